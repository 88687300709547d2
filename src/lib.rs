//! Contact Enrichment API Library
//!
//! A contact manager backed by SQLite, with optional Hunter.io enrichment
//! and email verification that fall back to fixed mock data.
//!
//! # Modules
//!
//! - `api`: API-layer components.
//! - `core`: Domain logic, models and errors.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema.
//! - `db_storage`: Contact store and input validation.
//! - `enrichment`: Enrichment gateway and email verifier.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `router`: Route table, middleware and OpenAPI document.
//! - `services`: Hunter.io client and the contact service.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod db;
pub mod db_storage;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
