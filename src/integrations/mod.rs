//! External service integrations.

pub mod hunter {
    pub use crate::services::{
        EmailVerifierData, Employment, HunterClient, LookupError, PersonLookup, SocialHandle,
    };
}
