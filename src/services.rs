use crate::db_storage::{ContactChanges, ContactStore, NewContact};
use crate::enrichment::{EmailVerification, EmailVerifier, EnrichmentGateway};
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

// ============ Hunter.io client ============

/// Why a call to the lookup service produced no usable data.
#[derive(Debug)]
pub enum LookupError {
    /// Connection, TLS, or timeout failure.
    Transport(reqwest::Error),
    /// The service answered with a non-2xx status.
    Status { status: StatusCode, body: String },
    /// The body was not the JSON we expect.
    Decode(String),
    /// The body parsed but lacks a required field.
    Incomplete(&'static str),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Transport(e) => write!(f, "Hunter request failed: {}", e),
            LookupError::Status { status, body } => {
                write!(f, "Hunter returned {}: {}", status, body)
            }
            LookupError::Decode(msg) => write!(f, "Failed to parse Hunter response: {}", msg),
            LookupError::Incomplete(field) => {
                write!(f, "Hunter response is missing '{}'", field)
            }
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Transport(err)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// `data` of `GET /v2/people/find`.
#[derive(Debug, Default, Deserialize)]
pub struct PersonLookup {
    #[serde(default)]
    pub employment: Option<Employment>,
    #[serde(default)]
    pub linkedin: Option<SocialHandle>,
    #[serde(default)]
    pub twitter: Option<SocialHandle>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Employment {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SocialHandle {
    pub handle: Option<String>,
}

/// `data` of `GET /v2/email-verifier`.
#[derive(Debug, Default, Deserialize)]
pub struct EmailVerifierData {
    pub score: Option<i64>,
}

/// Thin client for the Hunter.io REST API.
#[derive(Clone)]
pub struct HunterClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HunterClient {
    /// Creates a new `HunterClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the Hunter API, without trailing slash.
    /// * `api_key` - The API key sent with every request.
    /// * `timeout` - Upper bound for a whole request.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Looks up the person behind an email address.
    pub async fn find_person(&self, email: &str) -> Result<PersonLookup, LookupError> {
        self.get_data("/v2/people/find", email).await
    }

    /// Asks Hunter how deliverable an email address is.
    pub async fn verify_email(&self, email: &str) -> Result<EmailVerifierData, LookupError> {
        self.get_data("/v2/email-verifier", email).await
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        email: &str,
    ) -> Result<T, LookupError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!("{}{}", self.base_url, endpoint),
            &[("email", email), ("api_key", self.api_key.as_str())],
        )
        .map_err(|e| LookupError::Decode(format!("Failed to build URL: {}", e)))?;

        // Redact the key from logs
        tracing::debug!(
            "Hunter URL: {}{}?email={}&api_key=[REDACTED]",
            self.base_url,
            endpoint,
            email
        );

        let response = self.client.get(url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status { status, body });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))?;

        Ok(envelope.data)
    }
}

// ============ Contact service ============

/// Ties the store to the lookup integrations; one method per API operation.
#[derive(Clone)]
pub struct ContactService {
    store: ContactStore,
    gateway: EnrichmentGateway,
    verifier: EmailVerifier,
}

impl ContactService {
    /// `hunter` is `None` in mock mode.
    pub fn new(store: ContactStore, hunter: Option<HunterClient>) -> Self {
        Self {
            store,
            gateway: EnrichmentGateway::new(hunter.clone()),
            verifier: EmailVerifier::new(hunter),
        }
    }

    pub async fn list(&self, params: &ListParams) -> Result<Vec<Contact>, AppError> {
        match (params.skip, params.limit) {
            (None, None) => self.store.list().await,
            (skip, limit) => {
                let skip = skip.unwrap_or(0);
                if skip < 0 || limit.is_some_and(|l| l < 0) {
                    return Err(AppError::BadRequest(
                        "skip and limit must not be negative".to_string(),
                    ));
                }
                self.store.list_page(skip, limit).await
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Contact, AppError> {
        self.store.get(id).await
    }

    /// Validates, checks for a duplicate email, scores the email, then inserts.
    pub async fn create(&self, fields: CreateContact) -> Result<Contact, AppError> {
        let mut new_contact = NewContact::parse(fields)?;

        if self.store.find_by_email(&new_contact.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Contact with email {} already exists",
                new_contact.email
            )));
        }

        let verification = self.verifier.verify(&new_contact.email).await;
        new_contact.verification_score = Some(verification.score);

        let contact = self.store.create(&new_contact).await?;
        tracing::info!("Created contact {} <{}>", contact.id, contact.email);
        Ok(contact)
    }

    /// Applies a partial update. A changed email is re-scored and drops any enrichment.
    pub async fn update(&self, id: i64, fields: UpdateContact) -> Result<Contact, AppError> {
        let changes = ContactChanges::parse(fields)?;
        let current = self.store.get(id).await?;

        let mut rescored = None;
        if let Some(email) = changes.email.as_deref().filter(|e| *e != current.email) {
            if let Some(other) = self.store.find_by_email(email).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!(
                        "Email {} is already in use by another contact",
                        email
                    )));
                }
            }
            rescored = Some(self.verifier.verify(email).await.score);
        }

        let contact = self
            .store
            .update(id, &changes, rescored)
            .await
            .with_context(|| format!("updating contact {}", id))?;
        tracing::info!("Updated contact {}", id);
        Ok(contact)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.store.delete(id).await?;
        tracing::info!("Deleted contact {}", id);
        Ok(())
    }

    /// Enriches the contact's email and stores the whole block.
    pub async fn enrich(&self, id: i64) -> Result<EnrichedContactResponse, AppError> {
        let contact = self.store.get(id).await?;

        let enrichment = self.gateway.enrich(&contact.email).await;
        let source = enrichment.source();

        let contact = self
            .store
            .apply_enrichment(id, &contact.email, &enrichment)
            .await?;
        tracing::info!("Enriched contact {} (source={})", id, source.as_str());

        Ok(EnrichedContactResponse { contact, source })
    }

    pub async fn verify_email(&self, email: &str) -> Result<EmailVerification, AppError> {
        let email = crate::db_storage::normalize_email(email)?;
        Ok(self.verifier.verify(&email).await)
    }
}
