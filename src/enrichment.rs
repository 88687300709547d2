//! Enrichment and verification with a fixed fallback.
//!
//! Both operations make at most one call to Hunter.io. Whatever goes wrong
//! with that call (no key, network, status, payload) is logged and replaced
//! by canned data; callers always get a value.
use crate::models::{EnrichmentSource, SocialLink};
use crate::services::{HunterClient, LookupError, PersonLookup};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // RFC 5322 simplified: local@domain.tld
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Validate the basic shape of an email address.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || email.len() > 100 {
        return false;
    }

    EMAIL_REGEX.is_match(email)
}

// ============ Enrichment ============

/// Enrichment fields as they are written onto a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentData {
    pub title: String,
    pub social_links: Vec<SocialLink>,
}

/// Outcome of [`EnrichmentGateway::enrich`]: live data or the static substitute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Live(EnrichmentData),
    Mock(EnrichmentData),
}

impl Enrichment {
    pub fn source(&self) -> EnrichmentSource {
        match self {
            Enrichment::Live(_) => EnrichmentSource::Live,
            Enrichment::Mock(_) => EnrichmentSource::Mock,
        }
    }

    pub fn data(&self) -> &EnrichmentData {
        match self {
            Enrichment::Live(data) | Enrichment::Mock(data) => data,
        }
    }
}

/// The record substituted whenever a live lookup is not possible.
pub fn mock_enrichment() -> EnrichmentData {
    EnrichmentData {
        title: "Business Development Manager".to_string(),
        social_links: vec![
            SocialLink {
                network: "linkedin".to_string(),
                url: "https://www.linkedin.com/in/example-contact".to_string(),
            },
            SocialLink {
                network: "twitter".to_string(),
                url: "https://twitter.com/example_contact".to_string(),
            },
        ],
    }
}

/// Maps a Hunter person lookup onto enrichment fields.
///
/// A lookup without a job title has nothing to enrich with and is rejected,
/// so a live record is never partially filled.
pub fn map_person(person: PersonLookup) -> Result<EnrichmentData, LookupError> {
    let title = person
        .employment
        .and_then(|e| e.title)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(LookupError::Incomplete("employment.title"))?;

    let mut social_links = Vec::new();
    if let Some(handle) = person.linkedin.and_then(|s| s.handle) {
        let handle = handle.trim_start_matches("in/");
        social_links.push(SocialLink {
            network: "linkedin".to_string(),
            url: format!("https://www.linkedin.com/in/{}", handle),
        });
    }
    if let Some(handle) = person.twitter.and_then(|s| s.handle) {
        social_links.push(SocialLink {
            network: "twitter".to_string(),
            url: format!("https://twitter.com/{}", handle.trim_start_matches('@')),
        });
    }

    Ok(EnrichmentData {
        title,
        social_links,
    })
}

/// Chooses between a live Hunter lookup and the mock record.
#[derive(Clone)]
pub struct EnrichmentGateway {
    client: Option<HunterClient>,
}

impl EnrichmentGateway {
    /// `client` is `None` when no API key is configured.
    pub fn new(client: Option<HunterClient>) -> Self {
        Self { client }
    }

    pub async fn enrich(&self, email: &str) -> Enrichment {
        let Some(client) = &self.client else {
            tracing::debug!("No Hunter API key, using mock enrichment for {}", email);
            return Enrichment::Mock(mock_enrichment());
        };

        match client.find_person(email).await.and_then(map_person) {
            Ok(data) => {
                tracing::info!("✓ Live enrichment for {}", email);
                Enrichment::Live(data)
            }
            Err(e) => {
                tracing::warn!("Enrichment lookup failed for {}, using mock: {}", email, e);
                Enrichment::Mock(mock_enrichment())
            }
        }
    }
}

// ============ Verification ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Verified,
    MockedKey,
    ApiError,
    NetworkError,
    UnexpectedError,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::MockedKey => "mocked_key",
            VerificationStatus::ApiError => "api_error",
            VerificationStatus::NetworkError => "network_error",
            VerificationStatus::UnexpectedError => "unexpected_error",
        }
    }

    fn for_failure(err: &LookupError) -> Self {
        match err {
            LookupError::Status { .. } => VerificationStatus::ApiError,
            LookupError::Transport(_) => VerificationStatus::NetworkError,
            LookupError::Decode(_) | LookupError::Incomplete(_) => {
                VerificationStatus::UnexpectedError
            }
        }
    }

    /// Fixed score reported alongside each fallback status.
    fn fallback_score(&self) -> i64 {
        match self {
            VerificationStatus::MockedKey | VerificationStatus::Verified => 50,
            VerificationStatus::ApiError => 40,
            VerificationStatus::NetworkError => 45,
            VerificationStatus::UnexpectedError => 48,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailVerification {
    pub score: i64,
    pub status: VerificationStatus,
}

impl EmailVerification {
    fn fallback(status: VerificationStatus) -> Self {
        Self {
            score: status.fallback_score(),
            status,
        }
    }
}

/// Scores email deliverability through Hunter, with per-failure fallbacks.
#[derive(Clone)]
pub struct EmailVerifier {
    client: Option<HunterClient>,
}

impl EmailVerifier {
    pub fn new(client: Option<HunterClient>) -> Self {
        Self { client }
    }

    pub async fn verify(&self, email: &str) -> EmailVerification {
        let Some(client) = &self.client else {
            return EmailVerification::fallback(VerificationStatus::MockedKey);
        };

        match client.verify_email(email).await {
            Ok(data) => EmailVerification {
                score: data
                    .score
                    .unwrap_or(VerificationStatus::Verified.fallback_score())
                    .clamp(0, 100),
                status: VerificationStatus::Verified,
            },
            Err(e) => {
                let status = VerificationStatus::for_failure(&e);
                tracing::warn!(
                    "Email verification failed for {} ({}), using mock score: {}",
                    email,
                    status.as_str(),
                    e
                );
                EmailVerification::fallback(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Employment, SocialHandle};

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@exam ple.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "a".repeat(100))));
    }

    #[test]
    fn test_mock_record_is_stable() {
        assert_eq!(mock_enrichment(), mock_enrichment());
        assert!(!mock_enrichment().title.is_empty());
        assert_eq!(mock_enrichment().social_links.len(), 2);
    }

    #[test]
    fn test_map_person_builds_links() {
        let person = PersonLookup {
            employment: Some(Employment {
                title: Some("CTO".into()),
            }),
            linkedin: Some(SocialHandle {
                handle: Some("in/ada-lovelace".into()),
            }),
            twitter: Some(SocialHandle {
                handle: Some("@ada".into()),
            }),
        };

        let data = map_person(person).unwrap();
        assert_eq!(data.title, "CTO");
        assert_eq!(
            data.social_links,
            vec![
                SocialLink {
                    network: "linkedin".into(),
                    url: "https://www.linkedin.com/in/ada-lovelace".into(),
                },
                SocialLink {
                    network: "twitter".into(),
                    url: "https://twitter.com/ada".into(),
                },
            ]
        );
    }

    #[test]
    fn test_map_person_without_title_is_incomplete() {
        let person = PersonLookup {
            employment: Some(Employment {
                title: Some("  ".into()),
            }),
            ..Default::default()
        };

        assert!(matches!(
            map_person(person),
            Err(LookupError::Incomplete("employment.title"))
        ));
    }

    #[tokio::test]
    async fn test_gateway_without_key_is_mock() {
        let gateway = EnrichmentGateway::new(None);
        let enrichment = gateway.enrich("ada@example.com").await;

        assert_eq!(enrichment.source(), EnrichmentSource::Mock);
        assert_eq!(enrichment.data(), &mock_enrichment());
    }

    #[tokio::test]
    async fn test_verifier_without_key() {
        let verification = EmailVerifier::new(None).verify("ada@example.com").await;
        assert_eq!(verification.status, VerificationStatus::MockedKey);
        assert_eq!(verification.score, 50);
    }

    #[test]
    fn test_fallback_scores() {
        assert_eq!(
            EmailVerification::fallback(VerificationStatus::ApiError).score,
            40
        );
        assert_eq!(
            EmailVerification::fallback(VerificationStatus::NetworkError).score,
            45
        );
        assert_eq!(
            EmailVerification::fallback(VerificationStatus::UnexpectedError).score,
            48
        );
    }
}
