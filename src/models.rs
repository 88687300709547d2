use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// ============ API Models ============

/// A person record with identity fields and optional enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    /// Unique identifier, assigned at creation and never reused.
    pub id: i64,
    pub name: String,
    /// Stored lowercased.
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    /// Deliverability score (0-100) from the email verifier.
    pub verification_score: Option<i64>,
    /// Absent until the contact has been enriched; always complete when present.
    pub enrichment: Option<ContactEnrichment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an enrichment block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSource {
    Live,
    Mock,
}

impl EnrichmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentSource::Live => "live",
            EnrichmentSource::Mock => "mock",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "live" => Some(EnrichmentSource::Live),
            "mock" => Some(EnrichmentSource::Mock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SocialLink {
    /// e.g. "linkedin", "twitter".
    pub network: String,
    pub url: String,
}

/// The enrichment fields of a contact, stored as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactEnrichment {
    pub source: EnrichmentSource,
    pub title: String,
    pub social_links: Vec<SocialLink>,
    pub enriched_at: DateTime<Utc>,
}

/// Body of `POST /contacts`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

/// Body of `PUT`/`PATCH /contacts/{id}`.
///
/// Absent fields are left untouched. For the optional fields an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Query parameters for `GET /contacts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Number of contacts to skip.
    pub skip: Option<i64>,
    /// Maximum number of contacts to return. Unbounded when omitted.
    pub limit: Option<i64>,
}

/// Response of `POST /contacts/{id}/enrich`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrichedContactResponse {
    #[serde(flatten)]
    pub contact: Contact,
    pub source: EnrichmentSource,
}

/// Response of `GET /contacts/verify-email/{email}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailVerificationResponse {
    pub email: String,
    pub score: i64,
    pub status: String,
}

// ============ Database Models ============

/// Row shape of the `contacts` table.
#[derive(Debug, Clone, FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub verification_score: Option<i64>,
    pub enrichment_source: Option<String>,
    pub enrichment_title: Option<String>,
    pub enrichment_social_links: Option<Json<Vec<SocialLink>>>,
    pub enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        // The enrichment columns are written together; a row missing any of
        // them is read back as not enriched.
        let enrichment = match (
            row.enrichment_source.as_deref().and_then(EnrichmentSource::parse),
            row.enrichment_title,
            row.enrichment_social_links,
            row.enriched_at,
        ) {
            (Some(source), Some(title), Some(Json(social_links)), Some(enriched_at)) => {
                Some(ContactEnrichment {
                    source,
                    title,
                    social_links,
                    enriched_at,
                })
            }
            _ => None,
        };

        Contact {
            id: row.id,
            name: row.name,
            email: row.email,
            company: row.company,
            phone: row.phone,
            verification_score: row.verification_score,
            enrichment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
