use crate::enrichment::{is_valid_email, Enrichment};
use crate::errors::{AppError, ResultExt};
use crate::models::{Contact, ContactRow, CreateContact, UpdateContact};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const PHONE_MAX_CHARS: usize = 20;
const COMPANY_MAX_CHARS: usize = 100;

// ============ Validation ============

/// Trims and lowercases an email, rejecting anything that is not `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", raw)));
    }
    Ok(email)
}

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars < NAME_MIN_CHARS || chars > NAME_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "name must be between {} and {} characters",
            NAME_MIN_CHARS, NAME_MAX_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Blank optional text is stored as NULL.
fn validate_optional(
    field: &str,
    raw: Option<String>,
    max_chars: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(Some(value))
}

/// A validated `CreateContact`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub verification_score: Option<i64>,
}

impl NewContact {
    pub fn parse(fields: CreateContact) -> Result<Self, AppError> {
        let name = fields
            .name
            .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
        let email = fields
            .email
            .ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

        Ok(Self {
            name: validate_name(&name)?,
            email: normalize_email(&email)?,
            company: validate_optional("company", fields.company, COMPANY_MAX_CHARS)?,
            phone: validate_optional("phone", fields.phone, PHONE_MAX_CHARS)?,
            verification_score: None,
        })
    }
}

/// A validated `UpdateContact`. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

impl ContactChanges {
    pub fn parse(fields: UpdateContact) -> Result<Self, AppError> {
        Ok(Self {
            name: fields.name.as_deref().map(validate_name).transpose()?,
            email: fields.email.as_deref().map(normalize_email).transpose()?,
            company: fields
                .company
                .map(|c| validate_optional("company", c, COMPANY_MAX_CHARS))
                .transpose()?,
            phone: fields
                .phone
                .map(|p| validate_optional("phone", p, PHONE_MAX_CHARS))
                .transpose()?,
        })
    }

    /// Writes the changes onto `contact`. Returns whether the email changed,
    /// in which case the enrichment block is dropped as a whole.
    pub fn apply_to(&self, contact: &mut Contact) -> bool {
        if let Some(name) = &self.name {
            contact.name = name.clone();
        }
        if let Some(company) = &self.company {
            contact.company = company.clone();
        }
        if let Some(phone) = &self.phone {
            contact.phone = phone.clone();
        }

        let email_changed = matches!(&self.email, Some(email) if *email != contact.email);
        if let Some(email) = &self.email {
            contact.email = email.clone();
        }
        if email_changed {
            contact.enrichment = None;
        }
        email_changed
    }
}

// ============ Store ============

/// SQLite-backed contact store.
#[derive(Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

impl ContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All contacts in creation order.
    pub async fn list(&self) -> Result<Vec<Contact>, AppError> {
        let rows = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("listing contacts")?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    /// A window over [`list`](Self::list). `limit = None` means no upper bound.
    pub async fn list_page(&self, skip: i64, limit: Option<i64>) -> Result<Vec<Contact>, AppError> {
        // SQLite treats a negative LIMIT as unbounded
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contacts ORDER BY id ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit.unwrap_or(-1))
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .context("listing contacts")?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Contact, AppError> {
        sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Contact::from)
            .ok_or_else(|| not_found(id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Contact::from))
    }

    /// Inserts a contact; the database assigns the id.
    pub async fn create(&self, contact: &NewContact) -> Result<Contact, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ContactRow>(
            "INSERT INTO contacts (name, email, company, phone, verification_score, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING *",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.company)
        .bind(&contact.phone)
        .bind(contact.verification_score)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Applies `changes` inside one transaction.
    ///
    /// `verification_score` replaces the stored score when the email changes.
    pub async fn update(
        &self,
        id: i64,
        changes: &ContactChanges,
        verification_score: Option<i64>,
    ) -> Result<Contact, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut contact: Contact =
            sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .map(Contact::from)
                .ok_or_else(|| not_found(id))?;

        if changes.apply_to(&mut contact) {
            if let Some(score) = verification_score {
                contact.verification_score = Some(score);
            }
        }

        let enrichment = contact.enrichment.as_ref();
        let row = sqlx::query_as::<_, ContactRow>(
            "UPDATE contacts
             SET name = $1, email = $2, company = $3, phone = $4, verification_score = $5,
                 enrichment_source = $6, enrichment_title = $7,
                 enrichment_social_links = $8, enriched_at = $9, updated_at = $10
             WHERE id = $11
             RETURNING *",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.company)
        .bind(&contact.phone)
        .bind(contact.verification_score)
        .bind(enrichment.map(|e| e.source.as_str()))
        .bind(enrichment.map(|e| e.title.as_str()))
        .bind(enrichment.map(|e| Json(&e.social_links)))
        .bind(enrichment.map(|e| e.enriched_at))
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Writes the full enrichment block in a single statement.
    ///
    /// `email` is the address the lookup ran against. If the contact's email
    /// has changed since, nothing is written and the call is a conflict.
    pub async fn apply_enrichment(
        &self,
        id: i64,
        email: &str,
        enrichment: &Enrichment,
    ) -> Result<Contact, AppError> {
        let data = enrichment.data();
        let now = Utc::now();

        let row = sqlx::query_as::<_, ContactRow>(
            "UPDATE contacts
             SET enrichment_source = $1, enrichment_title = $2,
                 enrichment_social_links = $3, enriched_at = $4, updated_at = $4
             WHERE id = $5 AND email = $6
             RETURNING *",
        )
        .bind(enrichment.source().as_str())
        .bind(&data.title)
        .bind(Json(&data.social_links))
        .bind(now)
        .bind(id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Contact::from(row)),
            None => {
                // Distinguish a deleted contact from one whose email moved on
                let current = self.get(id).await?;
                Err(AppError::Conflict(format!(
                    "Contact {} changed email from {} to {} during enrichment",
                    id, email, current.email
                )))
            }
        }
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts the demo contacts when the table is empty. Returns how many were added.
    pub async fn seed_if_empty(&self) -> Result<usize, AppError> {
        if self.count().await? > 0 {
            return Ok(0);
        }

        let seeds = [
            NewContact {
                name: "Alice Smith".to_string(),
                email: "alice@example.com".to_string(),
                company: Some("Example Corp".to_string()),
                phone: Some("555-1234".to_string()),
                verification_score: Some(85),
            },
            NewContact {
                name: "Bob Johnson".to_string(),
                email: "bob.j@test.org".to_string(),
                company: None,
                phone: None,
                verification_score: Some(45),
            },
        ];

        for seed in &seeds {
            self.create(seed).await.context("seeding demo contacts")?;
        }
        Ok(seeds.len())
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Contact with id {} not found", id))
}
