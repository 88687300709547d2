use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    name                    TEXT    NOT NULL,
    email                   TEXT    NOT NULL UNIQUE,
    company                 TEXT,
    phone                   TEXT,
    verification_score      INTEGER,
    enrichment_source       TEXT,
    enrichment_title        TEXT,
    enrichment_social_links TEXT,
    enriched_at             TEXT,
    created_at              TEXT    NOT NULL,
    updated_at              TEXT    NOT NULL
)
"#;

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens (creating if missing) the SQLite database and ensures the schema exists.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// A fresh private database, used by tests and tooling.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::new("sqlite::memory:").await
    }
}
