use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://contacts.db";
pub const DEFAULT_HUNTER_BASE_URL: &str = "https://api.hunter.io";
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:8000,http://127.0.0.1:8000,http://localhost:5500";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Hunter.io API key. `None` selects mock mode.
    pub hunter_api_key: Option<String>,
    pub hunter_base_url: String,
    pub hunter_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Every setting has a default; only malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            database_url: var("DATABASE_URL")
                .map(|url| {
                    if !url.starts_with("sqlite:") {
                        anyhow::bail!("DATABASE_URL must start with sqlite:");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            hunter_api_key: var("HUNTER_IO_API_KEY").map(|key| key.trim().to_string()),
            hunter_base_url: var("HUNTER_BASE_URL")
                .map(|raw| {
                    let url = url::Url::parse(&raw)
                        .map_err(|e| anyhow::anyhow!("HUNTER_BASE_URL is not a valid URL: {}", e))?;
                    if url.scheme() != "http" && url.scheme() != "https" {
                        anyhow::bail!("HUNTER_BASE_URL must start with http:// or https://");
                    }
                    Ok(raw.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_HUNTER_BASE_URL.to_string()),
            hunter_timeout_secs: var("HUNTER_TIMEOUT_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HUNTER_TIMEOUT_SECS must be a whole number"))?,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            seed_demo_data: match var("SEED_DEMO_DATA").as_deref() {
                None => true,
                Some("1" | "true" | "yes") => true,
                Some("0" | "false" | "no") => false,
                Some(other) => anyhow::bail!("SEED_DEMO_DATA must be true or false, got {}", other),
            },
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Database URL: {}", config.database_url);
        tracing::debug!("Hunter Base URL: {}", config.hunter_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.hunter_api_key.is_none() {
            tracing::info!("HUNTER_IO_API_KEY not set, enrichment runs in mock mode");
        }

        Ok(config)
    }

    pub fn hunter_timeout(&self) -> Duration {
        Duration::from_secs(self.hunter_timeout_secs)
    }
}
