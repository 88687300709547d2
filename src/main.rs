use contact_enrichment_api::{
    config::Config,
    db::Database,
    db_storage::ContactStore,
    handlers::AppState,
    router::build_router,
    services::{ContactService, HunterClient},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the SQLite database and the optional
/// Hunter.io client, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_enrichment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Open the database; failure here aborts startup
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database ready at {}", config.database_url);

    let store = ContactStore::new(db.pool.clone());
    if config.seed_demo_data {
        let seeded = store.seed_if_empty().await?;
        if seeded > 0 {
            tracing::info!("Seeded {} demo contacts", seeded);
        }
    }

    // Without a key, or if the client cannot be built, lookups run in mock mode
    let hunter_client = match &config.hunter_api_key {
        Some(key) => match HunterClient::new(
            config.hunter_base_url.clone(),
            key.clone(),
            config.hunter_timeout(),
        ) {
            Ok(client) => {
                tracing::info!("✓ Hunter client initialized: {}", config.hunter_base_url);
                Some(client)
            }
            Err(e) => {
                tracing::error!("Failed to initialize Hunter client, using mock mode: {}", e);
                None
            }
        },
        None => None,
    };

    // Build application state
    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        config: config.clone(),
        contacts: ContactService::new(store, hunter_client),
    });

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
