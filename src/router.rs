use crate::handlers::{self, AppState};
use crate::models::*;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(title = "Contact Enrichment API"),
    paths(
        handlers::list_contacts,
        handlers::get_contact,
        handlers::create_contact,
        handlers::update_contact,
        handlers::delete_contact,
        handlers::enrich_contact,
        handlers::verify_email,
    ),
    components(schemas(
        Contact,
        ContactEnrichment,
        EnrichmentSource,
        SocialLink,
        CreateContact,
        UpdateContact,
        EnrichedContactResponse,
        EmailVerificationResponse,
    )),
    tags(
        (name = "contacts", description = "Contact CRUD"),
        (name = "enrichment", description = "Hunter.io lookups with mock fallback")
    )
)]
pub struct ApiDoc;

/// Browser origins allowed to call the API with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let api_routes = Router::new()
        .route(
            "/contacts",
            get(handlers::list_contacts).post(handlers::create_contact),
        )
        .route(
            "/contacts/:id",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .patch(handlers::update_contact)
                .delete(handlers::delete_contact),
        )
        .route("/contacts/:id/enrich", post(handlers::enrich_contact))
        .route(
            "/contacts/verify-email/:email",
            get(handlers::verify_email),
        )
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)));

    Router::new()
        .route("/", get(handlers::serve_index))
        .route("/health", get(handlers::health))
        .route("/docs", get(handlers::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(handlers::serve_openapi_spec))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_contact_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/contacts"));
        assert!(paths.iter().any(|p| p.as_str() == "/contacts/{id}/enrich"));
    }
}
