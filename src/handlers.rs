use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::services::ContactService;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: SqlitePool,
    /// Application configuration.
    pub config: Config,
    /// Contact operations, wired to the store and the Hunter integrations.
    pub contacts: ContactService,
}

/// `Json` body extractor whose rejections are `AppError`s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor whose rejections are `AppError`s.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `Query` extractor whose rejections are `AppError`s.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Health check endpoint.
///
/// Reports `degraded` when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    (
        if db_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(json!({
            "status": if db_ok { "healthy" } else { "degraded" },
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "enrichment_mode": if state.config.hunter_api_key.is_some() { "live" } else { "mock" },
        })),
    )
}

/// GET /contacts
///
/// Lists contacts in creation order.
#[utoipa::path(
    get,
    path = "/contacts",
    params(ListParams),
    responses(
        (status = 200, description = "Contacts in creation order", body = [Contact]),
        (status = 400, description = "Negative skip or limit")
    ),
    tag = "contacts"
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Contact>>, AppError> {
    tracing::debug!("GET /contacts - params: {:?}", params);

    let contacts = state.contacts.list(&params).await?;
    Ok(Json(contacts))
}

/// GET /contacts/:id
#[utoipa::path(
    get,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id")),
    responses(
        (status = 200, body = Contact),
        (status = 404, description = "Unknown id")
    ),
    tag = "contacts"
)]
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Contact>, AppError> {
    Ok(Json(state.contacts.get(id).await?))
}

/// POST /contacts
///
/// Creates a contact. The email is scored by the verifier before insertion.
#[utoipa::path(
    post,
    path = "/contacts",
    request_body = CreateContact,
    responses(
        (status = 201, body = Contact),
        (status = 400, description = "Missing or malformed name/email"),
        (status = 409, description = "Email already in use")
    ),
    tag = "contacts"
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateContact>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    tracing::info!("POST /contacts - email: {:?}", payload.email);

    let contact = state.contacts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /contacts/:id (also mounted as PATCH)
///
/// Partial update: absent fields are kept, `null` clears `company`/`phone`.
#[utoipa::path(
    put,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id")),
    request_body = UpdateContact,
    responses(
        (status = 200, body = Contact),
        (status = 400, description = "Malformed field"),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Email already in use")
    ),
    tag = "contacts"
)]
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateContact>,
) -> Result<Json<Contact>, AppError> {
    tracing::info!("PUT /contacts/{}", id);

    Ok(Json(state.contacts.update(id, payload).await?))
}

/// DELETE /contacts/:id
#[utoipa::path(
    delete,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id")
    ),
    tag = "contacts"
)]
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /contacts/{}", id);

    state.contacts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /contacts/:id/enrich
///
/// Enriches the contact from Hunter, or from the mock record when the lookup
/// is unavailable. Never fails because of the lookup itself.
#[utoipa::path(
    post,
    path = "/contacts/{id}/enrich",
    params(("id" = i64, Path, description = "Contact id")),
    responses(
        (status = 200, body = EnrichedContactResponse),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Email changed while the lookup was running")
    ),
    tag = "enrichment"
)]
pub async fn enrich_contact(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EnrichedContactResponse>, AppError> {
    tracing::info!("POST /contacts/{}/enrich", id);

    Ok(Json(state.contacts.enrich(id).await?))
}

/// GET /contacts/verify-email/:email
#[utoipa::path(
    get,
    path = "/contacts/verify-email/{email}",
    params(("email" = String, Path, description = "Email address to score")),
    responses(
        (status = 200, body = EmailVerificationResponse),
        (status = 400, description = "Malformed email")
    ),
    tag = "enrichment"
)]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    AppPath(email): AppPath<String>,
) -> Result<Json<EmailVerificationResponse>, AppError> {
    let verification = state.contacts.verify_email(&email).await?;

    Ok(Json(EmailVerificationResponse {
        email: email.trim().to_lowercase(),
        score: verification.score,
        status: verification.status.as_str().to_string(),
    }))
}

/// Serves the contact list page.
pub async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Serves the generated OpenAPI document.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    use utoipa::OpenApi;

    Json(crate::router::ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads the OpenAPI document served by `serve_openapi_spec`.
pub async fn serve_swagger_ui() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Contact Enrichment API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#,
    )
}
