/// Integration tests with a mocked Hunter.io API
/// Exercises the live path and every fallback without hitting the real service
use contact_enrichment_api::core::enrichment::{
    mock_enrichment, EmailVerifier, EnrichmentGateway, VerificationStatus,
};
use contact_enrichment_api::core::errors::AppError;
use contact_enrichment_api::core::models::{CreateContact, EnrichmentSource, UpdateContact};
use contact_enrichment_api::core::storage::ContactStore;
use contact_enrichment_api::db::Database;
use contact_enrichment_api::integrations::hunter::HunterClient;
use contact_enrichment_api::services::ContactService;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

/// Helper function to create a client pointing at the mock server
fn client_for(base_url: String) -> HunterClient {
    HunterClient::new(base_url, API_KEY.to_string(), Duration::from_millis(500))
        .expect("client builds")
}

fn person_response() -> serde_json::Value {
    serde_json::json!({
        "data": {
            "name": {"fullName": "Ada Lovelace"},
            "email": "ada@example.com",
            "employment": {"domain": "example.com", "name": "Example", "title": "CTO"},
            "linkedin": {"handle": "ada-lovelace"},
            "twitter": {"handle": "ada"}
        }
    })
}

async fn mount_person(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v2/people/find"))
        .and(query_param("email", "ada@example.com"))
        .and(query_param("api_key", API_KEY))
        .respond_with(response)
        .mount(server)
        .await;
}

/// URL of a local port nothing listens on.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_live_enrichment_maps_response() {
    let mock_server = MockServer::start().await;
    mount_person(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(person_response()),
    )
    .await;

    let gateway = EnrichmentGateway::new(Some(client_for(mock_server.uri())));
    let enrichment = gateway.enrich("ada@example.com").await;

    assert_eq!(enrichment.source(), EnrichmentSource::Live);
    assert_eq!(enrichment.data().title, "CTO");
    let urls: Vec<&str> = enrichment
        .data()
        .social_links
        .iter()
        .map(|l| l.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec!["https://www.linkedin.com/in/ada-lovelace", "https://twitter.com/ada"]
    );
}

#[tokio::test]
async fn test_error_status_falls_back_to_mock() {
    let mock_server = MockServer::start().await;
    mount_person(
        &mock_server,
        ResponseTemplate::new(500).set_body_string("boom"),
    )
    .await;

    let gateway = EnrichmentGateway::new(Some(client_for(mock_server.uri())));
    let enrichment = gateway.enrich("ada@example.com").await;

    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
    assert_eq!(enrichment.data(), &mock_enrichment());
}

#[tokio::test]
async fn test_malformed_body_falls_back_to_mock() {
    let mock_server = MockServer::start().await;
    mount_person(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
    )
    .await;

    let gateway = EnrichmentGateway::new(Some(client_for(mock_server.uri())));
    let enrichment = gateway.enrich("ada@example.com").await;

    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
    assert_eq!(enrichment.data(), &mock_enrichment());
}

#[tokio::test]
async fn test_missing_title_falls_back_to_mock() {
    let mock_server = MockServer::start().await;
    mount_person(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"employment": {"title": null}, "twitter": {"handle": "ada"}}
        })),
    )
    .await;

    let gateway = EnrichmentGateway::new(Some(client_for(mock_server.uri())));
    let enrichment = gateway.enrich("ada@example.com").await;

    // No mix of live handles and mock title
    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
    assert_eq!(enrichment.data(), &mock_enrichment());
}

#[tokio::test]
async fn test_unreachable_service_falls_back_to_mock() {
    let gateway = EnrichmentGateway::new(Some(client_for(unreachable_url())));
    let enrichment = gateway.enrich("ada@example.com").await;

    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
}

#[tokio::test]
async fn test_slow_service_times_out_to_mock() {
    let mock_server = MockServer::start().await;
    mount_person(
        &mock_server,
        ResponseTemplate::new(200)
            .set_body_json(person_response())
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let gateway = EnrichmentGateway::new(Some(client_for(mock_server.uri())));
    let enrichment = gateway.enrich("ada@example.com").await;

    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
}

#[tokio::test]
async fn test_verifier_live_and_fallback_statuses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/email-verifier"))
        .and(query_param("email", "ada@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "valid", "score": 91}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/email-verifier"))
        .and(query_param("email", "limited@example.com"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/email-verifier"))
        .and(query_param("email", "garbled@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{"))
        .mount(&mock_server)
        .await;

    let verifier = EmailVerifier::new(Some(client_for(mock_server.uri())));

    let live = verifier.verify("ada@example.com").await;
    assert_eq!(live.status, VerificationStatus::Verified);
    assert_eq!(live.score, 91);

    let limited = verifier.verify("limited@example.com").await;
    assert_eq!(limited.status, VerificationStatus::ApiError);
    assert_eq!(limited.score, 40);

    let garbled = verifier.verify("garbled@example.com").await;
    assert_eq!(garbled.status, VerificationStatus::UnexpectedError);
    assert_eq!(garbled.score, 48);

    let offline = EmailVerifier::new(Some(client_for(unreachable_url())));
    let network = offline.verify("ada@example.com").await;
    assert_eq!(network.status, VerificationStatus::NetworkError);
    assert_eq!(network.score, 45);
}

#[tokio::test]
async fn test_mock_mode_never_calls_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(person_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let gateway = EnrichmentGateway::new(None);
    let verifier = EmailVerifier::new(None);

    let enrichment = gateway.enrich("ada@example.com").await;
    assert_eq!(enrichment.source(), EnrichmentSource::Mock);
    assert_eq!(enrichment.data().title, mock_enrichment().title);

    let verification = verifier.verify("ada@example.com").await;
    assert_eq!(verification.status, VerificationStatus::MockedKey);
    assert_eq!(verification.score, 50);

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_service_enrich_stores_live_then_mock() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/email-verifier"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "valid", "score": 77}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/people/find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(person_response()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = Database::in_memory().await.unwrap();
    let service = ContactService::new(
        ContactStore::new(db.pool.clone()),
        Some(client_for(mock_server.uri())),
    );

    let contact = service
        .create(CreateContact {
            name: Some("Ada Lovelace".into()),
            email: Some("Ada@Example.com".into()),
            company: None,
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(contact.email, "ada@example.com");
    assert_eq!(contact.verification_score, Some(77));

    let live = service.enrich(contact.id).await.unwrap();
    assert_eq!(live.source, EnrichmentSource::Live);
    assert_eq!(live.contact.enrichment.unwrap().title, "CTO");

    // The mock only answers once; the second lookup hits wiremock's 404
    let fallback = service.enrich(contact.id).await.unwrap();
    assert_eq!(fallback.source, EnrichmentSource::Mock);
    let block = fallback.contact.enrichment.unwrap();
    assert_eq!(block.source, EnrichmentSource::Mock);
    assert_eq!(block.title, mock_enrichment().title);
}

#[tokio::test]
async fn test_service_rescores_on_email_change() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/email-verifier"))
        .and(query_param("email", "ada@lovelace.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"score": 64}
        })))
        .mount(&mock_server)
        .await;

    let db = Database::in_memory().await.unwrap();
    let service = ContactService::new(
        ContactStore::new(db.pool.clone()),
        Some(client_for(mock_server.uri())),
    );

    // The first address is not mocked, so creation gets the api_error score
    let contact = service
        .create(CreateContact {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            company: None,
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(contact.verification_score, Some(40));

    let updated = service
        .update(
            contact.id,
            UpdateContact {
                email: Some("ada@lovelace.org".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.verification_score, Some(64));
}

#[tokio::test]
async fn test_email_change_during_lookup_discards_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/people/find"))
        .and(query_param("email", "ada@example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(person_response())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let db = Database::in_memory().await.unwrap();
    let service = ContactService::new(
        ContactStore::new(db.pool.clone()),
        Some(client_for(mock_server.uri())),
    );

    let contact = service
        .create(CreateContact {
            name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            company: None,
            phone: None,
        })
        .await
        .unwrap();

    let enriching = {
        let service = service.clone();
        tokio::spawn(async move { service.enrich(contact.id).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    service
        .update(
            contact.id,
            UpdateContact {
                email: Some("ada@lovelace.org".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = enriching.await.unwrap();
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let current = service.get(contact.id).await.unwrap();
    assert_eq!(current.email, "ada@lovelace.org");
    assert!(current.enrichment.is_none());
}
