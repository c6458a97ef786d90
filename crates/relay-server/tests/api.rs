//! End-to-end tests for the relay's HTTP contract, with Stripe faked out
//! behind wiremock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sha2::Sha256;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_payments::{PaymentError, Provisioner, RelayConfig, StripeClient, Tier};
use relay_server::{AppState, app};

const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Provisioner that records every invocation.
#[derive(Default)]
struct RecordingProvisioner {
    calls: Mutex<Vec<(String, Tier)>>,
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn provision(&self, customer_email: &str, tier: Tier) -> relay_payments::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((customer_email.to_string(), tier));
        Ok(())
    }
}

/// Provisioner that always fails.
struct FailingProvisioner;

#[async_trait]
impl Provisioner for FailingProvisioner {
    async fn provision(&self, _customer_email: &str, _tier: Tier) -> relay_payments::Result<()> {
        Err(PaymentError::Provision("key issuance unreachable".into()))
    }
}

fn test_config() -> RelayConfig {
    RelayConfig {
        secret_key: "sk_test_abc".into(),
        webhook_secret: WEBHOOK_SECRET.into(),
        price_ids: HashMap::from([
            (Tier::Basic, "price_basic_123".into()),
            (Tier::Pro, "price_pro_123".into()),
            (Tier::Enterprise, "price_enterprise_123".into()),
        ]),
        success_url: "https://example.com/success".into(),
        cancel_url: "https://example.com/pricing".into(),
    }
}

fn test_app(stripe_base: &str, provisioner: Arc<dyn Provisioner>) -> Router {
    let config = test_config();
    let stripe = Arc::new(StripeClient::new(&config.secret_key).with_api_base(stripe_base));
    app(AppState {
        config: Arc::new(config),
        stripe,
        provisioner,
    })
}

fn sign(payload: &[u8]) -> String {
    let ts = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{ts}.").as_bytes());
    mac.update(payload);
    format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn webhook_request(payload: &[u8], signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("stripe-signature", signature)
        .body(Body::from(payload.to_vec()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn checkout_redirects_for_every_mapped_tier() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_123",
            "url": "https://checkout.stripe.com/c/pay/cs_test_123"
        })))
        .expect(3)
        .mount(&stripe)
        .await;

    let app = test_app(&stripe.uri(), Arc::new(RecordingProvisioner::default()));

    for tier in ["basic", "pro", "enterprise"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/checkout?tier={tier}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND, "tier {tier}");
        let location = response
            .headers()
            .get(header::LOCATION)
            .expect("Location header")
            .to_str()
            .unwrap();
        assert!(!location.is_empty());
        assert!(location.starts_with("https://checkout.stripe.com/"));
    }
}

#[tokio::test]
async fn checkout_passes_price_and_tier_metadata_through() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_enterprise_123"))
        .and(body_string_contains("metadata%5Btier%5D=enterprise"))
        .and(body_string_contains("mode=subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_456",
            "url": "https://checkout.stripe.com/c/pay/cs_test_456"
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let app = test_app(&stripe.uri(), Arc::new(RecordingProvisioner::default()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/checkout?tier=enterprise")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn checkout_rejects_unknown_tier_without_calling_stripe() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stripe)
        .await;

    let app = test_app(&stripe.uri(), Arc::new(RecordingProvisioner::default()));

    for uri in [
        "/api/checkout?tier=gold",
        "/api/checkout?tier=",
        "/api/checkout",
        "/api/checkout?tier=Basic",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Invalid tier"})
        );
    }
}

#[tokio::test]
async fn checkout_surfaces_provider_failure_as_500() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "No such price: 'price_pro_123'"}
        })))
        .mount(&stripe)
        .await;

    let app = test_app(&stripe.uri(), Arc::new(RecordingProvisioner::default()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/checkout?tier=pro")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::LOCATION).is_none());
    let body = body_json(response).await;
    assert!(
        body["error"].as_str().unwrap().contains("No such price"),
        "body was {body}"
    );
}

#[tokio::test]
async fn webhook_accepts_completed_checkout_and_provisions_once() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let app = test_app("http://stripe.invalid", provisioner.clone());

    let payload = br#"{
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_test_123",
            "customer_email": "user@example.com",
            "metadata": {"tier": "pro"}
        }}
    }"#;

    let response = app
        .oneshot(webhook_request(payload, &sign(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = provisioner.calls.lock().unwrap();
    assert_eq!(*calls, vec![("user@example.com".to_string(), Tier::Pro)]);
}

#[tokio::test]
async fn webhook_rejects_bad_signature_without_provisioning() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let app = test_app("http://stripe.invalid", provisioner.clone());

    let payload = br#"{
        "type": "checkout.session.completed",
        "data": {"object": {
            "customer_email": "user@example.com",
            "metadata": {"tier": "pro"}
        }}
    }"#;

    // Wrong signature entirely
    let ts = chrono::Utc::now().timestamp();
    let response = app
        .clone()
        .oneshot(webhook_request(payload, &format!("t={ts},v1=deadbeef")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid signature for a different body
    let signature = sign(b"some other body");
    let response = app
        .clone()
        .oneshot(webhook_request(payload, &signature))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No signature header at all
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webhook")
                .body(Body::from(payload.to_vec()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(provisioner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_ignores_unrecognized_event_types() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let app = test_app("http://stripe.invalid", provisioner.clone());

    let payload = br#"{"type": "charge.refunded", "data": {"object": {}}}"#;
    let response = app
        .oneshot(webhook_request(payload, &sign(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(provisioner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_recognizes_failed_invoice_as_noop() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let app = test_app("http://stripe.invalid", provisioner.clone());

    let payload = br#"{
        "type": "invoice.payment_failed",
        "data": {"object": {"customer_email": "user@example.com"}}
    }"#;
    let response = app
        .oneshot(webhook_request(payload, &sign(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(provisioner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_returns_500_when_verified_payload_is_undecodable() {
    let app = test_app(
        "http://stripe.invalid",
        Arc::new(RecordingProvisioner::default()),
    );

    let payload = b"definitely not json";
    let response = app
        .oneshot(webhook_request(payload, &sign(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn webhook_stays_200_when_provisioning_fails() {
    let app = test_app("http://stripe.invalid", Arc::new(FailingProvisioner));

    let payload = br#"{
        "type": "checkout.session.completed",
        "data": {"object": {
            "customer_email": "user@example.com",
            "metadata": {"tier": "basic"}
        }}
    }"#;
    let response = app
        .oneshot(webhook_request(payload, &sign(payload)))
        .await
        .unwrap();

    // Fire-and-forget: provisioning failures never trigger redelivery.
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unmatched_paths_and_methods_get_404() {
    let app = test_app(
        "http://stripe.invalid",
        Arc::new(RecordingProvisioner::default()),
    );

    let cases = [
        ("GET", "/"),
        ("GET", "/api/unknown"),
        ("POST", "/api/checkout"),
        ("GET", "/api/webhook"),
        ("DELETE", "/api/webhook"),
    ];

    for (verb, uri) in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(verb)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{verb} {uri}");
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app(
        "http://stripe.invalid",
        Arc::new(RecordingProvisioner::default()),
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}
