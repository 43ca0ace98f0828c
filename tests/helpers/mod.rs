//! Shared test helpers for integration tests.
//!
//! Builds the full router over the in-memory stores, so every test runs
//! the real handlers, services, and error mapping without a database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Duration, Utc};
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tollgate_core::config::{AppConfig, DatabaseConfig};
use tollgate_entity::license::LicenseStatus;
use tollgate_service::testing::MemoryStores;
use tollgate_service::{AccessGate, LicenseService, PaymentProcessor, SessionTracker};

/// Webhook signing secret used by the test configuration.
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The in-memory stores behind the router
    pub stores: MemoryStores,
    /// Application config
    pub config: Arc<AppConfig>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = Arc::new(test_config());
        let stores = MemoryStores::new();

        let gate = Arc::new(AccessGate::new(
            stores.licenses.clone(),
            stores.ledger.clone(),
            &config.gate,
        ));
        let tracker = Arc::new(SessionTracker::new(
            stores.sessions.clone(),
            stores.ledger.clone(),
            Arc::clone(&gate),
            config.session.clone(),
        ));
        let payments = Arc::new(PaymentProcessor::new(
            stores.licenses.clone(),
            stores.ledger.clone(),
            config.payment.clone(),
        ));
        let license_service = Arc::new(LicenseService::new(
            stores.licenses.clone(),
            stores.ledger.clone(),
        ));

        let state = tollgate_api::AppState {
            config: Arc::clone(&config),
            licenses: stores.licenses.clone(),
            ledger: stores.ledger.clone(),
            sessions: stores.sessions.clone(),
            gate,
            tracker,
            payments,
            license_service,
        };

        Self {
            router: tollgate_api::build_router(state),
            stores,
            config,
        }
    }

    /// Create an active license with the given hour balance
    pub async fn create_test_license(&self, key: &str, balance_hours: f64) {
        self.stores
            .seed_license(
                key,
                LicenseStatus::Active,
                Utc::now() + Duration::days(30),
                balance_hours,
            )
            .await;
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Deliver a signed webhook body
    pub async fn webhook(&self, body: &[u8], signature: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri("/api/payments/webhook")
            .header("Content-Type", "application/json")
            .header(self.config.payment.signature_header.as_str(), signature)
            .body(Body::from(body.to_vec()))
            .expect("Failed to build request");

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
        },
        session: Default::default(),
        gate: Default::default(),
        payment: tollgate_core::config::payment::PaymentConfig {
            webhook_secret: WEBHOOK_SECRET.to_string(),
            signature_header: "x-tollgate-signature".to_string(),
        },
        worker: Default::default(),
        logging: Default::default(),
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Fetch a string field from the body, panicking if absent
    pub fn str_field(&self, name: &str) -> &str {
        self.body
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| panic!("No string field '{name}' in {:?}", self.body))
    }

    /// Fetch a float field from the body, panicking if absent
    pub fn f64_field(&self, name: &str) -> f64 {
        self.body
            .get(name)
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| panic!("No numeric field '{name}' in {:?}", self.body))
    }
}
