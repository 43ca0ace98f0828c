//! Integration tests for the payment webhook endpoint.

mod helpers;

use http::StatusCode;
use tollgate_entity::license::LicenseStatus;
use tollgate_service::payment::signature::sign;
use tollgate_service::testing::{Ledger, LicenseStore};

fn event_body(key: &str, hours: f64, txn: &str) -> Vec<u8> {
    serde_json::json!({
        "licenseKey": key,
        "hours": hours,
        "transactionId": txn,
        "amount": 2999,
        "currency": "usd",
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn valid_webhook_credits_balance() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_pay", 0.0).await;

    let body = event_body("lic_pay", 20.0, "txn_a1");
    let response = app
        .webhook(&body, &sign(helpers::WEBHOOK_SECRET, &body))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.str_field("result"), "credited");
    assert_eq!(response.f64_field("balance_hours"), 20.0);

    assert_eq!(app.stores.ledger.balance("lic_pay").await.unwrap(), 20.0);
}

#[tokio::test]
async fn redelivery_credits_once() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_retry", 0.0).await;

    let body = event_body("lic_retry", 10.0, "txn_b2");
    let sig = sign(helpers::WEBHOOK_SECRET, &body);

    let first = app.webhook(&body, &sig).await;
    assert_eq!(first.str_field("result"), "credited");

    let second = app.webhook(&body, &sig).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.str_field("result"), "duplicate");

    assert_eq!(app.stores.ledger.balance("lic_retry").await.unwrap(), 10.0);
}

#[tokio::test]
async fn bad_signature_is_401() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_sig", 0.0).await;

    let body = event_body("lic_sig", 10.0, "txn_c3");
    let response = app.webhook(&body, &sign("wrong-secret", &body)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.str_field("error"), "INVALID_SIGNATURE");
    assert_eq!(app.stores.ledger.balance("lic_sig").await.unwrap(), 0.0);
}

#[tokio::test]
async fn missing_signature_header_is_401() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/payments/webhook",
            Some(serde_json::json!({ "licenseKey": "lic_x" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_license_acknowledged_without_credit() {
    let app = helpers::TestApp::new();

    let body = event_body("lic_stranger", 10.0, "txn_d4");
    let response = app
        .webhook(&body, &sign(helpers::WEBHOOK_SECRET, &body))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.str_field("result"), "unknown_license");
}

#[tokio::test]
async fn revoked_license_refused() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_gone", 0.0).await;
    app.stores
        .licenses
        .set_status("lic_gone", LicenseStatus::Revoked)
        .await
        .unwrap();

    let body = event_body("lic_gone", 10.0, "txn_e5");
    let response = app
        .webhook(&body, &sign(helpers::WEBHOOK_SECRET, &body))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.str_field("result"), "revoked_license");
    assert_eq!(app.stores.ledger.balance("lic_gone").await.unwrap(), 0.0);
}
