//! Integration tests for the access check endpoint.

mod helpers;

use http::StatusCode;
use tollgate_entity::license::LicenseStatus;
use tollgate_service::testing::LicenseStore;

#[tokio::test]
async fn granted_for_active_funded_license() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_good", 10.0).await;

    let response = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_good",
                "intent": "use_service",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["granted"], true);
    assert!(response.body.get("error").is_none());
}

#[tokio::test]
async fn denial_is_200_with_reason() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_nobody",
                "intent": "use_service",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["granted"], false);
    assert_eq!(response.str_field("error"), "license_not_found");
}

#[tokio::test]
async fn exhausted_license_can_still_purchase() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_broke", 0.0).await;

    let usage = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_broke",
                "intent": "use_service",
            })),
        )
        .await;
    assert_eq!(usage.body["granted"], false);
    assert_eq!(usage.str_field("error"), "insufficient_balance");

    let purchase = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_broke",
                "intent": "purchase_hours",
            })),
        )
        .await;
    assert_eq!(purchase.body["granted"], true);
}

#[tokio::test]
async fn revoked_license_is_inactive() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_rev", 5.0).await;
    app.stores
        .licenses
        .set_status("lic_rev", LicenseStatus::Revoked)
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_rev",
                "intent": "use_service",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["granted"], false);
    assert_eq!(response.str_field("error"), "inactive");
}

#[tokio::test]
async fn store_outage_fails_closed_for_unknown_keys() {
    let app = helpers::TestApp::new();
    app.create_test_license("lic_seen", 5.0).await;

    // Warm the gate's cache.
    let warm = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_seen",
                "intent": "use_service",
            })),
        )
        .await;
    assert_eq!(warm.body["granted"], true);

    app.stores.licenses.set_unavailable(true);

    // Cached key keeps its last decision for the grace window.
    let cached = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_seen",
                "intent": "use_service",
            })),
        )
        .await;
    assert_eq!(cached.status, StatusCode::OK);
    assert_eq!(cached.body["granted"], true);

    // A cold key is denied, not granted.
    let cold = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "lic_cold",
                "intent": "use_service",
            })),
        )
        .await;
    assert_eq!(cold.status, StatusCode::OK);
    assert_eq!(cold.body["granted"], false);
    assert_eq!(cold.str_field("error"), "authority_unavailable");
}

#[tokio::test]
async fn blank_license_key_is_rejected() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/access/check",
            Some(serde_json::json!({
                "license_key": "",
                "intent": "use_service",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.str_field("error"), "VALIDATION_ERROR");
}
