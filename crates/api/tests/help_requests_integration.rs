//! Integration tests for the help request lifecycle over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin_token, confirm_reject, get_request, json_request, patient_name, patient_token,
    post_request, submit_help_request, TestApp, HOSPITAL, OTHER_HOSPITAL,
};
use domain::models::HelpRequestStatus;
use domain::services::StoreOperation;
use serde_json::json;

#[tokio::test]
async fn test_guest_submission_is_pending() {
    let app = TestApp::new();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", HOSPITAL),
            json!({ "patient_name": "  Salma Idrissi  ", "description": "" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["patient_name"], "Salma Idrissi");
    assert_eq!(body["hospital_id"], HOSPITAL);
    assert!(body.get("user_id").is_none());
    assert!(body.get("description").is_none());
}

#[tokio::test]
async fn test_signed_in_submission_records_user() {
    let app = TestApp::new();
    let (user_id, token) = patient_token();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", HOSPITAL),
            json!({ "patient_name": patient_name() }),
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], user_id.to_string());
}

#[tokio::test]
async fn test_invalid_token_is_not_downgraded_to_guest() {
    let app = TestApp::new();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", HOSPITAL),
            json!({ "patient_name": patient_name() }),
            Some("not-a-jwt"),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_blank_patient_name_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", HOSPITAL),
            json!({ "patient_name": "   " }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "patient_name");
}

/// Accept takes a unit and resolve gives it back.
#[tokio::test]
async fn test_accept_then_resolve_round_trips_a_unit() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    let id = submit_help_request(&app, HOSPITAL).await;

    let (status, body) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/accept", id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "in-progress");
    assert_eq!(body["ledger_effect"], "consumed");
    assert_eq!(body["availability"]["available_count"], 9);

    let (status, body) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/resolve", id),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "resolved");
    assert!(body["request"]["resolved_at"].is_string());
    assert_eq!(body["ledger_effect"], "returned");
    assert_eq!(body["availability"]["available_count"], 10);
}

/// With no free unit, accept is refused and the request stays pending.
#[tokio::test]
async fn test_accept_refused_when_no_units() {
    let app = TestApp::new();
    app.store.seed_ledger(HOSPITAL, 0, 4);
    let token = admin_token(HOSPITAL);
    let id = submit_help_request(&app, HOSPITAL).await;

    let (status, body) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/accept", id),
            &token,
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_units_available");
    assert_eq!(body["available_count"], 0);
    assert_eq!(body["total_count"], 4);
    assert_eq!(
        app.store.help_request(id).unwrap().status,
        HelpRequestStatus::Pending
    );
    assert_eq!(app.store.ledger(HOSPITAL).unwrap().available_count, 0);
}

/// The request is resolved even when the unit cannot be returned.
#[tokio::test]
async fn test_resolve_succeeds_when_return_fails() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    let id = submit_help_request(&app, HOSPITAL).await;
    app.call(post_request(
        &format!("/api/v1/admin/help-requests/{}/accept", id),
        &token,
    ))
    .await;

    app.store.fail_operation(StoreOperation::IncrementClamped);
    let (status, body) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/resolve", id),
            &token,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "resolved");
    assert_eq!(body["ledger_effect"], "return_failed");
    assert_eq!(app.store.ledger(HOSPITAL).unwrap().available_count, 9);
}

#[tokio::test]
async fn test_reject_requires_confirmation() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    let id = submit_help_request(&app, HOSPITAL).await;
    let uri = format!("/api/v1/admin/help-requests/{}/reject", id);

    let (status, _) = app.call(post_request(&uri, &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(json_request(
            Method::POST,
            &uri,
            json!({ "confirm": false }),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        app.store.help_request(id).unwrap().status,
        HelpRequestStatus::Pending
    );

    let (status, body) = app.call(confirm_reject(&uri, &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "cancelled");
    assert_eq!(body["ledger_effect"], "untouched");
    assert!(app.store.ledger(HOSPITAL).is_none());
}

#[tokio::test]
async fn test_stale_transition_is_conflict() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    let id = submit_help_request(&app, HOSPITAL).await;

    let (status, body) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/resolve", id),
            &token,
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert!(body["message"].as_str().unwrap().contains("pending"));
}

#[tokio::test]
async fn test_admin_cannot_touch_other_hospital_requests() {
    let app = TestApp::new();
    let id = submit_help_request(&app, OTHER_HOSPITAL).await;

    let (status, _) = app
        .call(post_request(
            &format!("/api/v1/admin/help-requests/{}/accept", id),
            &admin_token(HOSPITAL),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.store.help_request(id).unwrap().status,
        HelpRequestStatus::Pending
    );
}

#[tokio::test]
async fn test_list_with_out_of_range_page_is_empty() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    submit_help_request(&app, HOSPITAL).await;

    let (status, body) = app
        .call(get_request(
            "/api/v1/admin/help-requests?page=9223372036854775807&per_page=20",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let app = TestApp::new();
    let token = admin_token(HOSPITAL);
    let first = submit_help_request(&app, HOSPITAL).await;
    submit_help_request(&app, HOSPITAL).await;
    submit_help_request(&app, HOSPITAL).await;
    submit_help_request(&app, OTHER_HOSPITAL).await;
    app.call(post_request(
        &format!("/api/v1/admin/help-requests/{}/accept", first),
        &token,
    ))
    .await;

    let (status, body) = app
        .call(get_request(
            "/api/v1/admin/help-requests?page=1&per_page=2",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let (_, body) = app
        .call(get_request(
            "/api/v1/admin/help-requests?status=in-progress",
            Some(&token),
        ))
        .await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], first.to_string());

    let (status, _) = app
        .call(get_request(
            "/api/v1/admin/help-requests?status=open",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_is_service_unavailable() {
    let app = TestApp::new();
    app.store.fail_operation(StoreOperation::InsertHelpRequest);

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", HOSPITAL),
            json!({ "patient_name": patient_name() }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}
