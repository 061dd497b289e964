mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use erp_api::auth::Role;

use common::TestApp;

#[tokio::test]
async fn admins_and_managers_list_users() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/users?role=employee", Role::Manager).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "employee@example.com");
    assert!(users[0].get("passwordHash").is_none());
    assert_eq!(body["pagination"]["total"], 1);

    let (status, _) = app.get("/api/users", Role::Employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invited_users_can_sign_in_with_the_mailed_password() {
    let app = TestApp::spawn().await;
    let email = "invitee@example.com";

    let (status, body) = app
        .post("/api/users", Role::Admin, json!({ "email": email, "name": "Invitee" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "employee");

    let password = app.mailer.last_secret("welcome", email).expect("welcome email with password");
    let (status, body) = app
        .request(Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": password })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "employee");
}

#[tokio::test]
async fn only_admins_invite() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .post("/api/users", Role::Manager, json!({ "email": "x@example.com", "name": "Xavier" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_cannot_demote_themselves() {
    let app = TestApp::spawn().await;
    let me = app.user_id(Role::Admin).to_string();

    let (status, body) = app.patch(&format!("/api/users/{}", me), Role::Admin, json!({ "role": "viewer" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You cannot demote or deactivate your own account");

    let (status, _) = app.patch(&format!("/api/users/{}", me), Role::Admin, json!({ "isActive": false })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_changes_take_effect_on_the_next_request() {
    let app = TestApp::spawn().await;
    let viewer = app.user_id(Role::Viewer).to_string();
    let body = json!({ "name": "Jo", "familyName": "Do", "phoneNumber": "555" });

    let (status, _) = app.post("/api/client", Role::Viewer, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .patch(&format!("/api/users/{}", viewer), Role::Admin, json!({ "role": "manager" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["role"], "manager");

    // Same token, role re-read from the user row.
    let (status, _) = app.post("/api/client", Role::Viewer, body).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn deactivating_a_user_revokes_access() {
    let app = TestApp::spawn().await;
    let employee = app.user_id(Role::Employee).to_string();

    let (status, _) = app
        .patch(&format!("/api/users/{}", employee), Role::Admin, json!({ "isActive": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/client", Role::Employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_user_update_is_not_found() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .patch("/api/users/2b1e3c9a-0f4d-4c1e-9a7b-5d6e7f8a9b0c", Role::Admin, json!({ "name": "Nobody" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}
