#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use erp_api::auth::password::hash_password;
use erp_api::auth::{generate_jwt, Claims, Role};
use erp_api::config::AppConfig;
use erp_api::database::MemoryStore;
use erp_api::mailer::{MailError, Mailer};
use erp_api::repositories::{into_row, timestamp, users, Repository};
use erp_api::{app, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// One captured outgoing email.
#[derive(Debug, Clone)]
pub struct Sent {
    pub kind: &'static str,
    pub to: String,
    /// Token or temporary password carried by the message.
    pub secret: Option<String>,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingMailer {
    fn record(&self, kind: &'static str, to: &str, secret: Option<&str>) {
        self.sent.lock().unwrap().push(Sent { kind, to: to.to_string(), secret: secret.map(str::to_string) });
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Secret of the most recent message of `kind` sent to `to`.
    pub fn last_secret(&self, kind: &str, to: &str) -> Option<String> {
        self.sent().into_iter().rev().find(|m| m.kind == kind && m.to == to).and_then(|m| m.secret)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.record("verification", to, Some(token));
        Ok(())
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.record("password_reset", to, Some(token));
        Ok(())
    }

    async fn send_welcome_email(&self, to: &str, temporary_password: Option<&str>) -> Result<(), MailError> {
        self.record("welcome", to, temporary_password);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    tokens: HashMap<Role, String>,
    user_ids: HashMap<Role, String>,
}

impl TestApp {
    /// In-memory app with one active, verified user per role.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::with_schema());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(store, AppConfig::in_memory(), mailer.clone());

        let mut test_app = Self {
            router: app(state.clone()),
            state,
            mailer,
            tokens: HashMap::new(),
            user_ids: HashMap::new(),
        };
        for role in Role::ALL {
            let email = format!("{}@example.com", role.as_str());
            let id = test_app.seed_user(&email, role, true).await;
            let token = test_app.token_for(&id, &email, role);
            test_app.tokens.insert(role, token);
            test_app.user_ids.insert(role, id);
        }
        test_app
    }

    pub async fn seed_user(&self, email: &str, role: Role, active: bool) -> String {
        let repo = Repository::new(self.state.store.clone(), users::TABLE);
        let row = repo
            .create(into_row(json!({
                "email": email,
                "name": "Test User",
                "password_hash": hash_password(PASSWORD).unwrap(),
                "role": role.as_str(),
                "is_active": active,
                "email_verified_at": timestamp(),
            })))
            .await
            .unwrap();
        row["id"].as_str().unwrap().to_string()
    }

    pub fn token_for(&self, user_id: &str, email: &str, role: Role) -> String {
        let claims = Claims::new(
            Uuid::parse_str(user_id).unwrap(),
            email,
            role,
            self.state.config.security.jwt_expiry_hours,
        );
        generate_jwt(&claims, &self.state.config.security).unwrap()
    }

    pub fn token(&self, role: Role) -> &str {
        &self.tokens[&role]
    }

    pub fn user_id(&self, role: Role) -> &str {
        &self.user_ids[&role]
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn get(&self, uri: &str, role: Role) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(self.token(role)), None).await
    }

    pub async fn post(&self, uri: &str, role: Role, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(self.token(role)), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, role: Role, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(self.token(role)), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, role: Role) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(self.token(role)), None).await
    }

    /// POST as admin and return the created record's id.
    pub async fn create(&self, uri: &str, body: Value) -> String {
        let (status, created) = self.post(uri, Role::Admin, body).await;
        assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", uri, created);
        created["data"]["id"].as_str().unwrap().to_string()
    }
}

pub fn client_body(company_id: Option<&str>) -> Value {
    let mut body = json!({ "name": "Jo", "familyName": "Do", "phoneNumber": "555" });
    if let Some(company_id) = company_id {
        body["companyId"] = json!(company_id);
    }
    body
}

pub fn company_body() -> Value {
    json!({
        "name": "Acme Corp",
        "email": "office@acme.example",
        "address": "1 Main Street",
        "phoneNumber": "555-123-4567"
    })
}

pub fn project_body(client_id: &str) -> Value {
    json!({ "name": "Website rebuild", "clientId": client_id })
}
