//! Common test utilities for integration tests.
//!
//! The app runs on the in-memory store, so these tests need no database.
//! Tokens are signed with the shared HS256 test secret.

// Helpers are shared across test binaries; not every binary uses all of them.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::services::{ChangeFeed, InMemoryStore};
use fake::faker::name::en::Name;
use fake::Fake;
use hospital_portal_api::{
    app::{create_app, AppState},
    config::{
        AuthConfig, ChangeFeedConfig, Config, DatabaseConfig, LedgerConfig, LimitsConfig,
        LoggingConfig, SecurityConfig, ServerConfig,
    },
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use shared::jwt::{Claims, UserMetadata};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const HOSPITAL: &str = "saniat-rmel";
pub const OTHER_HOSPITAL: &str = "mohammed-v";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            submission_rate_limit_per_minute: 0, // Disable rate limiting for tests
            hsts_enabled: false,
        },
        limits: LimitsConfig { max_page_size: 50 },
        ledger: LedgerConfig {
            default_fleet_size: 10,
            low_availability_threshold: 3,
        },
        auth: AuthConfig {
            algorithm: "HS256".to_string(),
            secret: TEST_SECRET.to_string(),
            public_key: String::new(),
            leeway_secs: 0,
            audience: None,
        },
        change_feed: ChangeFeedConfig::default(),
    }
}

/// App wired to an in-memory store the test can inspect and break.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub feed: ChangeFeed,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let feed = ChangeFeed::new(config.change_feed.buffer);
        let store = InMemoryStore::new().with_change_feed(feed.clone());
        let state = AppState::new(config, store.stores(), feed.clone(), "memory")
            .expect("Failed to build app state");
        Self {
            router: create_app(state),
            store,
            feed,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and returns status plus parsed JSON body.
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }
}

pub fn sign(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

fn claims(hospital: Option<&str>) -> Claims {
    Claims {
        sub: Uuid::new_v4().to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        email: Some("staff@example.ma".to_string()),
        hospital: None,
        user_metadata: UserMetadata {
            hospital: hospital.map(str::to_string),
            full_name: Some(Name().fake()),
        },
    }
}

/// Token for a staff member of `hospital`.
pub fn admin_token(hospital: &str) -> String {
    sign(&claims(Some(hospital)))
}

/// Token with no hospital claim.
pub fn patient_token() -> (Uuid, String) {
    let claims = claims(None);
    let user_id = Uuid::parse_str(&claims.sub).unwrap();
    (user_id, sign(&claims))
}

pub fn expired_token(hospital: &str) -> String {
    let mut claims = claims(Some(hospital));
    claims.exp = chrono::Utc::now().timestamp() - 3600;
    sign(&claims)
}

pub fn patient_name() -> String {
    Name().fake()
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// POST with no body, as the accept/resolve/dispatch/complete actions take.
pub fn post_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn confirm_reject(uri: &str, token: &str) -> Request<Body> {
    json_request(Method::POST, uri, json!({ "confirm": true }), Some(token))
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Submits a help request as a guest and returns its ID.
pub async fn submit_help_request(app: &TestApp, hospital: &str) -> Uuid {
    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/hospitals/{}/help-requests", hospital),
            json!({ "patient_name": patient_name(), "description": "Chest pain" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Submits an ambulance request as a guest; returns status and body.
pub async fn submit_ambulance_request(app: &TestApp, hospital: &str) -> (StatusCode, Value) {
    app.call(json_request(
        Method::POST,
        &format!("/api/v1/hospitals/{}/ambulance-requests", hospital),
        json!({ "patient_name": patient_name(), "location": "Bloc B, Maarif" }),
        None,
    ))
    .await
}
