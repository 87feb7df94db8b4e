//! Common test utilities for integration tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` on top
//! of the in-memory campaign store, so no database is needed.

// Helpers are shared by several test binaries; not all of them use every one.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{TimeZone, Utc};
use fake::{faker::internet::en::SafeEmail, Fake};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use domain::services::{FixedClock, MockInviteNotifier};
use domain::store::memory::InMemoryCampaignStore;
use loot_tracker_api::app::{create_app, AppState};
use loot_tracker_api::config::{
    CatalogConfig, Config, DatabaseConfig, EmailConfig, InvitesConfig, JwtAuthConfig,
    LoggingConfig, PermissionsConfig, SecurityConfig, ServerConfig, StoreConfig,
};
use shared::jwt::JwtConfig;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_APP_ORIGIN: &str = "http://localhost:5173";

/// Test configuration: memory store, HS256 sessions, email and catalog off.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 1048576,
        },
        database: DatabaseConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0, // Disable rate limiting for tests
        },
        jwt: JwtAuthConfig {
            algorithm: "HS256".to_string(),
            secret: TEST_JWT_SECRET.to_string(),
            public_key: String::new(),
            leeway_secs: 30,
        },
        email: EmailConfig::default(),
        invites: InvitesConfig {
            app_origin: TEST_APP_ORIGIN.to_string(),
        },
        store: StoreConfig {
            backend: "memory".to_string(),
            timeout_ms: 5000,
        },
        permissions: PermissionsConfig::default(),
        catalog: CatalogConfig {
            enabled: false,
            ..CatalogConfig::default()
        },
    }
}

/// A running test application and the handles tests poke at.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryCampaignStore>,
    pub notifier: MockInviteNotifier,
    pub clock: Arc<FixedClock>,
    jwt: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(), MockInviteNotifier::new())
    }

    pub fn with_config(config: Config, notifier: MockInviteNotifier) -> Self {
        let store = Arc::new(InMemoryCampaignStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let jwt = JwtConfig::hs256(&config.jwt.secret, config.jwt.leeway_secs).unwrap();

        let state = AppState::new(
            config,
            store.clone(),
            Arc::new(notifier.clone()),
            clock.clone(),
        )
        .expect("Failed to build app state");

        Self {
            router: create_app(state),
            store,
            notifier,
            clock,
            jwt,
        }
    }

    /// Mints a session for a fresh user.
    pub fn user(&self, email: &str) -> TestUser {
        let user_id = Uuid::new_v4();
        let token = self
            .jwt
            .issue_session_token(user_id, email, 3600)
            .expect("Failed to issue test token");
        TestUser {
            user_id,
            email: email.to_string(),
            token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Creates a campaign through the API and returns its id.
    pub async fn create_campaign(&self, owner: &TestUser, name: &str) -> Uuid {
        let response = self
            .send(json_request_with_auth(
                Method::POST,
                "/api/v1/campaigns",
                serde_json::json!({ "name": name, "game_system": "dnd-5e" }),
                &owner.token,
            ))
            .await;
        let body = parse_response_body(response).await;
        body["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(|| panic!("Campaign creation failed: {}", body))
    }

    /// Invites `email` and returns the invite token.
    pub async fn invite(&self, inviter: &TestUser, campaign_id: Uuid, email: &str, role: &str) -> String {
        let response = self
            .send(json_request_with_auth(
                Method::POST,
                &format!("/api/v1/campaigns/{}/invites", campaign_id),
                serde_json::json!({ "email": email, "role": role }),
                &inviter.token,
            ))
            .await;
        let body = parse_response_body(response).await;
        body["invite"]["token"]
            .as_str()
            .unwrap_or_else(|| panic!("Invite creation failed: {}", body))
            .to_string()
    }

    /// Invites `member` and accepts on their behalf.
    pub async fn join(&self, inviter: &TestUser, campaign_id: Uuid, member: &TestUser, role: &str) {
        let token = self.invite(inviter, campaign_id, &member.email, role).await;
        let response = self
            .send(empty_request_with_auth(
                Method::POST,
                &format!("/api/v1/invites/{}/accept", token),
                &member.token,
            ))
            .await;
        assert!(response.status().is_success(), "join failed: {}", response.status());
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique email for testing.
pub fn unique_test_email() -> String {
    let email: String = SafeEmail().fake();
    format!("{}.{}", Uuid::new_v4().simple(), email.to_lowercase())
}

/// Authenticated user context for tests.
pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a bodyless request with authentication.
pub fn empty_request_with_auth(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    empty_request_with_auth(Method::GET, uri, token)
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
