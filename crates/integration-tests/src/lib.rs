//! Integration tests for Verdant.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no external services)
//! cargo test -p verdant-integration-tests
//!
//! # Database-backed tests as well
//! task db:start
//! cargo test -p verdant-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_*` - Full router over in-memory repositories and sessions
//! - `postgres_*` - Repositories against a real `PostgreSQL` database (ignored by default)
//!
//! The helpers below build the same router the binary serves, swapping the
//! `PostgreSQL` repositories for in-memory ones, the session store for a
//! `MemoryStore`, and the auth provider for a fixed token table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono_tz::Tz;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;
use uuid::Uuid;

use verdant_core::{Email, UserId};
use verdant_storefront::db::{InMemoryOrderRepository, InMemoryProductRepository};
use verdant_storefront::models::VerifiedUser;
use verdant_storefront::services::{IdentityError, IdentityProvider};
use verdant_storefront::state::{AppParts, AppState};

/// Auth provider that accepts a fixed set of tokens.
#[derive(Debug, Default)]
pub struct StubProvider {
    users: HashMap<String, VerifiedUser>,
}

impl StubProvider {
    /// Accept `token` as proof of the given account.
    #[must_use]
    pub fn with_user(mut self, token: &str, id: UserId, email: &str) -> Self {
        let email = Email::parse(email).expect("stub email must be valid");
        self.users
            .insert(token.to_string(), VerifiedUser { id, email });
        self
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedUser, IdentityError> {
        self.users
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidCredential)
    }
}

/// A request's outcome, with the body parsed as JSON when possible.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of the session cookie set by this response.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| {
                v.starts_with(verdant_storefront::middleware::session::SESSION_COOKIE_NAME)
            })
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// The storefront router over in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub orders: Arc<InMemoryOrderRepository>,
    pub products: Arc<InMemoryProductRepository>,
}

/// Options for [`TestApp::build`].
#[derive(Default)]
pub struct TestAppOptions {
    pub provider: StubProvider,
    pub stats_token: Option<String>,
    pub time_zone: Option<Tz>,
}

impl TestApp {
    /// An app with no known bearer tokens and no stats token.
    #[must_use]
    pub fn new() -> Self {
        Self::build(TestAppOptions::default())
    }

    /// An app configured by `options`.
    #[must_use]
    pub fn build(options: TestAppOptions) -> Self {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());

        let state = AppState::from_parts(AppParts {
            orders: orders.clone(),
            products: products.clone(),
            identity_provider: Arc::new(options.provider),
            reporting_time_zone: options.time_zone.unwrap_or(chrono_tz::Europe::Paris),
            stats_token: options.stats_token.map(SecretString::from),
            pool: None,
        });

        let base_url = Url::parse("http://localhost:3000").expect("static URL is valid");
        let router = verdant_storefront::app(state, MemoryStore::default(), &base_url, false);

        Self {
            router,
            orders,
            products,
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Exchange `token` for a session and return its cookie.
    pub async fn sign_in(&self, token: &str) -> String {
        let response = self
            .send(
                RequestBuilder::new(Method::POST, "/auth/session")
                    .bearer(token)
                    .build(),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response
            .session_cookie()
            .expect("sign-in sets a session cookie")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Small builder over `http::Request` for JSON API calls.
pub struct RequestBuilder {
    inner: axum::http::request::Builder,
    body: Body,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            inner: Request::builder().method(method).uri(uri),
            body: Body::empty(),
        }
    }

    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    #[must_use]
    pub fn json(mut self, body: &Value) -> Self {
        self.inner = self
            .inner
            .header(header::CONTENT_TYPE, "application/json");
        self.body = Body::from(body.to_string());
        self
    }

    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.inner = self
            .inner
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    #[must_use]
    pub fn cookie(mut self, cookie: &str) -> Self {
        self.inner = self.inner.header(header::COOKIE, cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> Request<Body> {
        self.inner.body(self.body).expect("request parts are valid")
    }
}

/// A fresh account ID.
#[must_use]
pub fn new_user_id() -> UserId {
    UserId::new(Uuid::new_v4())
}
