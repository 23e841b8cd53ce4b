//! Hosted auth provider client.
//!
//! Resolves a bearer access token to the account it was issued for by calling
//! the provider's `GET /auth/v1/user` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use url::Url;

use verdant_core::{Email, UserId};

use super::identity::{IdentityError, IdentityProvider};
use crate::config::AuthProviderConfig;
use crate::models::VerifiedUser;

/// Path of the current-user endpoint, relative to the provider base URL.
const USER_PATH: &str = "auth/v1/user";

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: UserId,
    email: Option<String>,
}

/// Auth provider HTTP client.
#[derive(Clone)]
pub struct AuthProviderClient {
    client: reqwest::Client,
    user_url: Url,
}

impl AuthProviderClient {
    /// Create a new auth provider client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Provider` if the API key is not a valid header
    /// value or the HTTP client fails to build.
    pub fn new(config: &AuthProviderConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| IdentityError::Provider(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        let user_url = user_endpoint(&config.base_url)?;

        Ok(Self { client, user_url })
    }
}

/// Join the user endpoint onto the base URL, keeping any base path.
fn user_endpoint(base_url: &Url) -> Result<Url, IdentityError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(USER_PATH)
        .map_err(|e| IdentityError::Provider(format!("Invalid provider URL: {e}")))
}

#[async_trait]
impl IdentityProvider for AuthProviderClient {
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedUser, IdentityError> {
        let response = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Auth provider request failed");
                IdentityError::Provider(e.to_string())
            })?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(IdentityError::InvalidCredential);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), message = %message, "Auth provider error");
            return Err(IdentityError::Provider(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(format!("Invalid user payload: {e}")))?;

        // Phone-only accounts have no email and cannot own orders.
        let email = user.email.ok_or(IdentityError::InvalidCredential)?;
        let email = Email::parse(&email)
            .map_err(|e| IdentityError::Provider(format!("account email: {e}")))?;

        Ok(VerifiedUser { id: user.id, email })
    }
}
