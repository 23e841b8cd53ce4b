//! Caller identity reconciliation for order reads.
//!
//! Every order read passes through [`IdentityReconciler::resolve`] before the
//! order store is touched. The reconciler either produces a
//! [`ReconciledIdentity`] whose predicate can only match the caller's own
//! orders, or fails; there is no partially-trusted outcome.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use verdant_core::{Email, EmailError};

use crate::models::{CurrentUser, ReconciledIdentity, VerifiedUser};

/// Errors produced while establishing who the caller is.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No session and no bearer credential.
    #[error("no credential presented")]
    MissingCredential,

    /// The auth provider rejected the bearer credential.
    #[error("invalid credential")]
    InvalidCredential,

    /// The verified email differs from the requested one.
    #[error("credential does not match the requested email")]
    EmailMismatch,

    /// The requested email is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The auth provider could not be reached or answered unexpectedly.
    #[error("auth provider error: {0}")]
    Provider(String),
}

/// Resolves bearer credentials to verified accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up the account behind a bearer token.
    ///
    /// # Errors
    ///
    /// `IdentityError::InvalidCredential` for an unknown or expired token,
    /// `IdentityError::Provider` when the provider itself fails.
    async fn verify_bearer(&self, token: &str) -> Result<VerifiedUser, IdentityError>;
}

/// The two supported shapes of an order read request.
#[derive(Debug, Clone)]
pub enum IdentityRequest {
    /// Cookie-session request with no explicit email.
    Session { current_user: Option<CurrentUser> },
    /// Bearer-credential request naming the email whose orders it wants.
    BearerForEmail {
        token: Option<String>,
        requested_email: String,
    },
}

/// Turns a request context into an ownership-bearing identity.
#[derive(Clone)]
pub struct IdentityReconciler {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityReconciler {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the caller's identity.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` / `InvalidCredential`: unauthenticated.
    /// - `EmailMismatch`: the caller asked for an email they do not control.
    /// - `InvalidEmail`: the requested email is malformed.
    /// - `Provider`: the bearer credential could not be checked.
    #[instrument(skip_all, fields(mode = tracing::field::Empty))]
    pub async fn resolve(
        &self,
        request: IdentityRequest,
    ) -> Result<ReconciledIdentity, IdentityError> {
        match request {
            IdentityRequest::Session { current_user } => {
                tracing::Span::current().record("mode", "session");
                let user = current_user.ok_or(IdentityError::MissingCredential)?;
                Ok(ReconciledIdentity::Authenticated {
                    user_id: user.id,
                    email: user.email,
                })
            }
            IdentityRequest::BearerForEmail {
                token,
                requested_email,
            } => {
                tracing::Span::current().record("mode", "bearer");
                let token = token
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(IdentityError::MissingCredential)?;
                let verified = self.provider.verify_bearer(token.trim()).await?;
                let requested = Email::parse(&requested_email)?;
                if verified.email != requested {
                    tracing::warn!(user_id = %verified.id, "Bearer email mismatch");
                    return Err(IdentityError::EmailMismatch);
                }

                Ok(ReconciledIdentity::EmailVerified { email: requested })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;
    use verdant_core::UserId;

    use super::*;

    struct FixedProvider {
        tokens: HashMap<String, VerifiedUser>,
    }

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn verify_bearer(&self, token: &str) -> Result<VerifiedUser, IdentityError> {
            self.tokens
                .get(token)
                .cloned()
                .ok_or(IdentityError::InvalidCredential)
        }
    }

    fn reconciler() -> IdentityReconciler {
        let mut tokens = HashMap::new();
        tokens.insert(
            "tok-a".to_string(),
            VerifiedUser {
                id: UserId::new(Uuid::new_v4()),
                email: Email::parse("a@x.com").unwrap(),
            },
        );
        IdentityReconciler::new(Arc::new(FixedProvider { tokens }))
    }

    #[tokio::test]
    async fn test_session_without_user_is_unauthenticated() {
        let err = reconciler()
            .resolve(IdentityRequest::Session { current_user: None })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::MissingCredential));
    }

    #[tokio::test]
    async fn test_session_user_is_authenticated() {
        let id = UserId::new(Uuid::new_v4());
        let identity = reconciler()
            .resolve(IdentityRequest::Session {
                current_user: Some(CurrentUser {
                    id,
                    email: Email::parse("a@x.com").unwrap(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(identity.predicate().user_id, Some(id));
    }

    #[tokio::test]
    async fn test_bearer_for_own_email_is_verified() {
        let identity = reconciler()
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("tok-a".to_string()),
                requested_email: " A@X.com ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(identity.email().as_str(), "a@x.com");
        assert!(identity.predicate().user_id.is_none());
    }

    #[tokio::test]
    async fn test_bearer_for_other_email_is_forbidden() {
        let err = reconciler()
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("tok-a".to_string()),
                requested_email: "b@x.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailMismatch));
    }

    #[tokio::test]
    async fn test_bearer_missing_or_unknown() {
        let r = reconciler();
        let missing = r
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("  ".to_string()),
                requested_email: "a@x.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, IdentityError::MissingCredential));

        let unknown = r
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("tok-z".to_string()),
                requested_email: "a@x.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, IdentityError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_unknown_bearer_is_rejected_before_email_parsing() {
        let err = reconciler()
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("tok-z".to_string()),
                requested_email: "not-an-email".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_malformed_requested_email() {
        let err = reconciler()
            .resolve(IdentityRequest::BearerForEmail {
                token: Some("tok-a".to_string()),
                requested_email: "not-an-email".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidEmail(_)));
    }
}
