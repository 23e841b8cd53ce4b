//! Authentication route handlers.
//!
//! The storefront never sees passwords. A client signs in with the hosted
//! auth provider and trades the resulting bearer token for a cookie session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tower_sessions::Session;

use verdant_core::{Email, UserId};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{BearerToken, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::IdentityError;
use crate::state::AppState;

/// Body returned when a session is established.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: UserId,
    pub email: Email,
}

/// `POST /auth/session` - exchange a provider bearer token for a session.
#[tracing::instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    session: Session,
    BearerToken(token): BearerToken,
) -> Result<Json<SessionUser>> {
    let token = token.ok_or(IdentityError::MissingCredential)?;
    let verified = state.identity_provider().verify_bearer(&token).await?;

    let user = CurrentUser {
        id: verified.id,
        email: verified.email,
    };
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "Customer signed in");

    Ok(Json(SessionUser {
        user_id: user.id,
        email: user.email,
    }))
}

/// `POST /auth/logout` - end the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
