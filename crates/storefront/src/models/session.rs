//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use verdant_core::{Email, UserId};

/// Session-stored customer identity.
///
/// Written once when a bearer token from the auth provider is exchanged for a
/// cookie session. Never re-read from the provider for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account ID issued by the auth provider.
    pub id: UserId,
    /// Verified account email.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";
}
