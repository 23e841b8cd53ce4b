//! Identity and ownership types.

use serde::{Deserialize, Serialize};

use verdant_core::{Email, UserId};

use super::order::Order;

/// An account as confirmed by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub id: UserId,
    pub email: Email,
}

/// Who a read request is allowed to see orders for.
///
/// Produced per request by [`crate::services::identity::IdentityReconciler`]
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciledIdentity {
    /// Cookie session: the account ID and the account email both grant access.
    Authenticated { user_id: UserId, email: Email },
    /// Bearer credential whose verified email matched the requested email.
    EmailVerified { email: Email },
}

impl ReconciledIdentity {
    /// The email the caller has proven they control.
    #[must_use]
    pub const fn email(&self) -> &Email {
        match self {
            Self::Authenticated { email, .. } | Self::EmailVerified { email } => email,
        }
    }

    /// The ownership condition orders must satisfy to be returned.
    #[must_use]
    pub fn predicate(&self) -> OwnershipPredicate {
        match self {
            Self::Authenticated { user_id, email } => OwnershipPredicate {
                user_id: Some(*user_id),
                email: email.clone(),
            },
            Self::EmailVerified { email } => OwnershipPredicate {
                user_id: None,
                email: email.clone(),
            },
        }
    }
}

/// `user_id == self.user_id OR customer_email == self.email`.
///
/// The user-ID arm is absent when the identity carries no account ID. An order
/// placed as a guest before the account existed matches through its email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipPredicate {
    pub user_id: Option<UserId>,
    pub email: Email,
}

impl OwnershipPredicate {
    /// Evaluate the predicate against one order.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let by_user = self.user_id.is_some() && order.user_id == self.user_id;
        by_user || order.customer_email == self.email
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;
    use verdant_core::{CurrencyCode, OrderId, OrderStatus, PaymentStatus};

    use super::*;

    fn order(user_id: Option<UserId>, email: &str) -> Order {
        Order {
            id: OrderId::new(1),
            payment_session_id: "cs_test".to_string(),
            user_id,
            customer_email: Email::parse(email).unwrap(),
            customer_name: None,
            customer_phone: None,
            customer_address: None,
            total_amount: 100,
            currency: CurrencyCode::EUR,
            items: Vec::new(),
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Confirmed,
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authenticated_matches_by_user_or_email() {
        let me = UserId::new(Uuid::new_v4());
        let identity = ReconciledIdentity::Authenticated {
            user_id: me,
            email: Email::parse("a@x.com").unwrap(),
        };
        let predicate = identity.predicate();

        assert!(predicate.matches(&order(Some(me), "other@x.com")));
        assert!(predicate.matches(&order(None, "a@x.com")));
        assert!(predicate.matches(&order(Some(me), "a@x.com")));
        assert!(!predicate.matches(&order(None, "b@x.com")));
        assert!(!predicate.matches(&order(Some(UserId::new(Uuid::new_v4())), "b@x.com")));
    }

    #[test]
    fn test_email_verified_ignores_user_ids() {
        let identity = ReconciledIdentity::EmailVerified {
            email: Email::parse("a@x.com").unwrap(),
        };
        let predicate = identity.predicate();

        assert!(predicate.user_id.is_none());
        assert!(predicate.matches(&order(Some(UserId::new(Uuid::new_v4())), "a@x.com")));
        assert!(!predicate.matches(&order(None, "b@x.com")));
    }

    #[test]
    fn test_guest_orders_do_not_match_absent_user_id() {
        let predicate = OwnershipPredicate {
            user_id: None,
            email: Email::parse("a@x.com").unwrap(),
        };
        assert!(!predicate.matches(&order(None, "b@x.com")));
    }
}
