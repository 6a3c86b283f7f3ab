use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Created, awaiting the first payment.
    Pending,
    Active,
    /// Ended by the user; `canceled_at` is set and auto-renew is off.
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Active)
                | (Pending, Canceled)
                | (Pending, Expired)
                | (Active, Active) // renewal
                | (Active, Canceled)
                | (Active, Expired)
                | (Canceled, Active)
                | (Canceled, Expired)
                | (Expired, Active)
        )
    }
}

impl TryFrom<String> for SubscriptionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("unknown subscription status '{}'", other)),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    /// `None` once the owning user is gone.
    pub user_id: Option<Uuid>,
    pub plan_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    pub payment_method: Option<String>,
    pub quantity: i32,
    /// Set once the payment confirmation went out.
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubscriptionStatus::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [Pending, Active, Canceled, Expired] {
            assert_eq!(SubscriptionStatus::try_from(status.to_string()), Ok(status));
        }
        assert_eq!(SubscriptionStatus::try_from("cancelled".to_string()), Ok(Canceled));
        assert!(SubscriptionStatus::try_from("paused".to_string()).is_err());
    }

    #[test]
    fn active_can_renew_into_active() {
        assert!(Active.can_transition_to(&Active));
        assert!(Active.can_transition_to(&Expired));
        assert!(Active.can_transition_to(&Canceled));
    }

    #[test]
    fn expired_only_comes_back_through_reactivation() {
        assert!(Expired.can_transition_to(&Active));
        assert!(!Expired.can_transition_to(&Canceled));
        assert!(!Expired.can_transition_to(&Expired));
        assert!(!Expired.can_transition_to(&Pending));
    }

    #[test]
    fn nothing_returns_to_pending() {
        for status in [Pending, Active, Canceled, Expired] {
            assert!(!status.can_transition_to(&Pending));
        }
    }
}
