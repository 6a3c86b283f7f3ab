use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rendered mail, as stored on the `emails` queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    Expired,
    ExpiringSoon { days_left: i64 },
    Renewed,
    PaymentConfirmed { amount: f64 },
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Expired => "expired",
            NotificationKind::ExpiringSoon { .. } => "expiring_soon",
            NotificationKind::Renewed => "renewed",
            NotificationKind::PaymentConfirmed { .. } => "payment_confirmed",
        }
    }
}

/// Something the owner of a subscription has to be told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub subscription_id: Uuid,
    pub to: String,
    pub user_name: String,
    pub plan_name: String,
    /// End of the current term after the change that triggered the mail.
    pub end_date: DateTime<Utc>,
    pub kind: NotificationKind,
}
