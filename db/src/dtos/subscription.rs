use chrono::{DateTime, Utc};

use crate::models::subscription::{Subscription, SubscriptionStatus};

/// Selection criteria for subscription scans. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    /// `end_date < value`
    pub ending_before: Option<DateTime<Utc>>,
    /// `end_date >= value`
    pub ending_from: Option<DateTime<Utc>>,
    /// `end_date > value`
    pub ending_after: Option<DateTime<Utc>>,
    /// `end_date <= value`
    pub ending_until: Option<DateTime<Utc>>,
    /// `created_at >= value`
    pub created_since: Option<DateTime<Utc>>,
    /// `confirmation_sent_at IS NULL` when true
    pub unconfirmed: bool,
    pub limit: Option<i64>,
}

impl SubscriptionFilter {
    /// Whether `sub` satisfies every set criterion.
    pub fn matches(&self, sub: &Subscription) -> bool {
        self.status.is_none_or(|status| sub.status == status)
            && self.ending_before.is_none_or(|t| sub.end_date < t)
            && self.ending_from.is_none_or(|t| sub.end_date >= t)
            && self.ending_after.is_none_or(|t| sub.end_date > t)
            && self.ending_until.is_none_or(|t| sub.end_date <= t)
            && self.created_since.is_none_or(|t| sub.created_at >= t)
            && (!self.unconfirmed || sub.confirmation_sent_at.is_none())
    }
}
