use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Renewal period of a plan.
///
/// Stored as the plan's `billing_cycle` text. Unknown values are kept as-is
/// and renew monthly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    /// mensal
    Monthly,
    /// trimestral
    Quarterly,
    /// anual
    Annual,
    Other(String),
}

impl BillingCycle {
    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Monthly => "mensal",
            BillingCycle::Quarterly => "trimestral",
            BillingCycle::Annual => "anual",
            BillingCycle::Other(raw) => raw,
        }
    }

    /// Calendar months added per renewal.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Annual => 12,
            BillingCycle::Other(_) => 1,
        }
    }

    /// Nominal length in days, for display.
    pub fn nominal_days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Quarterly => 90,
            BillingCycle::Annual => 365,
            BillingCycle::Other(_) => 30,
        }
    }
}

impl From<String> for BillingCycle {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "mensal" | "monthly" => BillingCycle::Monthly,
            "trimestral" | "quarterly" => BillingCycle::Quarterly,
            "anual" | "annual" | "yearly" => BillingCycle::Annual,
            _ => BillingCycle::Other(raw),
        }
    }
}

impl From<&str> for BillingCycle {
    fn from(raw: &str) -> Self {
        BillingCycle::from(raw.to_string())
    }
}

impl From<BillingCycle> for String {
    fn from(cycle: BillingCycle) -> Self {
        cycle.as_str().to_string()
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[sqlx(try_from = "String")]
    pub billing_cycle: BillingCycle,
    pub discount_percentage: f64,
    #[sqlx(json)]
    pub features: Vec<String>,
    pub is_active: bool,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn discounted_price(&self) -> f64 {
        if self.discount_percentage <= 0.0 {
            return self.price;
        }
        self.price * (1.0 - self.discount_percentage / 100.0)
    }

    /// Price in cents, the unit payment gateways expect.
    pub fn price_in_cents(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }
}
