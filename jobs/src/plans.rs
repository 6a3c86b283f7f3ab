use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use common::{
    error::Res,
    stripe::{self, PriceInterval},
};
use db::models::plan::{BillingCycle, Plan};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Ids of a plan as published to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPlan {
    pub product_id: String,
    pub price_id: String,
}

#[async_trait]
pub trait PlanPublisher: Send + Sync {
    async fn publish(&self, plan: &Plan) -> Res<PublishedPlan>;
}

/// Recurring interval and count a billing cycle is sold with.
pub fn recurrence(cycle: &BillingCycle) -> (PriceInterval, u64) {
    match cycle {
        BillingCycle::Monthly => (PriceInterval::Month, 1),
        BillingCycle::Quarterly => (PriceInterval::Month, 3),
        BillingCycle::Annual => (PriceInterval::Year, 1),
        BillingCycle::Other(_) => (PriceInterval::Month, 1),
    }
}

pub struct StripePublisher {
    client: ::stripe::Client,
    currency: ::stripe::Currency,
}

impl StripePublisher {
    pub fn new(secret_key: &str, currency: &str) -> Res<Self> {
        Ok(Self {
            client: stripe::create_client(secret_key),
            currency: stripe::parse_currency(currency)?,
        })
    }
}

#[async_trait]
impl PlanPublisher for StripePublisher {
    async fn publish(&self, plan: &Plan) -> Res<PublishedPlan> {
        let product_id = match &plan.stripe_product_id {
            Some(id) => id.clone(),
            None => {
                let metadata = HashMap::from([
                    ("plan_id".to_string(), plan.id.to_string()),
                    ("features".to_string(), plan.features.join(", ")),
                ]);
                stripe::create_product(
                    &self.client,
                    &plan.name,
                    plan.description.as_deref(),
                    metadata,
                )
                .await?
                .id
                .to_string()
            }
        };

        let (interval, interval_count) = recurrence(&plan.billing_cycle);
        let price = stripe::create_recurring_price(
            &self.client,
            &product_id,
            plan.price_in_cents(),
            self.currency,
            interval,
            interval_count,
        )
        .await?;

        Ok(PublishedPlan {
            product_id,
            price_id: price.id.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSyncReport {
    pub job_id: Uuid,
    pub scanned: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Publishes plans to the payment provider and stores the resulting ids.
pub struct PlanSync {
    pool: Arc<PgPool>,
    publisher: Arc<dyn PlanPublisher>,
}

impl PlanSync {
    pub fn new(pool: Arc<PgPool>, publisher: Arc<dyn PlanPublisher>) -> Self {
        Self { pool, publisher }
    }

    /// Syncs one plan, or every active plan when `plan_id` is `None`.
    /// A plan that fails is logged and skipped.
    pub async fn run(&self, plan_id: Option<Uuid>) -> Res<PlanSyncReport> {
        let plans = match plan_id {
            Some(id) => vec![db::plan::get_plan_by_id(&*self.pool, id).await?],
            None => db::plan::get_active_plans(&*self.pool).await?,
        };

        let mut report = PlanSyncReport {
            job_id: Uuid::new_v4(),
            scanned: plans.len(),
            ..Default::default()
        };
        log::info!(
            "Syncing plans with Stripe job_id={} plans={}",
            report.job_id,
            plans.len()
        );

        for plan in &plans {
            match self.sync_one(plan).await {
                Ok(published) => {
                    report.synced += 1;
                    log::info!(
                        "Plan synced plan_id={} name={} product_id={} price_id={}",
                        plan.id,
                        plan.name,
                        published.product_id,
                        published.price_id
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!(
                        "Failed to sync plan job_id={} plan_id={} name={}: {}",
                        report.job_id,
                        plan.id,
                        plan.name,
                        e
                    );
                }
            }
        }

        Ok(report)
    }

    async fn sync_one(&self, plan: &Plan) -> Res<PublishedPlan> {
        let published = self.publisher.publish(plan).await?;
        db::plan::update_plan_stripe_ids(
            &*self.pool,
            plan.id,
            &published.product_id,
            &published.price_id,
        )
        .await?;
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_map_to_stripe_recurrence() {
        assert_eq!(recurrence(&BillingCycle::Monthly), (PriceInterval::Month, 1));
        assert_eq!(recurrence(&BillingCycle::Quarterly), (PriceInterval::Month, 3));
        assert_eq!(recurrence(&BillingCycle::Annual), (PriceInterval::Year, 1));
        assert_eq!(recurrence(&BillingCycle::from("semanal")), (PriceInterval::Month, 1));
    }
}
