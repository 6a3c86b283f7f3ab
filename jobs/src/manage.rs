use common::error::{AppError, Res};
use db::models::subscription::Subscription;
use uuid::Uuid;

use crate::JobContext;

pub async fn cancel_subscription(ctx: &JobContext, subscription_id: Uuid) -> Res<Subscription> {
    let now = ctx.clock.now();
    let mut sub = ctx.store.find_by_id(subscription_id).await?.subscription;

    lifecycle::cancel(&mut sub, now)?;
    let saved = ctx.store.save(&sub, now).await?;

    log::info!(
        "Subscription canceled subscription_id={} user_id={:?}",
        saved.id,
        saved.user_id
    );
    Ok(saved)
}

/// Starts a fresh paid term for a canceled, expired or running subscription.
pub async fn reactivate_subscription(ctx: &JobContext, subscription_id: Uuid) -> Res<Subscription> {
    let now = ctx.clock.now();
    let record = ctx.store.find_by_id(subscription_id).await?;
    let mut sub = record.subscription;
    let plan = record
        .plan
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", sub.plan_id)))?;

    lifecycle::reactivate(&mut sub, &plan.billing_cycle, now)?;
    let saved = ctx.store.save(&sub, now).await?;

    log::info!(
        "Subscription reactivated subscription_id={} user_id={:?} end_date={}",
        saved.id,
        saved.user_id,
        saved.end_date
    );
    Ok(saved)
}
