use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::{
    dtos::subscription::SubscriptionFilter, models::subscription::SubscriptionStatus,
    store::SubscriptionRecord,
};
use mailer::NotificationKind;
use uuid::Uuid;

use crate::{
    JobContext, NotificationReport,
    notice::{self, Notice},
    window,
};

/// Sends the payment confirmation for subscriptions activated in the last
/// `recently_created_minutes` (0 = every active subscription).
///
/// Each subscription is confirmed once: it is marked after its notice went out
/// or was skipped, and marked ones are never selected again. A failed notice
/// leaves it unmarked for the next run.
pub async fn process_new(ctx: &JobContext, recently_created_minutes: i64) -> Res<NotificationReport> {
    let job_id = Uuid::new_v4();
    let now = ctx.clock.now();
    let filter = SubscriptionFilter {
        status: Some(SubscriptionStatus::Active),
        created_since: window::minutes_back(now, recently_created_minutes, "recently created window")?,
        unconfirmed: true,
        ..Default::default()
    };
    let records = ctx.store.find(&filter).await?;

    log::info!(
        "Processing new subscriptions job_id={} found={} window_minutes={}",
        job_id,
        records.len(),
        recently_created_minutes
    );

    let mut report = NotificationReport::new(job_id);
    report.scanned = records.len();

    for record in &records {
        match confirm(ctx, record, now, job_id).await {
            Ok(Notice::Sent) => report.notified += 1,
            Ok(Notice::Skipped) => report.skipped_notifications += 1,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "Failed to confirm subscription job_id={} subscription_id={} user_id={:?}: {}",
                    job_id,
                    record.subscription.id,
                    record.subscription.user_id,
                    e
                );
            }
        }
    }

    Ok(report)
}

async fn confirm(
    ctx: &JobContext,
    record: &SubscriptionRecord,
    now: DateTime<Utc>,
    job_id: Uuid,
) -> Res<Notice> {
    let plan = record.plan.as_ref().ok_or_else(|| {
        AppError::NotFound(format!("Plan {} not found", record.subscription.plan_id))
    })?;
    let kind = NotificationKind::PaymentConfirmed {
        amount: plan.discounted_price(),
    };

    let notice = notice::send(ctx, record, kind, job_id).await?;
    ctx.store.mark_confirmed(record.subscription.id, now).await?;
    Ok(notice)
}
