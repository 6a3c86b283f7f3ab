use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::{
    dtos::subscription::SubscriptionFilter,
    models::{
        plan::BillingCycle,
        subscription::{Subscription, SubscriptionStatus},
    },
    store::SubscriptionRecord,
};
use lifecycle::{Decision, SweepMode};
use mailer::NotificationKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    JobContext,
    notice::{self, Notice},
    window,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredSweep {
    /// Only look at subscriptions that ended in the last N minutes. 0 scans every overdue one.
    pub recently_expired_minutes: i64,
    pub mode: SweepMode,
}

/// Counters of one expiry sweep pass.
///
/// `failed` counts records whose transition or notification failed; a record
/// whose mail failed after its transition was saved is counted in both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub job_id: Uuid,
    pub scanned: usize,
    pub renewed: usize,
    pub expired: usize,
    pub notified: usize,
    pub skipped_notifications: usize,
    pub failed: usize,
}

pub fn due_filter(now: DateTime<Utc>, recently_expired_minutes: i64) -> Res<SubscriptionFilter> {
    Ok(SubscriptionFilter {
        status: Some(SubscriptionStatus::Active),
        ending_before: Some(now),
        ending_from: window::minutes_back(now, recently_expired_minutes, "recently expired window")?,
        ..Default::default()
    })
}

/// Renews or expires every overdue active subscription, then notifies owners.
///
/// Errors only when the due subscriptions cannot be loaded; anything that goes
/// wrong with a single record is logged and counted in the report.
pub async fn process_expired(ctx: &JobContext, sweep: ExpiredSweep) -> Res<SweepReport> {
    let job_id = Uuid::new_v4();
    let now = ctx.clock.now();
    let filter = due_filter(now, sweep.recently_expired_minutes)?;
    let records = ctx.store.find(&filter).await?;

    log::info!(
        "Processing expired subscriptions job_id={} found={} window_minutes={} mode={:?}",
        job_id,
        records.len(),
        sweep.recently_expired_minutes,
        sweep.mode
    );

    let mut report = SweepReport {
        job_id,
        scanned: records.len(),
        ..Default::default()
    };

    for record in records {
        let (decision, subscription) = match transition(ctx, &record, sweep.mode, now).await {
            Ok(Some(done)) => done,
            Ok(None) => continue,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "Failed to process subscription job_id={} subscription_id={} user_id={:?}: {}",
                    job_id,
                    record.subscription.id,
                    record.subscription.user_id,
                    e
                );
                continue;
            }
        };

        let kind = match decision {
            Decision::Renew => {
                report.renewed += 1;
                NotificationKind::Renewed
            }
            _ => {
                report.expired += 1;
                NotificationKind::Expired
            }
        };

        let updated = SubscriptionRecord {
            subscription,
            ..record
        };

        match notice::send(ctx, &updated, kind, job_id).await {
            Ok(Notice::Sent) => report.notified += 1,
            Ok(Notice::Skipped) => report.skipped_notifications += 1,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "Failed to notify job_id={} subscription_id={} user_id={:?}: {}",
                    job_id,
                    updated.subscription.id,
                    updated.subscription.user_id,
                    e
                );
            }
        }
    }

    log::info!(
        "Expired subscriptions processed job_id={} scanned={} renewed={} expired={} notified={} skipped={} failed={}",
        report.job_id,
        report.scanned,
        report.renewed,
        report.expired,
        report.notified,
        report.skipped_notifications,
        report.failed
    );

    Ok(report)
}

/// Decides, applies and saves the transition of one record.
/// `None` when there is nothing to do or another pass got there first.
async fn transition(
    ctx: &JobContext,
    record: &SubscriptionRecord,
    mode: SweepMode,
    now: DateTime<Utc>,
) -> Res<Option<(Decision, Subscription)>> {
    let mut sub = record.subscription.clone();
    let decision = lifecycle::decide(&sub, mode, now);

    let cycle = match (decision, &record.plan) {
        (Decision::Skip, _) => return Ok(None),
        (Decision::Renew, None) => {
            return Err(AppError::NotFound(format!(
                "Plan {} not found for renewal",
                sub.plan_id
            )));
        }
        (_, Some(plan)) => plan.billing_cycle.clone(),
        (Decision::Expire, None) => BillingCycle::Monthly,
    };

    lifecycle::apply(&mut sub, decision, &cycle, now)?;

    if !ctx.store.save_swept(&sub, now).await? {
        log::debug!(
            "Subscription already handled subscription_id={} decision={}",
            sub.id,
            decision.as_str()
        );
        return Ok(None);
    }

    log::info!(
        "Subscription {} subscription_id={} user_id={:?} end_date={}",
        if decision == Decision::Renew { "renewed" } else { "expired" },
        sub.id,
        sub.user_id,
        sub.end_date
    );

    Ok(Some((decision, sub)))
}
