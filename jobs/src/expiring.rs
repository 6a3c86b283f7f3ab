use common::error::Res;
use db::{dtos::subscription::SubscriptionFilter, models::subscription::SubscriptionStatus};
use lifecycle::SweepMode;
use mailer::NotificationKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    JobContext, NotificationReport,
    expired::{self, ExpiredSweep, SweepReport},
    notice::{self, Notice},
    window,
};

pub const DEFAULT_EXPIRING_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringCheck {
    pub days: i64,
    /// Run a notify-only expiry sweep before looking ahead.
    pub check_expired: bool,
}

impl Default for ExpiringCheck {
    fn default() -> Self {
        Self {
            days: DEFAULT_EXPIRING_DAYS,
            check_expired: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpiringReport {
    #[serde(flatten)]
    pub notifications: NotificationReport,
    pub expired_sweep: Option<SweepReport>,
}

/// Warns owners of active subscriptions ending within `days`. Changes no record.
pub async fn process_expiring(ctx: &JobContext, check: ExpiringCheck) -> Res<ExpiringReport> {
    // reject a bad horizon before the sweep touches anything
    window::days_ahead(ctx.clock.now(), check.days)?;

    let expired_sweep = if check.check_expired {
        let sweep = ExpiredSweep {
            recently_expired_minutes: 0,
            mode: SweepMode::NotifyOnly,
        };
        Some(expired::process_expired(ctx, sweep).await?)
    } else {
        None
    };

    let job_id = Uuid::new_v4();
    let now = ctx.clock.now();
    let filter = SubscriptionFilter {
        status: Some(SubscriptionStatus::Active),
        ending_after: Some(now),
        ending_until: Some(window::days_ahead(now, check.days)?),
        ..Default::default()
    };
    let records = ctx.store.find(&filter).await?;

    log::info!(
        "Checking subscriptions expiring soon job_id={} found={} days={}",
        job_id,
        records.len(),
        check.days
    );

    let mut report = NotificationReport::new(job_id);
    report.scanned = records.len();

    for record in &records {
        let days_left = lifecycle::days_remaining(&record.subscription, now);
        match notice::send(ctx, record, NotificationKind::ExpiringSoon { days_left }, job_id).await
        {
            Ok(Notice::Sent) => report.notified += 1,
            Ok(Notice::Skipped) => report.skipped_notifications += 1,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "Failed to send expiring notice job_id={} subscription_id={} user_id={:?}: {}",
                    job_id,
                    record.subscription.id,
                    record.subscription.user_id,
                    e
                );
            }
        }
    }

    log::info!(
        "Expiring check finished job_id={} notified={} skipped={} failed={}",
        job_id,
        report.notified,
        report.skipped_notifications,
        report.failed
    );

    Ok(ExpiringReport {
        notifications: report,
        expired_sweep,
    })
}
