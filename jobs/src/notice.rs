use common::error::Res;
use db::store::SubscriptionRecord;
use mailer::{Notification, NotificationKind};
use serde::Serialize;
use uuid::Uuid;

use crate::JobContext;

/// Counters of a read-only notification sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationReport {
    pub job_id: Uuid,
    pub scanned: usize,
    pub notified: usize,
    pub skipped_notifications: usize,
    pub failed: usize,
}

impl NotificationReport {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    Sent,
    /// Nobody to send it to.
    Skipped,
}

/// Builds the mail payload for `record`, `None` when it has no reachable owner.
pub(crate) fn notification(
    record: &SubscriptionRecord,
    kind: NotificationKind,
) -> Option<Notification> {
    let user = record.user.as_ref()?;
    let to = user.mail_address()?;

    Some(Notification {
        subscription_id: record.subscription.id,
        to: to.to_string(),
        user_name: user.name.clone(),
        plan_name: record
            .plan
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "current".to_string()),
        end_date: record.subscription.end_date,
        kind,
    })
}

pub(crate) async fn send(
    ctx: &JobContext,
    record: &SubscriptionRecord,
    kind: NotificationKind,
    job_id: Uuid,
) -> Res<Notice> {
    let Some(notification) = notification(record, kind) else {
        log::warn!(
            "Subscription has no user or e-mail, notification skipped job_id={} subscription_id={} user_id={:?}",
            job_id,
            record.subscription.id,
            record.subscription.user_id
        );
        return Ok(Notice::Skipped);
    };

    ctx.notifier.notify(&notification).await?;
    Ok(Notice::Sent)
}
