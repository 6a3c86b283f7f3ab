use async_trait::async_trait;
use common::error::Res;
use queue::RedisQueue;

use crate::{
    message::Notification,
    templates::{self, Branding},
};

/// Dispatches lifecycle notifications to subscription owners.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Res<()>;
}

/// Renders the mail and leaves delivery to the mail worker.
pub struct QueuedNotifier {
    queue: RedisQueue,
    branding: Branding,
}

impl QueuedNotifier {
    pub fn new(queue: RedisQueue, branding: Branding) -> Self {
        Self { queue, branding }
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn notify(&self, notification: &Notification) -> Res<()> {
        let mail = templates::render(notification, &self.branding);
        let message_id = self.queue.push(mail).await?;
        log::info!(
            "Mail queued subscription_id={} kind={} queue={} message_id={}",
            notification.subscription_id,
            notification.kind.as_str(),
            self.queue.name(),
            message_id
        );
        Ok(())
    }
}
