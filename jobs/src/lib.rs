use std::sync::Arc;

use common::clock::Clock;
use db::store::SubscriptionStore;
use mailer::Notifier;

pub mod expired;
pub mod expiring;
pub mod manage;
pub mod new_subs;
pub mod plans;
pub mod retry;
pub mod scheduler;
pub mod worker;

mod notice;
mod window;

pub use notice::NotificationReport;

/// Collaborators shared by every lifecycle job.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn SubscriptionStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl JobContext {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }
}
