use std::sync::Arc;

use common::{clock::SystemClock, env_config::Config, error::Res};
use db::store::PgSubscriptionStore;
use jobs::{
    JobContext,
    plans::{PlanSync, StripePublisher},
    retry::RetryPolicy,
    worker::{JobRunner, JobWorker},
};
use mailer::{Branding, QueuedNotifier, SmtpMailer, worker::MailWorker};
use queue::RedisQueue;
use sqlx::PgPool;

/// Everything a command needs, built once from the config.
pub struct Services {
    pub config: Arc<Config>,
    pub pool: Arc<PgPool>,
    pub ctx: Arc<JobContext>,
    pub runner: JobRunner,
    pub subscriptions: RedisQueue,
    pub emails: RedisQueue,
}

impl Services {
    pub async fn init(config: Arc<Config>) -> Res<Self> {
        let pool = db::setup(&config.database_url, config.is_production()).await?;
        let redis = queue::setup_pool(&config.redis_url)?;

        let subscriptions = RedisQueue::new(redis.clone(), config.queues.subscriptions.clone());
        let emails = RedisQueue::new(redis, config.queues.emails.clone());

        let notifier = QueuedNotifier::new(emails.clone(), Branding::from_config(&config));
        let ctx = Arc::new(JobContext::new(
            Arc::new(PgSubscriptionStore::new(pool.clone())),
            Arc::new(notifier),
            Arc::new(SystemClock),
        ));

        let plan_sync = if config.stripe_secret_key.is_empty() {
            log::warn!("STRIPE_SECRET_KEY not set, plan sync disabled");
            None
        } else {
            let publisher =
                StripePublisher::new(&config.stripe_secret_key, &config.stripe_currency)?;
            Some(Arc::new(PlanSync::new(pool.clone(), Arc::new(publisher))))
        };

        let runner = JobRunner::new(
            ctx.clone(),
            plan_sync,
            RetryPolicy::from_config(&config.jobs),
        );

        Ok(Self {
            config,
            pool,
            ctx,
            runner,
            subscriptions,
            emails,
        })
    }

    pub fn job_worker(&self) -> JobWorker {
        JobWorker::new(
            self.subscriptions.clone(),
            self.runner.clone(),
            self.config.queues.poll_seconds,
        )
    }

    pub fn mail_worker(&self) -> Res<MailWorker> {
        let transport = SmtpMailer::new(self.config.smtp.clone())?;
        Ok(MailWorker::new(
            self.emails.clone(),
            Arc::new(transport),
            self.config.smtp.max_per_second,
            self.config.jobs.tries,
            self.config.queues.poll_seconds,
        ))
    }
}
