use std::{sync::Arc, time::Duration};

use common::error::{AppError, Res};
use queue::RedisQueue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    JobContext, NotificationReport,
    expired::{self, ExpiredSweep, SweepReport},
    expiring::{self, ExpiringCheck, ExpiringReport},
    new_subs,
    plans::{PlanSync, PlanSyncReport},
    retry::{RetryPolicy, run_with_retry},
};

/// A unit of work on the `subscriptions` queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    ProcessExpired(ExpiredSweep),
    ProcessExpiring(ExpiringCheck),
    ProcessNew { recently_created_minutes: i64 },
    SyncPlans { plan_id: Option<Uuid> },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::ProcessExpired(_) => "process-expired",
            Job::ProcessExpiring(_) => "process-expiring",
            Job::ProcessNew { .. } => "process-new",
            Job::SyncPlans { .. } => "sync-plans",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", content = "report", rename_all = "snake_case")]
pub enum JobOutcome {
    Expired(SweepReport),
    Expiring(ExpiringReport),
    New(NotificationReport),
    Plans(PlanSyncReport),
}

/// Runs jobs in-process, each under the retry policy.
#[derive(Clone)]
pub struct JobRunner {
    ctx: Arc<JobContext>,
    plan_sync: Option<Arc<PlanSync>>,
    retry: RetryPolicy,
}

impl JobRunner {
    pub fn new(ctx: Arc<JobContext>, plan_sync: Option<Arc<PlanSync>>, retry: RetryPolicy) -> Self {
        Self {
            ctx,
            plan_sync,
            retry,
        }
    }

    async fn run_once(&self, job: &Job) -> Res<JobOutcome> {
        let ctx = self.ctx.as_ref();
        match job {
            Job::ProcessExpired(sweep) => {
                expired::process_expired(ctx, *sweep).await.map(JobOutcome::Expired)
            }
            Job::ProcessExpiring(check) => expiring::process_expiring(ctx, *check)
                .await
                .map(JobOutcome::Expiring),
            Job::ProcessNew {
                recently_created_minutes,
            } => new_subs::process_new(ctx, *recently_created_minutes)
                .await
                .map(JobOutcome::New),
            Job::SyncPlans { plan_id } => {
                let sync = self.plan_sync.as_ref().ok_or_else(|| {
                    AppError::Validation("Stripe is not configured".to_string())
                })?;
                sync.run(*plan_id).await.map(JobOutcome::Plans)
            }
        }
    }

    pub async fn run(&self, job: &Job) -> Res<JobOutcome> {
        run_with_retry(job.name(), self.retry, || self.run_once(job)).await
    }
}

pub async fn dispatch(queue: &RedisQueue, job: Job) -> Res<Uuid> {
    let name = job.name();
    let message_id = queue.push(job).await?;
    log::info!(
        "Job dispatched job={} queue={} message_id={}",
        name,
        queue.name(),
        message_id
    );
    Ok(message_id)
}

/// Consumes the `subscriptions` queue.
pub struct JobWorker {
    queue: RedisQueue,
    runner: JobRunner,
    poll_seconds: f64,
}

impl JobWorker {
    pub fn new(queue: RedisQueue, runner: JobRunner, poll_seconds: f64) -> Self {
        Self {
            queue,
            runner,
            poll_seconds,
        }
    }

    pub async fn run(self) {
        log::info!("Job worker listening queue={}", self.queue.name());

        loop {
            let envelope = match self.queue.pop::<Job>(self.poll_seconds).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Failed to read queue={}: {}", self.queue.name(), e);
                    tokio::time::sleep(Duration::from_secs_f64(self.poll_seconds)).await;
                    continue;
                }
            };

            let runner = self.runner.clone();
            let job = envelope.payload.clone();
            let finished = tokio::spawn(async move { runner.run(&job).await }).await;

            match finished {
                Ok(Ok(outcome)) => log::info!(
                    "Job finished job={} message_id={} outcome={:?}",
                    envelope.payload.name(),
                    envelope.id,
                    outcome
                ),
                Ok(Err(e)) => log::error!(
                    "Job failed job={} message_id={}: {}",
                    envelope.payload.name(),
                    envelope.id,
                    e
                ),
                Err(e) => log::error!(
                    "Job aborted job={} message_id={}: {}",
                    envelope.payload.name(),
                    envelope.id,
                    e
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle::SweepMode;

    #[test]
    fn job_wire_format() {
        let job = Job::ProcessExpired(ExpiredSweep {
            recently_expired_minutes: 6,
            mode: SweepMode::Renew,
        });
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["job"], "process_expired");
        assert_eq!(value["recently_expired_minutes"], 6);
        assert_eq!(value["mode"], "renew");

        let parsed: Job =
            serde_json::from_str(r#"{"job":"sync_plans","plan_id":null}"#).unwrap();
        assert_eq!(parsed, Job::SyncPlans { plan_id: None });
    }
}
