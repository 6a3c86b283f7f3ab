use std::{future::Future, sync::Arc, time::Duration};

use common::env_config::JobsConfig;
use lifecycle::SweepMode;
use tokio::{sync::Mutex, time::MissedTickBehavior};

use crate::{
    expired::ExpiredSweep,
    worker::{Job, JobRunner},
};

/// Lets at most one run of a task be in flight.
#[derive(Clone, Default)]
pub struct OverlapGuard {
    running: Arc<Mutex<()>>,
}

impl OverlapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` unless the previous run is still going. Returns whether it was spawned.
    pub fn try_spawn<F>(&self, name: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(guard) = self.running.clone().try_lock_owned() else {
            log::warn!("Skipping {}: previous run still in progress", name);
            return false;
        };

        tokio::spawn(async move {
            task.await;
            drop(guard);
        });
        true
    }
}

/// In-process periodic invoker of the sweeps.
pub struct Scheduler {
    runner: JobRunner,
    config: JobsConfig,
}

impl Scheduler {
    pub fn new(runner: JobRunner, config: JobsConfig) -> Self {
        Self { runner, config }
    }

    fn sweep_mode(&self) -> SweepMode {
        if self.config.auto_renew_enabled {
            SweepMode::Renew
        } else {
            SweepMode::NotifyOnly
        }
    }

    fn run_job(&self, job: Job) -> impl Future<Output = ()> + Send + 'static {
        let runner = self.runner.clone();
        async move {
            // failures are logged by the retry runner
            let _ = runner.run(&job).await;
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.tick_seconds.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let expired_guard = OverlapGuard::new();
        let new_guard = OverlapGuard::new();

        log::info!(
            "Scheduler started tick_seconds={} expired_window={} created_window={}",
            self.config.tick_seconds,
            self.config.recently_expired_minutes,
            self.config.recently_created_minutes
        );

        loop {
            ticker.tick().await;

            let expired_job = Job::ProcessExpired(ExpiredSweep {
                recently_expired_minutes: self.config.recently_expired_minutes,
                mode: self.sweep_mode(),
            });
            expired_guard.try_spawn("expired sweep", self.run_job(expired_job));

            let new_job = Job::ProcessNew {
                recently_created_minutes: self.config.recently_created_minutes,
            };
            new_guard.try_spawn("new subscriptions sweep", self.run_job(new_job));
        }
    }
}
