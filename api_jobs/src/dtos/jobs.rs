use jobs::{expired::ExpiredSweep, worker::Job};
use lifecycle::SweepMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpiredJobRequest {
    /// Defaults to 0, every overdue subscription.
    pub recently_expired_minutes: i64,
    /// Expire and notify only, never renew.
    pub notify: bool,
    /// Run inside the request instead of queueing.
    pub now: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpiringJobRequest {
    pub days: Option<i64>,
    pub check_expired: bool,
    pub now: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewJobRequest {
    /// Defaults to 0, every unconfirmed active subscription.
    pub recently_created_minutes: i64,
    pub now: bool,
}

impl ExpiredJobRequest {
    pub fn to_job(&self, auto_renew_enabled: bool) -> Job {
        Job::ProcessExpired(ExpiredSweep {
            recently_expired_minutes: self.recently_expired_minutes,
            mode: if self.notify || !auto_renew_enabled {
                SweepMode::NotifyOnly
            } else {
                SweepMode::Renew
            },
        })
    }
}

impl NewJobRequest {
    pub fn to_job(&self) -> Job {
        Job::ProcessNew {
            recently_created_minutes: self.recently_created_minutes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SyncPlansRequest {
    pub plan_id: Option<Uuid>,
    pub now: bool,
}

#[derive(Debug, Serialize)]
pub struct DispatchedResponse {
    pub job: &'static str,
    pub queue: String,
    pub message_id: Uuid,
}
