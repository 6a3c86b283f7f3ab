use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, post, web};
use common::{
    access::{self, Capability},
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::get_jwt_claims_or_error,
};
use jobs::{
    expiring::ExpiringCheck,
    worker::{self, Job, JobRunner},
};
use queue::RedisQueue;

use crate::dtos::jobs::{
    DispatchedResponse, ExpiredJobRequest, ExpiringJobRequest, NewJobRequest, SyncPlansRequest,
};

async fn submit(job: Job, now: bool, queue: &RedisQueue, runner: &JobRunner) -> Res<HttpResponse> {
    if now {
        let outcome = runner.run(&job).await?;
        return Success::ok(outcome);
    }

    let name = job.name();
    let message_id = worker::dispatch(queue, job).await?;
    Success::accepted(DispatchedResponse {
        job: name,
        queue: queue.name().to_string(),
        message_id,
    })
}

/// Queues (or runs) the expiry sweep.
///
/// # Input
/// - `recently_expired_minutes`: recency window, defaults to 0 which scans every overdue subscription
/// - `notify`: expire and notify without renewing
/// - `now`: run inside the request and return the report
///
/// # Output
/// - 202 with the queued message id, or 200 with the sweep report when `now` is set
///
/// # Example
/// ```bash
/// curl -X POST https://ops.example.com/api/jobs/expired \
///   -H "Authorization: Bearer $TOKEN" -H "Content-Type: application/json" \
///   -d '{"recently_expired_minutes": 6}'
/// ```
#[post("/expired")]
pub async fn post_expired(
    config: web::Data<Arc<Config>>,
    queue: web::Data<RedisQueue>,
    runner: web::Data<JobRunner>,
    req: web::Json<ExpiredJobRequest>,
) -> Res<HttpResponse> {
    let job = req.to_job(config.jobs.auto_renew_enabled);
    submit(job, req.now, &queue, &runner).await
}

/// Queues (or runs) the expiring-soon notifier.
///
/// # Input
/// - `days`: look-ahead horizon, defaults to the configured one
/// - `check_expired`: run a notify-only expiry sweep first
/// - `now`: run inside the request
#[post("/expiring")]
pub async fn post_expiring(
    config: web::Data<Arc<Config>>,
    queue: web::Data<RedisQueue>,
    runner: web::Data<JobRunner>,
    req: web::Json<ExpiringJobRequest>,
) -> Res<HttpResponse> {
    let req = req.into_inner();
    let days = req.days.unwrap_or(config.jobs.expiring_days);
    if days < 1 {
        return Err(AppError::Validation("days must be at least 1".to_string()));
    }
    let job = Job::ProcessExpiring(ExpiringCheck {
        days,
        check_expired: req.check_expired,
    });
    submit(job, req.now, &queue, &runner).await
}

#[post("/new")]
pub async fn post_new(
    queue: web::Data<RedisQueue>,
    runner: web::Data<JobRunner>,
    req: web::Json<NewJobRequest>,
) -> Res<HttpResponse> {
    submit(req.to_job(), req.now, &queue, &runner).await
}

/// Publishes plans to Stripe. Also needs the plan management capability.
#[post("/plans/sync")]
pub async fn post_sync_plans(
    http: HttpRequest,
    queue: web::Data<RedisQueue>,
    runner: web::Data<JobRunner>,
    req: web::Json<SyncPlansRequest>,
) -> Res<HttpResponse> {
    let claims = get_jwt_claims_or_error(&http)
        .map_err(|_| AppError::Unauthorized("No authorization token provided".to_string()))?;
    if !access::authorize(&claims.principal(), Capability::ManagePlans) {
        return Err(AppError::Forbidden(
            "Plan management capability required".to_string(),
        ));
    }

    let req = req.into_inner();
    submit(Job::SyncPlans { plan_id: req.plan_id }, req.now, &queue, &runner).await
}
