mod cli;
mod services;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use clap::Parser;
use cli::{Cli, Commands};
use common::{
    access::{self, Capability, Role},
    env_config::Config,
    error::{AppError, Res},
    jwt::{TokenSubject, generate_jwt},
};
use jobs::{
    expired::ExpiredSweep,
    expiring::ExpiringCheck,
    manage,
    scheduler::Scheduler,
    worker::{self, Job},
};
use lifecycle::SweepMode;
use serde::Serialize;
use services::Services;

fn print_json<T: Serialize>(value: &T) -> Res<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs `job` in this process, or hands it to the queue workers.
async fn run_or_dispatch(services: &Services, job: Job, now: bool) -> Res<()> {
    if now {
        let outcome = services.runner.run(&job).await?;
        return print_json(&outcome);
    }
    let message_id = worker::dispatch(&services.subscriptions, job).await?;
    println!("Dispatched message {}", message_id);
    Ok(())
}

fn sweep_mode(config: &Config, notify: bool) -> SweepMode {
    if notify || !config.jobs.auto_renew_enabled {
        SweepMode::NotifyOnly
    } else {
        SweepMode::Renew
    }
}

fn spawn_workers(services: &Services) -> Res<()> {
    let mail_worker = services.mail_worker()?;
    tokio::spawn(services.job_worker().run());
    tokio::spawn(mail_worker.run());
    Ok(())
}

async fn serve(services: Services) -> Res<()> {
    spawn_workers(&services)?;
    tokio::spawn(Scheduler::new(services.runner.clone(), services.config.jobs.clone()).run());

    let config = services.config.clone();
    let queue = services.subscriptions.clone();
    let runner = services.runner.clone();

    log::info!(
        "Ops endpoint listening on {}:{}",
        config.server_host,
        config.server_port
    );

    let config_data = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(runner.clone()))
            .wrap(logger::middleware(config_data.console_logging_enabled))
            .service(
                web::scope("/api")
                    .service(api_jobs::mount_health())
                    .service(api_jobs::mount_jobs(&config_data.jwt_config.secret)),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))
    .map_err(|e| AppError::Internal(format!("Failed to bind ops endpoint: {}", e)))?
    .workers(config.num_workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(format!("Ops endpoint stopped: {}", e)))
}

async fn work(services: Services) -> Res<()> {
    spawn_workers(&services)?;
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to listen for shutdown: {}", e)))?;
    log::info!("Shutting down workers");
    Ok(())
}

async fn issue_token(services: &Services, user_id: uuid::Uuid) -> Res<()> {
    let user = db::user::get_user_by_id(&*services.pool, user_id).await?;
    if !access::authorize(&user.principal(false), Capability::RunMaintenance) {
        return Err(AppError::Forbidden(format!(
            "User {} may not run maintenance",
            user.id
        )));
    }

    let token = generate_jwt(
        TokenSubject {
            subject: user.id,
            role: Role::from_string(&user.role),
            permissions: user.permissions.clone(),
        },
        &services.config.jwt_config,
    )?;
    println!("{}", token);
    Ok(())
}

async fn run(cli: Cli, config: Arc<Config>) -> Res<()> {
    let services = Services::init(config.clone()).await?;

    match cli.command {
        Commands::Serve => serve(services).await,
        Commands::Work => work(services).await,
        Commands::CheckExpired {
            now,
            recently_expired,
            notify,
        } => {
            let job = Job::ProcessExpired(ExpiredSweep {
                recently_expired_minutes: recently_expired,
                mode: sweep_mode(&config, notify),
            });
            run_or_dispatch(&services, job, now).await
        }
        Commands::CheckExpiring {
            days,
            check_expired,
        } => {
            let job = Job::ProcessExpiring(ExpiringCheck {
                days: days.unwrap_or(config.jobs.expiring_days),
                check_expired,
            });
            run_or_dispatch(&services, job, true).await
        }
        Commands::ProcessNew {
            now,
            recently_created,
        } => {
            let job = Job::ProcessNew {
                recently_created_minutes: recently_created,
            };
            run_or_dispatch(&services, job, now).await
        }
        Commands::SyncPlans { plan_id } => {
            run_or_dispatch(&services, Job::SyncPlans { plan_id }, true).await
        }
        Commands::SeedPlans => {
            let plans = db::seed::seed_default_plans(&services.pool).await?;
            if plans.is_empty() {
                println!("Plans already present, nothing seeded");
            }
            for plan in plans {
                println!("Seeded plan {} ({})", plan.name, plan.id);
            }
            Ok(())
        }
        Commands::Cancel { subscription_id } => {
            let sub = manage::cancel_subscription(&services.ctx, subscription_id).await?;
            print_json(&sub)
        }
        Commands::Reactivate { subscription_id } => {
            let sub = manage::reactivate_subscription(&services.ctx, subscription_id).await?;
            print_json(&sub)
        }
        Commands::Token { user_id } => issue_token(&services, user_id).await,
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // get env vars
    let config = Config::from_env();

    // init logger
    logger::setup(&config).expect("Failed to set up logger");

    if let Err(e) = run(cli, config).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
