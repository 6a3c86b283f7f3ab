use std::{env, str::FromStr, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the worker.
///
/// Holds everything needed to run the lifecycle jobs: database and Redis
/// connections, the ops endpoint, logging, mail delivery, Stripe and the
/// scheduling/retry policy of the sweeps.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The URL of Redis server backing the work queues.
    pub redis_url: String,
    /// Configuration for JWT (JSON Web Token) authentication of the ops endpoint.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the ops endpoint will bind to.
    pub server_host: String,
    /// The port number the ops endpoint will listen on.
    pub server_port: u16,
    /// The number of actix worker threads.
    pub num_workers: usize,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Minimum log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// File the logger appends to, next to stdout.
    pub log_file: String,
    /// Application name shown in mail subjects.
    pub app_name: String,
    /// Public URL used for renew/plans links in mails.
    pub app_url: String,
    pub smtp: SmtpConfig,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// ISO currency used when publishing plan prices.
    pub stripe_currency: String,
    pub jobs: JobsConfig,
    pub queues: QueueConfig,
}

#[derive(Clone, Debug)]
/// SMTP relay used by the mail worker.
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// Upper bound on deliveries per second.
    pub max_per_second: u32,
}

#[derive(Clone, Debug)]
/// Scheduling and retry policy of the lifecycle jobs.
pub struct JobsConfig {
    /// Seconds between scheduler ticks.
    pub tick_seconds: u64,
    /// Recency window of the scheduled expiry sweep, in minutes. 0 scans everything.
    pub recently_expired_minutes: i64,
    /// Recency window of the scheduled confirmation sweep, in minutes.
    pub recently_created_minutes: i64,
    /// Horizon of the expiring-soon notifier.
    pub expiring_days: i64,
    /// Renew subscriptions with auto-renew set, instead of only expiring them.
    pub auto_renew_enabled: bool,
    pub tries: u32,
    pub timeout_seconds: u64,
    pub backoff_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Queue holding dispatched sweep jobs.
    pub subscriptions: String,
    /// Queue holding outgoing mails.
    pub emails: String,
    /// Seconds a worker blocks waiting for the next envelope.
    pub poll_seconds: f64,
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) authentication.
///
/// This struct contains the secret key used to sign JWTs and
/// the expiration time in hours for issued tokens.
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

/// Reads an optional variable, falling back to `default` when unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// - `JWT_SECRET`: Required. The secret key for JWT signing.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            expiration_hours: env_or("JWT_EXPIRATION_HOURS", 24),
        }
    }
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        SmtpConfig {
            enabled: env_flag("SMTP_ENABLED", false),
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env_or("SMTP_PORT", 587),
            user: env::var("SMTP_USER").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("MAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Subscriptions".to_string()),
            max_per_second: env_or("MAIL_MAX_PER_SECOND", 5),
        }
    }
}

impl JobsConfig {
    pub fn from_env() -> Self {
        JobsConfig {
            tick_seconds: env_or("SCHEDULER_TICK_SECONDS", 60),
            recently_expired_minutes: env_or("SWEEP_RECENTLY_EXPIRED_MINUTES", 6),
            recently_created_minutes: env_or("SWEEP_RECENTLY_CREATED_MINUTES", 6),
            expiring_days: env_or("EXPIRING_NOTICE_DAYS", 3),
            auto_renew_enabled: env_flag("AUTO_RENEW_ENABLED", true),
            tries: env_or("JOB_TRIES", 3),
            timeout_seconds: env_or("JOB_TIMEOUT_SECONDS", 120),
            backoff_seconds: env_or("JOB_BACKOFF_SECONDS", 5),
        }
    }
}

const DEFAULT_POLL_SECONDS: f64 = 5.0;

/// Keeps the poll interval finite and within 0.1..=300 seconds.
fn poll_seconds(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.1, 300.0)
    } else {
        DEFAULT_POLL_SECONDS
    }
}

impl QueueConfig {
    pub fn from_env() -> Self {
        QueueConfig {
            subscriptions: env::var("QUEUE_SUBSCRIPTIONS")
                .unwrap_or_else(|_| "subscriptions".to_string()),
            emails: env::var("QUEUE_EMAILS").unwrap_or_else(|_| "emails".to_string()),
            poll_seconds: poll_seconds(env_or("QUEUE_POLL_SECONDS", DEFAULT_POLL_SECONDS)),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `DATABASE_URL`: Connection string for the database
    /// - `REDIS_URL`: Connection string for the queue backend
    /// - `JWT_SECRET`: Secret key for JWT signing (via `JwtConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `ENVIRONMENT`: "development"
    /// - `IP` / `PORT` / `WORKERS`: "127.0.0.1" / 8080 / 2
    /// - `ENABLE_CONSOLE_LOGGING`, `LOG_LEVEL`, `LOG_FILE`
    /// - `APP_NAME`, `APP_URL`
    /// - SMTP, Stripe, scheduler and queue settings (see the nested configs)
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env_or("PORT", 8080),
            num_workers: env_or("WORKERS", 2),
            console_logging_enabled: env_flag("ENABLE_CONSOLE_LOGGING", true),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "subscriptions.log".to_string()),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Subscriptions".to_string()),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            smtp: SmtpConfig::from_env(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_currency: env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "brl".to_string()),
            jobs: JobsConfig::from_env(),
            queues: QueueConfig::from_env(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
