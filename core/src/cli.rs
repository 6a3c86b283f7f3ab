use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Subscription lifecycle worker
#[derive(Parser)]
#[command(name = "subscription-worker")]
#[command(about = "Renews, expires and notifies subscriptions on schedule")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler, the queue workers and the ops endpoint
    Serve,

    /// Run the queue workers only
    Work,

    /// Renew or expire overdue subscriptions
    CheckExpired {
        /// Run here instead of dispatching to the queue
        #[arg(long)]
        now: bool,

        /// Only subscriptions that ended in the last N minutes (0 = all)
        #[arg(long, value_name = "MINUTES", default_value_t = 0)]
        recently_expired: i64,

        /// Expire and notify without renewing
        #[arg(long)]
        notify: bool,
    },

    /// Warn owners of subscriptions ending soon
    CheckExpiring {
        /// Look-ahead in days
        days: Option<i64>,

        /// Expire overdue subscriptions first
        #[arg(long)]
        check_expired: bool,
    },

    /// Send payment confirmations for new subscriptions
    ProcessNew {
        /// Run here instead of dispatching to the queue
        #[arg(long)]
        now: bool,

        /// Only subscriptions created in the last N minutes (0 = all)
        #[arg(long, value_name = "MINUTES", default_value_t = 0)]
        recently_created: i64,
    },

    /// Publish plans to Stripe
    SyncPlans {
        /// Sync a single plan
        #[arg(long)]
        plan_id: Option<Uuid>,
    },

    /// Insert the default plan catalogue into an empty database
    SeedPlans,

    /// Cancel a subscription
    Cancel { subscription_id: Uuid },

    /// Start a fresh term for a subscription
    Reactivate { subscription_id: Uuid },

    /// Issue an ops endpoint token for a user allowed to run maintenance
    Token {
        #[arg(long)]
        user_id: Uuid,
    },
}
