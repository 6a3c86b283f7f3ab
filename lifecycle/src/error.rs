use common::error::AppError;
use db::models::subscription::SubscriptionStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Cannot move subscription from {from} to {to}")]
    InvalidTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    #[error("Renewal date out of range")]
    DateOverflow,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { .. } => AppError::Validation(err.to_string()),
            LifecycleError::DateOverflow => AppError::Internal(err.to_string()),
        }
    }
}
