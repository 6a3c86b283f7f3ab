use chrono::{DateTime, Duration, Utc};
use common::error::{AppError, Res};

/// Start of a look-back window of `minutes` ending at `now`, or `None` when
/// `minutes` is 0 and the scan is unbounded.
pub(crate) fn minutes_back(now: DateTime<Utc>, minutes: i64, name: &str) -> Res<Option<DateTime<Utc>>> {
    if minutes < 0 {
        return Err(AppError::Validation(format!("{} must not be negative", name)));
    }
    if minutes == 0 {
        return Ok(None);
    }
    Duration::try_minutes(minutes)
        .and_then(|window| now.checked_sub_signed(window))
        .map(Some)
        .ok_or_else(|| {
            AppError::Validation(format!("{} of {} minutes is out of range", name, minutes))
        })
}

/// `now` plus `days`, for look-ahead scans.
pub(crate) fn days_ahead(now: DateTime<Utc>, days: i64) -> Res<DateTime<Utc>> {
    if days < 1 {
        return Err(AppError::Validation(format!(
            "days must be at least 1, got {}",
            days
        )));
    }
    Duration::try_days(days)
        .and_then(|horizon| now.checked_add_signed(horizon))
        .ok_or_else(|| AppError::Validation(format!("{} days is out of range", days)))
}
