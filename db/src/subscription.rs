use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::subscription::SubscriptionFilter,
    models::subscription::{Subscription, SubscriptionStatus},
};

pub async fn get_subscription_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .fetch_one(executor)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                AppError::NotFound(format!("Subscription {} not found", subscription_id))
            }
            other => AppError::from(other),
        })
}

pub async fn get_subscriptions<'e, E>(
    executor: E,
    filter: &SubscriptionFilter,
) -> Res<Vec<Subscription>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM subscriptions");
    let mut conditions_added = false;

    // Helper to add WHERE or AND
    let mut add_condition_separator = |qb: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(status) = filter.status {
        add_condition_separator(&mut qb);
        qb.push("status = ").push_bind(status.as_str());
    }

    if let Some(ending_before) = filter.ending_before {
        add_condition_separator(&mut qb);
        qb.push("end_date < ").push_bind(ending_before);
    }

    if let Some(ending_from) = filter.ending_from {
        add_condition_separator(&mut qb);
        qb.push("end_date >= ").push_bind(ending_from);
    }

    if let Some(ending_after) = filter.ending_after {
        add_condition_separator(&mut qb);
        qb.push("end_date > ").push_bind(ending_after);
    }

    if let Some(ending_until) = filter.ending_until {
        add_condition_separator(&mut qb);
        qb.push("end_date <= ").push_bind(ending_until);
    }

    if let Some(created_since) = filter.created_since {
        add_condition_separator(&mut qb);
        qb.push("created_at >= ").push_bind(created_since);
    }

    if filter.unconfirmed {
        add_condition_separator(&mut qb);
        qb.push("confirmation_sent_at IS NULL");
    }

    qb.push(" ORDER BY end_date ASC, id ASC");

    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    qb.build_query_as::<Subscription>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

/// Writes the lifecycle fields of a swept subscription.
///
/// The row is only touched while it is still `active` and past `end_date` at
/// `now`, so a record already handled by another pass is left alone. Returns
/// whether the row was updated.
pub async fn save_swept_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    sub: &Subscription,
    now: DateTime<Utc>,
) -> Res<bool> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = $1, start_date = $2, end_date = $3, last_payment_date = $4,
            next_payment_date = $5, updated_at = $6
        WHERE id = $7 AND status = $8 AND end_date < $6
        "#,
    )
    .bind(sub.status.as_str())
    .bind(sub.start_date)
    .bind(sub.end_date)
    .bind(sub.last_payment_date)
    .bind(sub.next_payment_date)
    .bind(now)
    .bind(sub.id)
    .bind(SubscriptionStatus::Active.as_str())
    .execute(executor)
    .await
    .map_err(AppError::from)?;

    Ok(result.rows_affected() > 0)
}

/// Writes every lifecycle field of `sub` unconditionally.
pub async fn save_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    sub: &Subscription,
    now: DateTime<Utc>,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET status = $1, start_date = $2, end_date = $3, canceled_at = $4,
            last_payment_date = $5, next_payment_date = $6, auto_renew = $7, updated_at = $8
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(sub.status.as_str())
    .bind(sub.start_date)
    .bind(sub.end_date)
    .bind(sub.canceled_at)
    .bind(sub.last_payment_date)
    .bind(sub.next_payment_date)
    .bind(sub.auto_renew)
    .bind(now)
    .bind(sub.id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Records that the payment confirmation of a subscription was handled.
pub async fn mark_subscription_confirmed<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
    now: DateTime<Utc>,
) -> Res<()> {
    sqlx::query(
        "UPDATE subscriptions SET confirmation_sent_at = $1, updated_at = $1 WHERE id = $2",
    )
    .bind(now)
    .bind(subscription_id)
    .execute(executor)
    .await
    .map_err(AppError::from)?;

    Ok(())
}
