use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::user::User;

pub async fn get_users_by_ids<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_ids: &[Uuid],
) -> Res<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("User {} not found", user_id)),
            other => AppError::from(other),
        })
}
