use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::plan::PlanCreateRequest, models::plan::Plan};

pub async fn get_plan_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
) -> Res<Plan> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(plan_id)
        .fetch_one(executor)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Plan {} not found", plan_id)),
            other => AppError::from(other),
        })
}

pub async fn get_plans_by_ids<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_ids: &[Uuid],
) -> Res<Vec<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = ANY($1)")
        .bind(plan_ids)
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_active_plans<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<Vec<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE is_active = TRUE ORDER BY price ASC")
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_plans<'e, E: Executor<'e, Database = Postgres>>(executor: E) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM plans")
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_plan<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: PlanCreateRequest,
) -> Res<Plan> {
    sqlx::query_as::<_, Plan>(
        r#"
        INSERT INTO plans (name, description, price, billing_cycle, discount_percentage, features)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(data.name)
    .bind(data.description)
    .bind(data.price)
    .bind(data.billing_cycle.as_str())
    .bind(data.discount_percentage)
    .bind(sqlx::types::Json(data.features))
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_plan_stripe_ids<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
    product_id: &str,
    price_id: &str,
) -> Res<Plan> {
    sqlx::query_as::<_, Plan>(
        r#"
        UPDATE plans
        SET stripe_product_id = $1, stripe_price_id = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(price_id)
    .bind(plan_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
