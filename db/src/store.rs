use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::subscription::SubscriptionFilter,
    models::{plan::Plan, subscription::Subscription, user::User},
};

/// A subscription with its eagerly loaded relations.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub subscription: Subscription,
    pub plan: Option<Plan>,
    pub user: Option<User>,
}

/// Persistence used by the lifecycle jobs.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find(&self, filter: &SubscriptionFilter) -> Res<Vec<SubscriptionRecord>>;

    async fn find_by_id(&self, subscription_id: Uuid) -> Res<SubscriptionRecord>;

    /// Persists a sweep transition while the stored row is still due at `now`.
    async fn save_swept(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<bool>;

    async fn save(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<Subscription>;

    async fn mark_confirmed(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Res<()>;
}

pub struct PgSubscriptionStore {
    pool: Arc<PgPool>,
}

impl PgSubscriptionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn with_relations(&self, subs: Vec<Subscription>) -> Res<Vec<SubscriptionRecord>> {
        if subs.is_empty() {
            return Ok(Vec::new());
        }

        let mut plan_ids: Vec<Uuid> = subs.iter().map(|s| s.plan_id).collect();
        plan_ids.sort();
        plan_ids.dedup();
        let mut user_ids: Vec<Uuid> = subs.iter().filter_map(|s| s.user_id).collect();
        user_ids.sort();
        user_ids.dedup();

        let plans: HashMap<Uuid, Plan> = crate::plan::get_plans_by_ids(&*self.pool, &plan_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let users: HashMap<Uuid, User> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            crate::user::get_users_by_ids(&*self.pool, &user_ids)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        Ok(subs
            .into_iter()
            .map(|subscription| SubscriptionRecord {
                plan: plans.get(&subscription.plan_id).cloned(),
                user: subscription.user_id.and_then(|id| users.get(&id).cloned()),
                subscription,
            })
            .collect())
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn find(&self, filter: &SubscriptionFilter) -> Res<Vec<SubscriptionRecord>> {
        let subs = crate::subscription::get_subscriptions(&*self.pool, filter).await?;
        self.with_relations(subs).await
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Res<SubscriptionRecord> {
        let sub = crate::subscription::get_subscription_by_id(&*self.pool, subscription_id).await?;
        self.with_relations(vec![sub])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::NotFound(format!("Subscription {} not found", subscription_id))
            })
    }

    async fn save_swept(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<bool> {
        crate::subscription::save_swept_subscription(&*self.pool, sub, now).await
    }

    async fn save(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<Subscription> {
        crate::subscription::save_subscription(&*self.pool, sub, now).await
    }

    async fn mark_confirmed(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Res<()> {
        crate::subscription::mark_subscription_confirmed(&*self.pool, subscription_id, now).await
    }
}
