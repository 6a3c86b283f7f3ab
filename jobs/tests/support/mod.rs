#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{
    clock::FixedClock,
    error::{AppError, Res},
};
use db::{
    dtos::subscription::SubscriptionFilter,
    models::{
        plan::{BillingCycle, Plan},
        subscription::{Subscription, SubscriptionStatus},
        user::User,
    },
    store::{SubscriptionRecord, SubscriptionStore},
};
use jobs::JobContext;
use mailer::{Notification, Notifier};
use uuid::Uuid;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn plan(name: &str, cycle: BillingCycle, price: f64) -> Plan {
    let now = at(2024, 1, 1, 0, 0);
    Plan {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price,
        billing_cycle: cycle,
        discount_percentage: 0.0,
        features: vec!["4K quality".to_string()],
        is_active: true,
        stripe_product_id: None,
        stripe_price_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(name: &str, email: &str) -> User {
    let now = at(2024, 1, 1, 0, 0);
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        role: "user".to_string(),
        permissions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn subscription(
    user: Option<&User>,
    plan: &Plan,
    status: SubscriptionStatus,
    end_date: DateTime<Utc>,
    auto_renew: bool,
) -> Subscription {
    let start_date = end_date - Duration::days(30);
    Subscription {
        id: Uuid::new_v4(),
        user_id: user.map(|u| u.id),
        plan_id: plan.id,
        status,
        start_date,
        end_date,
        canceled_at: None,
        trial_ends_at: None,
        last_payment_date: Some(start_date),
        next_payment_date: Some(end_date),
        auto_renew,
        payment_method: Some("card".to_string()),
        quantity: 1,
        confirmation_sent_at: None,
        created_at: start_date,
        updated_at: start_date,
    }
}

/// Store backed by hash maps, mirroring the guarded sweep update of the Postgres one.
#[derive(Default)]
pub struct InMemoryStore {
    subs: Mutex<HashMap<Uuid, Subscription>>,
    plans: Mutex<HashMap<Uuid, Plan>>,
    users: Mutex<HashMap<Uuid, User>>,
    failing_saves: Mutex<HashSet<Uuid>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn add_plan(&self, plan: &Plan) {
        self.plans.lock().unwrap().insert(plan.id, plan.clone());
    }

    pub fn add_user(&self, user: &User) {
        self.users.lock().unwrap().insert(user.id, user.clone());
    }

    pub fn add_subscription(&self, sub: &Subscription) {
        self.subs.lock().unwrap().insert(sub.id, sub.clone());
    }

    pub fn get(&self, id: Uuid) -> Subscription {
        self.subs.lock().unwrap()[&id].clone()
    }

    pub fn fail_saves_for(&self, id: Uuid) {
        self.failing_saves.lock().unwrap().insert(id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn record(&self, sub: Subscription) -> SubscriptionRecord {
        SubscriptionRecord {
            plan: self.plans.lock().unwrap().get(&sub.plan_id).cloned(),
            user: sub
                .user_id
                .and_then(|id| self.users.lock().unwrap().get(&id).cloned()),
            subscription: sub,
        }
    }

    fn check_available(&self) -> Res<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection pool unavailable".to_string()));
        }
        Ok(())
    }

    fn check_save(&self, id: Uuid) -> Res<()> {
        self.check_available()?;
        if self.failing_saves.lock().unwrap().contains(&id) {
            return Err(AppError::Internal(format!("write failed for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn find(&self, filter: &SubscriptionFilter) -> Res<Vec<SubscriptionRecord>> {
        self.check_available()?;
        let mut subs: Vec<Subscription> = self
            .subs
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        subs.sort_by_key(|s| (s.end_date, s.id));
        if let Some(limit) = filter.limit {
            subs.truncate(limit as usize);
        }
        Ok(subs.into_iter().map(|s| self.record(s)).collect())
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Res<SubscriptionRecord> {
        self.check_available()?;
        let sub = self
            .subs
            .lock()
            .unwrap()
            .get(&subscription_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Subscription {} not found", subscription_id)))?;
        Ok(self.record(sub))
    }

    async fn save_swept(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<bool> {
        self.check_save(sub.id)?;
        let mut subs = self.subs.lock().unwrap();
        let Some(stored) = subs.get_mut(&sub.id) else {
            return Ok(false);
        };
        if stored.status != SubscriptionStatus::Active || stored.end_date >= now {
            return Ok(false);
        }
        stored.status = sub.status;
        stored.start_date = sub.start_date;
        stored.end_date = sub.end_date;
        stored.last_payment_date = sub.last_payment_date;
        stored.next_payment_date = sub.next_payment_date;
        stored.updated_at = now;
        Ok(true)
    }

    async fn save(&self, sub: &Subscription, now: DateTime<Utc>) -> Res<Subscription> {
        self.check_save(sub.id)?;
        let mut saved = sub.clone();
        saved.updated_at = now;
        self.subs.lock().unwrap().insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn mark_confirmed(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Res<()> {
        self.check_save(subscription_id)?;
        if let Some(stored) = self.subs.lock().unwrap().get_mut(&subscription_id) {
            stored.confirmation_sent_at = Some(now);
            stored.updated_at = now;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<HashSet<Uuid>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_for(&self, subscription_id: Uuid) {
        self.failing.lock().unwrap().insert(subscription_id);
    }

    pub fn recover_for(&self, subscription_id: Uuid) {
        self.failing.lock().unwrap().remove(&subscription_id);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Res<()> {
        if self.failing.lock().unwrap().contains(&notification.subscription_id) {
            return Err(AppError::Mail("queue unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: FixedClock,
    pub ctx: JobContext,
}

pub fn harness(now: DateTime<Utc>) -> Harness {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = FixedClock::at(now);
    let ctx = JobContext::new(store.clone(), notifier.clone(), Arc::new(clock.clone()));
    Harness {
        store,
        notifier,
        clock,
        ctx,
    }
}
