mod support;

use chrono::Duration;
use common::error::AppError;
use db::models::{plan::BillingCycle, subscription::SubscriptionStatus};
use jobs::manage::{cancel_subscription, reactivate_subscription};
use support::*;

#[tokio::test]
async fn cancel_turns_off_auto_renew() {
    let now = at(2025, 6, 1, 9, 0);
    let h = harness(now);
    let premium = plan("Premium", BillingCycle::Monthly, 49.9);
    let sub = subscription(None, &premium, SubscriptionStatus::Active, now + Duration::days(10), true);
    h.store.add_plan(&premium);
    h.store.add_subscription(&sub);

    let saved = cancel_subscription(&h.ctx, sub.id).await.unwrap();

    assert_eq!(saved.status, SubscriptionStatus::Canceled);
    assert_eq!(saved.canceled_at, Some(now));
    assert!(!saved.auto_renew);
    assert_eq!(saved.end_date, sub.end_date);
    assert_eq!(h.store.get(sub.id), saved);
}

#[tokio::test]
async fn canceling_twice_is_a_validation_error() {
    let now = at(2025, 6, 1, 9, 0);
    let h = harness(now);
    let premium = plan("Premium", BillingCycle::Monthly, 49.9);
    let sub = subscription(None, &premium, SubscriptionStatus::Active, now + Duration::days(10), true);
    h.store.add_plan(&premium);
    h.store.add_subscription(&sub);

    cancel_subscription(&h.ctx, sub.id).await.unwrap();
    let err = cancel_subscription(&h.ctx, sub.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn reactivate_expired_starts_a_new_annual_term() {
    let now = at(2025, 6, 1, 9, 0);
    let h = harness(now);
    let annual = plan("Premium Anual", BillingCycle::Annual, 499.9);
    let sub = subscription(None, &annual, SubscriptionStatus::Expired, now - Duration::days(40), false);
    h.store.add_plan(&annual);
    h.store.add_subscription(&sub);

    let saved = reactivate_subscription(&h.ctx, sub.id).await.unwrap();

    assert_eq!(saved.status, SubscriptionStatus::Active);
    assert_eq!(saved.start_date, now);
    assert_eq!(saved.end_date, at(2026, 6, 1, 9, 0));
    assert!(saved.auto_renew);
    assert_eq!(saved.canceled_at, None);
}

#[tokio::test]
async fn unknown_subscription_is_not_found() {
    let h = harness(at(2025, 6, 1, 9, 0));
    let err = cancel_subscription(&h.ctx, uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
