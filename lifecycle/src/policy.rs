use chrono::{DateTime, Months, Utc};
use db::models::{
    plan::BillingCycle,
    subscription::{Subscription, SubscriptionStatus},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LifecycleError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Days left at or below which a running subscription counts as ending soon.
pub const EXPIRES_SOON_DAYS: i64 = 7;

/// How the expiry sweep treats auto-renewing subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Auto-renewing subscriptions are renewed, the rest expire.
    #[default]
    Renew,
    /// Every due subscription expires and its owner is notified.
    NotifyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Renew,
    Expire,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Skip => "skip",
            Decision::Renew => "renew",
            Decision::Expire => "expire",
        }
    }
}

pub fn is_expired(sub: &Subscription, now: DateTime<Utc>) -> bool {
    sub.status == SubscriptionStatus::Active && sub.end_date < now
}

pub fn is_active(sub: &Subscription, now: DateTime<Utc>) -> bool {
    sub.status == SubscriptionStatus::Active && sub.end_date > now
}

pub fn on_trial(sub: &Subscription, now: DateTime<Utc>) -> bool {
    sub.trial_ends_at.is_some_and(|ends| ends > now)
}

/// End of the term that follows one ending at `end`.
///
/// Months are calendar months; a day that does not exist in the target month
/// is clamped to its last day (Jan 31 + 1 month = Feb 28/29). It never spills
/// over into the following month, so Jan 31 does not renew to Mar 3.
pub fn renewal_end(end: DateTime<Utc>, cycle: &BillingCycle) -> Result<DateTime<Utc>, LifecycleError> {
    end.checked_add_months(Months::new(cycle.months()))
        .ok_or(LifecycleError::DateOverflow)
}

/// Whole days until `end_date`, rounded down. Negative once it has passed.
pub fn days_remaining(sub: &Subscription, now: DateTime<Utc>) -> i64 {
    (sub.end_date - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn expires_soon(sub: &Subscription, now: DateTime<Utc>) -> bool {
    is_active(sub, now) && days_remaining(sub, now) <= EXPIRES_SOON_DAYS
}

fn transition(sub: &mut Subscription, to: SubscriptionStatus) -> Result<(), LifecycleError> {
    if !sub.status.can_transition_to(&to) {
        return Err(LifecycleError::InvalidTransition {
            from: sub.status,
            to,
        });
    }
    sub.status = to;
    Ok(())
}

/// Decides what a sweep pass does with `sub`. Touches nothing.
pub fn decide(sub: &Subscription, mode: SweepMode, now: DateTime<Utc>) -> Decision {
    if !is_expired(sub, now) {
        return Decision::Skip;
    }
    match mode {
        SweepMode::Renew if sub.auto_renew => Decision::Renew,
        _ => Decision::Expire,
    }
}

/// Applies a sweep decision to the in-memory record.
pub fn apply(
    sub: &mut Subscription,
    decision: Decision,
    cycle: &BillingCycle,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    match decision {
        Decision::Skip => Ok(()),
        Decision::Renew => renew(sub, cycle, now),
        Decision::Expire => expire(sub),
    }
}

/// Extends the term by one billing cycle, starting where the old one ended.
pub fn renew(sub: &mut Subscription, cycle: &BillingCycle, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    let new_end = renewal_end(sub.end_date, cycle)?;
    transition(sub, SubscriptionStatus::Active)?;
    sub.start_date = sub.end_date;
    sub.end_date = new_end;
    sub.last_payment_date = Some(now);
    sub.next_payment_date = Some(new_end);
    Ok(())
}

pub fn expire(sub: &mut Subscription) -> Result<(), LifecycleError> {
    transition(sub, SubscriptionStatus::Expired)
}

pub fn cancel(sub: &mut Subscription, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    transition(sub, SubscriptionStatus::Canceled)?;
    sub.canceled_at = Some(now);
    sub.auto_renew = false;
    Ok(())
}

/// Manual renewal: a fresh term starting now, auto-renew switched back on.
pub fn reactivate(
    sub: &mut Subscription,
    cycle: &BillingCycle,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let new_end = renewal_end(now, cycle)?;
    transition(sub, SubscriptionStatus::Active)?;
    sub.start_date = now;
    sub.end_date = new_end;
    sub.canceled_at = None;
    sub.auto_renew = true;
    sub.last_payment_date = Some(now);
    sub.next_payment_date = Some(new_end);
    Ok(())
}

/// First payment confirmed for a pending subscription.
pub fn activate(sub: &mut Subscription, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    if sub.status != SubscriptionStatus::Pending {
        return Err(LifecycleError::InvalidTransition {
            from: sub.status,
            to: SubscriptionStatus::Active,
        });
    }
    transition(sub, SubscriptionStatus::Active)?;
    sub.last_payment_date = Some(now);
    sub.next_payment_date = Some(sub.end_date);
    Ok(())
}

/// A new pending subscription covering one billing cycle from `now`.
pub fn start_term(
    user_id: Option<Uuid>,
    plan_id: Uuid,
    cycle: &BillingCycle,
    now: DateTime<Utc>,
    auto_renew: bool,
) -> Result<Subscription, LifecycleError> {
    Ok(Subscription {
        id: Uuid::new_v4(),
        user_id,
        plan_id,
        status: SubscriptionStatus::Pending,
        start_date: now,
        end_date: renewal_end(now, cycle)?,
        canceled_at: None,
        trial_ends_at: None,
        last_payment_date: None,
        next_payment_date: None,
        auto_renew,
        payment_method: None,
        quantity: 1,
        confirmation_sent_at: None,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn active_sub(end: DateTime<Utc>, auto_renew: bool) -> Subscription {
        let mut sub = start_term(
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            &BillingCycle::Monthly,
            end - Duration::days(31),
            auto_renew,
        )
        .unwrap();
        sub.status = SubscriptionStatus::Active;
        sub.end_date = end;
        sub
    }

    #[test]
    fn duration_table() {
        let start = at(2025, 3, 15);
        assert_eq!(renewal_end(start, &BillingCycle::Monthly).unwrap(), at(2025, 4, 15));
        assert_eq!(renewal_end(start, &BillingCycle::Quarterly).unwrap(), at(2025, 6, 15));
        assert_eq!(renewal_end(start, &BillingCycle::Annual).unwrap(), at(2026, 3, 15));
        assert_eq!(
            renewal_end(start, &BillingCycle::from("semanal")).unwrap(),
            at(2025, 4, 15)
        );
    }

    #[test]
    fn month_end_is_clamped() {
        assert_eq!(renewal_end(at(2025, 1, 31), &BillingCycle::Monthly).unwrap(), at(2025, 2, 28));
        assert_eq!(renewal_end(at(2024, 1, 31), &BillingCycle::Monthly).unwrap(), at(2024, 2, 29));
        assert_eq!(renewal_end(at(2024, 2, 29), &BillingCycle::Annual).unwrap(), at(2025, 2, 28));
    }

    #[test]
    fn overdue_monthly_renewal_extends_from_old_end() {
        let now = at(2025, 1, 2);
        let mut sub = active_sub(at(2025, 1, 1), true);

        let decision = decide(&sub, SweepMode::Renew, now);
        assert_eq!(decision, Decision::Renew);
        apply(&mut sub, decision, &BillingCycle::Monthly, now).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.start_date, at(2025, 1, 1));
        assert_eq!(sub.end_date, at(2025, 2, 1));
        assert_eq!(sub.last_payment_date, Some(now));
        assert_eq!(sub.next_payment_date, Some(at(2025, 2, 1)));
    }

    #[test]
    fn overdue_without_auto_renew_expires_with_dates_untouched() {
        let now = at(2025, 1, 2);
        let mut sub = active_sub(at(2025, 1, 1), false);
        let before = sub.clone();

        let decision = decide(&sub, SweepMode::Renew, now);
        assert_eq!(decision, Decision::Expire);
        apply(&mut sub, decision, &BillingCycle::Monthly, now).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Expired);
        assert_eq!(sub.start_date, before.start_date);
        assert_eq!(sub.end_date, before.end_date);
        assert_eq!(sub.last_payment_date, before.last_payment_date);
    }

    #[test]
    fn notify_only_expires_auto_renewing_subscriptions() {
        let sub = active_sub(at(2025, 1, 1), true);
        assert_eq!(decide(&sub, SweepMode::NotifyOnly, at(2025, 1, 2)), Decision::Expire);
    }

    #[test]
    fn second_decision_after_apply_is_skip() {
        let now = at(2025, 1, 2);
        for auto_renew in [true, false] {
            let mut sub = active_sub(at(2025, 1, 1), auto_renew);
            let decision = decide(&sub, SweepMode::Renew, now);
            apply(&mut sub, decision, &BillingCycle::Monthly, now).unwrap();
            assert_eq!(decide(&sub, SweepMode::Renew, now), Decision::Skip);
        }
    }

    #[test]
    fn long_overdue_advances_one_cycle_per_pass() {
        let now = at(2025, 4, 10);
        let mut sub = active_sub(at(2025, 1, 1), true);

        let decision = decide(&sub, SweepMode::Renew, now);
        apply(&mut sub, decision, &BillingCycle::Monthly, now).unwrap();
        assert_eq!(sub.end_date, at(2025, 2, 1));
        assert_eq!(decide(&sub, SweepMode::Renew, now), Decision::Renew);
    }

    #[test]
    fn only_active_past_end_is_expired() {
        let now = at(2025, 1, 2);
        let mut sub = active_sub(at(2025, 1, 1), false);
        assert!(is_expired(&sub, now));
        assert!(!is_active(&sub, now));

        sub.end_date = now;
        assert!(!is_expired(&sub, now));

        sub.end_date = at(2025, 1, 1);
        sub.status = SubscriptionStatus::Canceled;
        assert!(!is_expired(&sub, now));
        assert_eq!(decide(&sub, SweepMode::Renew, now), Decision::Skip);
    }

    #[test]
    fn cancel_sets_marker_and_refuses_twice() {
        let now = at(2025, 1, 10);
        let mut sub = active_sub(at(2025, 2, 1), true);

        cancel(&mut sub, now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.canceled_at, Some(now));
        assert!(!sub.auto_renew);

        assert_eq!(
            cancel(&mut sub, now),
            Err(LifecycleError::InvalidTransition {
                from: SubscriptionStatus::Canceled,
                to: SubscriptionStatus::Canceled,
            })
        );
    }

    #[test]
    fn expired_cannot_be_canceled_or_expired_again() {
        let mut sub = active_sub(at(2025, 1, 1), false);
        expire(&mut sub).unwrap();
        assert!(cancel(&mut sub, at(2025, 1, 2)).is_err());
        assert!(expire(&mut sub).is_err());
    }

    #[test]
    fn reactivate_starts_fresh_term() {
        let now = at(2025, 3, 5);
        let mut sub = active_sub(at(2025, 2, 1), true);
        cancel(&mut sub, at(2025, 1, 20)).unwrap();

        reactivate(&mut sub, &BillingCycle::Quarterly, now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.start_date, now);
        assert_eq!(sub.end_date, at(2025, 6, 5));
        assert_eq!(sub.canceled_at, None);
        assert!(sub.auto_renew);
    }

    #[test]
    fn activate_only_from_pending() {
        let now = at(2025, 1, 1);
        let mut sub =
            start_term(None, Uuid::new_v4(), &BillingCycle::Annual, now, true).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert_eq!(sub.end_date, at(2026, 1, 1));

        activate(&mut sub, now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.next_payment_date, Some(at(2026, 1, 1)));
        assert!(activate(&mut sub, now).is_err());
    }

    #[test]
    fn days_remaining_rounds_down() {
        let now = at(2025, 1, 1);
        let mut sub = active_sub(now + Duration::hours(60), true);
        assert_eq!(days_remaining(&sub, now), 2);
        assert!(expires_soon(&sub, now));

        sub.end_date = now - Duration::hours(12);
        assert_eq!(days_remaining(&sub, now), -1);
        assert!(!expires_soon(&sub, now));

        sub.end_date = now + Duration::days(30);
        assert!(!expires_soon(&sub, now));
    }

    #[test]
    fn trial_is_read_from_trial_end() {
        let now = at(2025, 1, 1);
        let mut sub = active_sub(at(2025, 2, 1), true);
        assert!(!on_trial(&sub, now));
        sub.trial_ends_at = Some(at(2025, 1, 8));
        assert!(on_trial(&sub, now));
    }
}
