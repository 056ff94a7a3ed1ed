//! Read-side reports — payment reminders, outstanding balances, the
//! dashboard overview. All computed by full collection scans, the same way
//! the dashboard itself re-fetches whole collections.

use crate::models::*;
use crate::store::DeskStore;
use chrono::{DateTime, Duration, Utc};
use slotdesk_core::{DeskError, DeskResult};
use uuid::Uuid;

impl DeskStore {
    /// Partition unpaid subscriptions into two disjoint ranges around
    /// `now`: due within the window (`upcoming`) and past due (`overdue`,
    /// annotated with whole days overdue).
    pub fn payment_reminders(&self, now: DateTime<Utc>, window_days: i64) -> PaymentReminders {
        let horizon = now + Duration::days(window_days);
        let mut upcoming = Vec::new();
        let mut overdue = Vec::new();

        for entry in self.subscriptions.iter() {
            let sub = entry.value();
            if !sub.payment_status.needs_payment() {
                continue;
            }
            if sub.payment_due_date < now {
                let days_overdue = (now - sub.payment_due_date).num_days();
                overdue.push(OverdueReminder {
                    subscription: sub.clone(),
                    days_overdue,
                });
            } else if sub.payment_due_date <= horizon {
                upcoming.push(sub.clone());
            }
        }

        upcoming.sort_by(|a, b| a.payment_due_date.cmp(&b.payment_due_date));
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        PaymentReminders { upcoming, overdue }
    }

    /// Outstanding balance for one subscriber: billed amounts (account
    /// price, falling back to the paid price when unset) minus payments
    /// with paid status, clamped at zero. Free subscriptions bill nothing.
    pub fn outstanding_balance(&self, subscriber_id: Uuid) -> DeskResult<OutstandingBalance> {
        if !self.subscribers.contains_key(&subscriber_id) {
            return Err(DeskError::NotFound(format!("subscriber {}", subscriber_id)));
        }

        let mut total_billed = 0.0;
        let mut total_paid = 0.0;
        for entry in self.subscriptions.iter() {
            let sub = entry.value();
            if sub.subscriber_id != subscriber_id
                || sub.payment_status == PaymentStatus::Free
            {
                continue;
            }
            total_billed += sub.account_price.unwrap_or(sub.paid_price);
            if sub.payment_status == PaymentStatus::Paid {
                total_paid += sub.paid_price;
            }
        }

        Ok(OutstandingBalance {
            subscriber_id,
            total_billed,
            total_paid,
            outstanding: (total_billed - total_paid).max(0.0),
        })
    }

    pub fn dashboard_overview(&self) -> DashboardOverview {
        let total_accounts = self.accounts.len() as u64;
        let mut total_slots = 0u64;
        let mut occupied_slots = 0u64;
        let mut suspended_slots = 0u64;
        for entry in self.accounts.iter() {
            for slot in &entry.value().slots {
                total_slots += 1;
                if slot.is_occupied {
                    occupied_slots += 1;
                }
                if slot.is_suspended {
                    suspended_slots += 1;
                }
            }
        }

        let now = Utc::now();
        let mut active_subscriptions = 0u64;
        let mut total_revenue = 0.0;
        let mut overdue_payments = 0u64;
        for entry in self.subscriptions.iter() {
            let sub = entry.value();
            if sub.status.holds_slot() {
                active_subscriptions += 1;
            }
            if sub.payment_status == PaymentStatus::Paid {
                total_revenue += sub.paid_price;
            }
            if sub.payment_status.needs_payment() && sub.payment_due_date < now {
                overdue_payments += 1;
            }
        }

        DashboardOverview {
            total_accounts,
            total_slots,
            occupied_slots,
            suspended_slots,
            total_subscribers: self.subscribers.len() as u64,
            active_subscriptions,
            total_subscriptions: self.subscriptions.len() as u64,
            total_revenue,
            overdue_payments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DeskStore, Uuid, Uuid) {
        let store = DeskStore::new();
        let account = store
            .create_account(
                CreateAccountRequest {
                    email: "shared@example.com".into(),
                    password: "hunter2".into(),
                    account_type_id: None,
                    slot_count: Some(4),
                },
                "admin",
            )
            .unwrap();
        let subscriber = store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Ali".into(),
                    contact: "0300-1234567".into(),
                },
                "admin",
            )
            .unwrap();
        (store, account.id, subscriber.id)
    }

    fn request(
        account_id: Uuid,
        slot: &str,
        subscriber_id: Uuid,
        due: DateTime<Utc>,
        paid_price: f64,
        account_price: Option<f64>,
        payment_status: PaymentStatus,
    ) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            account_id,
            slot_id: slot.into(),
            subscriber_id,
            start_date: due - Duration::days(7),
            end_date: due + Duration::days(23),
            paid_price,
            account_price,
            payment_status,
            payment_due_date: Some(due),
            notes: None,
        }
    }

    #[test]
    fn test_reminder_partition() {
        let (store, account_id, subscriber_id) = fixture();
        let now = Utc::now();

        let soon = store
            .create_subscription(
                request(
                    account_id,
                    "slot-1",
                    subscriber_id,
                    now + Duration::days(3),
                    500.0,
                    None,
                    PaymentStatus::Unpaid,
                ),
                "admin",
            )
            .unwrap();
        let late = store
            .create_subscription(
                request(
                    account_id,
                    "slot-2",
                    subscriber_id,
                    now - Duration::days(3),
                    500.0,
                    None,
                    PaymentStatus::Unpaid,
                ),
                "admin",
            )
            .unwrap();
        // Paid subscriptions never generate reminders.
        store
            .create_subscription(
                request(
                    account_id,
                    "slot-3",
                    subscriber_id,
                    now + Duration::days(2),
                    500.0,
                    None,
                    PaymentStatus::Paid,
                ),
                "admin",
            )
            .unwrap();

        let reminders = store.payment_reminders(now, 7);
        assert_eq!(reminders.upcoming.len(), 1);
        assert_eq!(reminders.upcoming[0].id, soon.id);
        assert_eq!(reminders.overdue.len(), 1);
        assert_eq!(reminders.overdue[0].subscription.id, late.id);
        assert_eq!(reminders.overdue[0].days_overdue, 3);

        // The two ranges are disjoint by construction.
        assert!(reminders
            .upcoming
            .iter()
            .all(|u| reminders.overdue.iter().all(|o| o.subscription.id != u.id)));
    }

    #[test]
    fn test_reminder_window_bound() {
        let (store, account_id, subscriber_id) = fixture();
        let now = Utc::now();
        store
            .create_subscription(
                request(
                    account_id,
                    "slot-1",
                    subscriber_id,
                    now + Duration::days(10),
                    500.0,
                    None,
                    PaymentStatus::Unpaid,
                ),
                "admin",
            )
            .unwrap();

        let reminders = store.payment_reminders(now, 7);
        assert!(reminders.upcoming.is_empty());
        assert!(reminders.overdue.is_empty());
    }

    #[test]
    fn test_outstanding_balance() {
        let (store, account_id, subscriber_id) = fixture();
        let now = Utc::now();

        store
            .create_subscription(
                request(
                    account_id,
                    "slot-1",
                    subscriber_id,
                    now,
                    1000.0,
                    Some(1000.0),
                    PaymentStatus::Paid,
                ),
                "admin",
            )
            .unwrap();
        store
            .create_subscription(
                request(
                    account_id,
                    "slot-2",
                    subscriber_id,
                    now,
                    0.0,
                    Some(1500.0),
                    PaymentStatus::Unpaid,
                ),
                "admin",
            )
            .unwrap();

        let balance = store.outstanding_balance(subscriber_id).unwrap();
        assert_eq!(balance.total_billed, 2500.0);
        assert_eq!(balance.total_paid, 1000.0);
        assert_eq!(balance.outstanding, 1500.0);
    }

    #[test]
    fn test_outstanding_balance_clamps_at_zero() {
        let (store, account_id, subscriber_id) = fixture();
        let now = Utc::now();
        // Paid more than billed (discounted account price).
        store
            .create_subscription(
                request(
                    account_id,
                    "slot-1",
                    subscriber_id,
                    now,
                    1200.0,
                    Some(1000.0),
                    PaymentStatus::Paid,
                ),
                "admin",
            )
            .unwrap();

        let balance = store.outstanding_balance(subscriber_id).unwrap();
        assert_eq!(balance.outstanding, 0.0);
    }

    #[test]
    fn test_outstanding_balance_unknown_subscriber() {
        let (store, _, _) = fixture();
        let err = store.outstanding_balance(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }

    #[test]
    fn test_dashboard_overview() {
        let (store, account_id, subscriber_id) = fixture();
        let now = Utc::now();
        store
            .create_subscription(
                request(
                    account_id,
                    "slot-1",
                    subscriber_id,
                    now + Duration::days(3),
                    800.0,
                    None,
                    PaymentStatus::Paid,
                ),
                "admin",
            )
            .unwrap();

        let overview = store.dashboard_overview();
        assert_eq!(overview.total_accounts, 1);
        assert_eq!(overview.total_slots, 4);
        assert_eq!(overview.occupied_slots, 1);
        assert_eq!(overview.total_subscribers, 1);
        assert_eq!(overview.active_subscriptions, 1);
        assert_eq!(overview.total_revenue, 800.0);
        assert_eq!(overview.overdue_payments, 0);
    }
}
