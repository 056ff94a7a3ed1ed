//! End-to-end lifecycle flow over the public store API: rent a slot,
//! suspend for non-payment, renew, and wind the account down.

use chrono::{Duration, TimeZone, Utc};
use slotdesk_core::DeskError;
use slotdesk_store::models::*;
use slotdesk_store::DeskStore;

fn setup() -> (DeskStore, uuid::Uuid, uuid::Uuid) {
    let store = DeskStore::new();
    let account_type = store.create_account_type(
        CreateAccountTypeRequest {
            name: "Premium 4K".into(),
            slots: 4,
        },
        "admin",
    );
    let account = store
        .create_account(
            CreateAccountRequest {
                email: "pool@example.com".into(),
                password: "pw".into(),
                account_type_id: Some(account_type.id),
                slot_count: None,
            },
            "admin",
        )
        .unwrap();
    let subscriber = store
        .create_subscriber(
            CreateSubscriberRequest {
                name: "Ali Raza".into(),
                contact: "0300-1234567".into(),
            },
            "admin",
        )
        .unwrap();
    (store, account.id, subscriber.id)
}

#[test]
fn full_lifecycle_flow() {
    let (store, account_id, subscriber_id) = setup();

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let sub = store
        .create_subscription(
            CreateSubscriptionRequest {
                account_id,
                slot_id: "slot-2".into(),
                subscriber_id,
                start_date: start,
                end_date: end,
                paid_price: 1000.0,
                account_price: Some(1200.0),
                payment_status: PaymentStatus::Paid,
                payment_due_date: None,
                notes: Some("first month".into()),
            },
            "admin",
        )
        .unwrap();

    // The account cannot be deleted while the slot is held.
    assert!(matches!(
        store.delete_account(account_id, "admin"),
        Err(DeskError::Constraint(_))
    ));

    // Suspend for non-payment, then verify the slot blocks reassignment.
    store.suspend_subscription(sub.id, "admin").unwrap();
    let other = store
        .create_subscriber(
            CreateSubscriberRequest {
                name: "Sara Khan".into(),
                contact: "0301-7654321".into(),
            },
            "admin",
        )
        .unwrap();
    let steal = store.create_subscription(
        CreateSubscriptionRequest {
            account_id,
            slot_id: "slot-2".into(),
            subscriber_id: other.id,
            start_date: start,
            end_date: end,
            paid_price: 500.0,
            account_price: None,
            payment_status: PaymentStatus::Unpaid,
            payment_due_date: None,
            notes: None,
        },
        "admin",
    );
    assert!(matches!(steal, Err(DeskError::Constraint(_))));

    // Renewal hands the slot to the next month's subscription even from a
    // suspended state, with calendar-month dates.
    let renewed = store.renew_subscription(sub.id, "admin").unwrap();
    assert_eq!(
        renewed.start_date,
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        renewed.end_date,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        store.get_subscription(sub.id).unwrap().status,
        SubscriptionStatus::Expired
    );

    // Suspension state does not leak onto the renewed assignment.
    let account = store.get_account(account_id).unwrap();
    let slot = account.slots.iter().find(|s| s.id == "slot-2").unwrap();
    assert!(slot.is_occupied);
    assert!(!slot.is_suspended);
    assert_eq!(slot.current_subscriber, Some(subscriber_id));

    // Unpaid renewal shows up in the balance.
    let balance = store.outstanding_balance(subscriber_id).unwrap();
    assert_eq!(balance.total_billed, 2400.0);
    assert_eq!(balance.total_paid, 1000.0);
    assert_eq!(balance.outstanding, 1400.0);

    // Wind down: delete the live subscription, then the account.
    store.delete_subscription(renewed.id, "admin").unwrap();
    store.delete_account(account_id, "admin").unwrap();
    assert!(store.get_account(account_id).is_none());
}

#[test]
fn reminders_follow_payment_lifecycle() {
    let (store, account_id, subscriber_id) = setup();
    let now = Utc::now();

    let sub = store
        .create_subscription(
            CreateSubscriptionRequest {
                account_id,
                slot_id: "slot-1".into(),
                subscriber_id,
                start_date: now - Duration::days(25),
                end_date: now + Duration::days(5),
                paid_price: 0.0,
                account_price: Some(1000.0),
                payment_status: PaymentStatus::Unpaid,
                payment_due_date: Some(now + Duration::days(3)),
                notes: None,
            },
            "admin",
        )
        .unwrap();

    let reminders = store.payment_reminders(now, 7);
    assert_eq!(reminders.upcoming.len(), 1);
    assert!(reminders.overdue.is_empty());

    // The same subscription, viewed a week later, has crossed into overdue.
    let later = now + Duration::days(6);
    let reminders = store.payment_reminders(later, 7);
    assert!(reminders.upcoming.is_empty());
    assert_eq!(reminders.overdue.len(), 1);
    assert_eq!(reminders.overdue[0].subscription.id, sub.id);
    assert_eq!(reminders.overdue[0].days_overdue, 3);

    // Pending-renewal sweep picks it up without disturbing the slot.
    let flagged = store.mark_pending_renewals(7, "admin");
    assert_eq!(flagged.len(), 1);
    let account = store.get_account(account_id).unwrap();
    assert!(account.slots.iter().find(|s| s.id == "slot-1").unwrap().is_occupied);
}
