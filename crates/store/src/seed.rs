//! Demo data for development and UI work. Loaded explicitly (`--seed`),
//! never on store construction, so tests start from an empty store.

use crate::models::*;
use crate::store::DeskStore;
use chrono::{Duration, Utc};
use tracing::{info, warn};

impl DeskStore {
    /// Seed account types, accounts, subscribers, and a spread of
    /// subscriptions across statuses and payment states.
    pub fn seed_demo_data(&self) {
        let now = Utc::now();

        let premium = self.create_account_type(
            CreateAccountTypeRequest {
                name: "Premium 4K".into(),
                slots: 4,
            },
            "seed",
        );
        let standard = self.create_account_type(
            CreateAccountTypeRequest {
                name: "Standard".into(),
                slots: 2,
            },
            "seed",
        );

        let accounts = vec![
            ("flix-pool-1@example.com", premium.id),
            ("flix-pool-2@example.com", premium.id),
            ("flix-basic@example.com", standard.id),
        ];
        let mut account_ids = Vec::new();
        for (email, type_id) in accounts {
            match self.create_account(
                CreateAccountRequest {
                    email: email.into(),
                    password: "demo-password".into(),
                    account_type_id: Some(type_id),
                    slot_count: None,
                },
                "seed",
            ) {
                Ok(account) => account_ids.push(account.id),
                Err(e) => warn!(error = %e, email, "failed to seed account"),
            }
        }

        let subscribers = vec![
            ("Ali Raza", "0300-1234567"),
            ("Sara Khan", "0301-7654321"),
            ("Bilal Ahmed", "0333-5550001"),
            ("Fatima Noor", "0345-9990002"),
        ];
        let mut subscriber_ids = Vec::new();
        for (name, contact) in subscribers {
            match self.create_subscriber(
                CreateSubscriberRequest {
                    name: name.into(),
                    contact: contact.into(),
                },
                "seed",
            ) {
                Ok(subscriber) => subscriber_ids.push(subscriber.id),
                Err(e) => warn!(error = %e, name, "failed to seed subscriber"),
            }
        }

        // (account idx, slot, subscriber idx, days until due, paid, billed, payment status)
        let subscriptions = vec![
            (0, "slot-1", 0, 20, 1000.0, 1000.0, PaymentStatus::Paid),
            (0, "slot-2", 1, 5, 0.0, 1000.0, PaymentStatus::Unpaid),
            (1, "slot-1", 2, -4, 0.0, 1500.0, PaymentStatus::Overdue),
            (2, "slot-1", 3, 12, 500.0, 1000.0, PaymentStatus::Partial),
        ];
        for (ai, slot, si, due_in, paid, billed, payment_status) in subscriptions {
            let (Some(&account_id), Some(&subscriber_id)) =
                (account_ids.get(ai), subscriber_ids.get(si))
            else {
                continue;
            };
            let due = now + Duration::days(due_in);
            let result = self.create_subscription(
                CreateSubscriptionRequest {
                    account_id,
                    slot_id: slot.into(),
                    subscriber_id,
                    start_date: due - Duration::days(10),
                    end_date: due + Duration::days(20),
                    paid_price: paid,
                    account_price: Some(billed),
                    payment_status,
                    payment_due_date: Some(due),
                    notes: None,
                },
                "seed",
            );
            if let Err(e) = result {
                warn!(error = %e, slot, "failed to seed subscription");
            }
        }

        info!(
            accounts = account_ids.len(),
            subscribers = subscriber_ids.len(),
            "seeded demo data"
        );
    }
}
