//! Subscription lifecycle — create, renew, cancel, suspend, delete.
//!
//! These operations share one consistency contract: every transition keeps
//! the subscription row, the owning account's slot, the subscriber's
//! denormalized ref list, and the usage aggregates in step. Writes are
//! issued sequentially with no wrapping transaction; each operation
//! validates fully before its first write.

use crate::models::*;
use chrono::{Duration, Months, Utc};
use slotdesk_core::{DeskError, DeskResult};
use tracing::info;
use uuid::Uuid;

use crate::store::DeskStore;

/// Reason recorded on a slot when its subscription is suspended.
const SUSPENSION_REASON: &str = "payment_overdue";

impl DeskStore {
    /// Create a subscription and occupy its slot.
    ///
    /// The slot-free check and the occupy write are separate steps;
    /// concurrent creates against the same slot can race. Single-writer
    /// deployments (the admin dashboard) never hit this.
    pub fn create_subscription(
        &self,
        req: CreateSubscriptionRequest,
        user: &str,
    ) -> DeskResult<Subscription> {
        if !req.paid_price.is_finite() {
            return Err(DeskError::Validation(format!(
                "paid_price must be a finite number, got {}",
                req.paid_price
            )));
        }

        {
            let account = self
                .accounts
                .get(&req.account_id)
                .ok_or_else(|| DeskError::NotFound(format!("account {}", req.account_id)))?;
            let slot = account
                .slots
                .iter()
                .find(|s| s.id == req.slot_id)
                .ok_or_else(|| {
                    DeskError::NotFound(format!(
                        "slot {} on account {}",
                        req.slot_id, req.account_id
                    ))
                })?;
            if slot.is_occupied {
                return Err(DeskError::Constraint(format!(
                    "slot {} on account {} is already occupied",
                    req.slot_id, req.account_id
                )));
            }
        }
        if !self.subscribers.contains_key(&req.subscriber_id) {
            return Err(DeskError::NotFound(format!(
                "subscriber {}",
                req.subscriber_id
            )));
        }

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            account_id: req.account_id,
            slot_id: req.slot_id.clone(),
            subscriber_id: req.subscriber_id,
            start_date: req.start_date,
            end_date: req.end_date,
            payment_due_date: req.payment_due_date.unwrap_or(req.start_date),
            paid_price: req.paid_price,
            account_price: req.account_price,
            status: SubscriptionStatus::Active,
            payment_status: req.payment_status,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };
        let id = subscription.id;
        self.subscriptions.insert(id, subscription.clone());

        if let Some(mut account) = self.accounts.get_mut(&req.account_id) {
            if let Some(slot) = account.slots.iter_mut().find(|s| s.id == req.slot_id) {
                slot.is_occupied = true;
                slot.current_subscriber = Some(req.subscriber_id);
                slot.expiry_date = Some(req.end_date);
                slot.is_suspended = false;
                slot.suspension_reason = None;
            }
            account.updated_at = now;
        }

        if let Some(mut subscriber) = self.subscribers.get_mut(&req.subscriber_id) {
            subscriber.subscriptions.push(SubscriptionRef {
                id,
                status: SubscriptionStatus::Active,
            });
            subscriber.updated_at = now;
        }

        self.record_new_subscription_usage(&subscription);
        self.log_audit(
            user,
            AuditAction::Create,
            "subscription",
            &id.to_string(),
            serde_json::json!({
                "account_id": req.account_id,
                "slot_id": &req.slot_id,
                "subscriber_id": req.subscriber_id,
            }),
        );
        self.bump_revision();
        info!(subscription = %id, slot = %req.slot_id, "subscription created");
        Ok(subscription)
    }

    /// Renew by creating a new subscription for the next calendar month.
    ///
    /// The old record is marked expired and its slot released before the
    /// replacement is created, so the subscriber's ref list tracks only the
    /// latest subscription of a renewal chain.
    pub fn renew_subscription(&self, id: Uuid, user: &str) -> DeskResult<Subscription> {
        let old = self
            .get_subscription(id)
            .ok_or_else(|| DeskError::NotFound(format!("subscription {}", id)))?;

        // Month-rollover arithmetic: Jan 31 end -> Feb 1 start -> Mar 1 end.
        let new_start = old.end_date + Duration::days(1);
        let new_end = new_start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| DeskError::Validation("renewal end date out of range".into()))?;

        if old.status.holds_slot() {
            if let Some(mut entry) = self.subscriptions.get_mut(&id) {
                entry.status = SubscriptionStatus::Expired;
                entry.updated_at = Utc::now();
            }
            self.release_slot(old.account_id, &old.slot_id, old.subscriber_id);
            self.decrement_active_usage(old.account_id, old.subscriber_id);
        }
        self.remove_subscription_ref(old.subscriber_id, id);

        let renewed = self.create_subscription(
            CreateSubscriptionRequest {
                account_id: old.account_id,
                slot_id: old.slot_id.clone(),
                subscriber_id: old.subscriber_id,
                start_date: new_start,
                end_date: new_end,
                paid_price: old.paid_price,
                account_price: old.account_price,
                payment_status: PaymentStatus::Unpaid,
                payment_due_date: Some(new_start),
                notes: old.notes.clone(),
            },
            user,
        )?;

        self.log_audit(
            user,
            AuditAction::Renew,
            "subscription",
            &id.to_string(),
            serde_json::json!({"renewed_as": renewed.id}),
        );
        Ok(renewed)
    }

    /// Cancel a subscription and free its slot.
    pub fn cancel_subscription(&self, id: Uuid, user: &str) -> DeskResult<Subscription> {
        let (was_holding, cancelled) = {
            let mut entry = self
                .subscriptions
                .get_mut(&id)
                .ok_or_else(|| DeskError::NotFound(format!("subscription {}", id)))?;
            if entry.status == SubscriptionStatus::Cancelled {
                return Err(DeskError::Constraint(format!(
                    "subscription {} is already cancelled",
                    id
                )));
            }
            let was_holding = entry.status.holds_slot();
            entry.status = SubscriptionStatus::Cancelled;
            entry.updated_at = Utc::now();
            (was_holding, entry.clone())
        };

        if was_holding {
            self.release_slot(cancelled.account_id, &cancelled.slot_id, cancelled.subscriber_id);
            self.decrement_active_usage(cancelled.account_id, cancelled.subscriber_id);
        }
        self.set_subscription_ref_status(
            cancelled.subscriber_id,
            id,
            SubscriptionStatus::Cancelled,
        );

        self.log_audit(
            user,
            AuditAction::Cancel,
            "subscription",
            &id.to_string(),
            serde_json::json!({}),
        );
        self.bump_revision();
        info!(subscription = %id, "subscription cancelled");
        Ok(cancelled)
    }

    /// Suspend an active subscription. The slot stays occupied; a
    /// suspended slot is not available for new assignments.
    pub fn suspend_subscription(&self, id: Uuid, user: &str) -> DeskResult<Subscription> {
        let suspended = {
            let mut entry = self
                .subscriptions
                .get_mut(&id)
                .ok_or_else(|| DeskError::NotFound(format!("subscription {}", id)))?;
            if entry.status != SubscriptionStatus::Active {
                return Err(DeskError::Constraint(format!(
                    "only active subscriptions can be suspended, {} is {:?}",
                    id, entry.status
                )));
            }
            entry.status = SubscriptionStatus::Suspended;
            entry.updated_at = Utc::now();
            entry.clone()
        };

        if let Some(mut account) = self.accounts.get_mut(&suspended.account_id) {
            if let Some(slot) = account
                .slots
                .iter_mut()
                .find(|s| s.id == suspended.slot_id)
            {
                slot.is_suspended = true;
                slot.suspension_reason = Some(SUSPENSION_REASON.to_string());
            }
            account.updated_at = Utc::now();
        }
        self.set_subscription_ref_status(
            suspended.subscriber_id,
            id,
            SubscriptionStatus::Suspended,
        );

        self.log_audit(
            user,
            AuditAction::Suspend,
            "subscription",
            &id.to_string(),
            serde_json::json!({"reason": SUSPENSION_REASON}),
        );
        self.bump_revision();
        Ok(suspended)
    }

    /// Hard-delete a subscription. A subscription that still holds its
    /// slot is cancelled first so the slot is freed.
    pub fn delete_subscription(&self, id: Uuid, user: &str) -> DeskResult<()> {
        let sub = self
            .get_subscription(id)
            .ok_or_else(|| DeskError::NotFound(format!("subscription {}", id)))?;

        if sub.status.holds_slot() {
            self.cancel_subscription(id, user)?;
        }

        self.subscriptions.remove(&id);
        self.remove_subscription_ref(sub.subscriber_id, id);
        self.log_audit(
            user,
            AuditAction::Delete,
            "subscription",
            &id.to_string(),
            serde_json::json!({}),
        );
        self.bump_revision();
        info!(subscription = %id, "subscription deleted");
        Ok(())
    }

    /// Flag active subscriptions ending within the window as
    /// pending-renewal. Slot state is untouched; the subscription still
    /// holds its slot. Returns the flagged subscriptions.
    pub fn mark_pending_renewals(&self, window_days: i64, user: &str) -> Vec<Subscription> {
        let cutoff = Utc::now() + Duration::days(window_days);
        let due: Vec<Uuid> = self
            .subscriptions
            .iter()
            .filter(|r| {
                r.value().status == SubscriptionStatus::Active && r.value().end_date <= cutoff
            })
            .map(|r| *r.key())
            .collect();

        let mut flagged = Vec::with_capacity(due.len());
        for id in due {
            let sub = match self.subscriptions.get_mut(&id) {
                Some(mut entry) => {
                    entry.status = SubscriptionStatus::PendingRenewal;
                    entry.updated_at = Utc::now();
                    entry.clone()
                }
                None => continue,
            };
            self.set_subscription_ref_status(
                sub.subscriber_id,
                id,
                SubscriptionStatus::PendingRenewal,
            );
            self.log_audit(
                user,
                AuditAction::Update,
                "subscription",
                &id.to_string(),
                serde_json::json!({"status": "pending-renewal"}),
            );
            flagged.push(sub);
        }
        if !flagged.is_empty() {
            self.bump_revision();
        }
        flagged
    }

    // ─── Consistency helpers ───────────────────────────────────────────────

    /// Free a slot, recording the departing subscriber as `last_subscriber`
    /// and clearing any suspension state.
    fn release_slot(&self, account_id: Uuid, slot_id: &str, departing: Uuid) {
        if let Some(mut account) = self.accounts.get_mut(&account_id) {
            if let Some(slot) = account.slots.iter_mut().find(|s| s.id == slot_id) {
                slot.is_occupied = false;
                slot.current_subscriber = None;
                slot.last_subscriber = Some(departing);
                slot.expiry_date = None;
                slot.is_suspended = false;
                slot.suspension_reason = None;
            }
            account.updated_at = Utc::now();
        }
    }

    fn set_subscription_ref_status(
        &self,
        subscriber_id: Uuid,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) {
        if let Some(mut subscriber) = self.subscribers.get_mut(&subscriber_id) {
            if let Some(r) = subscriber
                .subscriptions
                .iter_mut()
                .find(|r| r.id == subscription_id)
            {
                r.status = status;
            }
            subscriber.updated_at = Utc::now();
        }
    }

    fn remove_subscription_ref(&self, subscriber_id: Uuid, subscription_id: Uuid) {
        if let Some(mut subscriber) = self.subscribers.get_mut(&subscriber_id) {
            subscriber.subscriptions.retain(|r| r.id != subscription_id);
            subscriber.updated_at = Utc::now();
        }
    }

    fn record_new_subscription_usage(&self, sub: &Subscription) {
        let mut account = self
            .account_usage
            .entry(sub.account_id)
            .or_insert_with(|| AccountUsage {
                account_id: sub.account_id,
                ..Default::default()
            });
        account.total_subscriptions += 1;
        account.active_subscriptions += 1;
        account.total_revenue += sub.paid_price;
        drop(account);

        let mut slot = self
            .slot_usage
            .entry((sub.account_id, sub.slot_id.clone()))
            .or_insert_with(|| SlotUsage {
                account_id: sub.account_id,
                slot_id: sub.slot_id.clone(),
                ..Default::default()
            });
        slot.total_subscriptions += 1;
        slot.total_revenue += sub.paid_price;
        drop(slot);

        let mut subscriber = self
            .subscriber_usage
            .entry(sub.subscriber_id)
            .or_insert_with(|| SubscriberUsage {
                subscriber_id: sub.subscriber_id,
                ..Default::default()
            });
        subscriber.total_subscriptions += 1;
        subscriber.active_subscriptions += 1;
        subscriber.total_payments += sub.paid_price;
    }

    fn decrement_active_usage(&self, account_id: Uuid, subscriber_id: Uuid) {
        if let Some(mut usage) = self.account_usage.get_mut(&account_id) {
            usage.active_subscriptions = usage.active_subscriptions.saturating_sub(1);
        }
        if let Some(mut usage) = self.subscriber_usage.get_mut(&subscriber_id) {
            usage.active_subscriptions = usage.active_subscriptions.saturating_sub(1);
        }
    }
}
