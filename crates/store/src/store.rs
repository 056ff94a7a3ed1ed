//! In-memory desk store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same API surface for development and testing.

use crate::models::*;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use slotdesk_core::{DeskError, DeskResult};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for accounts, subscribers, subscriptions,
/// account types, usage aggregates, and the audit log.
///
/// The revision counter increments on every subscription mutation; clients
/// poll it ETag-style to learn when to re-fetch.
pub struct DeskStore {
    pub(crate) accounts: DashMap<Uuid, Account>,
    pub(crate) subscribers: DashMap<Uuid, Subscriber>,
    pub(crate) subscriptions: DashMap<Uuid, Subscription>,
    pub(crate) account_types: DashMap<Uuid, AccountType>,
    pub(crate) account_usage: DashMap<Uuid, AccountUsage>,
    pub(crate) slot_usage: DashMap<(Uuid, String), SlotUsage>,
    pub(crate) subscriber_usage: DashMap<Uuid, SubscriberUsage>,
    pub(crate) audit_log: DashMap<Uuid, AuditLogEntry>,
    revision: AtomicU64,
}

impl DeskStore {
    pub fn new() -> Self {
        info!("Desk store initialized (in-memory, development mode)");
        Self {
            accounts: DashMap::new(),
            subscribers: DashMap::new(),
            subscriptions: DashMap::new(),
            account_types: DashMap::new(),
            account_usage: DashMap::new(),
            slot_usage: DashMap::new(),
            subscriber_usage: DashMap::new(),
            audit_log: DashMap::new(),
            revision: AtomicU64::new(0),
        }
    }

    /// Current change revision. Monotonic; bumped on subscription mutations.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub(crate) fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    // ─── Accounts ──────────────────────────────────────────────────────────

    pub fn list_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|r| r.value().clone()).collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        accounts
    }

    pub fn get_account(&self, id: Uuid) -> Option<Account> {
        self.accounts.get(&id).map(|r| r.value().clone())
    }

    pub fn create_account(&self, req: CreateAccountRequest, user: &str) -> DeskResult<Account> {
        let slot_count = match req.account_type_id {
            Some(type_id) => {
                self.account_types
                    .get(&type_id)
                    .ok_or_else(|| DeskError::NotFound(format!("account type {}", type_id)))?
                    .slots
            }
            None => req
                .slot_count
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    DeskError::Validation("slot_count or account_type_id required".into())
                })?,
        };

        let now = Utc::now();
        let slots = (1..=slot_count)
            .map(|n| Slot {
                id: format!("slot-{}", n),
                pin: generate_pin(),
                is_occupied: false,
                current_subscriber: None,
                last_subscriber: None,
                expiry_date: None,
                is_suspended: false,
                suspension_reason: None,
            })
            .collect();

        let account = Account {
            id: Uuid::new_v4(),
            email: req.email,
            password: req.password,
            account_type_id: req.account_type_id,
            slots,
            created_at: now,
            updated_at: now,
        };
        let id = account.id;
        self.accounts.insert(id, account.clone());
        self.log_audit(
            user,
            AuditAction::Create,
            "account",
            &id.to_string(),
            serde_json::json!({"email": &account.email, "slots": slot_count}),
        );
        Ok(account)
    }

    pub fn update_account(
        &self,
        id: Uuid,
        req: UpdateAccountRequest,
        user: &str,
    ) -> Option<Account> {
        self.accounts.get_mut(&id).map(|mut entry| {
            let a = entry.value_mut();
            if let Some(email) = req.email {
                a.email = email;
            }
            if let Some(password) = req.password {
                a.password = password;
            }
            a.updated_at = Utc::now();
            self.log_audit(
                user,
                AuditAction::Update,
                "account",
                &id.to_string(),
                serde_json::json!({}),
            );
            a.clone()
        })
    }

    /// Fails when any slot-holding subscription still references the
    /// account; the document is left unchanged in that case.
    pub fn delete_account(&self, id: Uuid, user: &str) -> DeskResult<()> {
        if !self.accounts.contains_key(&id) {
            return Err(DeskError::NotFound(format!("account {}", id)));
        }
        let holding = self
            .subscriptions
            .iter()
            .filter(|r| r.value().account_id == id && r.value().status.holds_slot())
            .count();
        if holding > 0 {
            return Err(DeskError::Constraint(format!(
                "account {} still has {} active subscription(s)",
                id, holding
            )));
        }
        self.accounts.remove(&id);
        self.account_usage.remove(&id);
        self.log_audit(
            user,
            AuditAction::Delete,
            "account",
            &id.to_string(),
            serde_json::json!({}),
        );
        Ok(())
    }

    // ─── Account types ─────────────────────────────────────────────────────

    pub fn list_account_types(&self) -> Vec<AccountType> {
        let mut types: Vec<AccountType> =
            self.account_types.iter().map(|r| r.value().clone()).collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    pub fn create_account_type(&self, req: CreateAccountTypeRequest, user: &str) -> AccountType {
        let account_type = AccountType {
            id: Uuid::new_v4(),
            name: req.name,
            slots: req.slots,
        };
        let id = account_type.id;
        self.account_types.insert(id, account_type.clone());
        self.log_audit(
            user,
            AuditAction::Create,
            "account_type",
            &id.to_string(),
            serde_json::json!({"name": &account_type.name}),
        );
        account_type
    }

    pub fn delete_account_type(&self, id: Uuid, user: &str) -> DeskResult<()> {
        if !self.account_types.contains_key(&id) {
            return Err(DeskError::NotFound(format!("account type {}", id)));
        }
        let referenced = self
            .accounts
            .iter()
            .any(|r| r.value().account_type_id == Some(id));
        if referenced {
            return Err(DeskError::Constraint(format!(
                "account type {} is still referenced by accounts",
                id
            )));
        }
        self.account_types.remove(&id);
        self.log_audit(
            user,
            AuditAction::Delete,
            "account_type",
            &id.to_string(),
            serde_json::json!({}),
        );
        Ok(())
    }

    // ─── Subscribers ───────────────────────────────────────────────────────

    pub fn list_subscribers(&self) -> Vec<Subscriber> {
        let mut subscribers: Vec<Subscriber> =
            self.subscribers.iter().map(|r| r.value().clone()).collect();
        subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        subscribers
    }

    pub fn get_subscriber(&self, id: Uuid) -> Option<Subscriber> {
        self.subscribers.get(&id).map(|r| r.value().clone())
    }

    /// Rejects a duplicate `(name, contact)` pair without creating a
    /// second document.
    pub fn create_subscriber(
        &self,
        req: CreateSubscriberRequest,
        user: &str,
    ) -> DeskResult<Subscriber> {
        let duplicate = self
            .subscribers
            .iter()
            .any(|r| r.value().name == req.name && r.value().contact == req.contact);
        if duplicate {
            return Err(DeskError::Duplicate(format!(
                "subscriber ({}, {}) already exists",
                req.name, req.contact
            )));
        }

        let now = Utc::now();
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            name: req.name,
            contact: req.contact,
            subscriptions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let id = subscriber.id;
        self.subscribers.insert(id, subscriber.clone());
        self.log_audit(
            user,
            AuditAction::Create,
            "subscriber",
            &id.to_string(),
            serde_json::json!({"name": &subscriber.name}),
        );
        Ok(subscriber)
    }

    pub fn update_subscriber(
        &self,
        id: Uuid,
        req: UpdateSubscriberRequest,
        user: &str,
    ) -> Option<Subscriber> {
        self.subscribers.get_mut(&id).map(|mut entry| {
            let s = entry.value_mut();
            if let Some(name) = req.name {
                s.name = name;
            }
            if let Some(contact) = req.contact {
                s.contact = contact;
            }
            s.updated_at = Utc::now();
            self.log_audit(
                user,
                AuditAction::Update,
                "subscriber",
                &id.to_string(),
                serde_json::json!({}),
            );
            s.clone()
        })
    }

    /// Fails when any slot-holding subscription still references the
    /// subscriber.
    pub fn delete_subscriber(&self, id: Uuid, user: &str) -> DeskResult<()> {
        if !self.subscribers.contains_key(&id) {
            return Err(DeskError::NotFound(format!("subscriber {}", id)));
        }
        let holding = self
            .subscriptions
            .iter()
            .filter(|r| r.value().subscriber_id == id && r.value().status.holds_slot())
            .count();
        if holding > 0 {
            return Err(DeskError::Constraint(format!(
                "subscriber {} still has {} active subscription(s)",
                id, holding
            )));
        }
        self.subscribers.remove(&id);
        self.subscriber_usage.remove(&id);
        self.log_audit(
            user,
            AuditAction::Delete,
            "subscriber",
            &id.to_string(),
            serde_json::json!({}),
        );
        Ok(())
    }

    // ─── Subscriptions (reads; mutations live in lifecycle.rs) ─────────────

    pub fn list_subscriptions(&self) -> Vec<Subscription> {
        let mut subscriptions: Vec<Subscription> =
            self.subscriptions.iter().map(|r| r.value().clone()).collect();
        subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        subscriptions
    }

    pub fn get_subscription(&self, id: Uuid) -> Option<Subscription> {
        self.subscriptions.get(&id).map(|r| r.value().clone())
    }

    // ─── Usage aggregates ──────────────────────────────────────────────────

    pub fn get_account_usage(&self, account_id: Uuid) -> Option<AccountUsage> {
        self.account_usage.get(&account_id).map(|r| r.value().clone())
    }

    pub fn get_subscriber_usage(&self, subscriber_id: Uuid) -> Option<SubscriberUsage> {
        self.subscriber_usage
            .get(&subscriber_id)
            .map(|r| r.value().clone())
    }

    // ─── Audit Log ─────────────────────────────────────────────────────────

    pub fn get_audit_log(&self) -> Vec<AuditLogEntry> {
        let mut entries: Vec<AuditLogEntry> =
            self.audit_log.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub(crate) fn log_audit(
        &self,
        user: &str,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        details: serde_json::Value,
    ) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user: user.to_string(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: Utc::now(),
        };
        self.audit_log.insert(entry.id, entry);
    }
}

impl Default for DeskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Random 4-digit slot PIN.
fn generate_pin() -> String {
    let mut rng = rand::thread_rng();
    format!("{:04}", rng.gen_range(0..10_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_from_type() {
        let store = DeskStore::new();
        let t = store.create_account_type(
            CreateAccountTypeRequest {
                name: "Premium 4K".into(),
                slots: 4,
            },
            "admin",
        );
        let account = store
            .create_account(
                CreateAccountRequest {
                    email: "shared@example.com".into(),
                    password: "hunter2".into(),
                    account_type_id: Some(t.id),
                    slot_count: None,
                },
                "admin",
            )
            .unwrap();

        assert_eq!(account.slots.len(), 4);
        assert_eq!(account.slots[0].id, "slot-1");
        assert_eq!(account.slots[3].id, "slot-4");
        assert!(account.slots.iter().all(|s| !s.is_occupied));
        assert!(account.slots.iter().all(|s| s.pin.len() == 4));
    }

    #[test]
    fn test_create_account_requires_slot_source() {
        let store = DeskStore::new();
        let err = store
            .create_account(
                CreateAccountRequest {
                    email: "x@example.com".into(),
                    password: "pw".into(),
                    account_type_id: None,
                    slot_count: None,
                },
                "admin",
            )
            .unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
    }

    #[test]
    fn test_duplicate_subscriber_rejected() {
        let store = DeskStore::new();
        store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Ali".into(),
                    contact: "0300-1234567".into(),
                },
                "admin",
            )
            .unwrap();

        let err = store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Ali".into(),
                    contact: "0300-1234567".into(),
                },
                "admin",
            )
            .unwrap_err();

        assert!(matches!(err, DeskError::Duplicate(_)));
        assert_eq!(store.list_subscribers().len(), 1);
    }

    #[test]
    fn test_same_name_different_contact_allowed() {
        let store = DeskStore::new();
        store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Ali".into(),
                    contact: "0300-1111111".into(),
                },
                "admin",
            )
            .unwrap();
        store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Ali".into(),
                    contact: "0300-2222222".into(),
                },
                "admin",
            )
            .unwrap();
        assert_eq!(store.list_subscribers().len(), 2);
    }

    #[test]
    fn test_delete_account_type_in_use() {
        let store = DeskStore::new();
        let t = store.create_account_type(
            CreateAccountTypeRequest {
                name: "Standard".into(),
                slots: 2,
            },
            "admin",
        );
        store
            .create_account(
                CreateAccountRequest {
                    email: "a@example.com".into(),
                    password: "pw".into(),
                    account_type_id: Some(t.id),
                    slot_count: None,
                },
                "admin",
            )
            .unwrap();

        let err = store.delete_account_type(t.id, "admin").unwrap_err();
        assert!(matches!(err, DeskError::Constraint(_)));
        assert_eq!(store.list_account_types().len(), 1);
    }

    #[test]
    fn test_audit_log_records_mutations() {
        let store = DeskStore::new();
        store
            .create_subscriber(
                CreateSubscriberRequest {
                    name: "Sara".into(),
                    contact: "0301-7654321".into(),
                },
                "admin",
            )
            .unwrap();
        let log = store.get_audit_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, AuditAction::Create);
        assert_eq!(log[0].resource_type, "subscriber");
    }
}
