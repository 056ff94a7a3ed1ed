//! Domain types — accounts, slots, subscribers, subscriptions, usage
//! aggregates, audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Account ───────────────────────────────────────────────────────────────

/// A streaming-service login shared across multiple renters via slots.
///
/// The password is stored in plaintext because the external provider's
/// login form needs it verbatim. Standing security defect, inherited from
/// the product requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub account_type_id: Option<Uuid>,
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One seat within an account, assignable to one subscriber at a time.
///
/// Invariant: `is_occupied` is true exactly while a slot-holding
/// subscription references this slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub pin: String,
    pub is_occupied: bool,
    pub current_subscriber: Option<Uuid>,
    pub last_subscriber: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
}

/// Template controlling how many slots a newly created account gets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountType {
    pub id: Uuid,
    pub name: String,
    pub slots: u32,
}

// ─── Subscriber ────────────────────────────────────────────────────────────

/// A paying customer renting one or more slots. Carries a denormalized
/// back-reference list of subscription ids and statuses so the dashboard
/// reads without joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRef {
    pub id: Uuid,
    pub status: SubscriptionStatus,
}

// ─── Subscription ──────────────────────────────────────────────────────────

/// A time-boxed assignment of one subscriber to one slot on one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub account_id: Uuid,
    pub slot_id: String,
    pub subscriber_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_due_date: DateTime<Utc>,
    pub paid_price: f64,
    pub account_price: Option<f64>,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    PendingRenewal,
    Suspended,
    Cancelled,
}

impl SubscriptionStatus {
    /// Statuses that occupy a slot. Expired and cancelled subscriptions
    /// have released theirs.
    pub fn holds_slot(self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PendingRenewal
                | SubscriptionStatus::Suspended
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Overdue,
    Pending,
    Partial,
    Free,
}

impl PaymentStatus {
    /// True for statuses a payment reminder should chase.
    pub fn needs_payment(self) -> bool {
        !matches!(self, PaymentStatus::Paid | PaymentStatus::Free)
    }
}

// ─── Usage aggregates ──────────────────────────────────────────────────────
//
// Best-effort denormalized counters updated alongside subscription writes.
// "Active" counts slot-holding subscriptions.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountUsage {
    pub account_id: Uuid,
    pub total_subscriptions: u64,
    pub active_subscriptions: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SlotUsage {
    pub account_id: Uuid,
    pub slot_id: String,
    pub total_subscriptions: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubscriberUsage {
    pub subscriber_id: Uuid,
    pub total_subscriptions: u64,
    pub active_subscriptions: u64,
    pub total_payments: f64,
}

// ─── Reports ───────────────────────────────────────────────────────────────

/// Union of the two disjoint reminder ranges.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReminders {
    pub upcoming: Vec<Subscription>,
    pub overdue: Vec<OverdueReminder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueReminder {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingBalance {
    pub subscriber_id: Uuid,
    pub total_billed: f64,
    pub total_paid: f64,
    pub outstanding: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub total_accounts: u64,
    pub total_slots: u64,
    pub occupied_slots: u64,
    pub suspended_slots: u64,
    pub total_subscribers: u64,
    pub active_subscriptions: u64,
    pub total_subscriptions: u64,
    pub total_revenue: f64,
    pub overdue_payments: u64,
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Cancel,
    Renew,
    Suspend,
}

// ─── API Request/Response types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    /// Slot count comes from the referenced account type when set.
    pub account_type_id: Option<Uuid>,
    /// Explicit slot count, used when no account type is given.
    pub slot_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountTypeRequest {
    pub name: String,
    pub slots: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriberRequest {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriberRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub account_id: Uuid,
    pub slot_id: String,
    pub subscriber_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub paid_price: f64,
    #[serde(default)]
    pub account_price: Option<f64>,
    pub payment_status: PaymentStatus,
    /// Defaults to `start_date` when omitted.
    #[serde(default)]
    pub payment_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub revision: u64,
}
