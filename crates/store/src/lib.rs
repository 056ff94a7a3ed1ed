//! Slot-and-subscription bookkeeping for the SlotDesk dashboard backend.
//!
//! One in-memory store holds accounts (with embedded slots), subscribers
//! (with denormalized subscription refs), subscription rows, and usage
//! aggregates; the lifecycle operations keep them mutually consistent.
//! Data stored in DashMap (development); swap to PostgreSQL for production.

pub mod lifecycle;
pub mod models;
pub mod reports;
pub mod seed;
pub mod store;

pub use store::DeskStore;
