//! REST API for the SlotDesk dashboard — handlers, router, auth, server.

pub mod auth;
pub mod handlers;
pub mod router;
pub mod server;

pub use handlers::AppState;
pub use router::desk_router;
pub use server::ApiServer;
