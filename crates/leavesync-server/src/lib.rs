//! leavesync-server
//!
//! HTTP surface for the approval-sync engine (§4.10):
//!   GET/POST /callback                  — push-callback endpoint
//!   GET      /api/sync/status           — cursor, scheduler flags, active count
//!   POST     /api/sync/start|stop       — toggle the incremental poller
//!   POST     /api/sync/reset-cursor     — rewind the incremental cursor
//!   POST     /api/sync/trigger          — manual incremental cycle (409/429)
//!   POST     /api/status-check/start|stop|trigger
//!   GET      /api/approvals/active      — dump the active index

pub mod error;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use server::{router, serve, AppState};
