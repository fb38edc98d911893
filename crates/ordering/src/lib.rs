//! Weekly ordering window and order gating.
//!
//! This crate provides:
//! - A recurrence clock for the weekly ordering day in a fixed civil timezone
//! - Window configuration with lenient settings fallback and strict admin validation
//! - The order gate (window/lock predicate, one order per member per cycle, notes cap)
//! - Storage traits with an in-memory implementation
//! - An order service wiring the above to storage and the audit log
//! - Administrator operations: cycle lock, window changes, dispatch
//! - Consolidated order summaries for dispatch to the restaurant

pub mod admin;
pub mod audit;
pub mod clock;
pub mod gate;
pub mod service;
pub mod store;
pub mod summary;
pub mod window;

pub use admin::{AdminError, Dispatch, LockOutcome};
pub use audit::{AuditEvent, AuditEventKind, AuditLog, AuditSink};
pub use clock::{Countdown, RecurrenceClock};
pub use gate::{GateState, NOTES_MAX_CHARS};
pub use service::{OrderService, OrderingStatus};
pub use store::{MemoryStore, OrderStore, SettingsSource};
pub use window::{TimeOfDay, WindowConfig, WindowConfigError};
