//! Audit trail for ordering activity.
//!
//! The ordering core only signals events through [`AuditSink`]; persisting
//! them is the sink's job. [`AuditLog`] is the in-memory sink, capped at a
//! configurable maximum (default 500) with FIFO eviction.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use friday_core::{CycleKey, UserId};

/// What happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    OrderCreated,
    OrderUpdated,
    OrdersLocked,
    OrdersUnlocked,
    TimeframeUpdated,
    SmsSent,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventKind::OrderCreated => "order_created",
            AuditEventKind::OrderUpdated => "order_updated",
            AuditEventKind::OrdersLocked => "orders_locked",
            AuditEventKind::OrdersUnlocked => "orders_unlocked",
            AuditEventKind::TimeframeUpdated => "timeframe_updated",
            AuditEventKind::SmsSent => "sms_sent",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AuditEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub payload: serde_json::Value,
}

impl AuditEvent {
    pub fn new(kind: AuditEventKind, user_id: Option<UserId>, payload: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            user_id,
            payload,
        }
    }

    /// Cycle the event refers to, read from the payload's `friday_date`.
    pub fn cycle(&self) -> Option<CycleKey> {
        self.payload
            .get("friday_date")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

/// Receiver for audit events emitted by the ordering core.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);

    /// Whether an event of `kind` was recorded for `cycle`.
    fn has_event_for_cycle(&self, kind: AuditEventKind, cycle: CycleKey) -> bool;
}

/// In-memory audit log with FIFO eviction.
///
/// Thread-safe via `std::sync::RwLock`.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<AuditEvent>>>,
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log with the default cap of 500 entries.
    pub fn new() -> Self {
        Self::with_max_entries(500)
    }

    /// Create a new audit log with a custom entry cap.
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries: max.max(1),
        }
    }

    /// Entries newest-first, optionally restricted to one kind.
    pub fn query(&self, kind: Option<AuditEventKind>, limit: Option<usize>) -> Vec<AuditEvent> {
        let guard = self.entries.read().expect("audit log lock poisoned");
        guard
            .iter()
            .rev()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .take(limit.unwrap_or(100))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("audit log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for AuditLog {
    fn record(&self, event: AuditEvent) {
        let mut guard = self.entries.write().expect("audit log lock poisoned");
        guard.push_back(event);
        while guard.len() > self.max_entries {
            guard.pop_front();
        }
    }

    fn has_event_for_cycle(&self, kind: AuditEventKind, cycle: CycleKey) -> bool {
        let guard = self.entries.read().expect("audit log lock poisoned");
        guard
            .iter()
            .any(|e| e.kind == kind && e.cycle() == Some(cycle))
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
