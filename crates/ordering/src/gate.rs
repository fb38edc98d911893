//! Mutation gate for a member's cycle order.
//!
//! Pure predicates: inputs are gathered by the caller (clock result, lock
//! state, existing record) and nothing is remembered between calls.

use serde::Serialize;

use friday_core::{CycleKey, OrderDraft, OrderError, OrderId, OrderRecord};

/// Maximum length of order notes, in characters.
pub const NOTES_MAX_CHARS: usize = 100;

/// Window and lock inputs for one mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateState {
    pub window_open: bool,
    pub cycle_locked: bool,
}

impl GateState {
    pub fn new(window_open: bool, cycle_locked: bool) -> Self {
        Self {
            window_open,
            cycle_locked,
        }
    }

    pub fn can_mutate(&self) -> bool {
        self.window_open && !self.cycle_locked
    }

    /// Lock takes precedence over a closed window when both apply.
    pub fn check(&self) -> Result<(), OrderError> {
        if self.cycle_locked {
            Err(OrderError::CycleLocked)
        } else if !self.window_open {
            Err(OrderError::WindowClosed)
        } else {
            Ok(())
        }
    }
}

/// Validate and normalize a draft before it goes anywhere near storage.
///
/// The notes cap applies to the raw input; accepted notes are trimmed and
/// blank notes are dropped.
pub fn validate_draft(draft: &OrderDraft) -> Result<OrderDraft, OrderError> {
    let item = draft.item.trim();
    let variant = draft.variant.trim();
    if item.is_empty() || variant.is_empty() {
        return Err(OrderError::MissingSelection);
    }

    let notes = match draft.notes.as_deref() {
        Some(raw) => {
            let len = raw.chars().count();
            if len > NOTES_MAX_CHARS {
                return Err(OrderError::NotesTooLong {
                    len,
                    max: NOTES_MAX_CHARS,
                });
            }
            Some(raw.trim()).filter(|n| !n.is_empty()).map(str::to_string)
        }
        None => None,
    };

    Ok(OrderDraft {
        item: item.to_string(),
        variant: variant.to_string(),
        notes,
    })
}

/// A member may hold at most one order per cycle.
pub fn plan_create(cycle: CycleKey, existing: Option<&OrderRecord>) -> Result<(), OrderError> {
    match existing {
        Some(_) => Err(OrderError::DuplicateOrder { cycle }),
        None => Ok(()),
    }
}

/// Only the member's own record for the cycle may be updated.
pub fn plan_update(existing: Option<&OrderRecord>, order_id: OrderId) -> Result<(), OrderError> {
    match existing {
        Some(record) if record.id == order_id => Ok(()),
        _ => Err(OrderError::OrderNotFound),
    }
}
