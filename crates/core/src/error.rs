use thiserror::Error;

use crate::model::CycleKey;

/// Failures reported by an external storage collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Why an order mutation was refused.
///
/// Everything except `Unavailable` and `Store` is a rejected attempt the
/// member can retry with different input or at a different time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Ordering window is closed")]
    WindowClosed,

    #[error("Orders for this cycle are locked")]
    CycleLocked,

    #[error("An order already exists for cycle {cycle}")]
    DuplicateOrder { cycle: CycleKey },

    #[error("Notes must be {max} characters or less (got {len})")]
    NotesTooLong { len: usize, max: usize },

    #[error("Please select both item and variant")]
    MissingSelection,

    #[error("No matching order to update")]
    OrderNotFound,

    #[error("Could not verify ordering state: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// True for refusals caused by the attempt itself, false for backend failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, OrderError::Unavailable(_) | OrderError::Store(_))
    }
}

/// Why a consolidated order cannot be sent to the restaurant yet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No orders found for this cycle")]
    NoOrders,

    #[error("Orders must be locked before sending")]
    NotLocked,

    #[error("Order already sent for cycle {cycle}")]
    AlreadySent { cycle: CycleKey },
}
