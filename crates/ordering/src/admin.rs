//! Administrator operations on the current cycle.
//!
//! Locking, window changes and the restaurant dispatch all go through the
//! same [`OrderService`] as member mutations, so they share its clock,
//! storage and audit sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use friday_core::{CycleKey, DispatchError, StoreError, UserId, UserProfile};

use crate::audit::{AuditEvent, AuditEventKind};
use crate::service::OrderService;
use crate::store::{OrderStore, SettingsSource};
use crate::summary::{self, OrderLine};
use crate::window::{WindowConfig, WindowConfigError, END_KEY, START_KEY};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error(transparent)]
    Window(#[from] WindowConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a lock toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockOutcome {
    pub cycle: CycleKey,
    pub locked: bool,
    /// Orders whose flag was set. Zero means the cycle stays unlocked.
    pub order_count: usize,
}

/// Consolidated order, checked and ready to hand to the messaging provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub cycle: CycleKey,
    pub order_count: usize,
    pub lines: Vec<OrderLine>,
    pub text: String,
}

impl<S> OrderService<S>
where
    S: OrderStore + SettingsSource,
{
    /// Lock or unlock every order of the current cycle.
    pub async fn set_cycle_locked(
        &self,
        admin: &UserId,
        locked: bool,
        now: DateTime<Utc>,
    ) -> Result<LockOutcome, AdminError> {
        let cycle = self.clock.current_cycle_key(now);
        let order_count = self.store.set_cycle_locked(cycle, locked).await?;

        let kind = if locked {
            AuditEventKind::OrdersLocked
        } else {
            AuditEventKind::OrdersUnlocked
        };
        self.audit.record(AuditEvent::new(
            kind,
            Some(admin.clone()),
            json!({ "friday_date": cycle, "order_count": order_count }),
        ));
        info!(admin = %admin, cycle = %cycle, locked, order_count, "cycle lock changed");

        Ok(LockOutcome { cycle, locked, order_count })
    }

    /// Validate and store a new ordering window. Nothing is written if either value is invalid.
    pub async fn update_window(&self, admin: &UserId, start: &str, end: &str) -> Result<WindowConfig, AdminError> {
        let window = WindowConfig::parse(start, end)?;
        let start_time = window.start().to_string();
        let end_time = window.end().to_string();

        self.store.put_setting(START_KEY, &start_time).await?;
        self.store.put_setting(END_KEY, &end_time).await?;

        self.audit.record(AuditEvent::new(
            AuditEventKind::TimeframeUpdated,
            Some(admin.clone()),
            json!({ "start_time": start_time, "end_time": end_time }),
        ));
        info!(admin = %admin, window = %window, "ordering window updated");
        Ok(window)
    }

    /// Build the restaurant message for the current cycle.
    ///
    /// Refused when the cycle has no orders, has unlocked orders, or was already sent.
    pub async fn prepare_dispatch(
        &self,
        restaurant: &str,
        contact_phone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Dispatch, AdminError> {
        let cycle = self.clock.current_cycle_key(now);
        let orders = self.store.list_orders(cycle).await?;
        let already_sent = self.audit.has_event_for_cycle(AuditEventKind::SmsSent, cycle);
        summary::check_dispatch_ready(cycle, &orders, already_sent)?;

        Ok(Dispatch {
            cycle,
            order_count: orders.len(),
            lines: summary::summarize(&orders),
            text: summary::dispatch_text(restaurant, &orders, contact_phone),
        })
    }

    /// Mark the dispatch as sent. Later `prepare_dispatch` calls for the cycle are refused.
    pub fn record_dispatch(&self, admin: &UserId, dispatch: &Dispatch) {
        self.audit.record(AuditEvent::new(
            AuditEventKind::SmsSent,
            Some(admin.clone()),
            json!({ "friday_date": dispatch.cycle, "order_count": dispatch.order_count }),
        ));
        info!(admin = %admin, cycle = %dispatch.cycle, order_count = dispatch.order_count, "order dispatched");
    }

    /// Whitelisted members who have not ordered in the current cycle.
    pub async fn missing_members<'a>(
        &self,
        users: &'a [UserProfile],
        now: DateTime<Utc>,
    ) -> Result<Vec<&'a UserProfile>, AdminError> {
        let cycle = self.clock.current_cycle_key(now);
        let orders = self.store.list_orders(cycle).await?;
        Ok(summary::missing_users(users, &orders))
    }
}
