//! Order mutations and status, wired to storage and the audit trail.
//!
//! Every call gathers its inputs fresh (window settings, lock state,
//! existing order) and then runs the pure clock and gate checks. Nothing
//! is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use friday_core::{CycleKey, NewOrder, OrderDraft, OrderError, OrderId, OrderRecord, StoreError, UserId};

use crate::audit::{AuditEvent, AuditEventKind, AuditSink};
use crate::clock::{Countdown, RecurrenceClock};
use crate::gate::{self, GateState};
use crate::store::{OrderStore, SettingsSource};
use crate::window::{WindowConfig, END_KEY, START_KEY};

/// Snapshot for rendering the ordering view.
#[derive(Debug, Clone, Serialize)]
pub struct OrderingStatus {
    pub cycle: CycleKey,
    pub window: WindowConfig,
    pub window_open: bool,
    pub cycle_locked: bool,
    pub can_mutate: bool,
    pub countdown: Countdown,
    pub next_window_start: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_order: Option<OrderRecord>,
}

pub struct OrderService<S> {
    pub(crate) store: S,
    pub(crate) clock: RecurrenceClock,
    pub(crate) audit: Arc<dyn AuditSink>,
}

impl<S> OrderService<S>
where
    S: OrderStore + SettingsSource,
{
    pub fn new(store: S, clock: RecurrenceClock, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, clock, audit }
    }

    pub fn clock(&self) -> &RecurrenceClock {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Effective window. Missing, malformed or unreadable settings fall back to defaults.
    pub async fn window_config(&self) -> WindowConfig {
        let start = self.setting(START_KEY).await;
        let end = self.setting(END_KEY).await;
        WindowConfig::from_settings(start.as_deref(), end.as_deref())
    }

    /// Current cycle, window state and countdown, plus the member's order if one is given.
    ///
    /// An unreadable lock flag is reported as locked.
    pub async fn status(&self, user_id: Option<&UserId>, now: DateTime<Utc>) -> OrderingStatus {
        let window = self.window_config().await;
        let cycle = self.clock.current_cycle_key(now);
        let window_open = self.clock.is_window_open(now, &window);

        let cycle_locked = self.store.is_cycle_locked(cycle).await.unwrap_or_else(|e| {
            warn!(cycle = %cycle, error = %e, "lock state unavailable, treating cycle as locked");
            true
        });

        let existing_order = match user_id {
            Some(user_id) => self.store.find_order(user_id, cycle).await.unwrap_or_else(|e| {
                warn!(user_id = %user_id, cycle = %cycle, error = %e, "existing order unavailable");
                None
            }),
            None => None,
        };

        OrderingStatus {
            cycle,
            window,
            window_open,
            cycle_locked,
            can_mutate: GateState::new(window_open, cycle_locked).can_mutate(),
            countdown: self.clock.time_until_next_window(now, &window),
            next_window_start: self.clock.next_window_start(now, &window),
            existing_order,
        }
    }

    /// Place the member's order for the current cycle.
    pub async fn create_order(
        &self,
        user_id: &UserId,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> Result<OrderRecord, OrderError> {
        let draft = gate::validate_draft(draft)?;
        let cycle = self.admit(now).await?;

        let existing = self
            .store
            .find_order(user_id, cycle)
            .await
            .map_err(unavailable)?;
        gate::plan_create(cycle, existing.as_ref())?;

        let record = self
            .store
            .insert_order(NewOrder {
                user_id: user_id.clone(),
                cycle,
                item: draft.item,
                variant: draft.variant,
                notes: draft.notes,
            })
            .await
            .map_err(|e| match e {
                // A concurrent create won the race between find and insert.
                StoreError::Conflict(_) => OrderError::DuplicateOrder { cycle },
                other => OrderError::Store(other),
            })?;

        self.audit.record(AuditEvent::new(
            AuditEventKind::OrderCreated,
            Some(user_id.clone()),
            order_payload(&record),
        ));
        info!(user_id = %user_id, cycle = %cycle, order_id = %record.id, "order created");
        Ok(record)
    }

    /// Modify the member's existing order for the current cycle.
    pub async fn update_order(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> Result<OrderRecord, OrderError> {
        let draft = gate::validate_draft(draft)?;
        let cycle = self.admit(now).await?;

        let existing = self
            .store
            .find_order(user_id, cycle)
            .await
            .map_err(unavailable)?;
        gate::plan_update(existing.as_ref(), order_id)?;

        let record = self.store.update_order(order_id, &draft).await?;

        let mut payload = order_payload(&record);
        payload["order_id"] = json!(record.id);
        self.audit.record(AuditEvent::new(
            AuditEventKind::OrderUpdated,
            Some(user_id.clone()),
            payload,
        ));
        info!(user_id = %user_id, cycle = %cycle, order_id = %record.id, "order updated");
        Ok(record)
    }

    /// All orders of the current cycle, oldest first.
    pub async fn cycle_orders(&self, now: DateTime<Utc>) -> Result<(CycleKey, Vec<OrderRecord>), OrderError> {
        let cycle = self.clock.current_cycle_key(now);
        let orders = self.store.list_orders(cycle).await.map_err(unavailable)?;
        Ok((cycle, orders))
    }

    /// Run the window/lock gate for `now` and return the cycle it admits.
    async fn admit(&self, now: DateTime<Utc>) -> Result<CycleKey, OrderError> {
        let window = self.window_config().await;
        let cycle = self.clock.current_cycle_key(now);
        let cycle_locked = self
            .store
            .is_cycle_locked(cycle)
            .await
            .map_err(unavailable)?;

        let state = GateState::new(self.clock.is_window_open(now, &window), cycle_locked);
        if let Err(e) = state.check() {
            debug!(cycle = %cycle, window = %window, ?state, "mutation refused");
            return Err(e);
        }
        Ok(cycle)
    }

    async fn setting(&self, key: &str) -> Option<String> {
        match self.store.get_setting(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "settings unavailable");
                None
            }
        }
    }
}

fn unavailable(e: StoreError) -> OrderError {
    OrderError::Unavailable(e.to_string())
}

fn order_payload(record: &OrderRecord) -> serde_json::Value {
    json!({
        "user_id": record.user_id,
        "friday_date": record.cycle,
        "item": record.item,
        "variant": record.variant,
        "notes": record.notes,
    })
}
