//! Storage boundary for settings and orders.
//!
//! The hosted data store is an external collaborator; these traits are the
//! only surface the ordering core needs from it. [`MemoryStore`] backs tests
//! and the CLI.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use friday_core::{CycleKey, NewOrder, OrderDraft, OrderId, OrderRecord, StoreError, UserId};

/// Key-value settings storage.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a setting (last write wins).
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The member's order for a cycle, if any.
    async fn find_order(&self, user_id: &UserId, cycle: CycleKey) -> Result<Option<OrderRecord>, StoreError>;

    /// True if any order in the cycle carries `locked = true`.
    async fn is_cycle_locked(&self, cycle: CycleKey) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] if (user, cycle) already has an order.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    async fn update_order(&self, id: OrderId, draft: &OrderDraft) -> Result<OrderRecord, StoreError>;

    async fn list_orders(&self, cycle: CycleKey) -> Result<Vec<OrderRecord>, StoreError>;

    /// Set `locked` on every order of the cycle, returning how many were touched.
    async fn set_cycle_locked(&self, cycle: CycleKey, locked: bool) -> Result<usize, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    settings: HashMap<String, String>,
    orders: Vec<OrderRecord>,
    fail_reads: bool,
}

/// In-memory settings and order storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with existing records, e.g. an exported cycle.
    pub fn with_orders(orders: Vec<OrderRecord>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.write() {
            state.orders = orders;
        }
        store
    }

    /// Make every subsequent read fail with [`StoreError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) -> Result<(), StoreError> {
        self.write()?.fail_reads = fail;
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>, StoreError> {
        let guard = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        if guard.fail_reads {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(guard)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl SettingsSource for MemoryStore {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write()?.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_order(&self, user_id: &UserId, cycle: CycleKey) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .read()?
            .orders
            .iter()
            .find(|o| &o.user_id == user_id && o.cycle == cycle)
            .cloned())
    }

    async fn is_cycle_locked(&self, cycle: CycleKey) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .orders
            .iter()
            .any(|o| o.cycle == cycle && o.locked))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let mut state = self.write()?;
        // Unique (user_id, friday_date), checked under the same write lock as the insert.
        if state
            .orders
            .iter()
            .any(|o| o.user_id == order.user_id && o.cycle == order.cycle)
        {
            return Err(StoreError::Conflict(format!(
                "order for {} in cycle {}",
                order.user_id, order.cycle
            )));
        }

        let now = Utc::now();
        let record = OrderRecord {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            cycle: order.cycle,
            item: order.item,
            variant: order.variant,
            notes: order.notes,
            locked: false,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(record.clone());
        Ok(record)
    }

    async fn update_order(&self, id: OrderId, draft: &OrderDraft) -> Result<OrderRecord, StoreError> {
        let mut state = self.write()?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;
        order.item = draft.item.clone();
        order.variant = draft.variant.clone();
        order.notes = draft.notes.clone();
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn list_orders(&self, cycle: CycleKey) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<OrderRecord> = self
            .read()?
            .orders
            .iter()
            .filter(|o| o.cycle == cycle)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// A cycle without orders stays unlocked, since the lock lives on the records.
    async fn set_cycle_locked(&self, cycle: CycleKey, locked: bool) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        let now = Utc::now();
        let mut touched = 0;
        for order in state.orders.iter_mut().filter(|o| o.cycle == cycle) {
            order.locked = locked;
            order.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() -> CycleKey {
        "2026-10-16".parse().unwrap()
    }

    fn new_order(user: &str) -> NewOrder {
        NewOrder {
            user_id: UserId::new(user),
            cycle: cycle(),
            item: "Pizza".into(),
            variant: "Margherita".into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let rec = store.insert_order(new_order("u1")).await.unwrap();
        let found = store.find_order(&UserId::new("u1"), cycle()).await.unwrap();
        assert_eq!(found, Some(rec));
        assert!(store.find_order(&UserId::new("u2"), cycle()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_same_user_and_cycle_conflicts() {
        let store = MemoryStore::new();
        store.insert_order(new_order("u1")).await.unwrap();

        let err = store.insert_order(new_order("u1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_orders(cycle()).await.unwrap().len(), 1);

        let mut next_week = new_order("u1");
        next_week.cycle = "2026-10-23".parse().unwrap();
        assert!(store.insert_order(next_week).await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_applies_cycle_wide() {
        let store = MemoryStore::new();
        store.insert_order(new_order("u1")).await.unwrap();
        store.insert_order(new_order("u2")).await.unwrap();
        assert!(!store.is_cycle_locked(cycle()).await.unwrap());

        assert_eq!(store.set_cycle_locked(cycle(), true).await.unwrap(), 2);
        assert!(store.is_cycle_locked(cycle()).await.unwrap());
        assert!(store.list_orders(cycle()).await.unwrap().iter().all(|o| o.locked));
    }

    #[tokio::test]
    async fn test_lock_on_empty_cycle_has_no_effect() {
        let store = MemoryStore::new();
        assert_eq!(store.set_cycle_locked(cycle(), true).await.unwrap(), 0);
        assert!(!store.is_cycle_locked(cycle()).await.unwrap());
    }

    #[tokio::test]
    async fn test_with_orders_seeds_records() {
        let seed = MemoryStore::new();
        seed.insert_order(new_order("u1")).await.unwrap();
        seed.set_cycle_locked(cycle(), true).await.unwrap();
        let records = seed.list_orders(cycle()).await.unwrap();

        let store = MemoryStore::with_orders(records);
        assert!(store.is_cycle_locked(cycle()).await.unwrap());
        assert!(store.find_order(&UserId::new("u1"), cycle()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let store = MemoryStore::new();
        let err = store
            .update_order(Uuid::new_v4(), &OrderDraft::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let store = MemoryStore::new();
        store.put_setting("ordering_start_time", "10:00").await.unwrap();
        store.fail_reads(true).unwrap();
        assert!(matches!(
            store.get_setting("ordering_start_time").await,
            Err(StoreError::Unavailable(_))
        ));
        store.fail_reads(false).unwrap();
        assert_eq!(
            store.get_setting("ordering_start_time").await.unwrap().as_deref(),
            Some("10:00")
        );
    }
}
