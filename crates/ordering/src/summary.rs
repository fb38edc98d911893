//! Consolidated cycle order for the restaurant.

use std::collections::HashSet;

use serde::Serialize;

use friday_core::{CycleKey, DispatchError, OrderRecord, UserProfile};

/// One `item: variant` line with its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub item: String,
    pub variant: String,
    pub count: usize,
}

impl OrderLine {
    pub fn label(&self) -> String {
        format!("{}: {}", self.item, self.variant)
    }
}

/// Group orders by item and variant, keeping first-seen order.
pub fn summarize(orders: &[OrderRecord]) -> Vec<OrderLine> {
    let mut lines: Vec<OrderLine> = Vec::new();
    for order in orders {
        match lines
            .iter_mut()
            .find(|l| l.item == order.item && l.variant == order.variant)
        {
            Some(line) => line.count += 1,
            None => lines.push(OrderLine {
                item: order.item.clone(),
                variant: order.variant.clone(),
                count: 1,
            }),
        }
    }
    lines
}

/// Message body sent to the restaurant.
pub fn dispatch_text(restaurant: &str, orders: &[OrderRecord], contact_phone: Option<&str>) -> String {
    let lines = summarize(orders)
        .iter()
        .map(|l| format!("{} x{}", l.label(), l.count))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Friday order – {}: {} meals. {}. Contact: {}.",
        restaurant,
        orders.len(),
        lines,
        contact_phone.filter(|p| !p.trim().is_empty()).unwrap_or("N/A")
    )
}

/// The cycle can be sent once: it must have orders and all of them must be locked.
pub fn check_dispatch_ready(
    cycle: CycleKey,
    orders: &[OrderRecord],
    already_sent: bool,
) -> Result<(), DispatchError> {
    if already_sent {
        return Err(DispatchError::AlreadySent { cycle });
    }
    if orders.is_empty() {
        return Err(DispatchError::NoOrders);
    }
    if !orders.iter().all(|o| o.locked) {
        return Err(DispatchError::NotLocked);
    }
    Ok(())
}

/// Whitelisted members with no order in `orders`.
pub fn missing_users<'a>(users: &'a [UserProfile], orders: &[OrderRecord]) -> Vec<&'a UserProfile> {
    let ordered: HashSet<&str> = orders.iter().map(|o| o.user_id.as_str()).collect();
    users
        .iter()
        .filter(|u| u.whitelisted && !ordered.contains(u.id.as_str()))
        .collect()
}
