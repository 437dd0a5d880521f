//! Missing-information policy: which required slots an intent still lacks.

use super::intent::Intent;
use super::slots::{ParameterSet, Slot};

/// Slots an intent cannot be answered without, in asking order.
pub fn required_slots(intent: Intent) -> &'static [Slot] {
    match intent {
        Intent::OrderStatus => &[Slot::OrderId],
        Intent::StockLevels | Intent::ProductDetails => &[Slot::ProductName],
        Intent::CustomerOrders => &[Slot::UserId],
        Intent::TopProducts | Intent::SalesSummary | Intent::General => &[],
    }
}

/// Required slots absent from `params`. Empty means the query is answerable.
///
/// A text slot holding only whitespace counts as absent.
pub fn missing_slots(intent: Intent, params: &ParameterSet) -> Vec<Slot> {
    required_slots(intent)
        .iter()
        .copied()
        .filter(|slot| match params.get(*slot) {
            None => true,
            Some(value) => value.as_text().is_some_and(|s| s.trim().is_empty()),
        })
        .collect()
}

/// Human-readable labels for a list of slots, e.g. `["order ID"]`.
pub fn labels(slots: &[Slot]) -> Vec<&'static str> {
    slots.iter().map(|s| s.label()).collect()
}
