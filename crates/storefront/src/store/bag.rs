//! The bag slice.

use bazaar_core::BagItemId;
use serde::Serialize;

use crate::api::types::BagItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BagState {
    pub items: Vec<BagItem>,
}

impl BagState {
    #[must_use]
    pub fn item(&self, id: &BagItemId) -> Option<&BagItem> {
        self.items.iter().find(|i| i.id == *id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BagAction {
    SetBag(Vec<BagItem>),
    /// Replace the line with the same ID, or append it.
    UpsertBagItem(BagItem),
    /// Quantities below 1 remove the line.
    SetBagQuantity { id: BagItemId, quantity: u32 },
    RemoveBagItem(BagItemId),
    ClearBag,
}

impl BagAction {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::SetBag(_) => "bag/setBag",
            Self::UpsertBagItem(_) => "bag/upsertBagItem",
            Self::SetBagQuantity { .. } => "bag/setBagQuantity",
            Self::RemoveBagItem(_) => "bag/removeBagItem",
            Self::ClearBag => "bag/clearBag",
        }
    }
}

pub(crate) fn reduce(state: &mut BagState, action: BagAction) {
    match action {
        BagAction::SetBag(items) => state.items = items,
        BagAction::UpsertBagItem(item) => {
            if let Some(existing) = state.items.iter_mut().find(|i| i.id == item.id) {
                *existing = item;
            } else {
                state.items.push(item);
            }
        }
        BagAction::SetBagQuantity { id, quantity } => {
            if quantity < 1 {
                state.items.retain(|i| i.id != id);
            } else if let Some(existing) = state.items.iter_mut().find(|i| i.id == id) {
                existing.quantity = quantity;
            }
        }
        BagAction::RemoveBagItem(id) => state.items.retain(|i| i.id != id),
        BagAction::ClearBag => state.items.clear(),
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::ProductId;

    use super::*;

    fn item(id: &str, quantity: u32) -> BagItem {
        BagItem {
            id: BagItemId::new(id),
            product_id: ProductId::new(format!("p-{id}")),
            quantity,
            selected_size: None,
            selected_color: None,
            product: None,
        }
    }

    #[test]
    fn test_quantity_below_one_removes() {
        let mut state = BagState::default();
        reduce(&mut state, BagAction::SetBag(vec![item("a", 1), item("b", 2)]));
        reduce(
            &mut state,
            BagAction::SetBagQuantity {
                id: "a".into(),
                quantity: 0,
            },
        );
        assert_eq!(state.items.len(), 1);
        assert!(state.item(&"a".into()).is_none());
    }

    #[test]
    fn test_set_quantity() {
        let mut state = BagState::default();
        reduce(&mut state, BagAction::SetBag(vec![item("a", 1)]));
        reduce(
            &mut state,
            BagAction::SetBagQuantity {
                id: "a".into(),
                quantity: 4,
            },
        );
        assert_eq!(state.item(&"a".into()).map(|i| i.quantity), Some(4));
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut state = BagState::default();
        reduce(&mut state, BagAction::UpsertBagItem(item("a", 1)));
        reduce(&mut state, BagAction::UpsertBagItem(item("a", 3)));
        reduce(&mut state, BagAction::UpsertBagItem(item("b", 1)));
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items.first().map(|i| i.quantity), Some(3));

        reduce(&mut state, BagAction::RemoveBagItem("a".into()));
        reduce(&mut state, BagAction::RemoveBagItem("a".into()));
        assert_eq!(state.items.len(), 1);

        reduce(&mut state, BagAction::ClearBag);
        assert!(state.items.is_empty());
    }
}
