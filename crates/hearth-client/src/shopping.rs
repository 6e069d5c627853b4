//! Client cache of the shared shopping list.

use hearth_core::{RealtimeEvent, ShoppingItem};

#[derive(Debug, Clone, Default)]
pub struct ShoppingListState {
    items: Vec<ShoppingItem>,
}

impl ShoppingListState {
    pub fn new(items: Vec<ShoppingItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn unchecked(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items.iter().filter(|item| !item.checked)
    }

    /// Apply a shopping event. Returns false for task events and for events
    /// that changed nothing.
    pub fn apply(&mut self, event: &RealtimeEvent) -> bool {
        match event {
            RealtimeEvent::ShoppingItemAdded(payload) => match &payload.shopping_item {
                Some(item) if self.position(item.id).is_none() => {
                    self.items.push(item.clone());
                    true
                }
                Some(item) => self.replace(item),
                None => false,
            },
            RealtimeEvent::ShoppingItemChecked(payload)
            | RealtimeEvent::ShoppingItemQuantityUpdated(payload) => payload
                .shopping_item
                .as_ref()
                .is_some_and(|item| self.replace(item)),
            RealtimeEvent::ShoppingItemDeleted(payload) => {
                match payload.shopping_item.as_ref().and_then(|item| self.position(item.id)) {
                    Some(index) => {
                        self.items.remove(index);
                        true
                    }
                    None => false,
                }
            }
            RealtimeEvent::ShoppingItemsCleared(_) => {
                let changed = !self.items.is_empty();
                self.items.clear();
                changed
            }
            _ => false,
        }
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn replace(&mut self, item: &ShoppingItem) -> bool {
        match self.position(item.id) {
            Some(index) => {
                self.items[index] = item.clone();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::ShoppingPayload;

    fn item(id: i64, name: &str) -> ShoppingItem {
        ShoppingItem {
            id,
            name: name.to_string(),
            quantity: 1,
            category_id: 1,
            checked: false,
            price: 0.0,
            created_at: Utc::now(),
        }
    }

    fn event(kind: fn(ShoppingPayload) -> RealtimeEvent, item: Option<ShoppingItem>) -> RealtimeEvent {
        RealtimeEvent::shopping(kind, item)
    }

    #[test]
    fn test_shopping_events() {
        let mut list = ShoppingListState::default();

        assert!(list.apply(&event(RealtimeEvent::ShoppingItemAdded, Some(item(1, "Milk")))));
        assert!(list.apply(&event(RealtimeEvent::ShoppingItemAdded, Some(item(2, "Eggs")))));
        assert_eq!(list.items().len(), 2);

        let mut checked = item(1, "Milk");
        checked.checked = true;
        assert!(list.apply(&event(RealtimeEvent::ShoppingItemChecked, Some(checked))));
        assert_eq!(list.unchecked().count(), 1);

        let mut more = item(2, "Eggs");
        more.quantity = 12;
        assert!(list.apply(&event(RealtimeEvent::ShoppingItemQuantityUpdated, Some(more))));
        assert_eq!(list.items()[1].quantity, 12);

        assert!(list.apply(&event(RealtimeEvent::ShoppingItemDeleted, Some(item(1, "Milk")))));
        assert_eq!(list.items().len(), 1);

        assert!(list.apply(&event(RealtimeEvent::ShoppingItemsCleared, None)));
        assert!(list.items().is_empty());
    }

    #[test]
    fn test_unknown_items_are_ignored() {
        let mut list = ShoppingListState::new(vec![item(1, "Milk")]);

        assert!(!list.apply(&event(RealtimeEvent::ShoppingItemChecked, Some(item(9, "Tea")))));
        assert!(!list.apply(&event(RealtimeEvent::ShoppingItemDeleted, Some(item(9, "Tea")))));
        assert_eq!(list.items().len(), 1);
    }
}
