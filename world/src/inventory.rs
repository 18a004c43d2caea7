//! Item counts carried by an entity.

use std::collections::BTreeMap;

/// Mapping from item name to a strictly positive count.
///
/// Entries whose count would drop to zero or below are removed, so absence
/// and zero are indistinguishable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` of `item`; negative amounts remove. Returns the resulting count.
    pub fn add(&mut self, item: &str, amount: i64) -> u32 {
        let current = i64::from(self.amount(item));
        let total = current.saturating_add(amount);
        if total <= 0 {
            let _ = self.items.remove(item);
            return 0;
        }

        let total = u32::try_from(total).unwrap_or(u32::MAX);
        let _ = self.items.insert(item.to_owned(), total);
        total
    }

    /// Removes up to `amount` of `item`. Returns the resulting count.
    pub fn remove(&mut self, item: &str, amount: u32) -> u32 {
        self.add(item, -i64::from(amount))
    }

    /// Count of `item` currently held.
    #[must_use]
    pub fn amount(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Reports whether the inventory holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reports whether every listed item is held in at least the listed amount.
    #[must_use]
    pub fn covers(&self, required: &BTreeMap<String, u32>) -> bool {
        required
            .iter()
            .all(|(item, amount)| self.amount(item) >= *amount)
    }

    /// Iterator over held items in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(item, amount)| (item.as_str(), *amount))
    }
}
