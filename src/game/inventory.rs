use std::time::Duration;
use crate::game::{item_names, GameConfig, InventoryCount, Item, ItemTick};

#[derive(Clone, Debug)]
pub struct InventoryEntry {
    pub item: Item,
    pub quantity: u32,
}

/// Ordered collection of items with one of them held.
#[derive(Clone, Default, Debug)]
pub struct Inventory {
    entries: Vec<InventoryEntry>,
    held: usize,
}

impl Inventory {

    /// Builds an inventory from saved counts.
    /// Names missing from the catalogue and zero quantities are skipped.
    pub fn from_counts(config: &GameConfig, counts: &[InventoryCount]) -> Self {
        let mut inventory = Self::default();
        for count in counts {
            if count.quantity == 0 { continue }
            match config.item(&count.item) {
                Some(def) => {
                    let item = Item::new(def.clone());
                    for _ in 0..count.quantity {
                        inventory.add(item.clone());
                    }
                },
                None => log::warn!("Skipping unknown item '{}'", count.item),
            }
        }
        inventory
    }

    pub fn to_counts(&self) -> Vec<InventoryCount> {
        self.entries
            .iter()
            .map(|entry| InventoryCount { item: String::from(entry.item.name()), quantity: entry.quantity })
            .collect()
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn held(&self) -> Option<&Item> {
        self.entries.get(self.held).map(|entry| &entry.item)
    }

    pub fn held_mut(&mut self) -> Option<&mut Item> {
        self.entries.get_mut(self.held).map(|entry| &mut entry.item)
    }

    pub fn held_quantity(&self) -> u32 {
        self.entries.get(self.held).map(|entry| entry.quantity).unwrap_or(0)
    }

    pub fn is_held_in_use(&self) -> bool {
        self.held().map(Item::is_in_use).unwrap_or(false)
    }

    pub fn quantity(&self, name: &str) -> u32 {
        self.position(name)
            .map(|index| self.entries[index].quantity)
            .unwrap_or(0)
    }

    /// Adds one unit of an item, stacking it with an item of the same name.
    pub fn add(&mut self, item: Item) {
        match self.position(item.name()) {
            Some(index) => self.entries[index].quantity += 1,
            None => self.entries.push(InventoryEntry { item, quantity: 1 }),
        }
    }

    /// Holds the next item, wrapping around.
    /// Does nothing while the held item is in use.
    pub fn cycle(&mut self) -> bool {
        if self.is_held_in_use() || self.entries.is_empty() {
            return false;
        }
        self.held = (self.held + 1) % self.entries.len();
        true
    }

    /// Removes one unit of an item.
    /// The Knight's Sword can never be destroyed.
    /// Removing the last unit of the held item makes the Knight's Sword held.
    pub fn destroy(&mut self, name: &str) -> bool {
        if name == item_names::KNIGHT_SWORD {
            return false;
        }
        let Some(index) = self.position(name) else { return false };
        let entry = &mut self.entries[index];
        if entry.quantity > 1 {
            entry.quantity -= 1;
            return true;
        }
        self.entries.remove(index);
        if index == self.held {
            self.held = self.position(item_names::KNIGHT_SWORD).unwrap_or(0);
        }
        else if index < self.held {
            self.held -= 1;
        }
        true
    }

    /// Removes every item, returning them with their quantities.
    pub fn take_all(&mut self) -> Vec<InventoryEntry> {
        self.held = 0;
        std::mem::take(&mut self.entries)
    }

    /// Advances the held item's use.
    /// Consumed items are destroyed.
    pub fn tick(&mut self, delta: Duration) -> ItemTick {
        let Some(held) = self.held_mut() else { return ItemTick::Idle };
        let tick = held.tick(delta);
        if tick == ItemTick::Consumed {
            let name = String::from(held.name());
            self.destroy(&name);
        }
        tick
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.item.name() == name)
    }
}


#[cfg(test)]
mod test {
    use std::time::Duration;
    use crate::game::{item_names, GameConfig, Inventory, InventoryCount, Item, ItemTick};

    fn counts(counts: &[(&str, u32)]) -> Vec<InventoryCount> {
        counts
            .iter()
            .map(|(item, quantity)| InventoryCount { item: String::from(*item), quantity: *quantity })
            .collect()
    }

    #[test]
    fn cycle_wraps() {
        let config = GameConfig::default();
        let mut inventory = Inventory::from_counts(&config, &counts(&[
            (item_names::KNIGHT_SWORD, 1),
            (item_names::LESSER_HEALING, 2),
            (item_names::LANCE, 1),
        ]));
        assert_eq!(item_names::KNIGHT_SWORD, inventory.held().unwrap().name());
        inventory.cycle();
        inventory.cycle();
        assert_eq!(item_names::LANCE, inventory.held().unwrap().name());
        inventory.cycle();
        assert_eq!(item_names::KNIGHT_SWORD, inventory.held().unwrap().name());
    }

    #[test]
    fn cannot_cycle_while_in_use() {
        let config = GameConfig::default();
        let mut inventory = Inventory::from_counts(&config, &counts(&[
            (item_names::KNIGHT_SWORD, 1),
            (item_names::LANCE, 1),
        ]));
        inventory.held_mut().unwrap().start_use();
        assert!(!inventory.cycle());
        assert_eq!(item_names::KNIGHT_SWORD, inventory.held().unwrap().name());
    }

    #[test]
    fn pick_up_stacks() {
        let config = GameConfig::default();
        let mut inventory = Inventory::from_counts(&config, &counts(&[(item_names::KNIGHT_SWORD, 1)]));
        let potion = Item::new(config.item(item_names::LESSER_HEALING).unwrap().clone());
        inventory.add(potion.clone());
        inventory.add(potion);
        assert_eq!(2, inventory.len());
        assert_eq!(2, inventory.quantity(item_names::LESSER_HEALING));
    }

    #[test]
    fn knights_sword_is_protected() {
        let config = GameConfig::default();
        let mut inventory = Inventory::from_counts(&config, &counts(&[
            (item_names::KNIGHT_SWORD, 1),
            (item_names::LANCE, 1),
        ]));
        assert!(!inventory.destroy(item_names::KNIGHT_SWORD));
        assert_eq!(1, inventory.quantity(item_names::KNIGHT_SWORD));

        inventory.cycle();
        assert!(inventory.destroy(item_names::LANCE));
        assert_eq!(1, inventory.len());
        assert_eq!(item_names::KNIGHT_SWORD, inventory.held().unwrap().name());
    }

    #[test]
    fn used_potion_is_destroyed() {
        let config = GameConfig::default();
        let mut inventory = Inventory::from_counts(&config, &counts(&[
            (item_names::LESSER_HEALING, 1),
            (item_names::KNIGHT_SWORD, 1),
        ]));
        assert!(inventory.held_mut().unwrap().start_use());
        assert_eq!(ItemTick::InUse, inventory.tick(Duration::from_millis(500)));
        assert_eq!(ItemTick::Consumed, inventory.tick(Duration::from_millis(500)));
        assert_eq!(0, inventory.quantity(item_names::LESSER_HEALING));
        assert_eq!(item_names::KNIGHT_SWORD, inventory.held().unwrap().name());
    }

    #[test]
    fn unknown_items_are_skipped() {
        let config = GameConfig::default();
        let inventory = Inventory::from_counts(&config, &counts(&[
            ("Wooden Spoon", 1),
            (item_names::KNIGHT_SWORD, 0),
        ]));
        assert!(inventory.is_empty());
        assert!(inventory.held().is_none());
    }
}
