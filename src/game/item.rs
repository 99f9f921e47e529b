use std::time::Duration;
use crate::game::{Cooldown, ItemDef, ItemKind};
use crate::percentage_format;

/// Instance of an item from the catalogue.
/// Tracks whether it is being used.
#[derive(Clone, Debug)]
pub struct Item {
    def: ItemDef,
    usage: Cooldown,
    /// Potion that was used and must be removed once the use finishes.
    consumed: bool,
}

/// What happened to an item during a tick.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ItemTick {
    Idle,
    InUse,
    Finished,
    /// A potion finished and should be removed from its owner's inventory.
    Consumed,
}

impl Item {

    pub fn new(def: ItemDef) -> Self {
        let usage = Cooldown::from_millis(def.use_duration_ms);
        Self { def, usage, consumed: false }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &ItemDef {
        &self.def
    }

    pub fn kind(&self) -> ItemKind {
        self.def.kind
    }

    pub fn is_in_use(&self) -> bool {
        self.usage.is_active()
    }

    /// Starts using the item.
    /// Returns false if it is already in use.
    pub fn start_use(&mut self) -> bool {
        if self.is_in_use() {
            return false;
        }
        self.usage.start();
        if let ItemKind::Potion { .. } = self.def.kind {
            self.consumed = true;
        }
        true
    }

    pub fn tick(&mut self, delta: Duration) -> ItemTick {
        if !self.is_in_use() {
            return ItemTick::Idle;
        }
        if !self.usage.tick(delta) {
            return ItemTick::InUse;
        }
        if self.consumed {
            self.consumed = false;
            ItemTick::Consumed
        }
        else {
            ItemTick::Finished
        }
    }

    /// Damage dealt per second while in use. Zero for non-weapons.
    pub fn damage(&self) -> f32 {
        match self.def.kind {
            ItemKind::Weapon { damage } => damage,
            ItemKind::Potion { .. } => 0.0,
        }
    }

    /// Multi-line description shown next to the held item.
    pub fn properties(&self, damage_multiplier: f32, full_health: f32, quantity: u32) -> String {
        let use_secs = self.def.use_duration_ms as f32 / 1000.0;
        match self.def.kind {
            ItemKind::Weapon { damage } => {
                let dps = (damage * damage_multiplier * 100.0).round() / 100.0;
                format!("{}\nDPS: {dps}\nImpact Duration: {use_secs}s\nQuantity: {quantity}", self.def.name)
            },
            ItemKind::Potion { health_boost } => {
                let boost = percentage_format(health_boost / full_health);
                format!("{}\nHealth Boost: {boost}\nUse Duration: {use_secs}s\nQuantity: {quantity}", self.def.name)
            },
        }
    }
}
