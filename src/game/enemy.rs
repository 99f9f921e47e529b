use std::time::Duration;
use glam::Vec2;
use rand::Rng;
use crate::game::{CarriedItem, Character, Cooldown, EnemyDef, GameConfig, Inventory, InventoryCount, Item, Stats};

/// Component marking an enemy, with its AI state.
#[derive(Clone, Debug)]
pub struct Enemy {
    /// Distance in tiles at which the player is noticed.
    pub alert_radius: f32,
    recovery: Cooldown,
    drops: Vec<CarriedItem>,
}

impl Enemy {

    pub fn from_def(config: &GameConfig, def: &EnemyDef) -> (Self, Character) {
        let enemy = Self {
            alert_radius: def.alert_radius,
            recovery: Cooldown::from_millis(def.recovery_duration_ms),
            drops: def.inventory.clone(),
        };
        let stats = Stats {
            full_health: def.full_health,
            current_health: def.full_health,
            damage_multiplier: 1.0,
            speed_multiplier: def.speed_multiplier,
        };
        let counts: Vec<InventoryCount> = def.inventory
            .iter()
            .map(|carried| InventoryCount { item: carried.item.clone(), quantity: 1 })
            .collect();
        let inventory = Inventory::from_counts(config, &counts);
        let character = Character::new(def.name.clone(), stats, inventory, config.animation_frames);
        (enemy, character)
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.is_active()
    }

    pub fn tick(&mut self, delta: Duration) {
        self.recovery.tick(delta);
    }

    /// Reach of the held item, in pixels.
    pub fn attack_range(character: &Character, tile_size: f32) -> f32 {
        match character.inventory.held() {
            Some(item) => Vec2::from(item.def().size).max_element() * tile_size,
            None => 0.0,
        }
    }

    /// Chooses what to do this frame.
    /// Walks toward a noticed player and attacks once in range.
    /// Returns the name of an item used.
    pub fn think(
        &mut self,
        character: &mut Character,
        position: Vec2,
        player_position: Vec2,
        stealth_multiplier: f32,
        tile_size: f32,
    ) -> Option<String> {
        let distance = position.distance(player_position);
        let alert = distance * stealth_multiplier < self.alert_radius * tile_size;
        if character.inventory.is_held_in_use() || !alert {
            character.direction = Vec2::ZERO;
            return None;
        }
        if distance < Self::attack_range(character, tile_size) {
            character.direction = Vec2::ZERO;
            self.attack(character)
        }
        else {
            character.direction = (player_position - position).normalize_or_zero();
            None
        }
    }

    fn attack(&mut self, character: &mut Character) -> Option<String> {
        if self.recovery.is_active() {
            return None;
        }
        let used = character.use_item()?;
        self.recovery.start();
        Some(used)
    }

    /// Empties the inventory, keeping each item with its drop chance.
    pub fn roll_drops(&self, character: &mut Character, rng: &mut impl Rng) -> Vec<Item> {
        let mut dropped = Vec::new();
        for entry in character.inventory.take_all() {
            let chance = self.drops
                .iter()
                .find(|carried| carried.item == entry.item.name())
                .filter(|carried| carried.chance.is_finite())
                .map(|carried| carried.chance.clamp(0.0, 1.0))
                .unwrap_or(0.0);
            if rng.gen_bool(chance) {
                dropped.push(entry.item);
            }
        }
        dropped
    }
}
