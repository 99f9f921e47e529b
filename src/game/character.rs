use std::time::Duration;
use glam::Vec2;
use crate::game::{Cooldown, Inventory, ItemKind, ItemTick};
use crate::Rect;

/// Speed of characters in tiles per second, before multipliers.
pub const BASE_SPEED: f32 = 5.0;

/// Duration of an animation frame at a speed multiplier of 1.
const ANIMATION_FRAME_MS: f32 = 150.0;

/// Damage feedback is reported at most once within this window.
const DAMAGE_FEEDBACK_COOLDOWN_MS: u64 = 2000;

/// Vitals shared by the player and enemies.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Stats {
    pub full_health: f32,
    pub current_health: f32,
    pub damage_multiplier: f32,
    pub speed_multiplier: f32,
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum Action {
    Move,
    #[default]
    Idle,
    Use,
}

/// Which animation a character plays.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct AnimationStatus {
    pub action: Action,
    pub facing: Facing,
}

impl AnimationStatus {

    pub fn new(action: Action, facing: Facing) -> Self {
        Self { action, facing }
    }

    /// Status following this one.
    /// The dominant axis of `direction` picks the facing. Ties go to the vertical axis.
    pub fn next(self, direction: Vec2, item_in_use: bool) -> Self {
        let mut status = self;
        if direction.x.abs() > direction.y.abs() {
            if direction.x > 0.0 {
                status = Self::new(Action::Move, Facing::Right);
            }
            else if direction.x < 0.0 {
                status = Self::new(Action::Move, Facing::Left);
            }
        }
        else if direction.y > 0.0 {
            status = Self::new(Action::Move, Facing::Down);
        }
        else if direction.y < 0.0 {
            status = Self::new(Action::Move, Facing::Up);
        }

        if item_in_use {
            status.action = Action::Use;
        }
        else if direction == Vec2::ZERO {
            status.action = Action::Idle;
        }
        status
    }
}

/// Animation frame cycling for a character.
#[derive(Clone, Debug)]
pub struct Animation {
    pub status: AnimationStatus,
    pub frame: usize,
    frame_count: usize,
    frame_time: Duration,
    elapsed: Duration,
}

impl Animation {

    pub fn new(frame_count: usize, speed_multiplier: f32) -> Self {
        let frame_ms = if speed_multiplier > 0.0 {
            ANIMATION_FRAME_MS / speed_multiplier
        }
        else {
            ANIMATION_FRAME_MS
        };
        Self {
            status: AnimationStatus::default(),
            frame: 0,
            frame_count: frame_count.max(1),
            frame_time: Duration::from_micros((frame_ms * 1000.0) as u64),
            elapsed: Duration::ZERO,
        }
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Advances at most one frame, wrapping around.
    pub fn tick(&mut self, delta: Duration) {
        self.elapsed += delta;
        if self.elapsed >= self.frame_time {
            self.elapsed = Duration::ZERO;
            self.frame = (self.frame + 1) % self.frame_count;
        }
    }
}

/// Result of [`Character::receive_damage`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Damage {
    /// True if damage feedback should be played.
    pub feedback: bool,
    pub died: bool,
}

/// State shared by the player and enemies.
#[derive(Clone, Debug)]
pub struct Character {
    pub name: String,
    pub stats: Stats,
    pub inventory: Inventory,
    /// Unit vector, or zero when standing still.
    pub direction: Vec2,
    pub animation: Animation,
    displacement_deficit: Vec2,
    damage_feedback: Cooldown,
}

impl Character {

    pub fn new(name: impl Into<String>, stats: Stats, inventory: Inventory, animation_frames: usize) -> Self {
        Self {
            name: name.into(),
            stats,
            inventory,
            direction: Vec2::ZERO,
            animation: Animation::new(animation_frames, stats.speed_multiplier),
            displacement_deficit: Vec2::ZERO,
            damage_feedback: Cooldown::from_millis(DAMAGE_FEEDBACK_COOLDOWN_MS),
        }
    }

    pub fn status(&self) -> AnimationStatus {
        self.animation.status
    }

    pub fn is_dead(&self) -> bool {
        self.stats.current_health <= 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        if self.stats.full_health <= 0.0 { return 0.0 }
        self.stats.current_health / self.stats.full_health
    }

    /// Increases health without exceeding full health.
    pub fn add_health(&mut self, amount: f32) {
        self.stats.current_health = (self.stats.current_health + amount).min(self.stats.full_health);
    }

    pub fn receive_damage(&mut self, amount: f32) -> Damage {
        let feedback = !self.damage_feedback.is_active();
        if feedback {
            self.damage_feedback.start();
        }
        self.stats.current_health -= amount;
        Damage { feedback, died: self.is_dead() }
    }

    /// Starts using the held item.
    /// Potions heal immediately and are removed once the use finishes.
    /// Returns the name of the item used.
    pub fn use_item(&mut self) -> Option<String> {
        let item = self.inventory.held_mut()?;
        if !item.start_use() {
            return None;
        }
        let name = String::from(item.name());
        if let ItemKind::Potion { health_boost } = item.kind() {
            self.add_health(health_boost);
        }
        self.animation.status = self.animation.status.next(Vec2::ZERO, true);
        Some(name)
    }

    /// Holds the next item. Returns its name.
    pub fn cycle_item(&mut self) -> Option<String> {
        if !self.inventory.cycle() {
            return None;
        }
        self.inventory.held().map(|item| String::from(item.name()))
    }

    /// Advances timers, held item and animation.
    pub fn tick(&mut self, delta: Duration) -> ItemTick {
        self.damage_feedback.tick(delta);
        let item_tick = self.inventory.tick(delta);
        self.animation.status = self.animation.status.next(self.direction, self.inventory.is_held_in_use());
        self.animation.tick(delta);
        item_tick
    }

    /// Whole pixels to move this frame.
    /// Fractions left over are carried into the next frame.
    pub fn displacement(&mut self, tile_size: f32, delta: Duration) -> Vec2 {
        let speed = BASE_SPEED * self.stats.speed_multiplier * tile_size * delta.as_secs_f32();
        let required = self.direction * speed + self.displacement_deficit;
        let possible = required.trunc();
        self.displacement_deficit = required - possible;
        possible
    }

    /// Collider of the held weapon while it is being used.
    pub fn weapon_collider(&self, owner_rect: &Rect, tile_size: f32) -> Option<Rect> {
        let item = self.inventory.held()?;
        if !item.is_in_use() || item.damage() <= 0.0 {
            return None;
        }
        let size = Vec2::from(item.def().size) * tile_size;
        Some(held_item_rect(owner_rect, self.status().facing, size, tile_size))
    }
}

/// Places a held item against the side of its owner it faces.
/// Offset so that it lines up with the owner's hand.
pub fn held_item_rect(owner_rect: &Rect, facing: Facing, size: Vec2, tile_size: f32) -> Rect {
    let vertical_hand = Vec2::new(-0.2, 0.0) * tile_size;
    let horizontal_hand = Vec2::new(0.0, 0.21) * tile_size;
    let center = match facing {
        Facing::Up => owner_rect.mid_top() + vertical_hand - Vec2::new(0.0, size.y / 2.0),
        Facing::Down => owner_rect.mid_bottom() + vertical_hand + Vec2::new(0.0, size.y / 2.0),
        Facing::Left => owner_rect.mid_left() + horizontal_hand - Vec2::new(size.x / 2.0, 0.0),
        Facing::Right => owner_rect.mid_right() + horizontal_hand + Vec2::new(size.x / 2.0, 0.0),
    };
    Rect::from_center(center, size)
}


#[cfg(test)]
mod test {
    use std::time::Duration;
    use glam::Vec2;
    use crate::game::{
        held_item_rect, item_names, Action, AnimationStatus, Character, Facing, GameConfig,
        Inventory, InventoryCount, Stats,
    };
    use crate::Rect;

    fn character(items: &[&str]) -> Character {
        let config = GameConfig::default();
        let counts: Vec<InventoryCount> = items
            .iter()
            .map(|item| InventoryCount { item: String::from(*item), quantity: 1 })
            .collect();
        let stats = Stats {
            full_health: 100.0,
            current_health: 50.0,
            damage_multiplier: 1.0,
            speed_multiplier: 1.0,
        };
        Character::new("Test", stats, Inventory::from_counts(&config, &counts), 4)
    }

    #[test]
    fn status_follows_dominant_axis() {
        let idle = AnimationStatus::default();
        assert_eq!(AnimationStatus::new(Action::Idle, Facing::Down), idle);
        let status = idle.next(Vec2::new(0.8, 0.6), false);
        assert_eq!(AnimationStatus::new(Action::Move, Facing::Right), status);
        let status = status.next(Vec2::new(-0.6, -0.8), false);
        assert_eq!(AnimationStatus::new(Action::Move, Facing::Up), status);
        let status = status.next(Vec2::ZERO, true);
        assert_eq!(AnimationStatus::new(Action::Use, Facing::Up), status);
        let status = status.next(Vec2::ZERO, false);
        assert_eq!(AnimationStatus::new(Action::Idle, Facing::Up), status);
    }

    #[test]
    fn animation_wraps() {
        let mut character = character(&[item_names::KNIGHT_SWORD]);
        assert_eq!(Duration::from_millis(150), character.animation.frame_time());
        for _ in 0..4 {
            character.tick(Duration::from_millis(150));
        }
        assert_eq!(0, character.animation.frame);
        character.tick(Duration::from_millis(150));
        assert_eq!(1, character.animation.frame);
    }

    #[test]
    fn health_is_clamped() {
        let mut character = character(&[item_names::KNIGHT_SWORD]);
        character.add_health(80.0);
        assert_eq!(100.0, character.stats.current_health);
    }

    #[test]
    fn damage_feedback_is_rate_limited() {
        let mut character = character(&[item_names::KNIGHT_SWORD]);
        assert!(character.receive_damage(10.0).feedback);
        assert!(!character.receive_damage(10.0).feedback);
        character.tick(Duration::from_millis(2000));
        let damage = character.receive_damage(30.0);
        assert!(damage.feedback);
        assert!(damage.died);
        assert!(character.is_dead());
    }

    #[test]
    fn displacement_carries_fractions() {
        let mut character = character(&[item_names::KNIGHT_SWORD]);
        character.direction = Vec2::new(1.0, 0.0);
        let frame = Duration::from_secs_f32(1.0 / 60.0);
        // 5 tiles/s at 10 px per tile is 0.83 px per frame
        assert_eq!(Vec2::ZERO, character.displacement(10.0, frame));
        assert_eq!(Vec2::new(1.0, 0.0), character.displacement(10.0, frame));
        character.direction = Vec2::ZERO;
        assert_eq!(Vec2::ZERO, character.displacement(10.0, frame));
    }

    #[test]
    fn potion_heals_on_use() {
        let mut character = character(&[item_names::LESSER_HEALING, item_names::KNIGHT_SWORD]);
        assert_eq!(Some(String::from(item_names::LESSER_HEALING)), character.use_item());
        assert_eq!(75.0, character.stats.current_health);
        assert_eq!(None, character.use_item());
        assert_eq!(Action::Use, character.status().action);
    }

    #[test]
    fn weapon_sits_on_facing_side() {
        let owner = Rect::new(100.0, 100.0, 10.0, 10.0);
        let size = Vec2::new(6.0, 6.0);
        let right = held_item_rect(&owner, Facing::Right, size, 10.0);
        assert_eq!(110.0, right.left());
        let up = held_item_rect(&owner, Facing::Up, size, 10.0);
        assert_eq!(100.0, up.bottom());
        assert_eq!(103.0, up.center().x);
    }
}
