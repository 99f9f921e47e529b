use std::time::Duration;
use crate::game::{
    Character, EventQueue, GameConfig, GameEvent, Input, Inventory, InventoryCount, Item, Key,
    PlayerStats, Stats,
};

pub const PLAYER_NAME: &str = "Player";

/// Component marking the player, with stats only the player has.
#[derive(Clone, Debug)]
pub struct Player {
    pub level_id: u32,
    pub stealth_multiplier: f32,
    pub invulnerability: Duration,
}

impl Player {

    /// Rebuilds the player from saved progress.
    pub fn from_save(config: &GameConfig, stats: &PlayerStats, inventory: &[InventoryCount]) -> (Self, Character) {
        let player = Self {
            level_id: stats.level_id,
            stealth_multiplier: stats.stealth_multiplier,
            invulnerability: Duration::from_millis(stats.invulnerability_ms),
        };
        let character_stats = Stats {
            full_health: stats.full_health,
            current_health: stats.current_health,
            damage_multiplier: stats.damage_multiplier,
            speed_multiplier: stats.speed_multiplier,
        };
        let inventory = Inventory::from_counts(config, inventory);
        let character = Character::new(PLAYER_NAME, character_stats, inventory, config.animation_frames);
        (player, character)
    }

    pub fn to_stats(&self, character: &Character) -> PlayerStats {
        PlayerStats {
            level_id: self.level_id,
            full_health: character.stats.full_health,
            current_health: character.stats.current_health,
            damage_multiplier: character.stats.damage_multiplier,
            speed_multiplier: character.stats.speed_multiplier,
            stealth_multiplier: self.stealth_multiplier,
            invulnerability_ms: self.invulnerability.as_millis() as u64,
        }
    }
}

/// Applies a frame of input to the player's character.
/// The player cannot move while the held item is in use.
pub fn handle_player_input(character: &mut Character, input: &Input, events: &mut EventQueue) {
    if input.is_just_pressed(Key::Switch) {
        if let Some(name) = character.cycle_item() {
            events.push(GameEvent::ItemSwitched { name });
        }
    }
    if character.inventory.is_held_in_use() {
        character.direction = glam::Vec2::ZERO;
        return;
    }
    character.direction = input.direction();
    if input.is_just_pressed(Key::Use) {
        if let Some(name) = character.use_item() {
            events.push(GameEvent::ItemUsed { name });
        }
    }
}

/// Moves an item from the ground into the player's inventory.
pub fn pick_up(character: &mut Character, item: Item, events: &mut EventQueue) {
    let name = String::from(item.name());
    character.inventory.add(item);
    log::debug!("Picked up {name}");
    events.push(GameEvent::ItemPickedUp { name });
}

/// Description of the held item, as shown in the HUD.
pub fn held_item_properties(character: &Character) -> Option<String> {
    let item = character.inventory.held()?;
    Some(item.properties(
        character.stats.damage_multiplier,
        character.stats.full_health,
        character.inventory.held_quantity(),
    ))
}


#[cfg(test)]
mod test {
    use glam::Vec2;
    use crate::game::{
        handle_player_input, held_item_properties, item_names, EventQueue, GameConfig, GameEvent, Input,
        Key, Player, SaveData,
    };

    #[test]
    fn save_round_trip() {
        let config = GameConfig::default();
        let save = SaveData::default();
        let (player, character) = Player::from_save(&config, &save.player, &save.inventory);
        assert_eq!(save.player, player.to_stats(&character));
        assert_eq!(save.inventory, character.inventory.to_counts());
    }

    #[test]
    fn no_movement_while_using() {
        let config = GameConfig::default();
        let save = SaveData::default();
        let (_, mut character) = Player::from_save(&config, &save.player, &save.inventory);
        let mut events = EventQueue::default();
        let mut input = Input::default();

        input.press(Key::Right);
        handle_player_input(&mut character, &input, &mut events);
        assert_eq!(Vec2::new(1.0, 0.0), character.direction);

        input.sync_previous_state();
        input.press(Key::Use);
        handle_player_input(&mut character, &input, &mut events);
        assert_eq!(Some(GameEvent::ItemUsed { name: String::from(item_names::KNIGHT_SWORD) }), events.pop());

        input.sync_previous_state();
        handle_player_input(&mut character, &input, &mut events);
        assert_eq!(Vec2::ZERO, character.direction);
    }

    #[test]
    fn switch_updates_properties() {
        let config = GameConfig::default();
        let save = SaveData::default();
        let (_, mut character) = Player::from_save(&config, &save.player, &save.inventory);
        let mut events = EventQueue::default();
        let mut input = Input::default();
        input.press(Key::Switch);
        handle_player_input(&mut character, &input, &mut events);
        assert_eq!(Some(GameEvent::ItemSwitched { name: String::from(item_names::LESSER_HEALING) }), events.pop());
        assert_eq!(
            Some(String::from("Lesser Healing\nHealth Boost: 25%\nUse Duration: 1s\nQuantity: 3")),
            held_item_properties(&character),
        );
    }
}
