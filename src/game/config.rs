use std::path::Path;
use serde::{Deserialize, Serialize};

/// Static game data: levels, item catalogue and enemy roster.
/// Every field has a default, so a partial YAML file is enough.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct GameConfig {
    /// Directory every asset path is relative to.
    pub asset_root: String,
    /// Size of the visible area in pixels.
    pub viewport: [f32; 2],
    /// Number of tiles that fit along the shorter side of the viewport.
    pub min_tile_count: u32,
    /// Number of frames in each character animation.
    pub animation_frames: usize,
    pub levels: Vec<LevelConfig>,
    pub items: Vec<ItemDef>,
    pub enemies: Vec<EnemyDef>,
}

impl GameConfig {

    /// Reads a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&source)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates YAML config source.
    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation can't work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        for enemy in &self.enemies {
            for carried in &enemy.inventory {
                if !carried.chance.is_finite() {
                    anyhow::bail!("Enemy '{}' drops '{}' with invalid chance {}", enemy.name, carried.item, carried.chance);
                }
            }
        }
        Ok(())
    }

    pub fn item(&self, name: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn enemy(&self, name: &str) -> Option<&EnemyDef> {
        self.enemies.iter().find(|enemy| enemy.name == name)
    }

    /// Config of a level by 1-based id.
    pub fn level(&self, level_id: u32) -> Option<&LevelConfig> {
        let index = level_id.checked_sub(1)?;
        self.levels.get(index as usize)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            asset_root: String::from("assets"),
            viewport: [1920.0, 1080.0],
            min_tile_count: 15,
            animation_frames: 4,
            levels: vec![
                LevelConfig {
                    map: String::from("maps/level_1.tmx"),
                    background_color: [107, 165, 74],
                },
            ],
            items: vec![
                ItemDef::weapon(item_names::KNIGHT_SWORD, 30.0, 400, [0.6, 0.6]),
                ItemDef::weapon(item_names::LANCE, 25.0, 600, [0.8, 0.8]),
                ItemDef::weapon(item_names::BATTLE_AXE, 45.0, 800, [0.7, 0.7]),
                ItemDef::weapon(item_names::RAPIER, 20.0, 300, [0.6, 0.6]),
                ItemDef::weapon(item_names::TRIDENT, 35.0, 700, [0.8, 0.8]),
                ItemDef::potion(item_names::LESSER_HEALING, 25.0, 1000),
                ItemDef::potion(item_names::NORMAL_HEALING, 50.0, 1000),
                ItemDef::potion(item_names::GREATER_HEALING, 75.0, 1500),
                ItemDef::potion(item_names::SUPER_HEALING, 100.0, 2000),
            ],
            enemies: vec![
                EnemyDef {
                    name: String::from("Skeleton"),
                    full_health: 60.0,
                    speed_multiplier: 0.6,
                    alert_radius: 7.0,
                    recovery_duration_ms: 1500,
                    inventory: vec![
                        CarriedItem { item: String::from(item_names::RAPIER), chance: 0.5 },
                        CarriedItem { item: String::from(item_names::LESSER_HEALING), chance: 0.8 },
                    ],
                },
                EnemyDef {
                    name: String::from("Orc"),
                    full_health: 120.0,
                    speed_multiplier: 0.4,
                    alert_radius: 5.0,
                    recovery_duration_ms: 2500,
                    inventory: vec![
                        CarriedItem { item: String::from(item_names::BATTLE_AXE), chance: 0.3 },
                        CarriedItem { item: String::from(item_names::NORMAL_HEALING), chance: 0.5 },
                    ],
                },
            ],
        }
    }
}

/// Names of the items shipped with the default config.
pub mod item_names {
    pub const KNIGHT_SWORD: &str = "Knight's Sword";
    pub const LANCE: &str = "Lance";
    pub const BATTLE_AXE: &str = "Battle Axe";
    pub const RAPIER: &str = "Rapier";
    pub const TRIDENT: &str = "Trident";
    pub const LESSER_HEALING: &str = "Lesser Healing";
    pub const NORMAL_HEALING: &str = "Normal Healing";
    pub const GREATER_HEALING: &str = "Greater Healing";
    pub const SUPER_HEALING: &str = "Super Healing";
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct LevelConfig {
    /// Path of the .tmx map, relative to the asset root.
    pub map: String,
    pub background_color: [u8; 3],
}

/// Catalogue entry of an item.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ItemDef {
    pub name: String,
    pub kind: ItemKind,
    /// How long a single use lasts.
    pub use_duration_ms: u64,
    /// Size in tiles.
    pub size: [f32; 2],
}

impl ItemDef {
    pub fn weapon(name: &str, damage: f32, use_duration_ms: u64, size: [f32; 2]) -> Self {
        Self {
            name: String::from(name),
            kind: ItemKind::Weapon { damage },
            use_duration_ms,
            size,
        }
    }

    pub fn potion(name: &str, health_boost: f32, use_duration_ms: u64) -> Self {
        Self {
            name: String::from(name),
            kind: ItemKind::Potion { health_boost },
            use_duration_ms,
            size: [0.5, 0.5],
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Damage per second dealt while the weapon is in use.
    Weapon { damage: f32 },
    /// Health restored when used. The potion is consumed afterwards.
    Potion { health_boost: f32 },
}

/// Roster entry of an enemy, spawned from objects of the "enemies" layer by name.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct EnemyDef {
    pub name: String,
    pub full_health: f32,
    pub speed_multiplier: f32,
    /// Distance in tiles at which the enemy notices the player.
    pub alert_radius: f32,
    /// Pause after each attack.
    pub recovery_duration_ms: u64,
    /// Items carried, in order. The first one is held.
    pub inventory: Vec<CarriedItem>,
}

/// Item carried by an enemy, with the chance of it dropping on death.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CarriedItem {
    pub item: String,
    pub chance: f64,
}


#[cfg(test)]
mod test {
    use crate::game::{GameConfig, ItemKind};

    #[test]
    fn partial_yaml_uses_defaults() {
        let yaml = "
viewport: [1000, 1000]
levels:
  - map: maps/custom.tmx
    background_color: [0, 0, 0]
items:
  - name: Stick
    kind: !weapon
      damage: 5
    use_duration_ms: 200
    size: [0.5, 0.5]
";
        let config: GameConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!([1000.0, 1000.0], config.viewport);
        assert_eq!(15, config.min_tile_count);
        assert_eq!("maps/custom.tmx", config.level(1).unwrap().map);
        assert!(config.level(0).is_none());
        assert!(config.level(2).is_none());
        assert_eq!(ItemKind::Weapon { damage: 5.0 }, config.item("Stick").unwrap().kind);
        assert!(config.enemy("Skeleton").is_some());
    }

    #[test]
    fn non_finite_drop_chance_is_rejected() {
        let yaml = "
enemies:
  - name: Ghost
    full_health: 10
    speed_multiplier: 1
    alert_radius: 3
    recovery_duration_ms: 500
    inventory:
      - item: Rapier
        chance: .nan
";
        let err = GameConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
        assert!(GameConfig::from_yaml(&yaml.replace(".nan", "0.5")).is_ok());
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn defaults_round_trip() {
        let config = GameConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: GameConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
