use std::path::{Path, PathBuf};
use derive_more::*;
use serde::{Deserialize, Serialize};
use crate::game::item_names;

/// Persistent progress: settings, player stats and inventory.
/// Stored as a single YAML file.
#[derive(Debug)]
pub struct SaveStore {
    path: Option<PathBuf>,
    data: SaveData,
}

impl SaveStore {

    /// Opens the save file at `path`, creating it with defaults when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SaveError> {
        let path = path.into();
        let store = if path.exists() {
            let source = std::fs::read_to_string(&path)?;
            let data = serde_yaml::from_str(&source)?;
            log::info!("Opened save file {}", path.display());
            Self { path: Some(path), data }
        }
        else {
            log::info!("Creating save file {}", path.display());
            let store = Self { path: Some(path), data: SaveData::default() };
            store.write()?;
            store
        };
        Ok(store)
    }

    /// Store that never touches the file system.
    pub fn in_memory() -> Self {
        Self { path: None, data: SaveData::default() }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    /// Resets everything to defaults.
    pub fn delete_saves(&mut self) -> Result<(), SaveError> {
        log::info!("Deleting saves");
        self.data = SaveData::default();
        self.write()
    }

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    pub fn setting(&self, setting: Setting) -> SettingValue {
        let settings = &self.data.settings;
        match setting {
            Setting::FrameRateLimit => SettingValue::Int(settings.frame_rate_limit),
            Setting::ShowFrameRate => SettingValue::Bool(settings.show_frame_rate),
            Setting::AudioVolume => SettingValue::Float(settings.audio_volume),
        }
    }

    /// Updates a single setting. The value must match the setting's type.
    pub fn update_setting(&mut self, setting: Setting, value: SettingValue) -> Result<(), SaveError> {
        let settings = &mut self.data.settings;
        match (setting, value) {
            (Setting::FrameRateLimit, SettingValue::Int(limit)) if limit > 0 => settings.frame_rate_limit = limit,
            (Setting::ShowFrameRate, SettingValue::Bool(show)) => settings.show_frame_rate = show,
            (Setting::AudioVolume, SettingValue::Float(volume)) if (0.0..=1.0).contains(&volume) => settings.audio_volume = volume,
            _ => return Err(SaveError::InvalidSetting { setting, value }),
        }
        self.write()
    }

    pub fn player_stats(&self) -> &PlayerStats {
        &self.data.player
    }

    pub fn update_player_stats(&mut self, stats: PlayerStats) -> Result<(), SaveError> {
        self.data.player = stats;
        self.write()
    }

    pub fn inventory(&self) -> &[InventoryCount] {
        &self.data.inventory
    }

    pub fn update_inventory(&mut self, inventory: Vec<InventoryCount>) -> Result<(), SaveError> {
        self.data.inventory = inventory;
        self.write()
    }

    /// Updates stats and inventory with a single write.
    pub fn update_progress(&mut self, stats: PlayerStats, inventory: Vec<InventoryCount>) -> Result<(), SaveError> {
        self.data.player = stats;
        self.data.inventory = inventory;
        self.write()
    }

    fn write(&self) -> Result<(), SaveError> {
        let Some(path) = &self.path else { return Ok(()) };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let source = serde_yaml::to_string(&self.data)?;
        std::fs::write(path, source)?;
        log::debug!("Wrote save file {}", path.display());
        Ok(())
    }
}

/// Contents of the save file.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct SaveData {
    pub settings: Settings,
    pub player: PlayerStats,
    pub inventory: Vec<InventoryCount>,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            player: PlayerStats::default(),
            inventory: vec![
                InventoryCount { item: String::from(item_names::KNIGHT_SWORD), quantity: 1 },
                InventoryCount { item: String::from(item_names::LESSER_HEALING), quantity: 3 },
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct Settings {
    pub frame_rate_limit: u32,
    pub show_frame_rate: bool,
    /// Between 0 and 1.
    pub audio_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_rate_limit: 60,
            show_frame_rate: false,
            audio_volume: 0.5,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Setting {
    FrameRateLimit,
    ShowFrameRate,
    AudioVolume,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SettingValue {
    Int(u32),
    Bool(bool),
    Float(f32),
}

/// Player stats carried between levels.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct PlayerStats {
    /// Level to resume at. Zero before the first level is played.
    pub level_id: u32,
    pub full_health: f32,
    pub current_health: f32,
    pub damage_multiplier: f32,
    pub speed_multiplier: f32,
    /// Scales the distance at which enemies notice the player.
    pub stealth_multiplier: f32,
    pub invulnerability_ms: u64,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level_id: 0,
            full_health: 100.0,
            current_health: 100.0,
            damage_multiplier: 1.0,
            speed_multiplier: 1.0,
            stealth_multiplier: 1.0,
            invulnerability_ms: 300,
        }
    }
}

/// Quantity of a named item in the player's inventory.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct InventoryCount {
    pub item: String,
    pub quantity: u32,
}

#[derive(Error, Display, From, Debug)]
pub enum SaveError {
    #[display(fmt="{_0}")]
    IoError(std::io::Error),
    #[display(fmt="{_0}")]
    YamlError(serde_yaml::Error),
    #[display(fmt="Invalid value {value:?} for setting {setting:?}")]
    #[from(ignore)]
    InvalidSetting { setting: Setting, value: SettingValue },
}


#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use crate::game::{item_names, InventoryCount, PlayerStats, SaveError, SaveStore, Setting, SettingValue};

    fn temp_save(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("summer_rpg_{}_{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("save.yaml")
    }

    #[test]
    fn creates_defaults_when_missing() {
        let path = temp_save("defaults");
        let store = SaveStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(SettingValue::Int(60), store.setting(Setting::FrameRateLimit));
        assert_eq!(SettingValue::Bool(false), store.setting(Setting::ShowFrameRate));
        assert_eq!(SettingValue::Float(0.5), store.setting(Setting::AudioVolume));
        assert_eq!(&PlayerStats::default(), store.player_stats());
        assert_eq!(item_names::KNIGHT_SWORD, store.inventory()[0].item);
        assert_eq!(3, store.inventory()[1].quantity);
    }

    #[test]
    fn changes_survive_reopening() {
        let path = temp_save("reopen");
        let mut store = SaveStore::open(&path).unwrap();
        store.update_setting(Setting::AudioVolume, SettingValue::Float(0.25)).unwrap();
        let stats = PlayerStats { level_id: 2, current_health: 40.0, ..PlayerStats::default() };
        store.update_player_stats(stats.clone()).unwrap();
        store.update_inventory(vec![InventoryCount { item: String::from(item_names::LANCE), quantity: 2 }]).unwrap();

        let reopened = SaveStore::open(&path).unwrap();
        assert_eq!(SettingValue::Float(0.25), reopened.setting(Setting::AudioVolume));
        assert_eq!(&stats, reopened.player_stats());
        assert_eq!(item_names::LANCE, reopened.inventory()[0].item);

        let mut reopened = reopened;
        reopened.delete_saves().unwrap();
        let reset = SaveStore::open(&path).unwrap();
        assert_eq!(&PlayerStats::default(), reset.player_stats());
        assert_eq!(2, reset.inventory().len());
    }

    #[test]
    fn rejects_mismatched_setting() {
        let mut store = SaveStore::in_memory();
        let result = store.update_setting(Setting::ShowFrameRate, SettingValue::Int(1));
        assert!(matches!(result, Err(SaveError::InvalidSetting { .. })));
        let result = store.update_setting(Setting::AudioVolume, SettingValue::Float(1.5));
        assert!(matches!(result, Err(SaveError::InvalidSetting { .. })));
        store.update_setting(Setting::ShowFrameRate, SettingValue::Bool(true)).unwrap();
        assert_eq!(SettingValue::Bool(true), store.setting(Setting::ShowFrameRate));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let path = temp_save("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "settings:\n  frame_rate_limit: 144\n").unwrap();
        let store = SaveStore::open(&path).unwrap();
        assert_eq!(144, store.settings().frame_rate_limit);
        assert_eq!(0.5, store.settings().audio_volume);
        assert_eq!(100.0, store.player_stats().full_health);
    }
}
