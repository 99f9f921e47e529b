use std::time::Duration;
use derive_more::*;
use tracing::instrument;
use crate::{AssetManager, FileProtocol, LoadError};
use crate::map::install_loaders;
use crate::game::{
    EventQueue, GameConfig, GameEvent, Input, Level, LevelError, LevelOutcome, Player, SaveError,
    SaveStore, Setting, SettingValue,
};

/// Longest step a single frame may simulate.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Top level state: config, saves, the level being played and pending events.
pub struct Game {
    config: GameConfig,
    assets: AssetManager,
    saves: SaveStore,
    level: Level,
    events: EventQueue,
}

impl Game {

    /// Creates a game reading assets from the file system, starting at the saved level.
    pub fn new(config: GameConfig, saves: SaveStore) -> Result<Self, GameError> {
        let assets = AssetManager::builder()
            .default_protocol(FileProtocol)
            .path_prefix(config.asset_root.clone())
            .build();
        Self::with_assets(config, assets, saves)
    }

    /// Creates a game reading assets through an existing manager.
    pub fn with_assets(config: GameConfig, mut assets: AssetManager, saves: SaveStore) -> Result<Self, GameError> {
        install_loaders(&mut assets)?;
        let mut events = EventQueue::default();
        let level_id = saves.player_stats().level_id;
        let level = start_level(&config, &assets, &saves, level_id, &mut events)?;
        Ok(Self { config, assets, saves, level, events })
    }

    /// Advances the current level by a single frame.
    /// Finished levels are followed by the next one, or the same one when the player died.
    #[instrument(skip_all)]
    pub fn run_frame(&mut self, delta: Duration, input: &Input) -> Result<LevelOutcome, GameError> {
        let delta = delta.min(MAX_FRAME_DELTA);
        let outcome = self.level.update(delta, input, &mut self.events);
        match outcome {
            LevelOutcome::Playing => {},
            LevelOutcome::Restart => {
                let level_id = self.level.level_id();
                self.level = start_level(&self.config, &self.assets, &self.saves, level_id, &mut self.events)?;
            },
            LevelOutcome::Completed => {
                let next_level_id = self.next_level_id();
                if let Some((mut stats, inventory)) = self.level.player_progress() {
                    stats.level_id = next_level_id;
                    self.saves.update_progress(stats, inventory)?;
                }
                self.level = start_level(&self.config, &self.assets, &self.saves, next_level_id, &mut self.events)?;
            },
        }
        Ok(outcome)
    }

    /// Level after the current one. Wraps to the first level after the last.
    fn next_level_id(&self) -> u32 {
        let next = self.level.level_id() + 1;
        if self.config.level(next).is_some() { next } else { 1 }
    }

    /// Time between frames at the configured frame rate limit.
    pub fn frame_duration(&self) -> Duration {
        let limit = self.saves.settings().frame_rate_limit.max(1);
        Duration::from_secs(1) / limit
    }

    pub fn update_setting(&mut self, setting: Setting, value: SettingValue) -> Result<(), GameError> {
        self.saves.update_setting(setting, value)?;
        Ok(())
    }

    /// Resets the save file and starts over from the first level.
    pub fn delete_saves(&mut self) -> Result<(), GameError> {
        self.saves.delete_saves()?;
        self.level = start_level(&self.config, &self.assets, &self.saves, 1, &mut self.events)?;
        Ok(())
    }

    /// Removes and returns the events emitted so far.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain()
    }

    pub fn config(&self) -> &GameConfig { &self.config }
    pub fn saves(&self) -> &SaveStore { &self.saves }
    pub fn level(&self) -> &Level { &self.level }
    pub fn assets(&self) -> &AssetManager { &self.assets }
}

/// Loads a level and populates it with the saved player.
fn start_level(
    config: &GameConfig,
    assets: &AssetManager,
    saves: &SaveStore,
    level_id: u32,
    events: &mut EventQueue,
) -> Result<Level, GameError> {
    let level_id = if config.level(level_id).is_some() { level_id } else { 1 };
    let mut level = Level::new(config, level_id, assets)?;
    let (mut player, character) = Player::from_save(config, saves.player_stats(), saves.inventory());
    player.level_id = level.level_id();
    level.set_up_map(config, assets, (player, character))?;
    events.push(GameEvent::LevelStarted { level_id: level.level_id() });
    Ok(level)
}

#[derive(Error, Display, From, Debug)]
pub enum GameError {
    #[display(fmt="{_0}")]
    LoadError(LoadError),
    #[display(fmt="{_0}")]
    LevelError(LevelError),
    #[display(fmt="{_0}")]
    SaveError(SaveError),
}


#[cfg(test)]
mod test {
    use std::time::Duration;
    use crate::{AssetManager, RawProtocol};
    use crate::game::{
        item_names, CarriedItem, Game, GameConfig, GameEvent, Input, Key, LevelConfig, LevelOutcome,
        SaveStore, Setting, SettingValue, Body, Enemy,
    };

    const ARENA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="4" height="4" tilewidth="256" tileheight="256" infinite="0">
 <tileset firstgid="1" name="plain" tilewidth="256" tileheight="256" tilecount="1" columns="1">
  <image source="plain.png" width="256" height="256"/>
 </tileset>
 <layer id="1" name="player" width="4" height="4">
  <data encoding="csv">
0,0,0,0,
0,1,0,0,
0,0,0,0,
0,0,0,0
</data>
 </layer>
 <objectgroup id="2" name="enemies">
  <object id="1" name="Skeleton" x="256" y="512" width="256" height="256"/>
 </objectgroup>
</map>"#;

    fn game() -> Game {
        let mut config = GameConfig::default();
        config.viewport = [1500.0, 1500.0];
        config.levels = vec![
            LevelConfig { map: String::from("first.tmx"), background_color: [0, 0, 0] },
            LevelConfig { map: String::from("second.tmx"), background_color: [0, 0, 0] },
        ];
        config.enemies[0].full_health = 1.0;
        config.enemies[0].inventory = vec![CarriedItem { item: String::from(item_names::RAPIER), chance: 0.0 }];
        let assets = AssetManager::builder()
            .default_protocol(RawProtocol::new()
                .with_file("first.tmx", ARENA)
                .with_file("second.tmx", ARENA)
            )
            .build();
        Game::with_assets(config, assets, SaveStore::in_memory()).unwrap()
    }

    fn play_until_done(game: &mut Game, input: &mut Input) -> LevelOutcome {
        for _ in 0..60 {
            let outcome = game.run_frame(Duration::from_millis(16), input).unwrap();
            input.sync_previous_state();
            if outcome != LevelOutcome::Playing {
                return outcome;
            }
        }
        LevelOutcome::Playing
    }

    #[test]
    fn completing_levels_saves_progress_and_wraps() {
        let mut game = game();
        assert_eq!(1, game.level().level_id());
        assert_eq!(Some(GameEvent::LevelStarted { level_id: 1 }), game.drain_events().next());

        let mut input = Input::default();
        input.press(Key::Use);
        assert_eq!(LevelOutcome::Completed, play_until_done(&mut game, &mut input));
        assert_eq!(2, game.level().level_id());
        assert_eq!(2, game.saves().player_stats().level_id);
        assert!(game.drain_events().any(|event| event == GameEvent::LevelStarted { level_id: 2 }));

        input.release(Key::Use);
        input.sync_previous_state();
        input.press(Key::Use);
        assert_eq!(LevelOutcome::Completed, play_until_done(&mut game, &mut input));
        assert_eq!(1, game.level().level_id());
        assert_eq!(1, game.saves().player_stats().level_id);
    }

    #[test]
    fn delete_saves_restarts_from_first_level() {
        let mut game = game();
        let mut input = Input::default();
        input.press(Key::Use);
        play_until_done(&mut game, &mut input);
        assert_eq!(2, game.level().level_id());

        game.delete_saves().unwrap();
        assert_eq!(1, game.level().level_id());
        assert_eq!(0, game.saves().player_stats().level_id);
    }

    #[test]
    fn frame_duration_follows_settings() {
        let mut game = game();
        assert_eq!(Duration::from_secs(1) / 60, game.frame_duration());
        game.update_setting(Setting::FrameRateLimit, SettingValue::Int(30)).unwrap();
        assert_eq!(Duration::from_secs(1) / 30, game.frame_duration());
        assert!(game.update_setting(Setting::FrameRateLimit, SettingValue::Bool(true)).is_err());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut game = game();
        let input = Input::default();
        game.run_frame(Duration::from_secs(10), &input).unwrap();

        // Skeleton walks up toward the player for at most a quarter second
        let mut query = game.level().world().query::<(&Enemy, &Body)>();
        let (_, (_, body)) = query.iter().next().unwrap();
        assert!(body.center().y > 170.0 && body.center().y < 250.0);
    }
}
