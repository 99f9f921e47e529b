use std::time::Instant;
use summer_rpg::game::{Game, GameConfig, Input, SaveStore};

const SAVE_PATH: &str = "saves/save.yaml";
const DEFAULT_FRAMES: u64 = 600;

/// Usage: summer_rpg [config.yaml] [frames]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    #[cfg(feature = "profile")]
    let _guard = init_profiling();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let frames = match args.next() {
        Some(frames) => frames.parse()?,
        None => DEFAULT_FRAMES,
    };

    let saves = SaveStore::open(SAVE_PATH)?;
    let mut game = Game::new(config, saves)?;
    let input = Input::default();
    let frame_duration = game.frame_duration();
    let mut last_frame = Instant::now();
    for _ in 0..frames {
        let now = Instant::now();
        let delta = now - last_frame;
        last_frame = now;
        game.run_frame(delta, &input)?;
        for event in game.drain_events() {
            log::info!("{event:?}");
        }
        let elapsed = now.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }

    let level = game.level();
    log::info!(
        "Stopped on level {} with {} enemies left",
        level.level_id(),
        level.enemy_count(),
    );
    if let Some(properties) = level.held_item_properties() {
        log::info!("Holding {properties}");
    }
    Ok(())
}

#[cfg(feature = "profile")]
fn init_profiling() -> tracing_chrome::FlushGuard {
    use tracing_subscriber::prelude::*;
    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new().build();
    tracing_subscriber::registry().with(chrome_layer).init();
    guard
}
