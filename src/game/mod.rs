//! Headless top-down RPG built on Tiled maps.
//! Levels own a `hecs` world of tiles, characters and ground items, stepped by explicit frame deltas.
mod config;
mod save;
mod clock;
mod input;
mod event;
mod item;
mod inventory;
mod body;
mod character;
mod player;
mod enemy;
mod level;
mod game;

pub use config::*;
pub use save::*;
pub use clock::*;
pub use input::*;
pub use event::*;
pub use item::*;
pub use inventory::*;
pub use body::*;
pub use character::*;
pub use player::*;
pub use enemy::*;
pub use level::*;
pub use game::*;
