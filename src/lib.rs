mod asset;
mod util;
pub mod map;
pub mod game;

pub use asset::*;
pub use util::*;
