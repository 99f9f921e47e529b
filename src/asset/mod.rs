mod asset;
mod manager;
mod loader;
mod handle;
mod protocol;
mod path_parts;

pub use asset::*;
pub use manager::*;
pub use loader::*;
pub use handle::*;
pub use protocol::*;
pub use path_parts::*;
