pub mod config;
pub mod drag;
pub mod item;
pub mod library;

pub use config::*;
pub use drag::*;
pub use item::*;
pub use library::*;
