pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `vaadin_deploy::config` instead of `vaadin_deploy::core::config`
pub use core::*;
pub use utils::*;
