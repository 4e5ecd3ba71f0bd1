//! Command dispatch: bridges CLI args -> `Discover` -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod util;
