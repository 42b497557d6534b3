//! Configuration system
//!
//! TOML file (optional) → environment overrides → validation. The resulting
//! `Config` is handed to `AppContext`, which passes each component its own
//! section.

mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::{apply_env_overrides, load_config, parse_config, validate_config, DEFAULT_CONFIG_PATH};
