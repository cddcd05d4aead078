//! Configuration file parsing for formbot
//!
//! Supports:
//! - `.formbot/config.toml` - Dispatch, state and client settings

pub mod settings;
pub mod types;

pub use settings::{
    config_dir, init_config_dir, load_settings, save_settings, state_file_path, CONFIG_FILENAME,
    FORMBOT_DIR,
};
pub use types::*;
