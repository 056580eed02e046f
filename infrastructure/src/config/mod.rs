//! Configuration file loading for hacrud
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `HACRUD_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./hacrud.toml` or `./.hacrud.toml`
//! 4. Global: `$XDG_CONFIG_HOME/hacrud/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAuthConfig, FileConfig, FileHostConfig, FilePermissionsConfig,
    FileServerConfig, FileTokenConfig,
};
pub use loader::ConfigLoader;
