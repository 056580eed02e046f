//! Infrastructure layer for hacrud
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod host;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAuthConfig, FileConfig, FileHostConfig,
    FilePermissionsConfig, FileServerConfig, FileTokenConfig,
};
pub use host::{
    error::{FrameError, HostError, Result},
    orchestrator::CommandOrchestrator,
};
