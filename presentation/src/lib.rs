//! Presentation layer for hacrud
//!
//! This crate contains the REST adapter, the tool-call adapter and the CLI
//! definitions. Both adapters drive the same [`hacrud_application::CrudService`].

pub mod cli;
pub mod rest;
pub mod tools;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use rest::{AppState, ApiError, Caller, CallerResolver, StaticTokenResolver, router};
pub use tools::{HelperToolset, ToolDefinition};
