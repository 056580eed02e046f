//! Host platform adapter
//!
//! Implements [`HostCommandPort`](hacrud_application::HostCommandPort) over the
//! platform's framed command socket.

pub mod codec;
pub mod error;
pub mod orchestrator;
