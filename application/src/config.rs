//! Application-level configuration.
//!
//! Controls how the CRUD use cases behave: which operations are enabled and
//! how long a single host command may take.

use hacrud_domain::PermissionProfile;
use std::time::Duration;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Operation feature flags, independent of who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionFlags {
    pub read: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Default for PermissionFlags {
    /// Read on, writes off.
    fn default() -> Self {
        Self {
            read: true,
            create: false,
            update: false,
            delete: false,
        }
    }
}

impl PermissionFlags {
    pub fn all() -> Self {
        Self {
            read: true,
            create: true,
            update: true,
            delete: true,
        }
    }
}

/// CRUD behavior configuration.
#[derive(Debug, Clone)]
pub struct CrudConfig {
    pub permissions: PermissionFlags,
    /// Maximum time to wait for the host to answer one command.
    pub command_timeout: Duration,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            permissions: PermissionFlags::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl CrudConfig {
    pub fn with_permissions(mut self, permissions: PermissionFlags) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.command_timeout = Duration::from_secs(seconds);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// The effective profile for one caller.
    pub fn profile_for(&self, is_admin: bool) -> PermissionProfile {
        PermissionProfile {
            read: self.permissions.read,
            create: self.permissions.create,
            update: self.permissions.update,
            delete: self.permissions.delete,
            is_admin,
        }
    }
}
