//! Operation feature flags from TOML (`[permissions]` section)

use hacrud_application::PermissionFlags;
use serde::{Deserialize, Serialize};

/// Raw permission flags from TOML
///
/// Reads are on and writes are off unless enabled here. Writes additionally
/// require an admin caller.
///
/// ```toml
/// [permissions]
/// read = true
/// create = true
/// update = true
/// delete = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePermissionsConfig {
    pub read: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Default for FilePermissionsConfig {
    fn default() -> Self {
        let flags = PermissionFlags::default();
        Self {
            read: flags.read,
            create: flags.create,
            update: flags.update,
            delete: flags.delete,
        }
    }
}

impl From<FilePermissionsConfig> for PermissionFlags {
    fn from(c: FilePermissionsConfig) -> Self {
        PermissionFlags {
            read: c.read,
            create: c.create,
            update: c.update,
            delete: c.delete,
        }
    }
}
