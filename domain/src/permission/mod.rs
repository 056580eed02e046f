//! Permission gate: operation policy evaluated before anything else
//!
//! Two sequential checks, stateless per call:
//!
//! | Step | Check | Denial |
//! |------|-------|--------|
//! | 1 | feature flag for the operation is on | [`PermissionDenial::FlagDisabled`] |
//! | 2 | caller is admin (writes only) | [`PermissionDenial::AdminRequired`] |
//!
//! The flag check always runs first, so a disabled operation is reported as
//! disabled even to admins.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A CRUD operation subject to policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Effective capabilities of one caller for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionProfile {
    pub read: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub is_admin: bool,
}

impl Default for PermissionProfile {
    /// Read-only, non-admin.
    fn default() -> Self {
        Self {
            read: true,
            create: false,
            update: false,
            delete: false,
            is_admin: false,
        }
    }
}

impl PermissionProfile {
    /// Every flag on, admin.
    pub fn full_admin() -> Self {
        Self {
            read: true,
            create: true,
            update: true,
            delete: true,
            is_admin: true,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.read,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermissionDenial {
    #[error("Helper {0} permission is disabled")]
    FlagDisabled(Operation),

    #[error("Admin permission required")]
    AdminRequired(Operation),
}

impl PermissionDenial {
    pub fn operation(&self) -> Operation {
        match self {
            PermissionDenial::FlagDisabled(op) | PermissionDenial::AdminRequired(op) => *op,
        }
    }
}

pub struct PermissionGate;

impl PermissionGate {
    pub fn authorize(
        profile: &PermissionProfile,
        operation: Operation,
    ) -> Result<(), PermissionDenial> {
        if !profile.allows(operation) {
            return Err(PermissionDenial::FlagDisabled(operation));
        }
        if operation.is_write() && !profile.is_admin {
            return Err(PermissionDenial::AdminRequired(operation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_flag(operation: Operation, enabled: bool, is_admin: bool) -> PermissionProfile {
        let mut profile = PermissionProfile::full_admin().with_admin(is_admin);
        match operation {
            Operation::Read => profile.read = enabled,
            Operation::Create => profile.create = enabled,
            Operation::Update => profile.update = enabled,
            Operation::Delete => profile.delete = enabled,
        }
        profile
    }

    #[test]
    fn disabled_flag_denied_even_for_admin() {
        for op in Operation::ALL {
            for is_admin in [true, false] {
                let profile = with_flag(op, false, is_admin);
                assert_eq!(
                    PermissionGate::authorize(&profile, op),
                    Err(PermissionDenial::FlagDisabled(op)),
                    "{op} admin={is_admin}"
                );
            }
        }
    }

    #[test]
    fn writes_require_admin() {
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            let profile = with_flag(op, true, false);
            assert_eq!(
                PermissionGate::authorize(&profile, op),
                Err(PermissionDenial::AdminRequired(op))
            );
        }
    }

    #[test]
    fn read_never_requires_admin() {
        let profile = PermissionProfile::default();
        assert_eq!(PermissionGate::authorize(&profile, Operation::Read), Ok(()));
    }

    #[test]
    fn admin_with_flags_allowed() {
        let profile = PermissionProfile::full_admin();
        for op in Operation::ALL {
            assert_eq!(PermissionGate::authorize(&profile, op), Ok(()));
        }
    }

    #[test]
    fn denial_messages() {
        assert_eq!(
            PermissionDenial::FlagDisabled(Operation::Read).to_string(),
            "Helper read permission is disabled"
        );
        assert_eq!(
            PermissionDenial::AdminRequired(Operation::Delete).to_string(),
            "Admin permission required"
        );
    }
}
