//! Well-known role names and the [`Role`] enum.
//!
//! Role strings are the values stored in `profiles.role` by the identity
//! provider's user-management screens.

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
/// Internal coordinator staff.
pub const ROLE_STAFF: &str = "LifeSafe";
pub const ROLE_EDUCATOR: &str = "educator";
pub const ROLE_CLIENT_ADMIN: &str = "client_admin";
pub const ROLE_CLIENT_SITE: &str = "client_site";
/// Fallback for authenticated users without a recognized profile role.
pub const ROLE_USER: &str = "user";

/// The role of an acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Staff,
    Educator,
    ClientAdmin,
    ClientSite,
    User,
}

impl Role {
    /// Parse a stored role string. Unknown values map to [`Role::User`],
    /// which carries no permissions.
    pub fn parse(value: &str) -> Self {
        match value {
            ROLE_ADMIN => Self::Admin,
            ROLE_STAFF => Self::Staff,
            ROLE_EDUCATOR => Self::Educator,
            ROLE_CLIENT_ADMIN => Self::ClientAdmin,
            ROLE_CLIENT_SITE => Self::ClientSite,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Staff => ROLE_STAFF,
            Self::Educator => ROLE_EDUCATOR,
            Self::ClientAdmin => ROLE_CLIENT_ADMIN,
            Self::ClientSite => ROLE_CLIENT_SITE,
            Self::User => ROLE_USER,
        }
    }

    /// Admins and coordinator staff drive the lifecycle.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Self::ClientAdmin | Self::ClientSite)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
