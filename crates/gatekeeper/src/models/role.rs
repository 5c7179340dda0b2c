//! User roles and the capabilities they grant.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Access level carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Staff,
    Manager,
    Lessor,
    Admin,
}

/// Capability checked by the API role gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Back-office administration (`/api/admin`); admins and managers.
    Administer,
    /// Staff tooling; staff and everyone above them.
    Staff,
    /// Manager tooling; managers and admins.
    Manage,
    /// Lessor tooling; lessors and admins.
    Lease,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Staff => "STAFF",
            Role::Manager => "MANAGER",
            Role::Lessor => "LESSOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn is_manager(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Staff | Role::Manager | Role::Admin)
    }

    pub fn is_lessor(self) -> bool {
        matches!(self, Role::Lessor | Role::Admin)
    }

    pub fn has_capability(self, capability: Capability) -> bool {
        match capability {
            Capability::Administer => self.is_admin() || self.is_manager(),
            Capability::Staff => self.is_staff(),
            Capability::Manage => self.is_manager(),
            Capability::Lease => self.is_lessor(),
        }
    }

    /// Landing page after login, without a locale prefix.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin-dashboard",
            Role::Manager => "/manager-dashboard",
            Role::Staff => "/staff-dashboard",
            Role::Lessor => "/lessor-dashboard",
            Role::User => "/user-dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "STAFF" => Ok(Role::Staff),
            "MANAGER" => Ok(Role::Manager),
            "LESSOR" => Ok(Role::Lessor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn administer_allows_admins_and_managers_only() {
        assert!(Role::Admin.has_capability(Capability::Administer));
        assert!(Role::Manager.has_capability(Capability::Administer));
        assert!(!Role::Staff.has_capability(Capability::Administer));
        assert!(!Role::Lessor.has_capability(Capability::Administer));
        assert!(!Role::User.has_capability(Capability::Administer));
    }

    #[test]
    fn staff_capability_is_inherited_upwards() {
        assert!(Role::Staff.has_capability(Capability::Staff));
        assert!(Role::Manager.has_capability(Capability::Staff));
        assert!(Role::Admin.has_capability(Capability::Staff));
        assert!(!Role::Lessor.has_capability(Capability::Staff));
    }

    #[test]
    fn lessor_capability() {
        assert!(Role::Lessor.has_capability(Capability::Lease));
        assert!(Role::Admin.has_capability(Capability::Lease));
        assert!(!Role::Manager.has_capability(Capability::Lease));
    }

    #[test]
    fn dashboards_per_role() {
        assert_eq!(Role::Lessor.dashboard_path(), "/lessor-dashboard");
        assert_eq!(Role::User.dashboard_path(), "/user-dashboard");
        assert_eq!(Role::Admin.dashboard_path(), "/admin-dashboard");
    }

    #[test]
    fn parses_uppercase_names() {
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(
            "manager".parse::<Role>().unwrap_err(),
            UnknownRole("manager".to_string())
        );
        assert_eq!(Role::Lessor.to_string(), "LESSOR");
    }
}
