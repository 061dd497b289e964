//! Static role → permission policy.
//!
//! Permission strings are `"<resource>:<action>"`. The table is plain data;
//! every check is a total function and an unrecognised role has no
//! permissions at all.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Employee, Role::Viewer];

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Viewer => "viewer",
        }
    }

    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => ADMIN,
            Role::Manager => MANAGER,
            Role::Employee => EMPLOYEE,
            Role::Viewer => VIEWER,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN: &[&str] = &[
    "clients:read", "clients:write", "clients:delete",
    "companies:read", "companies:write", "companies:delete",
    "employees:read", "employees:write", "employees:delete",
    "projects:read", "projects:write", "projects:delete",
    "milestones:read", "milestones:write", "milestones:delete",
    "payments:read", "payments:write", "payments:delete",
    "communications:read", "communications:write", "communications:delete",
    "users:read", "users:write",
];

const MANAGER: &[&str] = &[
    "clients:read", "clients:write", "clients:delete",
    "companies:read", "companies:write", "companies:delete",
    "employees:read", "employees:write",
    "projects:read", "projects:write", "projects:delete",
    "milestones:read", "milestones:write", "milestones:delete",
    "payments:read", "payments:write", "payments:delete",
    "communications:read", "communications:write", "communications:delete",
    "users:read",
];

const EMPLOYEE: &[&str] = &[
    "clients:read",
    "companies:read",
    "employees:read",
    "projects:read",
    "milestones:read", "milestones:write",
    "payments:read",
    "communications:read", "communications:write",
];

const VIEWER: &[&str] = &[
    "clients:read",
    "companies:read",
    "employees:read",
    "projects:read",
    "milestones:read",
    "payments:read",
    "communications:read",
];

pub fn has_permission(role: Option<Role>, permission: &str) -> bool {
    role.map(|r| r.permissions().contains(&permission)).unwrap_or(false)
}

pub fn is_admin(role: Option<Role>) -> bool {
    role == Some(Role::Admin)
}

pub fn is_admin_or_manager(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin) | Some(Role::Manager))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_permission_matrix() {
        assert!(has_permission(Some(Role::Admin), "clients:write"));
        assert!(has_permission(Some(Role::Manager), "clients:write"));
        assert!(!has_permission(Some(Role::Employee), "clients:write"));
        assert!(!has_permission(Some(Role::Viewer), "clients:write"));
    }

    #[test]
    fn every_role_can_read_clients() {
        for role in Role::ALL {
            assert!(has_permission(Some(role), "clients:read"), "{} cannot read", role);
        }
    }

    #[test]
    fn unknown_roles_fail_closed() {
        let role = Role::parse("superuser");
        assert_eq!(role, None);
        assert!(!has_permission(role, "clients:read"));
        assert!(!is_admin(role));
        assert!(!is_admin_or_manager(role));
    }

    #[test]
    fn unknown_permissions_are_denied() {
        assert!(!has_permission(Some(Role::Admin), "reactors:write"));
    }

    #[test]
    fn predicates() {
        assert!(is_admin(Some(Role::Admin)));
        assert!(!is_admin(Some(Role::Manager)));
        assert!(is_admin_or_manager(Some(Role::Manager)));
        assert!(!is_admin_or_manager(Some(Role::Viewer)));
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
