use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AuthzError;

/// Role
///
/// Coarse capability of an account. Variants are ordered from most to least
/// privileged; `level` is the only thing consulted when comparing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    SuperAdmin,
    Admin,
    Vip,
    User,
    Banned,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::SuperAdmin, Role::Admin, Role::Vip, Role::User, Role::Banned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Vip => "vip",
            Role::User => "user",
            Role::Banned => "banned",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::Vip => 2,
            Role::User => 1,
            Role::Banned => 0,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::InvalidRole(s.to_string()))
    }
}

/// Level of a stored role string. Anything unrecognised ranks with `banned`.
pub fn level_of(role: &str) -> u8 {
    role.parse::<Role>().map(|r| r.level()).unwrap_or(0)
}

/// `level(actual) >= level(required)`.
pub fn satisfies(actual: &str, required: Role) -> bool {
    level_of(actual) >= required.level()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_total_and_descending() {
        let levels: Vec<u8> = Role::ALL.iter().map(Role::level).collect();
        assert!(levels.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn satisfies_compares_levels() {
        assert!(satisfies("super_admin", Role::Admin));
        assert!(satisfies("admin", Role::Admin));
        assert!(!satisfies("vip", Role::Admin));
        assert!(satisfies("vip", Role::User));
        assert!(!satisfies("banned", Role::User));
    }

    #[test]
    fn unknown_roles_fail_closed() {
        assert_eq!(level_of("root"), 0);
        assert_eq!(level_of(""), 0);
        assert!(!satisfies("ADMIN", Role::User));
        assert!(satisfies("anything", Role::Banned));
    }

    #[test]
    fn parsing_rejects_unrecognised_names() {
        assert_eq!("vip".parse::<Role>().unwrap(), Role::Vip);
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(AuthzError::InvalidRole(name)) if name == "owner"
        ));
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }
}
