//! Records shared between the store, the cache and the HTTP layer

use serde::{Deserialize, Serialize};

/// Role reference data. Higher `level` means more privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub level: i32,
}

impl Role {
    /// True when this role grants at least the privilege of `required`
    pub fn satisfies(&self, required: &Role) -> bool {
        self.level >= required.level
    }
}

/// Authenticated user snapshot
///
/// Cached by value: a `Principal` taken from the cache may lag the store by up
/// to the cache TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, level: i32) -> Role {
        Role {
            id: level as i64,
            name: name.to_string(),
            description: String::new(),
            level,
        }
    }

    #[test]
    fn test_role_satisfies_boundary() {
        let moderator = role("moderator", 2);
        assert!(moderator.satisfies(&role("moderator", 2)));
        assert!(moderator.satisfies(&role("user", 1)));
        assert!(!moderator.satisfies(&role("admin", 3)));
    }

    #[test]
    fn test_principal_json_field_names() {
        let principal = Principal {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            is_active: true,
            role: role("user", 1),
        };
        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["is_active"], true);
        assert_eq!(json["role"]["level"], 1);
    }
}
