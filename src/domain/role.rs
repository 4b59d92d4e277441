use serde::{Deserialize, Serialize};

/// Closed set of account roles, stored as a smallint (1/2/3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    pub fn from_i16(value: i16) -> Option<Role> {
        match value {
            1 => Some(Role::Admin),
            2 => Some(Role::Staff),
            3 => Some(Role::Client),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Role::Admin => 1,
            Role::Staff => 2,
            Role::Client => 3,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_numeric_roles() {
        assert_eq!(Role::from_i16(1), Some(Role::Admin));
        assert_eq!(Role::from_i16(2), Some(Role::Staff));
        assert_eq!(Role::from_i16(3), Some(Role::Client));
        assert_eq!(Role::from_i16(0), None);
        assert_eq!(Role::from_i16(4), None);
    }

    #[test]
    fn round_trips_storage_form() {
        for role in [Role::Admin, Role::Staff, Role::Client] {
            assert_eq!(Role::from_i16(role.as_i16()), Some(role));
        }
    }
}
