use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Closed set: route gating matches on these exhaustively,
/// never on raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Provider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Role::Regular),
            "provider" => Ok(Role::Provider),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three swipe verdicts an animal profile can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeKind {
    Like,
    Ignore,
    SuperLike,
}

impl SwipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeKind::Like => "like",
            SwipeKind::Ignore => "ignore",
            SwipeKind::SuperLike => "super_like",
        }
    }

    /// Whether this swipe counts toward match formation.
    /// `super_like` matches exactly like `like`; it is a distinct ledger
    /// value only.
    pub fn is_positive(&self) -> bool {
        !matches!(self, SwipeKind::Ignore)
    }
}

impl FromStr for SwipeKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(SwipeKind::Like),
            "ignore" => Ok(SwipeKind::Ignore),
            "super_like" => Ok(SwipeKind::SuperLike),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

impl fmt::Display for SwipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the ledger a swipe query walks: swipes an animal sent,
/// or swipes it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Sent,
    Received,
}

/// Parse failure for a stored enum value.
#[derive(Debug, Clone)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownValue {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Regular, Role::Provider, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn swipe_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&SwipeKind::SuperLike).unwrap();
        assert_eq!(json, "\"super_like\"");
        let parsed: SwipeKind = serde_json::from_str("\"ignore\"").unwrap();
        assert_eq!(parsed, SwipeKind::Ignore);
    }

    #[test]
    fn only_ignore_is_negative() {
        assert!(SwipeKind::Like.is_positive());
        assert!(SwipeKind::SuperLike.is_positive());
        assert!(!SwipeKind::Ignore.is_positive());
    }
}
