//! Access rank carried by every grant.
//!
//! Ranks form a total order `ReadOnly < Update < Admin`. The order is the
//! only comparison that exists: a grant satisfies a requirement when its
//! ordinal is at least the required one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Permission level of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "read")]
    ReadOnly,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "admin")]
    Admin,
}

impl Rank {
    /// Every rank, lowest first.
    pub const ALL: [Rank; 3] = [Rank::ReadOnly, Rank::Update, Rank::Admin];

    /// Integer projection used for comparisons.
    pub const fn ordinal(self) -> u8 {
        match self {
            Rank::ReadOnly => 0,
            Rank::Update => 1,
            Rank::Admin => 2,
        }
    }

    /// Whether a grant of this rank meets a `required` rank.
    pub const fn satisfies(self, required: Rank) -> bool {
        self.ordinal() >= required.ordinal()
    }

    /// Storage and wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Rank::ReadOnly => "read",
            Rank::Update => "update",
            Rank::Admin => "admin",
        }
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Rank::ReadOnly),
            "update" => Ok(Rank::Update),
            "admin" => Ok(Rank::Admin),
            other => Err(CoreError::Validation(format!(
                "Unknown rank: '{other}'. Valid ranks: read, update, admin"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_or_equal_rank_satisfies_requirement() {
        for held in Rank::ALL {
            for required in Rank::ALL {
                assert_eq!(
                    held.satisfies(required),
                    held >= required,
                    "{held} vs required {required}"
                );
            }
        }
    }

    #[test]
    fn lower_rank_never_satisfies_higher_requirement() {
        assert!(!Rank::ReadOnly.satisfies(Rank::Update));
        assert!(!Rank::ReadOnly.satisfies(Rank::Admin));
        assert!(!Rank::Update.satisfies(Rank::Admin));
    }

    #[test]
    fn ordering_is_total_and_strict() {
        assert!(Rank::ReadOnly < Rank::Update);
        assert!(Rank::Update < Rank::Admin);
        assert_eq!(Rank::ALL.iter().max(), Some(&Rank::Admin));
    }

    #[test]
    fn parses_storage_names() {
        for rank in Rank::ALL {
            assert_eq!(rank.as_str().parse::<Rank>().unwrap(), rank);
        }
        assert!("owner".parse::<Rank>().is_err());
        assert!("Admin".parse::<Rank>().is_err());
    }

    #[test]
    fn serializes_to_storage_names() {
        assert_eq!(serde_json::to_value(Rank::ReadOnly).unwrap(), "read");
        let parsed: Rank = serde_json::from_value(serde_json::json!("admin")).unwrap();
        assert_eq!(parsed, Rank::Admin);
    }
}
