//! Trade-facing domain types shared by the engine, the registry and the
//! persistence adapters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Market identifier used as the registry key.
pub type MarketId = String;

/// Side of a binary market a stake is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Direction multiplier for probability moves: +1 for YES, -1 for NO.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Yes => 1.0,
            Self::No => -1.0,
        }
    }

    /// Probability of this side given the YES probability.
    pub fn probability_of(self, yes_probability: f64) -> f64 {
        match self {
            Self::Yes => yes_probability,
            Self::No => 1.0 - yes_probability,
        }
    }

    /// Lowercase label used for metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse_is_case_insensitive() {
        assert_eq!("yes".parse::<Side>().unwrap(), Side::Yes);
        assert_eq!(" No ".parse::<Side>().unwrap(), Side::No);
        assert!("maybe".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Yes).unwrap(), "\"YES\"");
        let side: Side = serde_json::from_str("\"NO\"").unwrap();
        assert_eq!(side, Side::No);
    }

    #[test]
    fn test_probability_of_side() {
        assert_eq!(Side::Yes.probability_of(0.25), 0.25);
        assert_eq!(Side::No.probability_of(0.25), 0.75);
    }
}
