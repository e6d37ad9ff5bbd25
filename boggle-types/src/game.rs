use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a game. Transitions are linear and never reverse:
/// `Pending -> Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Pending,
    Active,
    Completed,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Pending => "pending",
            GamePhase::Active => "active",
            GamePhase::Completed => "completed",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGamePhaseError(pub String);

impl fmt::Display for ParseGamePhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized game phase: {}", self.0)
    }
}

impl std::error::Error for ParseGamePhaseError {}

impl FromStr for GamePhase {
    type Err = ParseGamePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GamePhase::Pending),
            "active" => Ok(GamePhase::Active),
            "completed" => Ok(GamePhase::Completed),
            other => Err(ParseGamePhaseError(other.to_string())),
        }
    }
}

/// One ledger entry: a submitted word and the score it was awarded.
/// Entries are append-only and never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedWord {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Score")]
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&GamePhase::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&GamePhase::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn phase_round_trips_through_str() {
        for phase in [GamePhase::Pending, GamePhase::Active, GamePhase::Completed] {
            assert_eq!(phase.as_str().parse::<GamePhase>().unwrap(), phase);
        }
        assert!("paused".parse::<GamePhase>().is_err());
    }
}
