//! Offensive skill positions that receive a fitted model.

use crate::error::ProjError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fantasy football skill positions.
///
/// Only the four positions with a regression model are represented;
/// kickers and team defenses are not projected.
///
/// # Examples
///
/// ```rust
/// use ffl_proj::Position;
///
/// let wr: Position = "wr".parse().unwrap();
/// assert_eq!(wr, Position::WR);
/// assert_eq!(wr.to_string(), "WR");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    /// Every modeled position, in the order models are fitted and reported.
    pub const ALL: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ProjError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            _ => Err(ProjError::InvalidPosition {
                position: s.to_string(),
            }),
        }
    }
}
