//! Identifier types for players and teams.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe wrapper for upstream player identifiers.
///
/// Player IDs come from the stat provider as short slugs (e.g. `AllenJo02`),
/// so they are kept as strings rather than parsed into numbers.
///
/// # Examples
///
/// ```rust
/// use ffl_proj::PlayerId;
///
/// let id = PlayerId::new("AllenJo02");
/// assert_eq!(id.as_str(), "AllenJo02");
/// assert_eq!(id.to_string(), "AllenJo02");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
