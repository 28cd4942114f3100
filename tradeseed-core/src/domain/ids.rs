use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker ticket number. Sequential within one generated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

impl Ticket {
    /// Ticket for the trade at `index` in a run whose first ticket is `base`.
    pub fn from_index(base: u64, index: usize) -> Self {
        Self(base + index as u64)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
