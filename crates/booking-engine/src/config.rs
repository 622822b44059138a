//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::alternatives::SlotGrid;

/// Tunables for availability search and booking.
///
/// Every field has a default, so a partial JSON document (or none at all)
/// is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid used when suggesting alternative start times.
    pub grid: SlotGrid,
    /// How many times a booking re-runs the availability search after losing
    /// a commit race before giving up with the conflict.
    pub max_commit_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid: SlotGrid::default(),
            max_commit_attempts: 3,
        }
    }
}
