//! Game Configuration

use serde::{Serialize, Deserialize};

use crate::REPORT_THRESHOLD_BLOCKS;

/// Tunables applied to every game instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Sequence steps a reported player has to respond before the report
    /// can be verified.
    pub report_threshold: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            report_threshold: REPORT_THRESHOLD_BLOCKS,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables.
    ///
    /// Unset, unparsable or zero values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_threshold_var(std::env::var("BATTLESHIP_REPORT_THRESHOLD").ok().as_deref())
    }

    fn from_threshold_var(value: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            report_threshold: value
                .and_then(|v| v.trim().parse::<u64>().ok())
                // A zero window would let a report be verified in the same step
                .filter(|t| *t > 0)
                .unwrap_or(defaults.report_threshold),
        }
    }
}
