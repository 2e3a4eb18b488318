use serde::{Deserialize, Serialize};

/// Stand-in for a real distance measurement: how many metres a tick adds.
///
/// Both rules are deterministic in the tick count, so distance is monotonic
/// while a run is live and frozen otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DistanceRule {
    /// Every tick adds `meters`.
    PerTick { meters: u64 },
    /// Every `every_ticks`-th tick adds `meters`.
    Stepped {
        #[serde(rename = "everyTicks")]
        every_ticks: u64,
        meters: u64,
    },
}

impl Default for DistanceRule {
    fn default() -> Self {
        DistanceRule::PerTick { meters: 5 }
    }
}

impl DistanceRule {
    /// Metres to add for the tick that brings elapsed time to `tick_number` (1-based).
    pub fn meters_for_tick(&self, tick_number: u64) -> u64 {
        match *self {
            DistanceRule::PerTick { meters } => meters,
            DistanceRule::Stepped { every_ticks, meters } => {
                if tick_number % every_ticks.max(1) == 0 {
                    meters
                } else {
                    0
                }
            }
        }
    }
}
