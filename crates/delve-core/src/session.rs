//! Session outcomes: why a run ended and what it did along the way.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Reason why the session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The coarse clock reached its configured ceiling.
    TickCeiling {
        /// The coarse tick at which the ceiling was hit.
        tick: u64,
    },
    /// The controlling agent asked to stop.
    Quit,
    /// The player died.
    Died {
        /// What killed them.
        cause: String,
    },
    /// A handler or the world hook failed and the session cannot continue.
    Aborted {
        /// The error that stopped the session.
        error: String,
    },
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TickCeiling { tick } => {
                write!(f, "the dungeon clock ran out after {tick} ticks")
            }
            Self::Quit => f.write_str("the player quit"),
            Self::Died { cause } => write!(f, "the player died of {cause}"),
            Self::Aborted { error } => write!(f, "the session aborted: {error}"),
        }
    }
}

/// Counters the driver keeps while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStats {
    /// Tickouts triggered.
    pub dispatched: u64,
    /// Clock advances performed.
    pub advances: u64,
    /// Coarse boundaries crossed (world-tick hook runs).
    pub world_ticks: u64,
    /// Aftermath callbacks executed.
    pub aftermath_run: u64,
}

/// Outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// The reason the session ended.
    pub end_reason: SessionEndReason,
    /// Coarse clock value at the end.
    pub final_tick: u64,
    /// Fine clock value at the end.
    pub final_millitick: u64,
    /// Driver counters.
    pub stats: DriverStats,
}

/// Log the end-of-session summary.
pub fn log_session_end(result: &SessionResult) {
    info!(
        reason = %result.end_reason,
        final_tick = result.final_tick,
        final_millitick = result.final_millitick,
        dispatched = result.stats.dispatched,
        world_ticks = result.stats.world_ticks,
        aftermath_run = result.stats.aftermath_run,
        "Session ended"
    );

    if result.stats.dispatched == 0 {
        warn!("Session ended without any actor taking a turn");
    }
}
