//! The JSON summary printed when a session finishes.

use chrono::{DateTime, Utc};
use delve_core::config::DelveConfig;
use delve_core::session::{DriverStats, SessionEndReason, SessionResult};
use delve_core::turn::MoveMode;
use delve_types::Position;
use serde::Serialize;

use crate::world::{DemoWorld, PlayerTally};

/// Where the player ended up and how they got there.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    /// Final cell.
    pub position: Position,
    /// Movement mode at the end of the session.
    pub mode: MoveMode,
    /// Coarse ticks since the last drink.
    pub hunger: u64,
    /// Action counters.
    pub tally: PlayerTally,
}

/// Summary of one finished session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Session name from configuration.
    pub name: String,
    /// World seed.
    pub seed: u64,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock finish.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: i64,
    /// Why the session ended.
    pub end_reason: SessionEndReason,
    /// Coarse clock at the end.
    pub final_tick: u64,
    /// Fine clock at the end.
    pub final_millitick: u64,
    /// Driver counters.
    pub stats: DriverStats,
    /// The player.
    pub player: PlayerReport,
    /// Creatures alive at the end.
    pub creatures_alive: usize,
    /// Creatures spawned over the whole session.
    pub creatures_spawned: u32,
    /// Steps taken by the creatures still alive.
    pub creature_moves: u64,
    /// Final map, one string per row.
    pub map: Vec<String>,
}

impl SessionReport {
    /// Assemble the report from the finished world and driver result.
    pub fn new(
        config: &DelveConfig,
        world: &DemoWorld,
        result: &SessionResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: config.world.name.clone(),
            seed: config.world.seed,
            started_at,
            finished_at,
            elapsed_ms: finished_at
                .signed_duration_since(started_at)
                .num_milliseconds(),
            end_reason: result.end_reason.clone(),
            final_tick: result.final_tick,
            final_millitick: result.final_millitick,
            stats: result.stats,
            player: PlayerReport {
                position: world.player.pos,
                mode: world.player.turn.mode(),
                hunger: world.player.hunger,
                tally: world.tally,
            },
            creatures_alive: world.creatures.len(),
            creatures_spawned: world.spawned,
            creature_moves: world
                .creatures
                .values()
                .fold(0, |total: u64, c| total.saturating_add(c.moves)),
            map: world.render().lines().map(str::to_owned).collect(),
        }
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
