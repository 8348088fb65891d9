//! Creature spawner.
//!
//! Creatures appear on a random free floor cell with a speed drawn from the
//! configured pool, and get their first tickout one action delay later.
//! The same routine seeds the initial population and the periodic spawns
//! from the world tick.

use delve_core::driver::DriverError;
use delve_core::scheduler::Scheduler;
use delve_core::speed::{Speed, action_delay};
use delve_types::{ActorId, Position};
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::actors::CreatureTurn;
use crate::world::{Creature, DemoWorld};

/// Attempts at finding a free cell before giving up on this spawn.
const PLACEMENT_ATTEMPTS: u32 = 16;

/// Spawn one creature and schedule its first turn.
///
/// Returns `None` if no free floor cell turned up; the dungeon may simply
/// be crowded, so that is not an error.
///
/// # Errors
///
/// Returns [`DriverError`] if the first tickout cannot be scheduled.
pub fn spawn_creature(
    world: &mut DemoWorld,
    scheduler: &mut Scheduler<DemoWorld>,
) -> Result<Option<ActorId>, DriverError> {
    let Some(pos) = free_cell(world) else {
        warn!(
            creatures = world.creatures.len(),
            "No free floor cell for a new creature"
        );
        return Ok(None);
    };

    let speed = world
        .creature_config
        .speeds
        .choose(&mut world.rng)
        .copied()
        .map_or(Speed::NORMAL, Speed::new);
    let delay = action_delay(scheduler.clock().milliticks_per_tick(), speed)?;

    let id = ActorId::new();
    world.creatures.insert(
        id,
        Creature {
            pos,
            speed,
            moves: 0,
        },
    );
    world.spawned = world.spawned.saturating_add(1);
    let _ = scheduler.schedule_in(id, delay, Box::new(CreatureTurn))?;
    scheduler.schedule_aftermath(|world: &mut DemoWorld, _| world.look_around());

    info!(
        creature = %id,
        pos = %pos,
        speed = speed.get(),
        tick = scheduler.tick(),
        "Creature spawned"
    );
    Ok(Some(id))
}

fn free_cell(world: &mut DemoWorld) -> Option<Position> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let pos = world.dungeon.random_floor(&mut world.rng)?;
        if world.is_open(pos) {
            return Some(pos);
        }
    }
    None
}
