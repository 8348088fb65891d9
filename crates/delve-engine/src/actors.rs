//! Tickout handlers for the player and the wandering creatures.
//!
//! Each handler acts, queues any follow-up work as aftermath, and then
//! reschedules itself after a delay derived from the actor's speed.

use delve_core::driver::DriverError;
use delve_core::scheduler::{Scheduler, TickoutHandler};
use delve_core::session::SessionEndReason;
use delve_core::speed::action_delay;
use delve_core::turn::{MoveMode, PlayerAction, StepSource, TurnDecision};
use delve_types::{ActorId, Direction, TickoutAction};
use rand::seq::IndexedRandom;
use tracing::{debug, info, trace, warn};

use crate::dungeon::Tile;
use crate::world::DemoWorld;

/// The player's turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerTurn;

impl TickoutHandler<DemoWorld> for PlayerTurn {
    fn on_tickout(
        self: Box<Self>,
        world: &mut DemoWorld,
        scheduler: &mut Scheduler<DemoWorld>,
        owner: ActorId,
        _action: TickoutAction,
    ) -> Result<(), DriverError> {
        let tick = scheduler.tick();
        match world.decide_player_turn(tick)? {
            TurnDecision::Quit => {
                info!(tick, "Player quit");
                scheduler.request_end(SessionEndReason::Quit);
                return Ok(());
            }
            TurnDecision::Free => {
                world.tally.free_turns = world.tally.free_turns.saturating_add(1);
                let _ = scheduler.schedule_in(owner, 0, self)?;
                return Ok(());
            }
            TurnDecision::Helpless => {
                world.tally.helpless_turns = world.tally.helpless_turns.saturating_add(1);
                debug!(tick, held = world.player.held_ticks, "Player is helpless");
            }
            TurnDecision::Act { action, source } => perform(world, scheduler, action, source),
        }

        let delay = action_delay(scheduler.clock().milliticks_per_tick(), world.player.speed)?;
        let _ = scheduler.schedule_in(owner, delay, self)?;
        Ok(())
    }
}

fn perform(
    world: &mut DemoWorld,
    scheduler: &mut Scheduler<DemoWorld>,
    action: PlayerAction,
    source: StepSource,
) {
    match action {
        PlayerAction::Move(direction) => {
            let target = world.player.pos.step(direction).filter(|&next| world.is_open(next));
            let Some(next) = target else {
                world.tally.bumps = world.tally.bumps.saturating_add(1);
                world.player.turn.interrupt();
                debug!(%direction, at = %world.player.pos, "Player bumped into something");
                return;
            };
            world.player.pos = next;
            world.tally.moves = world.tally.moves.saturating_add(1);
            match source {
                StepSource::Automatic => {
                    world.tally.automatic_moves = world.tally.automatic_moves.saturating_add(1);
                }
                StepSource::Slide => world.tally.slides = world.tally.slides.saturating_add(1),
                StepSource::Input => {}
            }
            trace!(%direction, to = %next, ?source, "Player moved");

            let sliding = matches!(world.player.turn.mode(), MoveMode::Sliding { .. });
            if world.dungeon.tile(next) == Tile::Ice && !sliding {
                debug!(%direction, at = %next, "Player slipped on ice");
                world.player.turn.start_sliding(direction);
            }
            scheduler.schedule_aftermath(|world: &mut DemoWorld, _| world.look_around());
        }
        PlayerAction::Rest => {
            world.tally.rests = world.tally.rests.saturating_add(1);
            let here = world.player.pos;
            if world.dungeon.tile(here) == Tile::Fountain || world.dungeon.fountain_adjacent(here) {
                world.tally.drinks = world.tally.drinks.saturating_add(1);
                if world.player.hunger > 0 {
                    debug!(hunger = world.player.hunger, "Player drank from a fountain");
                }
                world.player.hunger = 0;
            }
        }
        PlayerAction::Wait => world.tally.waits = world.tally.waits.saturating_add(1),
    }
}

/// A creature's turn: one step in a random open direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatureTurn;

impl TickoutHandler<DemoWorld> for CreatureTurn {
    fn on_tickout(
        self: Box<Self>,
        world: &mut DemoWorld,
        scheduler: &mut Scheduler<DemoWorld>,
        owner: ActorId,
        _action: TickoutAction,
    ) -> Result<(), DriverError> {
        let Some((pos, speed)) = world.creatures.get(&owner).map(|c| (c.pos, c.speed)) else {
            warn!(creature = %owner, "Tickout for a creature that no longer exists");
            return Ok(());
        };

        let open: Vec<Direction> = Direction::ALL
            .iter()
            .copied()
            .filter(|&dir| pos.step(dir).is_some_and(|next| world.is_open(next)))
            .collect();
        let step = open
            .choose(&mut world.rng)
            .and_then(|&dir| pos.step(dir).map(|next| (dir, next)));

        if let Some((direction, next)) = step
            && let Some(creature) = world.creatures.get_mut(&owner)
        {
            creature.pos = next;
            creature.moves = creature.moves.saturating_add(1);
            trace!(creature = %owner, %direction, to = %next, "Creature wandered");
            scheduler.schedule_aftermath(|world: &mut DemoWorld, _| world.look_around());
        }

        let delay = action_delay(scheduler.clock().milliticks_per_tick(), speed)?;
        let _ = scheduler.schedule_in(owner, delay, self)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delve_core::config::DelveConfig;
    use delve_core::driver::Driver;
    use delve_core::speed::Speed;
    use delve_types::Position;

    use super::*;
    use crate::dungeon::Dungeon;
    use crate::world::Creature;

    fn quiet_config(script: &[&str]) -> DelveConfig {
        let mut config = DelveConfig::default();
        config.world.width = 9;
        config.world.height = 5;
        config.world.ice_patches = 0;
        config.world.fountains = 0;
        config.creatures.initial = 0;
        config.creatures.spawn_interval_ticks = 0;
        config.time.tick_ceiling = 200;
        config.player.script = script.iter().map(|&line| line.to_owned()).collect();
        config
    }

    /// A 9x5 open room with the player at its west end.
    fn setup(script: &[&str]) -> (Driver<DemoWorld>, DemoWorld) {
        let config = quiet_config(script);
        let mut world = DemoWorld::new(&config).unwrap();
        world.dungeon = Dungeon::walled(9, 5).unwrap();
        world.player.pos = Position::new(1, 2);
        let mut driver = Driver::from_config(&config.time).unwrap();
        world.populate(driver.scheduler_mut()).unwrap();
        (driver, world)
    }

    #[test]
    fn run_east_stops_at_the_wall_then_quits() {
        let (mut driver, mut world) = setup(&["run east"]);
        let result = driver.run(&mut world).unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Quit);
        assert_eq!(world.player.pos, Position::new(7, 2));
        assert_eq!(world.tally.moves, 6);
        assert_eq!(world.tally.automatic_moves, 5);
        assert_eq!(world.tally.bumps, 0);
    }

    #[test]
    fn ice_slides_the_player_past_where_they_stepped() {
        let (mut driver, mut world) = setup(&["east"]);
        for x in 2..=4 {
            world.dungeon.set(Position::new(x, 2), Tile::Ice);
        }
        let result = driver.run(&mut world).unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Quit);
        // Stepped onto (2,2), slid across (3,2) and (4,2), off the ice at (5,2).
        assert_eq!(world.player.pos, Position::new(5, 2));
        assert_eq!(world.tally.slides, 3);
        assert_eq!(world.player.turn.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn paralysis_costs_turns_until_it_wears_off() {
        let (mut driver, mut world) = setup(&["wait"]);
        world.player.held_ticks = 3;
        let result = driver.run(&mut world).unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Quit);
        assert_eq!(world.tally.helpless_turns, 3);
        assert_eq!(world.tally.waits, 1);
    }

    #[test]
    fn starving_ends_the_session() {
        let (mut driver, mut world) = setup(&["rest 100"]);
        world.hunger_limit = 5;
        let result = driver.run(&mut world).unwrap();

        assert_eq!(
            result.end_reason,
            SessionEndReason::Died {
                cause: "starvation".to_owned()
            }
        );
        assert_eq!(result.final_tick, 5);
    }

    #[test]
    fn resting_by_a_fountain_resets_hunger() {
        let (mut driver, mut world) = setup(&["rest 3"]);
        world.dungeon.set(Position::new(2, 2), Tile::Fountain);
        world.hunger_limit = 50;
        let result = driver.run(&mut world).unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Quit);
        assert_eq!(world.tally.drinks, 3);
        assert!(world.player.hunger < 3);
    }

    #[test]
    fn creature_in_view_stops_a_run() {
        let (mut driver, mut world) = setup(&["run east", "wait"]);
        // Parked out of reach behind a pillar column; never moves.
        world.dungeon.set(Position::new(6, 1), Tile::Wall);
        world.dungeon.set(Position::new(6, 3), Tile::Wall);
        world.dungeon.set(Position::new(7, 2), Tile::Wall);
        let watcher = ActorId::new();
        world.creatures.insert(
            watcher,
            Creature {
                pos: Position::new(7, 1),
                speed: Speed::NORMAL,
                moves: 0,
            },
        );

        let result = driver.run(&mut world).unwrap();
        assert_eq!(result.end_reason, SessionEndReason::Quit);
        // Stepping onto (3,2) brings (7,1) within four moves.
        assert_eq!(world.player.pos, Position::new(3, 2));
        assert_eq!(world.tally.interruptions, 1);
        assert_eq!(world.tally.waits, 1);
    }

    #[test]
    fn creatures_wander_and_reschedule() {
        let (mut driver, mut world) = setup(&["rest 10"]);
        let id = ActorId::new();
        world.creatures.insert(
            id,
            Creature {
                pos: Position::new(6, 2),
                speed: Speed::NORMAL,
                moves: 0,
            },
        );
        driver
            .scheduler_mut()
            .schedule_tickout(id, 0, Box::new(CreatureTurn));

        let _ = driver.run(&mut world).unwrap();
        assert!(world.creatures.get(&id).unwrap().moves > 0);
    }

    #[test]
    fn removed_creature_drops_its_tickout() {
        let (mut driver, mut world) = setup(&["wait"]);
        let ghost = ActorId::new();
        driver
            .scheduler_mut()
            .schedule_tickout(ghost, 0, Box::new(CreatureTurn));
        let _ = driver.run(&mut world).unwrap();
        assert!(!driver.scheduler().is_scheduled(ghost));
    }
}
