//! The demonstration world: dungeon, player, creatures, and the world-tick
//! hook that ages them.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use delve_core::config::{CreatureConfig, DelveConfig};
use delve_core::decision::{DecisionError, ScriptedDecisionSource};
use delve_core::driver::{DriverError, WorldHooks, WorldTickOutcome};
use delve_core::scheduler::Scheduler;
use delve_core::session::SessionEndReason;
use delve_core::speed::Speed;
use delve_core::turn::{Surroundings, TurnDecision, TurnState};
use delve_types::{ActorId, Direction, Position};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::actors::PlayerTurn;
use crate::dungeon::{Dungeon, DungeonError, Tile};
use crate::error::EngineError;
use crate::spawner;

/// How far the player can see, in king moves.
pub const VIEW_RADIUS: u32 = 4;

/// A wandering creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    /// Current cell.
    pub pos: Position,
    /// Movement speed.
    pub speed: Speed,
    /// Steps taken so far.
    pub moves: u64,
}

/// The player and everything the world tracks about them.
#[derive(Debug, Clone)]
pub struct Player {
    /// Tickout owner id.
    pub id: ActorId,
    /// Current cell.
    pub pos: Position,
    /// Movement speed.
    pub speed: Speed,
    /// Turn state machine.
    pub turn: TurnState,
    /// Coarse ticks of paralysis left.
    pub held_ticks: u64,
    /// Coarse ticks since the player last drank.
    pub hunger: u64,
    /// Creatures in view after the last look around.
    pub seen: BTreeSet<ActorId>,
}

/// Counters describing how the player spent the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerTally {
    /// Successful steps, however chosen.
    pub moves: u64,
    /// Steps chosen automatically by a run or countdown.
    pub automatic_moves: u64,
    /// Steps forced by ice.
    pub slides: u64,
    /// Steps that hit something.
    pub bumps: u64,
    /// Turns spent resting.
    pub rests: u64,
    /// Rests taken beside a fountain.
    pub drinks: u64,
    /// Turns spent waiting.
    pub waits: u64,
    /// Turns lost to paralysis.
    pub helpless_turns: u64,
    /// Decisions that took no time.
    pub free_turns: u64,
    /// Times a creature coming into view stopped the player.
    pub interruptions: u64,
}

/// All state the tickout handlers act on.
#[derive(Debug)]
pub struct DemoWorld {
    /// The map.
    pub dungeon: Dungeon,
    /// The player.
    pub player: Player,
    /// Creatures by tickout owner id.
    pub creatures: BTreeMap<ActorId, Creature>,
    /// Where the player's commands come from.
    pub input: ScriptedDecisionSource,
    /// Seeded randomness for wandering and spawning.
    pub rng: StdRng,
    /// Player counters.
    pub tally: PlayerTally,
    /// Creatures spawned so far, including the initial ones.
    pub spawned: u32,
    /// Population settings.
    pub creature_config: CreatureConfig,
    /// Coarse ticks without a drink before starving; zero disables hunger.
    pub hunger_limit: u64,
}

impl DemoWorld {
    /// Build the dungeon and place the player, from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the dungeon cannot be built or the player
    /// script does not parse.
    pub fn new(config: &DelveConfig) -> Result<Self, EngineError> {
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let dungeon = Dungeon::generate(&config.world, &mut rng)?;
        let start = dungeon.central_floor().ok_or(DungeonError::NoFloor)?;
        let input = ScriptedDecisionSource::parse_script(&config.player.script)?;

        info!(
            width = dungeon.width(),
            height = dungeon.height(),
            start = %start,
            script_len = input.remaining(),
            "Dungeon built"
        );

        Ok(Self {
            dungeon,
            player: Player {
                id: ActorId::new(),
                pos: start,
                speed: Speed::new(config.player.speed),
                turn: TurnState::new(),
                held_ticks: config.player.held_ticks,
                hunger: 0,
                seen: BTreeSet::new(),
            },
            creatures: BTreeMap::new(),
            input,
            rng,
            tally: PlayerTally::default(),
            spawned: 0,
            creature_config: config.creatures.clone(),
            hunger_limit: config.world.hunger_limit_ticks,
        })
    }

    /// Schedule the player's first turn and the initial creatures.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if a creature's first tickout cannot be
    /// scheduled.
    pub fn populate(&mut self, scheduler: &mut Scheduler<Self>) -> Result<(), DriverError> {
        scheduler.schedule_tickout(self.player.id, scheduler.now(), Box::new(PlayerTurn));
        for _ in 0..self.creature_config.initial {
            let _ = spawner::spawn_creature(self, scheduler)?;
        }
        self.look_around();
        Ok(())
    }

    /// Run the player's turn state machine against the current situation.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the player's input fails.
    pub fn decide_player_turn(&mut self, tick: u64) -> Result<TurnDecision, DecisionError> {
        let mut turn = self.player.turn;
        let mut input = mem::take(&mut self.input);
        let decision = turn.next_action(&*self, &mut input, tick);
        self.player.turn = turn;
        self.input = input;
        decision
    }

    /// Whether a creature stands on `pos`.
    pub fn creature_at(&self, pos: Position) -> bool {
        self.creatures.values().any(|c| c.pos == pos)
    }

    /// Whether an actor could step onto `pos`.
    pub fn is_open(&self, pos: Position) -> bool {
        self.dungeon.tile(pos).is_passable() && pos != self.player.pos && !self.creature_at(pos)
    }

    /// Refresh what the player can see, raising the stopper if a creature
    /// has come into view since last time.
    pub fn look_around(&mut self) {
        let visible: BTreeSet<ActorId> = self
            .creatures
            .iter()
            .filter(|(_, c)| c.pos.distance(self.player.pos) <= VIEW_RADIUS)
            .map(|(&id, _)| id)
            .collect();
        let newcomers = visible.difference(&self.player.seen).count();
        if newcomers > 0 {
            debug!(newcomers, at = %self.player.pos, "Creature came into view");
            self.player.turn.flag_stopper();
            self.tally.interruptions = self.tally.interruptions.saturating_add(1);
        }
        self.player.seen = visible;
    }

    /// The map with the player (`@`) and creatures (`c`) drawn on it.
    pub fn render(&self) -> String {
        let mut marks: Vec<(Position, char)> =
            self.creatures.values().map(|c| (c.pos, 'c')).collect();
        marks.push((self.player.pos, '@'));
        self.dungeon.render(&marks)
    }
}

impl Surroundings for DemoWorld {
    fn can_act(&self) -> bool {
        self.player.held_ticks == 0
    }

    fn is_blocked(&self, direction: Direction) -> bool {
        self.player.pos.step(direction).is_none_or(|next| !self.is_open(next))
    }

    fn near_point_of_interest(&self) -> bool {
        let here = self.player.pos;
        self.dungeon.tile(here) == Tile::Fountain
            || self.dungeon.fountain_adjacent(here)
            || self.creatures.values().any(|c| c.pos.is_adjacent(here))
    }

    fn keeps_sliding(&self, direction: Direction) -> bool {
        self.dungeon.tile(self.player.pos) == Tile::Ice && !self.is_blocked(direction)
    }
}

impl WorldHooks for DemoWorld {
    fn on_world_tick(
        &mut self,
        scheduler: &mut Scheduler<Self>,
    ) -> Result<WorldTickOutcome, DriverError> {
        let tick = scheduler.tick();

        if self.player.held_ticks > 0 {
            self.player.held_ticks = self.player.held_ticks.saturating_sub(1);
            if self.player.held_ticks == 0 {
                info!(tick, "Player can move again");
            }
        }

        if self.hunger_limit > 0 {
            self.player.hunger = self.player.hunger.saturating_add(1);
            if self.player.hunger >= self.hunger_limit {
                info!(tick, hunger = self.player.hunger, "Player starved");
                return Ok(WorldTickOutcome::End(SessionEndReason::Died {
                    cause: "starvation".to_owned(),
                }));
            }
        }

        let interval = self.creature_config.spawn_interval_ticks;
        let cap = usize::try_from(self.creature_config.max).unwrap_or(usize::MAX);
        let due = tick > 0 && interval > 0 && tick.checked_rem(interval) == Some(0);
        if due && self.creatures.len() < cap {
            let _ = spawner::spawn_creature(self, scheduler)?;
        }

        Ok(WorldTickOutcome::Continue)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delve_core::clock::GameClock;
    use delve_core::config::TimeConfig;

    use super::*;

    /// A 7x7 open room with the player in the middle and no creatures.
    fn small_world() -> DemoWorld {
        let mut config = DelveConfig::default();
        config.world.width = 7;
        config.world.height = 7;
        config.world.ice_patches = 0;
        config.world.fountains = 0;
        config.creatures.initial = 0;
        let mut world = DemoWorld::new(&config).unwrap();
        world.dungeon = Dungeon::walled(7, 7).unwrap();
        world.player.pos = Position::new(3, 3);
        world
    }

    fn scheduler() -> Scheduler<DemoWorld> {
        Scheduler::new(GameClock::new(&TimeConfig::default()).unwrap())
    }

    fn add_creature(world: &mut DemoWorld, pos: Position) -> ActorId {
        let id = ActorId::new();
        world.creatures.insert(
            id,
            Creature {
                pos,
                speed: Speed::NORMAL,
                moves: 0,
            },
        );
        id
    }

    #[test]
    fn walls_and_creatures_block() {
        let mut world = small_world();
        world.player.pos = Position::new(1, 3);
        assert!(world.is_blocked(Direction::West));
        assert!(!world.is_blocked(Direction::East));
        let _ = add_creature(&mut world, Position::new(2, 3));
        assert!(world.is_blocked(Direction::East));
    }

    #[test]
    fn ice_keeps_the_player_sliding_until_blocked() {
        let mut world = small_world();
        world.dungeon.set(Position::new(3, 3), Tile::Ice);
        assert!(world.keeps_sliding(Direction::East));
        world.player.pos = Position::new(5, 3);
        world.dungeon.set(Position::new(5, 3), Tile::Ice);
        assert!(!world.keeps_sliding(Direction::East));
        world.player.pos = Position::new(4, 3);
        assert!(!world.keeps_sliding(Direction::East));
    }

    #[test]
    fn fountains_and_adjacent_creatures_are_interesting() {
        let mut world = small_world();
        assert!(!world.near_point_of_interest());
        world.dungeon.set(Position::new(4, 4), Tile::Fountain);
        assert!(world.near_point_of_interest());
        world.dungeon.set(Position::new(4, 4), Tile::Floor);
        let _ = add_creature(&mut world, Position::new(2, 2));
        assert!(world.near_point_of_interest());
    }

    #[test]
    fn creature_coming_into_view_raises_stopper_once() {
        let mut world = small_world();
        let _ = add_creature(&mut world, Position::new(5, 5));
        world.look_around();
        assert!(world.player.turn.stopper_raised());
        assert_eq!(world.tally.interruptions, 1);

        world.player.turn.reset();
        world.look_around();
        assert!(!world.player.turn.stopper_raised());
    }

    #[test]
    fn paralysis_wears_off_with_world_ticks() {
        let mut world = small_world();
        let mut sched = scheduler();
        world.player.held_ticks = 2;
        assert!(!world.can_act());
        let _ = world.on_world_tick(&mut sched).unwrap();
        assert!(!world.can_act());
        let _ = world.on_world_tick(&mut sched).unwrap();
        assert!(world.can_act());
    }

    #[test]
    fn hunger_limit_ends_the_session() {
        let mut world = small_world();
        let mut sched = scheduler();
        world.hunger_limit = 2;
        assert_eq!(
            world.on_world_tick(&mut sched).unwrap(),
            WorldTickOutcome::Continue
        );
        assert_eq!(
            world.on_world_tick(&mut sched).unwrap(),
            WorldTickOutcome::End(SessionEndReason::Died {
                cause: "starvation".to_owned()
            })
        );
    }

    #[test]
    fn render_marks_player() {
        let world = small_world();
        let map = world.render();
        assert_eq!(map.lines().nth(3), Some("#..@..#"));
    }
}
