//! The player turn state machine.
//!
//! Each time the player's tickout fires, [`TurnState::next_action`] decides
//! what this turn does. Most of the time the answer comes from the decision
//! source, but a multi-turn command keeps acting on its own until something
//! interrupts it:
//!
//! | Mode                     | Repeats                 | Stops when                          |
//! |--------------------------|-------------------------|-------------------------------------|
//! | `SingleStep`             | nothing                 | n/a (input every turn)              |
//! | `CountingDown`           | a move, `remaining` more | count exhausted, or blocked         |
//! | `UntilBlocked`           | a move                  | blocked                             |
//! | `UntilPointOfInterest`   | a move                  | blocked, or next to something       |
//! | `Sliding`                | a forced move           | the terrain lets go                 |
//!
//! Content raises the *stopper* ([`TurnState::flag_stopper`]) when it
//! notices something the player should react to (a creature comes into
//! view, the floor changes). The next decision then drops back to
//! `SingleStep` and cancels any rest in progress. A sliding player has lost
//! control to the terrain, so the stopper does nothing to a slide.
//!
//! Resting is tracked beside the mode rather than inside it: a `rest 10`
//! command issues one rest from input and nine more automatically.

use core::num::NonZeroU32;

use delve_types::{Command, Direction, RunKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decision::{DecisionError, DecisionSource};

/// How the player's next turn is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MoveMode {
    /// Ask the decision source.
    #[default]
    SingleStep,
    /// Move `remaining` more times in `direction`.
    CountingDown {
        /// Direction of every step.
        direction: Direction,
        /// Automatic steps still to take.
        remaining: NonZeroU32,
    },
    /// Move in a direction until something is in the way.
    UntilBlocked {
        /// Direction of travel.
        direction: Direction,
    },
    /// Move in a direction until something is in the way or something
    /// interesting is adjacent.
    UntilPointOfInterest {
        /// Direction of travel.
        direction: Direction,
    },
    /// Forced movement; input and blocking are both ignored.
    Sliding {
        /// Direction of the slide.
        direction: Direction,
    },
}

impl MoveMode {
    /// The direction carried by every mode except `SingleStep`.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::SingleStep => None,
            Self::CountingDown { direction, .. }
            | Self::UntilBlocked { direction }
            | Self::UntilPointOfInterest { direction }
            | Self::Sliding { direction } => Some(direction),
        }
    }

    /// Whether the next turn will be chosen without input.
    pub const fn is_automatic(self) -> bool {
        !matches!(self, Self::SingleStep)
    }

    const fn for_run(direction: Direction, kind: RunKind) -> Self {
        match kind {
            RunKind::UntilBlocked => Self::UntilBlocked { direction },
            RunKind::UntilInteresting => Self::UntilPointOfInterest { direction },
        }
    }
}

/// What the state machine needs to know about the player's situation.
pub trait Surroundings {
    /// Whether the player is able to act at all (not paralysed, held, ...).
    fn can_act(&self) -> bool;

    /// Whether a step in `direction` would be obstructed.
    fn is_blocked(&self, direction: Direction) -> bool;

    /// Whether the player stands next to something worth stopping for.
    fn near_point_of_interest(&self) -> bool;

    /// Whether a slide in `direction` carries on this turn.
    fn keeps_sliding(&self, direction: Direction) -> bool;
}

/// A concrete action for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Step one cell.
    Move(Direction),
    /// Rest in place.
    Rest,
    /// Do nothing.
    Wait,
}

/// Why an action was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSource {
    /// Fresh input from the decision source.
    Input,
    /// Continuation of a run, countdown, or rest.
    Automatic,
    /// Forced by a slide.
    Slide,
}

/// The outcome of one turn decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// Perform `action`.
    Act {
        /// The action.
        action: PlayerAction,
        /// Where it came from.
        source: StepSource,
    },
    /// The player cannot act. No input was consulted, but the turn passes.
    Helpless,
    /// Nothing happened and no time should pass (e.g. "keep running" with
    /// no direction to run in).
    Free,
    /// The player asked to end the session.
    Quit,
}

impl TurnDecision {
    /// Whether the player's turn is used up.
    pub const fn takes_time(self) -> bool {
        matches!(self, Self::Act { .. } | Self::Helpless)
    }
}

/// The player's turn state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    mode: MoveMode,
    rest_remaining: u32,
    stopper: bool,
    last_direction: Option<Direction>,
}

impl TurnState {
    /// A fresh state: single-stepping, nothing pending.
    pub const fn new() -> Self {
        Self {
            mode: MoveMode::SingleStep,
            rest_remaining: 0,
            stopper: false,
            last_direction: None,
        }
    }

    /// Current mode.
    pub const fn mode(&self) -> MoveMode {
        self.mode
    }

    /// Automatic rests still to come.
    pub const fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    /// Whether the stopper is raised.
    pub const fn stopper_raised(&self) -> bool {
        self.stopper
    }

    /// The direction of the most recent directed command.
    pub const fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Note that something happened the player should react to. Takes
    /// effect at the next decision.
    pub const fn flag_stopper(&mut self) {
        self.stopper = true;
    }

    /// Start a forced slide (e.g. the player stepped onto ice).
    pub fn start_sliding(&mut self, direction: Direction) {
        self.rest_remaining = 0;
        self.set_mode(MoveMode::Sliding { direction });
    }

    /// Stop whatever is in progress immediately (e.g. a move failed).
    pub fn interrupt(&mut self) {
        self.rest_remaining = 0;
        self.set_mode(MoveMode::SingleStep);
    }

    /// Forget everything, including the remembered direction.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decide this turn's action.
    ///
    /// `input` is consulted only when nothing automatic is in progress and
    /// the player can act.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the decision source fails.
    pub fn next_action<S: Surroundings + ?Sized>(
        &mut self,
        surroundings: &S,
        input: &mut dyn DecisionSource,
        tick: u64,
    ) -> Result<TurnDecision, DecisionError> {
        if let MoveMode::Sliding { direction } = self.mode {
            self.stopper = false;
            if surroundings.keeps_sliding(direction) {
                return Ok(TurnDecision::Act {
                    action: PlayerAction::Move(direction),
                    source: StepSource::Slide,
                });
            }
            self.set_mode(MoveMode::SingleStep);
        }

        if self.stopper {
            self.stopper = false;
            if self.mode.is_automatic() || self.rest_remaining > 0 {
                debug!(mode = ?self.mode, rest = self.rest_remaining, "Stopper interrupted player");
            }
            self.interrupt();
        }

        if !surroundings.can_act() {
            self.interrupt();
            return Ok(TurnDecision::Helpless);
        }

        if let Some(action) = self.continue_mode(surroundings) {
            return Ok(TurnDecision::Act {
                action,
                source: StepSource::Automatic,
            });
        }

        if self.rest_remaining > 0 {
            self.rest_remaining = self.rest_remaining.saturating_sub(1);
            return Ok(TurnDecision::Act {
                action: PlayerAction::Rest,
                source: StepSource::Automatic,
            });
        }

        let command = input.next_command(tick)?;
        Ok(self.begin(command))
    }

    /// Carry on with a run or countdown, or collapse to `SingleStep` if it
    /// cannot continue.
    fn continue_mode<S: Surroundings + ?Sized>(&mut self, surroundings: &S) -> Option<PlayerAction> {
        let next = match self.mode {
            MoveMode::SingleStep | MoveMode::Sliding { .. } => return None,
            MoveMode::CountingDown {
                direction,
                remaining,
            } => {
                if surroundings.is_blocked(direction) {
                    None
                } else {
                    let mode = NonZeroU32::new(remaining.get().saturating_sub(1)).map_or(
                        MoveMode::SingleStep,
                        |remaining| MoveMode::CountingDown {
                            direction,
                            remaining,
                        },
                    );
                    Some((direction, mode))
                }
            }
            MoveMode::UntilBlocked { direction } => {
                (!surroundings.is_blocked(direction)).then_some((direction, self.mode))
            }
            MoveMode::UntilPointOfInterest { direction } => {
                (!surroundings.is_blocked(direction) && !surroundings.near_point_of_interest())
                    .then_some((direction, self.mode))
            }
        };

        match next {
            Some((direction, mode)) => {
                self.set_mode(mode);
                Some(PlayerAction::Move(direction))
            }
            None => {
                self.set_mode(MoveMode::SingleStep);
                None
            }
        }
    }

    /// Turn a fresh command into this turn's action and the modes that
    /// follow it.
    fn begin(&mut self, command: Command) -> TurnDecision {
        let act = |action| TurnDecision::Act {
            action,
            source: StepSource::Input,
        };
        match command {
            Command::Move(direction) => {
                self.last_direction = Some(direction);
                act(PlayerAction::Move(direction))
            }
            Command::Run(direction, kind) => {
                self.last_direction = Some(direction);
                self.set_mode(MoveMode::for_run(direction, kind));
                act(PlayerAction::Move(direction))
            }
            Command::RunOn(kind) => {
                if let Some(direction) = self.last_direction {
                    self.set_mode(MoveMode::for_run(direction, kind));
                    act(PlayerAction::Move(direction))
                } else {
                    warn!(?kind, "No previous direction to keep running in");
                    TurnDecision::Free
                }
            }
            Command::Repeat { direction, count } => {
                self.last_direction = Some(direction);
                if let Some(remaining) = NonZeroU32::new(count.get().saturating_sub(1)) {
                    self.set_mode(MoveMode::CountingDown {
                        direction,
                        remaining,
                    });
                }
                act(PlayerAction::Move(direction))
            }
            Command::Rest(turns) => {
                self.rest_remaining = turns.get().saturating_sub(1);
                act(PlayerAction::Rest)
            }
            Command::Wait => act(PlayerAction::Wait),
            Command::Quit => TurnDecision::Quit,
        }
    }

    fn set_mode(&mut self, mode: MoveMode) {
        if self.mode != mode && !same_kind(self.mode, mode) {
            debug!(from = ?self.mode, to = ?mode, "Move mode changed");
        }
        self.mode = mode;
    }
}

/// Countdown decrements are not worth a log line.
const fn same_kind(a: MoveMode, b: MoveMode) -> bool {
    matches!(
        (a, b),
        (MoveMode::CountingDown { .. }, MoveMode::CountingDown { .. })
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decision::ScriptedDecisionSource;

    #[derive(Debug, Clone, Copy)]
    struct Spot {
        can_act: bool,
        blocked: bool,
        near_poi: bool,
        slippery: bool,
    }

    impl Spot {
        const OPEN: Self = Self {
            can_act: true,
            blocked: false,
            near_poi: false,
            slippery: false,
        };
    }

    impl Surroundings for Spot {
        fn can_act(&self) -> bool {
            self.can_act
        }

        fn is_blocked(&self, _direction: Direction) -> bool {
            self.blocked
        }

        fn near_point_of_interest(&self) -> bool {
            self.near_poi
        }

        fn keeps_sliding(&self, _direction: Direction) -> bool {
            self.slippery
        }
    }

    fn script(lines: &[&str]) -> ScriptedDecisionSource {
        ScriptedDecisionSource::parse_script(lines).unwrap()
    }

    const fn step(direction: Direction, source: StepSource) -> TurnDecision {
        TurnDecision::Act {
            action: PlayerAction::Move(direction),
            source,
        }
    }

    #[test]
    fn single_step_consults_input_every_turn() {
        let mut state = TurnState::new();
        let mut input = script(&["n", "wait"]);
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 0).unwrap(),
            step(Direction::North, StepSource::Input)
        );
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 1).unwrap(),
            TurnDecision::Act {
                action: PlayerAction::Wait,
                source: StepSource::Input,
            }
        );
        assert_eq!(input.consulted(), 2);
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn run_east_until_blocked() {
        let mut state = TurnState::new();
        state.set_mode(MoveMode::UntilBlocked {
            direction: Direction::East,
        });
        let mut input = script(&["wait"]);

        for tick in 0..5 {
            assert_eq!(
                state.next_action(&Spot::OPEN, &mut input, tick).unwrap(),
                step(Direction::East, StepSource::Automatic)
            );
        }
        assert_eq!(input.consulted(), 0);

        let wall = Spot {
            blocked: true,
            ..Spot::OPEN
        };
        let decision = state.next_action(&wall, &mut input, 5).unwrap();
        assert_eq!(state.mode(), MoveMode::SingleStep);
        assert_eq!(input.consulted(), 1);
        assert_eq!(
            decision,
            TurnDecision::Act {
                action: PlayerAction::Wait,
                source: StepSource::Input,
            }
        );
    }

    #[test]
    fn run_command_enters_mode_after_first_step() {
        let mut state = TurnState::new();
        let mut input = script(&["scout w"]);
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 0).unwrap(),
            step(Direction::West, StepSource::Input)
        );
        assert_eq!(
            state.mode(),
            MoveMode::UntilPointOfInterest {
                direction: Direction::West
            }
        );
        let fountain = Spot {
            near_poi: true,
            ..Spot::OPEN
        };
        // Next to something interesting: stop and ask (script is exhausted).
        assert_eq!(
            state.next_action(&fountain, &mut input, 1).unwrap(),
            TurnDecision::Quit
        );
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn repeat_counts_down_then_asks() {
        let mut state = TurnState::new();
        let mut input = script(&["repeat s 3", "wait"]);
        for tick in 0..3 {
            let expected = if tick == 0 {
                StepSource::Input
            } else {
                StepSource::Automatic
            };
            assert_eq!(
                state.next_action(&Spot::OPEN, &mut input, tick).unwrap(),
                step(Direction::South, expected)
            );
        }
        assert_eq!(state.mode(), MoveMode::SingleStep);
        assert_eq!(input.consulted(), 1);
        assert!(matches!(
            state.next_action(&Spot::OPEN, &mut input, 3).unwrap(),
            TurnDecision::Act {
                action: PlayerAction::Wait,
                ..
            }
        ));
    }

    #[test]
    fn repeat_of_one_stays_single_step() {
        let mut state = TurnState::new();
        let mut input = script(&["repeat e 1"]);
        let _ = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn countdown_stops_when_blocked() {
        let mut state = TurnState::new();
        let mut input = script(&["repeat n 10"]);
        let _ = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        let wall = Spot {
            blocked: true,
            ..Spot::OPEN
        };
        assert_eq!(
            state.next_action(&wall, &mut input, 1).unwrap(),
            TurnDecision::Quit
        );
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn stopper_cancels_run_and_rest() {
        let mut state = TurnState::new();
        let mut input = script(&["rest 5", "run e"]);
        let _ = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        assert_eq!(state.rest_remaining(), 4);
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 1).unwrap(),
            TurnDecision::Act {
                action: PlayerAction::Rest,
                source: StepSource::Automatic,
            }
        );

        state.flag_stopper();
        // Rest is cancelled; input is consulted for the run.
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 2).unwrap(),
            step(Direction::East, StepSource::Input)
        );
        assert_eq!(state.rest_remaining(), 0);
        assert!(!state.stopper_raised());

        state.flag_stopper();
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 3).unwrap(),
            TurnDecision::Quit
        );
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn sliding_ignores_stopper_and_blocking() {
        let mut state = TurnState::new();
        state.start_sliding(Direction::SouthWest);
        state.flag_stopper();
        let ice = Spot {
            slippery: true,
            blocked: true,
            can_act: false,
            ..Spot::OPEN
        };
        let mut input = script(&["wait"]);
        assert_eq!(
            state.next_action(&ice, &mut input, 0).unwrap(),
            step(Direction::SouthWest, StepSource::Slide)
        );
        assert!(!state.stopper_raised());
        assert_eq!(input.consulted(), 0);

        // Off the ice: the slide ends and input takes over this same turn.
        assert!(matches!(
            state.next_action(&Spot::OPEN, &mut input, 1).unwrap(),
            TurnDecision::Act {
                action: PlayerAction::Wait,
                source: StepSource::Input,
            }
        ));
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn helpless_player_does_not_consult_input() {
        let mut state = TurnState::new();
        state.set_mode(MoveMode::UntilBlocked {
            direction: Direction::North,
        });
        let held = Spot {
            can_act: false,
            ..Spot::OPEN
        };
        let mut input = script(&["wait"]);
        let decision = state.next_action(&held, &mut input, 0).unwrap();
        assert_eq!(decision, TurnDecision::Helpless);
        assert!(decision.takes_time());
        assert_eq!(input.consulted(), 0);
        assert_eq!(state.mode(), MoveMode::SingleStep);
    }

    #[test]
    fn run_on_uses_last_direction_or_is_free() {
        let mut state = TurnState::new();
        let mut input = script(&["run", "n", "run"]);
        let decision = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        assert_eq!(decision, TurnDecision::Free);
        assert!(!decision.takes_time());
        assert_eq!(state.mode(), MoveMode::SingleStep);

        let _ = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        assert_eq!(state.last_direction(), Some(Direction::North));
        assert_eq!(
            state.next_action(&Spot::OPEN, &mut input, 1).unwrap(),
            step(Direction::North, StepSource::Input)
        );
        assert_eq!(
            state.mode(),
            MoveMode::UntilBlocked {
                direction: Direction::North
            }
        );
    }

    #[test]
    fn interrupt_and_reset() {
        let mut state = TurnState::new();
        let mut input = script(&["run se"]);
        let _ = state.next_action(&Spot::OPEN, &mut input, 0).unwrap();
        state.interrupt();
        assert_eq!(state.mode(), MoveMode::SingleStep);
        assert_eq!(state.last_direction(), Some(Direction::SouthEast));
        state.reset();
        assert_eq!(state, TurnState::new());
    }

    #[test]
    fn non_single_step_modes_carry_direction() {
        let modes = [
            MoveMode::CountingDown {
                direction: Direction::East,
                remaining: NonZeroU32::MIN,
            },
            MoveMode::UntilBlocked {
                direction: Direction::East,
            },
            MoveMode::UntilPointOfInterest {
                direction: Direction::East,
            },
            MoveMode::Sliding {
                direction: Direction::East,
            },
        ];
        for mode in modes {
            assert_eq!(mode.direction(), Some(Direction::East));
            assert!(mode.is_automatic());
        }
        assert_eq!(MoveMode::SingleStep.direction(), None);
    }
}
