//! Player commands.
//!
//! A [`Command`] is what a decision source (a keyboard, a script, a bot)
//! hands the player turn state machine when the machine asks for fresh
//! input. Commands also have a small text syntax so scripts can be written
//! in configuration files:
//!
//! | Text               | Command                                   |
//! |--------------------|-------------------------------------------|
//! | `east`, `e`        | `Move(East)`                              |
//! | `move east`        | `Move(East)`                              |
//! | `run east`         | `Run(East, UntilBlocked)`                 |
//! | `scout east`       | `Run(East, UntilInteresting)`             |
//! | `run` / `scout`    | `RunOn(..)` in the last direction moved   |
//! | `repeat east 5`    | `Repeat { East, 5 }`                      |
//! | `rest 10`, `rest`  | `Rest(10)`, `Rest(1)`                     |
//! | `wait`             | `Wait`                                    |
//! | `quit`             | `Quit`                                    |

use core::fmt;
use core::num::NonZeroU32;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::{Direction, RunKind};

/// Errors produced when parsing command text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    /// The input was empty or whitespace.
    #[error("empty command")]
    Empty,

    /// The first word is not a known command or direction.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A direction argument was not recognized.
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// A count argument was missing, zero, or not a number.
    #[error("invalid count: {0}")]
    InvalidCount(String),

    /// A required argument was missing.
    #[error("missing argument for {command}")]
    MissingArgument {
        /// The command that needed the argument.
        command: String,
    },

    /// Extra words followed a complete command.
    #[error("unexpected trailing input: {0}")]
    TrailingInput(String),
}

/// A decision made by the controlling agent for one player turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Take a single step.
    Move(Direction),
    /// Step repeatedly in a direction until the run kind says stop.
    Run(Direction, RunKind),
    /// Keep running in the most recently chosen direction.
    RunOn(RunKind),
    /// Step a fixed number of times in a direction.
    Repeat {
        /// Direction of every step.
        direction: Direction,
        /// Number of steps, including the first.
        count: NonZeroU32,
    },
    /// Rest in place for a number of turns.
    Rest(NonZeroU32),
    /// Let one turn pass without acting.
    Wait,
    /// End the session.
    Quit,
}

impl Command {
    /// The direction this command moves in, if it names one.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Move(direction) | Self::Run(direction, _) | Self::Repeat { direction, .. } => {
                Some(direction)
            }
            Self::RunOn(_) | Self::Rest(_) | Self::Wait | Self::Quit => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(dir) => write!(f, "move {dir}"),
            Self::Run(dir, RunKind::UntilBlocked) => write!(f, "run {dir}"),
            Self::Run(dir, RunKind::UntilInteresting) => write!(f, "scout {dir}"),
            Self::RunOn(RunKind::UntilBlocked) => f.write_str("run"),
            Self::RunOn(RunKind::UntilInteresting) => f.write_str("scout"),
            Self::Repeat { direction, count } => write!(f, "repeat {direction} {count}"),
            Self::Rest(turns) => write!(f, "rest {turns}"),
            Self::Wait => f.write_str("wait"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandParseError::Empty);
        };
        let head = head.to_lowercase();

        let command = match head.as_str() {
            "move" => Self::Move(required_direction(&head, words.next())?),
            "run" | "scout" => {
                let kind = if head == "run" {
                    RunKind::UntilBlocked
                } else {
                    RunKind::UntilInteresting
                };
                match words.next() {
                    Some(word) => Self::Run(word.parse()?, kind),
                    None => Self::RunOn(kind),
                }
            }
            "repeat" => {
                let direction = required_direction(&head, words.next())?;
                let count = parse_count(words.next().ok_or_else(|| {
                    CommandParseError::MissingArgument {
                        command: head.clone(),
                    }
                })?)?;
                Self::Repeat { direction, count }
            }
            "rest" => match words.next() {
                Some(word) => Self::Rest(parse_count(word)?),
                None => Self::Rest(NonZeroU32::MIN),
            },
            "wait" => Self::Wait,
            "quit" => Self::Quit,
            other => match other.parse::<Direction>() {
                Ok(dir) => Self::Move(dir),
                Err(_unknown) => return Err(CommandParseError::UnknownCommand(other.to_owned())),
            },
        };

        let rest: Vec<&str> = words.collect();
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(CommandParseError::TrailingInput(rest.join(" ")))
        }
    }
}

fn required_direction(command: &str, word: Option<&str>) -> Result<Direction, CommandParseError> {
    word.ok_or_else(|| CommandParseError::MissingArgument {
        command: command.to_owned(),
    })?
    .parse()
}

fn parse_count(word: &str) -> Result<NonZeroU32, CommandParseError> {
    word.parse::<NonZeroU32>()
        .map_err(|_err| CommandParseError::InvalidCount(word.to_owned()))
}
