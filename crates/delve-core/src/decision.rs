//! Decision source trait and simple implementations.
//!
//! When the player's turn state machine has nothing queued up (no run in
//! progress, no countdown, no rest), it asks a [`DecisionSource`] for a
//! fresh [`Command`]. The trait abstracts where that command comes from: a
//! keyboard, a bot, a test script.
//!
//! Two implementations ship with the crate:
//!
//! - [`ScriptedDecisionSource`] replays a fixed list of commands and quits
//!   when it runs out.
//! - [`StubDecisionSource`] always waits.

use std::collections::VecDeque;

use delve_types::{Command, CommandParseError};

/// Errors that can occur while obtaining a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// Command text could not be parsed.
    #[error("invalid command: {source}")]
    Parse {
        /// The underlying parse error.
        #[from]
        source: CommandParseError,
    },

    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of player commands.
pub trait DecisionSource {
    /// Produce the command for the player's turn at coarse tick `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if no command can be produced.
    fn next_command(&mut self, tick: u64) -> Result<Command, DecisionError>;
}

/// Replays a fixed sequence of commands, then quits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedDecisionSource {
    commands: VecDeque<Command>,
    consulted: u64,
}

impl ScriptedDecisionSource {
    /// Build a source from already-parsed commands.
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            consulted: 0,
        }
    }

    /// Parse a script written in the command text syntax.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Parse`] for the first line that does not
    /// parse.
    pub fn parse_script<S: AsRef<str>>(lines: &[S]) -> Result<Self, DecisionError> {
        let commands = lines
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::parse::<Command>)
            .collect::<Result<VecDeque<_>, _>>()?;
        Ok(Self {
            commands,
            consulted: 0,
        })
    }

    /// Commands not yet handed out.
    pub fn remaining(&self) -> usize {
        self.commands.len()
    }

    /// How many times the source has been consulted.
    pub const fn consulted(&self) -> u64 {
        self.consulted
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn next_command(&mut self, _tick: u64) -> Result<Command, DecisionError> {
        self.consulted = self.consulted.saturating_add(1);
        Ok(self.commands.pop_front().unwrap_or(Command::Quit))
    }
}

/// A stub decision source that always returns [`Command::Wait`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecisionSource;

impl StubDecisionSource {
    /// Create a new stub decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for StubDecisionSource {
    fn next_command(&mut self, _tick: u64) -> Result<Command, DecisionError> {
        Ok(Command::Wait)
    }
}
