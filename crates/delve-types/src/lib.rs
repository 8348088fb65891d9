//! Shared type definitions for the Delve turn engine.
//!
//! This crate holds the vocabulary that flows between the scheduling core,
//! the player turn state machine, and whatever game content sits on top:
//! actor identifiers, compass directions, grid positions, and the commands a
//! decision source can hand to the player.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actor identifiers
//! - [`enums`] -- Directions, run kinds, and tickout action tags
//! - [`position`] -- Grid coordinates with checked stepping
//! - [`command`] -- Player commands and their text syntax

pub mod command;
pub mod enums;
pub mod ids;
pub mod position;

// Re-export all public types at crate root for convenience.
pub use command::{Command, CommandParseError};
pub use enums::{Direction, RunKind, TickoutAction};
pub use ids::ActorId;
pub use position::Position;
