//! Enumeration types for the Delve turn engine.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::command::CommandParseError;

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// One of the eight compass directions an actor can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards negative y.
    North,
    /// Towards negative y and positive x.
    NorthEast,
    /// Towards positive x.
    East,
    /// Towards positive y and positive x.
    SouthEast,
    /// Towards positive y.
    South,
    /// Towards positive y and negative x.
    SouthWest,
    /// Towards negative x.
    West,
    /// Towards negative y and negative x.
    NorthWest,
}

impl Direction {
    /// All eight directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Grid offset `(dx, dy)` for one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// The direction pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Short lowercase name used in logs and the command syntax.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::NorthEast => "northeast",
            Self::East => "east",
            Self::SouthEast => "southeast",
            Self::South => "south",
            Self::SouthWest => "southwest",
            Self::West => "west",
            Self::NorthWest => "northwest",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CommandParseError;

    /// Accepts full names (`"northeast"`) and compass abbreviations (`"ne"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Ok(Self::North),
            "ne" | "northeast" => Ok(Self::NorthEast),
            "e" | "east" => Ok(Self::East),
            "se" | "southeast" => Ok(Self::SouthEast),
            "s" | "south" => Ok(Self::South),
            "sw" | "southwest" => Ok(Self::SouthWest),
            "w" | "west" => Ok(Self::West),
            "nw" | "northwest" => Ok(Self::NorthWest),
            other => Err(CommandParseError::UnknownDirection(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Run kinds
// ---------------------------------------------------------------------------

/// How long a multi-step run keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Keep moving until the way ahead is obstructed.
    UntilBlocked,
    /// Keep moving until obstructed or adjacent to something of interest.
    UntilInteresting,
}

// ---------------------------------------------------------------------------
// Tickout actions
// ---------------------------------------------------------------------------

/// The tag a tickout handler is invoked with.
///
/// Only [`TickoutAction::Trigger`] exists today; the enum is non-exhaustive
/// so that handlers already match with a wildcard when more tags appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TickoutAction {
    /// The tickout expired and its owner is due to act.
    Trigger,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn opposite_deltas_cancel() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let (ox, oy) = dir.opposite().delta();
            assert_eq!((dx.checked_add(ox), dy.checked_add(oy)), (Some(0), Some(0)));
        }
    }

    #[test]
    fn parses_names_and_abbreviations() {
        assert_eq!("east".parse::<Direction>().unwrap(), Direction::East);
        assert_eq!("SW".parse::<Direction>().unwrap(), Direction::SouthWest);
        assert_eq!("NorthWest".parse::<Direction>().unwrap(), Direction::NorthWest);
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for dir in Direction::ALL {
            assert_eq!(dir.to_string().parse::<Direction>().unwrap(), dir);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Direction::NorthEast).unwrap();
        assert_eq!(json, "\"north_east\"");
        let kind = serde_json::to_string(&RunKind::UntilInteresting).unwrap();
        assert_eq!(kind, "\"until_interesting\"");
    }
}
