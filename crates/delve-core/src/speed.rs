//! Actor speed and the millitick delay between actions.
//!
//! An actor at [`Speed::NORMAL`] acts once per coarse tick. Twice the speed
//! halves the delay, so a hasted actor gets two actions per tick; half the
//! speed doubles it.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::ClockError;

/// Speed value of an unhasted, unslowed actor.
pub const NORMAL_SPEED: u32 = 12;

/// An actor's speed. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed(u32);

impl Speed {
    /// Normal speed.
    pub const NORMAL: Self = Self(NORMAL_SPEED);

    /// Create a speed, clamping zero up to 1.
    pub const fn new(value: u32) -> Self {
        if value == 0 { Self(1) } else { Self(value) }
    }

    /// The raw speed value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Twice as fast (saturating).
    pub const fn hasted(self) -> Self {
        Self(self.0.saturating_mul(2))
    }

    /// Half as fast, never below 1.
    pub const fn slowed(self) -> Self {
        Self::new(self.0 / 2)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliticks between two actions of an actor moving at `speed`.
///
/// The result is at least 1 so that every actor makes progress.
///
/// # Errors
///
/// Returns [`ClockError::Overflow`] if `milliticks_per_tick * 12` exceeds
/// `u64::MAX`.
pub fn action_delay(milliticks_per_tick: u64, speed: Speed) -> Result<u64, ClockError> {
    let scaled = milliticks_per_tick
        .checked_mul(u64::from(NORMAL_SPEED))
        .ok_or(ClockError::Overflow {
            what: "action delay",
        })?;
    let delay = scaled.checked_div(u64::from(speed.get())).unwrap_or(scaled);
    Ok(delay.max(1))
}
