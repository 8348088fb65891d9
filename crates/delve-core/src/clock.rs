//! Dual-granularity game clock.
//!
//! The clock keeps two counters that advance independently and are
//! reconciled by the driver on every iteration:
//!
//! - **milliticks** -- the fine unit tickouts are expressed in. Actors can be
//!   scheduled at any millitick, which is how a hasted creature gets more
//!   than one action per tick.
//! - **ticks** -- the coarse "dungeon tick". It increments only when the fine
//!   counter lands exactly on a multiple of `milliticks_per_tick`, and each
//!   increment is one run of the world-tick hook.
//!
//! # Design Principles
//!
//! - All arithmetic is checked (no silent overflow).
//! - The fine counter may never jump *past* a coarse boundary; every
//!   boundary is stopped on exactly once, so the coarse counter can never
//!   advance faster than the fine time elapsed warrants.
//! - Reaching `tick_ceiling` coarse ticks ends the session.

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// A counter or a derived time value would overflow `u64`.
    #[error("clock overflow: {what} exceeds u64::MAX")]
    Overflow {
        /// Which quantity overflowed.
        what: &'static str,
    },

    /// An advance would carry the fine counter past a coarse boundary.
    #[error("cannot advance {requested} milliticks: next tick boundary is {until_boundary} away")]
    BoundarySkipped {
        /// The requested advance.
        requested: u64,
        /// Milliticks remaining until the next boundary.
        until_boundary: u64,
    },

    /// Invalid time configuration (e.g. zero milliticks per tick).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// The simulation clock: fine milliticks, coarse ticks, and the session
/// ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    /// Fine counter, monotonically increasing.
    milliticks: u64,

    /// Coarse counter, incremented once per boundary crossing.
    ticks: u64,

    /// Conversion factor between the two counters.
    milliticks_per_tick: u64,

    /// Coarse tick count at which the session ends.
    tick_ceiling: u64,
}

impl GameClock {
    /// Create a clock at millitick 0, tick 0 from a time configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `milliticks_per_tick` or
    /// `tick_ceiling` is zero.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, 0, config.milliticks_per_tick, config.tick_ceiling)
    }

    /// Create a clock from explicit counter values (useful for tests and
    /// for resuming a host's own saved state).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the conversion factor or
    /// ceiling is zero, or if `ticks` claims more boundaries than
    /// `milliticks` has crossed.
    pub fn from_parts(
        milliticks: u64,
        ticks: u64,
        milliticks_per_tick: u64,
        tick_ceiling: u64,
    ) -> Result<Self, ClockError> {
        if milliticks_per_tick == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "milliticks_per_tick must be at least 1".to_owned(),
            });
        }
        if tick_ceiling == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "tick_ceiling must be at least 1".to_owned(),
            });
        }
        let crossed = milliticks.checked_div(milliticks_per_tick).unwrap_or(0);
        if ticks > crossed {
            return Err(ClockError::InvalidConfig {
                reason: format!("{ticks} ticks cannot have elapsed in {milliticks} milliticks"),
            });
        }
        Ok(Self {
            milliticks,
            ticks,
            milliticks_per_tick,
            tick_ceiling,
        })
    }

    /// Current fine time.
    pub const fn milliticks(&self) -> u64 {
        self.milliticks
    }

    /// Current coarse time.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The configured conversion factor.
    pub const fn milliticks_per_tick(&self) -> u64 {
        self.milliticks_per_tick
    }

    /// The configured coarse ceiling.
    pub const fn tick_ceiling(&self) -> u64 {
        self.tick_ceiling
    }

    /// Whether the coarse counter has reached the session ceiling.
    pub const fn ceiling_reached(&self) -> bool {
        self.ticks >= self.tick_ceiling
    }

    /// Coarse ticks left before the ceiling.
    pub const fn ticks_remaining(&self) -> u64 {
        self.tick_ceiling.saturating_sub(self.ticks)
    }

    /// Milliticks from now until the next coarse boundary. Always at least 1:
    /// when the clock sits exactly on a boundary, the *next* one is a full
    /// tick away.
    pub const fn until_boundary(&self) -> u64 {
        let Some(into_tick) = self.milliticks.checked_rem(self.milliticks_per_tick) else {
            return self.milliticks_per_tick;
        };
        self.milliticks_per_tick.saturating_sub(into_tick)
    }

    /// The absolute millitick of the next coarse boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the boundary is beyond `u64::MAX`.
    pub const fn next_boundary(&self) -> Result<u64, ClockError> {
        match self.milliticks.checked_add(self.until_boundary()) {
            Some(boundary) => Ok(boundary),
            None => Err(ClockError::Overflow {
                what: "next tick boundary",
            }),
        }
    }

    /// Advance the fine counter by `by` milliticks.
    ///
    /// Returns `true` if the advance landed on a coarse boundary, in which
    /// case the coarse counter has also been incremented and the caller owes
    /// the world exactly one world-tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BoundarySkipped`] if `by` would carry the clock
    /// past the next boundary, or [`ClockError::Overflow`] if a counter would
    /// overflow.
    pub fn advance(&mut self, by: u64) -> Result<bool, ClockError> {
        let until_boundary = self.until_boundary();
        if by > until_boundary {
            return Err(ClockError::BoundarySkipped {
                requested: by,
                until_boundary,
            });
        }
        self.milliticks = self
            .milliticks
            .checked_add(by)
            .ok_or(ClockError::Overflow { what: "milliticks" })?;

        let crossed = by == until_boundary;
        if crossed {
            self.ticks = self
                .ticks
                .checked_add(1)
                .ok_or(ClockError::Overflow { what: "ticks" })?;
        }
        Ok(crossed)
    }

    /// Convert a coarse tick count to milliticks.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the product exceeds `u64::MAX`.
    pub fn ticks_to_milliticks(&self, ticks: u64) -> Result<u64, ClockError> {
        ticks
            .checked_mul(self.milliticks_per_tick)
            .ok_or(ClockError::Overflow {
                what: "tick to millitick conversion",
            })
    }

    /// Convert milliticks to whole coarse ticks (rounding down).
    pub const fn milliticks_to_ticks(&self, milliticks: u64) -> u64 {
        match milliticks.checked_div(self.milliticks_per_tick) {
            Some(ticks) => ticks,
            None => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper to create a clock with a 1000-millitick tick and the given ceiling.
    fn make_clock(ceiling: u64) -> GameClock {
        GameClock::new(&TimeConfig {
            milliticks_per_tick: 1000,
            tick_ceiling: ceiling,
        })
        .unwrap()
    }

    #[test]
    fn clock_starts_at_zero() {
        let clock = make_clock(99_999);
        assert_eq!(clock.milliticks(), 0);
        assert_eq!(clock.ticks(), 0);
        assert!(!clock.ceiling_reached());
        assert_eq!(clock.until_boundary(), 1000);
        assert_eq!(clock.next_boundary().unwrap(), 1000);
    }

    #[test]
    fn partial_advance_does_not_cross() {
        let mut clock = make_clock(10);
        assert!(!clock.advance(300).unwrap());
        assert_eq!(clock.milliticks(), 300);
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.until_boundary(), 700);
    }

    #[test]
    fn landing_on_boundary_increments_ticks() {
        let mut clock = make_clock(10);
        assert!(!clock.advance(400).unwrap());
        assert!(clock.advance(600).unwrap());
        assert_eq!(clock.milliticks(), 1000);
        assert_eq!(clock.ticks(), 1);
        // Sitting on a boundary, the next one is a full tick away.
        assert_eq!(clock.until_boundary(), 1000);
    }

    #[test]
    fn cannot_skip_a_boundary() {
        let mut clock = make_clock(10);
        let _ = clock.advance(900).unwrap();
        let err = clock.advance(200).unwrap_err();
        assert_eq!(
            err,
            ClockError::BoundarySkipped {
                requested: 200,
                until_boundary: 100,
            }
        );
        // A rejected advance leaves the clock untouched.
        assert_eq!(clock.milliticks(), 900);
    }

    #[test]
    fn zero_advance_is_a_no_op() {
        let mut clock = make_clock(10);
        assert!(!clock.advance(0).unwrap());
        assert_eq!(clock.milliticks(), 0);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn ceiling_is_reached_after_enough_boundaries() {
        let mut clock = make_clock(3);
        for _ in 0..3 {
            assert!(!clock.ceiling_reached());
            assert!(clock.advance(clock.until_boundary()).unwrap());
        }
        assert!(clock.ceiling_reached());
        assert_eq!(clock.ticks_remaining(), 0);
    }

    #[test]
    fn ticks_never_outpace_milliticks() {
        let mut clock = make_clock(1000);
        let steps = [1, 999, 250, 250, 500, 1000, 7, 993];
        for step in steps {
            let _ = clock.advance(step).unwrap();
            assert_eq!(clock.ticks(), clock.milliticks_to_ticks(clock.milliticks()));
        }
        assert_eq!(clock.ticks(), 4);
    }

    #[test]
    fn conversions() {
        let clock = make_clock(10);
        assert_eq!(clock.ticks_to_milliticks(7).unwrap(), 7000);
        assert_eq!(clock.milliticks_to_ticks(7999), 7);
        assert!(clock.ticks_to_milliticks(u64::MAX).is_err());
    }

    #[test]
    fn invalid_config_zero_milliticks_per_tick() {
        let result = GameClock::new(&TimeConfig {
            milliticks_per_tick: 0,
            tick_ceiling: 10,
        });
        assert!(matches!(result, Err(ClockError::InvalidConfig { .. })));
    }

    #[test]
    fn invalid_config_zero_ceiling() {
        let result = GameClock::new(&TimeConfig {
            milliticks_per_tick: 1000,
            tick_ceiling: 0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn from_parts_rejects_impossible_tick_count() {
        assert!(GameClock::from_parts(1500, 2, 1000, 10).is_err());
        let clock = GameClock::from_parts(1500, 1, 1000, 10).unwrap();
        assert_eq!(clock.until_boundary(), 500);
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = GameClock::from_parts(u64::MAX - 5, 0, 1, u64::MAX).unwrap();
        // until_boundary is 1 with a 1-millitick tick; walk to the edge.
        for _ in 0..5 {
            let _ = clock.advance(1).unwrap();
        }
        assert!(matches!(
            clock.advance(1),
            Err(ClockError::Overflow { .. })
        ));
    }
}
