//! The simulation driver.
//!
//! [`Driver::step`] performs one iteration of the main loop and returns, so a
//! host can interleave its own work (rendering, input polling) between
//! steps. Each step does exactly one of:
//!
//! 1. **Dispatch** -- the earliest tickout is due (`expiry <= now`). It is
//!    detached, its handler is triggered, and the aftermath queue is
//!    flushed. Due tickouts are dispatched back-to-back, one per step, before
//!    the clock moves again.
//! 2. **Advance** -- nothing is due. The clock moves forward to whichever
//!    comes first: the earliest expiry or the next coarse tick boundary.
//!    Landing on a boundary runs the world hook once.
//!
//! The session ends when the coarse clock reaches its ceiling, when the
//! world hook returns [`WorldTickOutcome::End`], or when a handler calls
//! [`Scheduler::request_end`].

use delve_types::{ActorId, TickoutAction};
use tracing::{debug, error, info, trace};

use crate::clock::{ClockError, GameClock};
use crate::config::TimeConfig;
use crate::decision::DecisionError;
use crate::scheduler::Scheduler;
use crate::session::{DriverStats, SessionEndReason, SessionResult};

/// Errors that abort a session.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Clock arithmetic failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The player's decision source failed.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: DecisionError,
    },

    /// A tickout handler failed.
    #[error("handler for actor {owner} failed: {message}")]
    Handler {
        /// The actor whose handler failed.
        owner: ActorId,
        /// Description of the failure.
        message: String,
    },
}

/// What the world hook wants after a coarse tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldTickOutcome {
    /// Keep going.
    Continue,
    /// End the session.
    End(SessionEndReason),
}

/// The world side of the driver: whatever state handlers act on, plus the
/// hook run once per coarse tick.
pub trait WorldHooks: Sized {
    /// Called once each time the clock lands on a coarse tick boundary.
    ///
    /// This is where periodic world aging happens: status counters, hunger,
    /// spawning. The default does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] to abort the session.
    fn on_world_tick(
        &mut self,
        scheduler: &mut Scheduler<Self>,
    ) -> Result<WorldTickOutcome, DriverError> {
        let _ = scheduler;
        Ok(WorldTickOutcome::Continue)
    }
}

/// Result of one driver iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A tickout was triggered.
    Dispatched {
        /// The actor whose tickout fired.
        owner: ActorId,
        /// The expiry it was scheduled for.
        expiry: u64,
    },
    /// The clock moved forward.
    Advanced {
        /// Milliticks advanced.
        milliticks: u64,
        /// Whether a coarse boundary was reached (and the world hook run).
        crossed_boundary: bool,
    },
    /// The session is over. Returned again by every later call.
    Ended(SessionEndReason),
}

/// Drives a session: owns the [`Scheduler`] and steps it against a world.
#[derive(Debug)]
pub struct Driver<W> {
    scheduler: Scheduler<W>,
    stats: DriverStats,
    ended: Option<SessionEndReason>,
}

impl<W: WorldHooks> Driver<W> {
    /// Create a driver around an existing clock.
    pub const fn new(clock: GameClock) -> Self {
        Self {
            scheduler: Scheduler::new(clock),
            stats: DriverStats {
                dispatched: 0,
                advances: 0,
                world_ticks: 0,
                aftermath_run: 0,
            },
            ended: None,
        }
    }

    /// Create a driver with a fresh clock built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the time configuration is
    /// invalid.
    pub fn from_config(config: &TimeConfig) -> Result<Self, ClockError> {
        Ok(Self::new(GameClock::new(config)?))
    }

    /// The scheduler, for inspection.
    pub const fn scheduler(&self) -> &Scheduler<W> {
        &self.scheduler
    }

    /// The scheduler, for seeding initial tickouts before running.
    pub const fn scheduler_mut(&mut self) -> &mut Scheduler<W> {
        &mut self.scheduler
    }

    /// Counters so far.
    pub const fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Why the session ended, if it has.
    pub const fn end_reason(&self) -> Option<&SessionEndReason> {
        self.ended.as_ref()
    }

    /// Perform one iteration of the main loop.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if a handler or the world hook fails, or if
    /// clock arithmetic overflows. The session is then over: the error is
    /// recorded as [`SessionEndReason::Aborted`] and every later call
    /// returns [`Step::Ended`].
    pub fn step(&mut self, world: &mut W) -> Result<Step, DriverError> {
        if let Some(reason) = &self.ended {
            return Ok(Step::Ended(reason.clone()));
        }

        self.dispatch_or_advance(world).inspect_err(|error| {
            error!(
                %error,
                tick = self.scheduler.tick(),
                millitick = self.scheduler.now(),
                "Session aborted"
            );
            self.ended = Some(SessionEndReason::Aborted {
                error: error.to_string(),
            });
        })
    }

    fn dispatch_or_advance(&mut self, world: &mut W) -> Result<Step, DriverError> {
        let now = self.scheduler.now();
        let due = self
            .scheduler
            .tickouts()
            .earliest()
            .filter(|tickout| tickout.expiry() <= now)
            .map(|tickout| tickout.owner());
        if let Some(tickout) = due.and_then(|owner| self.scheduler.tickouts_mut().detach(owner)) {
            let owner = tickout.owner();
            let expiry = tickout.expiry();
            debug!(%owner, expiry, now, "Dispatching tickout");

            tickout
                .into_handler()
                .on_tickout(world, &mut self.scheduler, owner, TickoutAction::Trigger)?;
            self.stats.dispatched = self.stats.dispatched.saturating_add(1);
            self.flush_aftermath(world);

            if let Some(reason) = self.scheduler.take_end_request() {
                return Ok(self.finish(world, reason));
            }
            return Ok(Step::Dispatched { owner, expiry });
        }

        self.advance(world)
    }

    /// Step until the session ends.
    ///
    /// # Errors
    ///
    /// Returns the first [`DriverError`] raised by a step.
    pub fn run(&mut self, world: &mut W) -> Result<SessionResult, DriverError> {
        info!(
            tick = self.scheduler.tick(),
            tick_ceiling = self.scheduler.clock().tick_ceiling(),
            milliticks_per_tick = self.scheduler.clock().milliticks_per_tick(),
            pending = self.scheduler.tickouts().len(),
            "Session starting"
        );
        loop {
            if let Step::Ended(reason) = self.step(world)? {
                return Ok(self.result(reason));
            }
        }
    }

    /// Step at most `limit` times, stopping early if the session ends.
    /// Returns the end reason if it did.
    ///
    /// # Errors
    ///
    /// Returns the first [`DriverError`] raised by a step.
    pub fn run_steps(
        &mut self,
        world: &mut W,
        limit: usize,
    ) -> Result<Option<SessionEndReason>, DriverError> {
        for _ in 0..limit {
            if let Step::Ended(reason) = self.step(world)? {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// The session result, once ended.
    pub fn session_result(&self) -> Option<SessionResult> {
        self.ended.clone().map(|reason| self.result(reason))
    }

    fn advance(&mut self, world: &mut W) -> Result<Step, DriverError> {
        let now = self.scheduler.now();
        let boundary_skip = self.scheduler.clock().until_boundary();
        let tick_skip = self
            .scheduler
            .tickouts()
            .next_expiry()
            .map_or(u64::MAX, |expiry| expiry.saturating_sub(now));
        let skip = boundary_skip.min(tick_skip);

        let crossed = self.scheduler.clock_mut().advance(skip)?;
        self.stats.advances = self.stats.advances.saturating_add(1);
        trace!(
            from = now,
            by = skip,
            tick = self.scheduler.tick(),
            crossed,
            "Clock advanced"
        );

        if !crossed {
            return Ok(Step::Advanced {
                milliticks: skip,
                crossed_boundary: false,
            });
        }

        self.stats.world_ticks = self.stats.world_ticks.saturating_add(1);
        let outcome = world.on_world_tick(&mut self.scheduler)?;
        self.flush_aftermath(world);

        let tick = self.scheduler.tick();
        if self.scheduler.clock().ceiling_reached() {
            info!(tick, "Tick ceiling reached");
            return Ok(self.finish(world, SessionEndReason::TickCeiling { tick }));
        }
        if let WorldTickOutcome::End(reason) = outcome {
            return Ok(self.finish(world, reason));
        }
        if let Some(reason) = self.scheduler.take_end_request() {
            return Ok(self.finish(world, reason));
        }

        Ok(Step::Advanced {
            milliticks: skip,
            crossed_boundary: true,
        })
    }

    fn flush_aftermath(&mut self, world: &mut W) {
        let ran = self.scheduler.run_aftermath(world);
        if ran > 0 {
            trace!(ran, "Aftermath flushed");
            self.stats.aftermath_run = self
                .stats
                .aftermath_run
                .saturating_add(u64::try_from(ran).unwrap_or(u64::MAX));
        }
    }

    fn finish(&mut self, world: &mut W, reason: SessionEndReason) -> Step {
        self.flush_aftermath(world);
        info!(
            reason = %reason,
            tick = self.scheduler.tick(),
            millitick = self.scheduler.now(),
            "Session over"
        );
        self.ended = Some(reason.clone());
        Step::Ended(reason)
    }

    fn result(&self, end_reason: SessionEndReason) -> SessionResult {
        SessionResult {
            end_reason,
            final_tick: self.scheduler.tick(),
            final_millitick: self.scheduler.now(),
            stats: self.stats,
        }
    }
}
