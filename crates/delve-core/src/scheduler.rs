//! The scheduling facade handed to tickout handlers and world hooks.
//!
//! A [`Scheduler`] owns the clock, the tickout registry, and the aftermath
//! queue for one session. Handlers receive `&mut Scheduler<W>` alongside the
//! world, which is everything they need to reschedule themselves, cancel
//! other actors, queue aftermath work, or ask for the session to end.

use std::fmt;

use delve_types::{ActorId, TickoutAction};

use crate::aftermath::AftermathQueue;
use crate::clock::{ClockError, GameClock};
use crate::driver::DriverError;
use crate::session::SessionEndReason;
use crate::tickout::TickoutRegistry;

/// A deferred callback run after the current action settles.
pub type AftermathFn<W> = Box<dyn FnOnce(&mut W, &mut Scheduler<W>)>;

/// Something that runs when an actor's tickout expires.
///
/// The handler is consumed by the call. An actor that wants another turn
/// schedules a handler (usually itself) again before returning; one that
/// does not is simply never triggered again.
pub trait TickoutHandler<W> {
    /// React to the tickout of `owner` expiring.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the action cannot be carried out. The
    /// error aborts the session.
    fn on_tickout(
        self: Box<Self>,
        world: &mut W,
        scheduler: &mut Scheduler<W>,
        owner: ActorId,
        action: TickoutAction,
    ) -> Result<(), DriverError>;
}

/// Adapts a closure into a [`TickoutHandler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    /// Wrap a closure and box it as a handler.
    pub fn boxed<W>(f: F) -> Box<dyn TickoutHandler<W>>
    where
        F: FnOnce(&mut W, &mut Scheduler<W>, ActorId, TickoutAction) -> Result<(), DriverError>
            + 'static,
    {
        Box::new(Self(f))
    }
}

impl<W, F> TickoutHandler<W> for FnHandler<F>
where
    F: FnOnce(&mut W, &mut Scheduler<W>, ActorId, TickoutAction) -> Result<(), DriverError>,
{
    fn on_tickout(
        self: Box<Self>,
        world: &mut W,
        scheduler: &mut Scheduler<W>,
        owner: ActorId,
        action: TickoutAction,
    ) -> Result<(), DriverError> {
        (self.0)(world, scheduler, owner, action)
    }
}

/// Clock, tickout registry, and aftermath queue for one session.
pub struct Scheduler<W> {
    clock: GameClock,
    tickouts: TickoutRegistry<Box<dyn TickoutHandler<W>>>,
    aftermath: AftermathQueue<AftermathFn<W>>,
    end_request: Option<SessionEndReason>,
}

impl<W> Scheduler<W> {
    /// Create a scheduler around a clock, with nothing pending.
    pub const fn new(clock: GameClock) -> Self {
        Self {
            clock,
            tickouts: TickoutRegistry::new(),
            aftermath: AftermathQueue::new(),
            end_request: None,
        }
    }

    /// Current fine time.
    pub const fn now(&self) -> u64 {
        self.clock.milliticks()
    }

    /// Current coarse time.
    pub const fn tick(&self) -> u64 {
        self.clock.ticks()
    }

    /// The session clock.
    pub const fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The pending tickouts.
    pub const fn tickouts(&self) -> &TickoutRegistry<Box<dyn TickoutHandler<W>>> {
        &self.tickouts
    }

    /// Schedule `owner` to be triggered at absolute millitick `expiry`.
    ///
    /// An expiry at or before [`now`](Self::now) fires before the clock
    /// moves again.
    pub fn schedule_tickout(
        &mut self,
        owner: ActorId,
        expiry: u64,
        handler: Box<dyn TickoutHandler<W>>,
    ) {
        self.tickouts.schedule(owner, expiry, handler);
    }

    /// Schedule `owner` to be triggered `delay` milliticks from now.
    /// Returns the absolute expiry.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the expiry exceeds `u64::MAX`.
    pub fn schedule_in(
        &mut self,
        owner: ActorId,
        delay: u64,
        handler: Box<dyn TickoutHandler<W>>,
    ) -> Result<u64, ClockError> {
        let expiry = self
            .now()
            .checked_add(delay)
            .ok_or(ClockError::Overflow { what: "tickout expiry" })?;
        self.schedule_tickout(owner, expiry, handler);
        Ok(expiry)
    }

    /// Cancel `owner`'s pending tickout. Returns `false` if there was none.
    pub fn cancel_tickout(&mut self, owner: ActorId) -> bool {
        self.tickouts.detach(owner).is_some()
    }

    /// Move `owner`'s pending tickout to a new expiry. Returns `false` if
    /// there was none.
    pub fn reschedule(&mut self, owner: ActorId, expiry: u64) -> bool {
        self.tickouts.reschedule(owner, expiry)
    }

    /// Whether `owner` has a pending tickout.
    pub fn is_scheduled(&self, owner: ActorId) -> bool {
        self.tickouts.is_scheduled(owner)
    }

    /// Queue work to run once the current action has settled.
    pub fn schedule_aftermath(&mut self, callback: impl FnOnce(&mut W, &mut Self) + 'static) {
        self.aftermath.push(Box::new(callback));
    }

    /// Aftermath callbacks waiting for the next flush.
    pub fn pending_aftermath(&self) -> usize {
        self.aftermath.len()
    }

    /// Run every queued aftermath callback once, newest first, and return
    /// how many ran.
    ///
    /// Callbacks queued by the callbacks themselves wait for the next call.
    /// Calling this from inside an aftermath callback is a bug and trips a
    /// debug assertion.
    pub fn run_aftermath(&mut self, world: &mut W) -> usize {
        let batch = self.aftermath.begin_run();
        let count = batch.len();
        for callback in batch {
            callback(world, self);
        }
        self.aftermath.end_run();
        count
    }

    /// Ask the driver to end the session once the current step settles.
    /// The first request wins; later ones are ignored.
    pub fn request_end(&mut self, reason: SessionEndReason) {
        if self.end_request.is_none() {
            self.end_request = Some(reason);
        }
    }

    /// The pending end request, if any.
    pub const fn end_requested(&self) -> Option<&SessionEndReason> {
        self.end_request.as_ref()
    }

    pub(crate) const fn take_end_request(&mut self) -> Option<SessionEndReason> {
        self.end_request.take()
    }

    pub(crate) const fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    pub(crate) const fn tickouts_mut(&mut self) -> &mut TickoutRegistry<Box<dyn TickoutHandler<W>>> {
        &mut self.tickouts
    }
}

impl<W> fmt::Debug for Scheduler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("tickouts", &self.tickouts)
            .field("pending_aftermath", &self.aftermath.len())
            .field("end_request", &self.end_request)
            .finish()
    }
}
