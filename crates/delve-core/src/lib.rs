//! Tickout scheduling, dual-speed clock, and turn control for Delve.
//!
//! This crate decides which actor acts next and when. Actors register a
//! *tickout* (an absolute millitick at which they are next due) and the
//! [`Driver`] repeatedly triggers the most imminent one, advancing the
//! [`GameClock`] whenever nothing is due and running the world-tick hook
//! each time a coarse tick boundary is crossed.
//!
//! # Modules
//!
//! - [`clock`] -- Dual-granularity clock (coarse ticks, fine milliticks)
//!   with checked arithmetic and a session ceiling.
//! - [`speed`] -- Conversion from actor speed to millitick delays.
//! - [`tickout`] -- The ordered registry of pending tickouts.
//! - [`aftermath`] -- One-shot queue of deferred post-action callbacks.
//! - [`scheduler`] -- The facade handlers receive: clock, registry, and
//!   aftermath queue in one value.
//! - [`driver`] -- The resumable step loop that drives a session.
//! - [`session`] -- End reasons, session results, and end-of-run logging.
//! - [`turn`] -- The player turn state machine (running, counting down,
//!   sliding, resting).
//! - [`decision`] -- [`DecisionSource`] trait plus scripted and stub sources.
//! - [`config`] -- Configuration loading from `delve-config.yaml`.
//!
//! [`Driver`]: driver::Driver
//! [`GameClock`]: clock::GameClock
//! [`DecisionSource`]: decision::DecisionSource

pub mod aftermath;
pub mod clock;
pub mod config;
pub mod decision;
pub mod driver;
pub mod scheduler;
pub mod session;
pub mod speed;
pub mod tickout;
pub mod turn;
