//! The registry of pending tickouts.
//!
//! A tickout is an actor's claim on a future instant: "wake me at millitick
//! `expiry`". The registry keeps every pending claim ordered by expiry and,
//! among equal expiries, by registration order, so the actor that asked
//! first acts first.
//!
//! Internally the registry is two maps kept in lockstep:
//!
//! - `order`: `(expiry, seq) -> owner`, the trigger order. Its first key is
//!   the head of the chain.
//! - `entries`: `owner -> Tickout`, which gives O(log n) cancellation by
//!   owner without searching the order.
//!
//! Each owner has at most one pending tickout. The handler type `H` is
//! generic so the registry itself knows nothing about worlds or closures.

use std::collections::BTreeMap;
use std::fmt;

use delve_types::ActorId;

/// A scheduled reactivation of one actor.
pub struct Tickout<H> {
    owner: ActorId,
    expiry: u64,
    seq: u64,
    handler: H,
}

impl<H> Tickout<H> {
    /// The actor this tickout belongs to.
    pub const fn owner(&self) -> ActorId {
        self.owner
    }

    /// The millitick at which the owner is due.
    pub const fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Registration sequence number; breaks ties between equal expiries.
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Borrow the handler.
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Consume the tickout, yielding its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }
}

impl<H> fmt::Debug for Tickout<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tickout")
            .field("owner", &self.owner)
            .field("expiry", &self.expiry)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of pending tickouts, at most one per owner.
pub struct TickoutRegistry<H> {
    order: BTreeMap<(u64, u64), ActorId>,
    entries: BTreeMap<ActorId, Tickout<H>>,
    next_seq: u64,
}

impl<H> TickoutRegistry<H> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Register `owner` to be triggered at `expiry`.
    ///
    /// The new entry goes after every existing entry with the same expiry.
    /// An owner may hold only one tickout; scheduling an owner that is
    /// already registered is a caller bug. Debug builds assert; release
    /// builds replace the old entry, which is then dropped.
    pub fn schedule(&mut self, owner: ActorId, expiry: u64, handler: H) {
        debug_assert!(
            !self.entries.contains_key(&owner),
            "actor {owner} already has a pending tickout"
        );
        let _replaced = self.detach(owner);

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let previous = self.order.insert((expiry, seq), owner);
        debug_assert!(previous.is_none(), "tickout sequence number reused");
        self.entries.insert(
            owner,
            Tickout {
                owner,
                expiry,
                seq,
                handler,
            },
        );
    }

    /// Remove `owner`'s tickout, wherever it sits, and hand it back.
    ///
    /// Detaching an owner with nothing pending returns `None` and leaves the
    /// registry unchanged, so repeated detaches are harmless.
    pub fn detach(&mut self, owner: ActorId) -> Option<Tickout<H>> {
        let tickout = self.entries.remove(&owner)?;
        let unlinked = self.order.remove(&(tickout.expiry, tickout.seq));
        debug_assert_eq!(unlinked, Some(owner), "tickout index out of sync");
        Some(tickout)
    }

    /// Move `owner`'s pending tickout to a new expiry, keeping its handler.
    /// The entry is ordered as if freshly scheduled. Returns `false` if the
    /// owner has nothing pending.
    pub fn reschedule(&mut self, owner: ActorId, expiry: u64) -> bool {
        match self.detach(owner) {
            Some(tickout) => {
                self.schedule(owner, expiry, tickout.handler);
                true
            }
            None => false,
        }
    }

    /// The next tickout to trigger, without removing it.
    ///
    /// Taking it out is a separate [`detach`](Self::detach) by the caller
    /// once it decides to trigger.
    pub fn earliest(&self) -> Option<&Tickout<H>> {
        let (_, owner) = self.order.first_key_value()?;
        self.entries.get(owner)
    }

    /// Expiry of the head of the chain.
    pub fn next_expiry(&self) -> Option<u64> {
        self.order.first_key_value().map(|(&(expiry, _), _)| expiry)
    }

    /// Expiry of `owner`'s pending tickout.
    pub fn expiry_of(&self, owner: ActorId) -> Option<u64> {
        self.entries.get(&owner).map(|t| t.expiry)
    }

    /// Whether `owner` has a pending tickout.
    pub fn is_scheduled(&self, owner: ActorId) -> bool {
        self.entries.contains_key(&owner)
    }

    /// Number of pending tickouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending tickouts in trigger order.
    pub fn iter(&self) -> impl Iterator<Item = &Tickout<H>> {
        self.order
            .values()
            .filter_map(|owner| self.entries.get(owner))
    }

    /// Owners in trigger order.
    pub fn owners(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.order.values().copied()
    }
}

impl<H> Default for TickoutRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for TickoutRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
