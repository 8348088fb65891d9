//! Property tests for tickout ordering.

#![allow(clippy::unwrap_used)]

use delve_core::tickout::{Tickout, TickoutRegistry};
use delve_types::ActorId;
use proptest::prelude::*;

/// Schedule one entry per expiry (handler = registration index), then take
/// the head repeatedly.
fn schedule_and_drain(expiries: &[u64]) -> Vec<(u64, usize)> {
    let mut registry = TickoutRegistry::new();
    for (index, &expiry) in expiries.iter().enumerate() {
        registry.schedule(ActorId::new(), expiry, index);
    }
    let mut fired = Vec::with_capacity(expiries.len());
    while let Some(owner) = registry.earliest().map(Tickout::owner) {
        let tickout = registry.detach(owner).unwrap();
        fired.push((tickout.expiry(), tickout.into_handler()));
    }
    fired
}

proptest! {
    #[test]
    fn drain_order_is_sorted_and_stable(expiries in prop::collection::vec(0u64..50, 0..64)) {
        let fired = schedule_and_drain(&expiries);
        prop_assert_eq!(fired.len(), expiries.len());

        // A stable sort by expiry is exactly "earliest first, FIFO on ties".
        let mut expected: Vec<(u64, usize)> = expiries
            .iter()
            .copied()
            .enumerate()
            .map(|(index, expiry)| (expiry, index))
            .collect();
        expected.sort_by_key(|&(expiry, _)| expiry);
        prop_assert_eq!(fired, expected);
    }

    #[test]
    fn cancelled_entries_never_fire(
        expiries in prop::collection::vec(0u64..1000, 1..40),
        cancel_mask in prop::collection::vec(any::<bool>(), 40),
    ) {
        let mut registry = TickoutRegistry::new();
        let mut kept = Vec::new();
        let mut owners = Vec::new();
        for (index, &expiry) in expiries.iter().enumerate() {
            let owner = ActorId::new();
            registry.schedule(owner, expiry, index);
            owners.push(owner);
        }
        for ((index, owner), cancel) in owners.iter().enumerate().zip(&cancel_mask) {
            if *cancel {
                prop_assert!(registry.detach(*owner).is_some());
                prop_assert!(registry.detach(*owner).is_none());
            } else {
                kept.push(index);
            }
        }
        prop_assert_eq!(registry.len(), kept.len());

        let mut fired: Vec<usize> = Vec::new();
        let mut last = 0;
        while let Some(owner) = registry.earliest().map(Tickout::owner) {
            let tickout = registry.detach(owner).unwrap();
            prop_assert!(tickout.expiry() >= last);
            last = tickout.expiry();
            fired.push(tickout.into_handler());
        }
        fired.sort_unstable();
        prop_assert_eq!(fired, kept);
    }
}
