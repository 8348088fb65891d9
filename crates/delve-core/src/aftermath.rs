//! Deferred post-action callbacks.
//!
//! While an action is being handled, content can push an *aftermath*: work
//! that must wait until the action has fully settled. The driver drains the
//! queue once per finished action.
//!
//! Draining takes the whole pending batch before anything runs. An entry
//! pushed while a batch is running goes into a fresh batch and runs on the
//! next drain, never the current one. Within a batch, entries run newest
//! first.

use std::mem;

/// One-shot queue of deferred work items.
#[derive(Debug)]
pub struct AftermathQueue<T> {
    pending: Vec<T>,
    draining: bool,
}

impl<T> AftermathQueue<T> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            draining: false,
        }
    }

    /// Queue an item for the next drain.
    pub fn push(&mut self, item: T) {
        self.pending.push(item);
    }

    /// Number of items waiting for the next drain.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a batch taken by [`begin_run`](Self::begin_run) is still
    /// being processed.
    pub const fn is_draining(&self) -> bool {
        self.draining
    }

    /// Take the current batch, newest item first, and mark the queue as
    /// draining. The queue is left empty, so pushes made while the batch is
    /// processed land in the next one.
    ///
    /// Starting a second run before [`end_run`](Self::end_run) is a caller
    /// bug and trips a debug assertion.
    pub fn begin_run(&mut self) -> Vec<T> {
        debug_assert!(!self.draining, "aftermath queue drained re-entrantly");
        self.draining = true;
        let mut batch = mem::take(&mut self.pending);
        batch.reverse();
        batch
    }

    /// Mark the current batch as finished.
    pub fn end_run(&mut self) {
        self.draining = false;
    }
}

impl<T> Default for AftermathQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_runs_newest_first() {
        let mut queue = AftermathQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.begin_run(), vec![3, 2, 1]);
        assert!(queue.is_empty());
        queue.end_run();
    }

    #[test]
    fn pushes_during_a_run_go_to_the_next_batch() {
        let mut queue = AftermathQueue::new();
        queue.push("first");
        let batch = queue.begin_run();
        assert!(queue.is_draining());
        for _ in batch {
            queue.push("chained");
        }
        queue.end_run();
        assert!(!queue.is_draining());
        assert_eq!(queue.begin_run(), vec!["chained"]);
        queue.end_run();
    }

    #[test]
    fn empty_run_yields_nothing() {
        let mut queue: AftermathQueue<u8> = AftermathQueue::default();
        assert!(queue.begin_run().is_empty());
        queue.end_run();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "aftermath queue drained re-entrantly")]
    fn nested_run_trips_debug_assertion() {
        let mut queue = AftermathQueue::new();
        queue.push(1);
        let _outer = queue.begin_run();
        let _inner = queue.begin_run();
    }
}
