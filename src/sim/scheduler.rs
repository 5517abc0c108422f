//! Deferred work on the session clock
//!
//! Cascades (chain, mega, mystery) and the boss warning-then-spawn sequence
//! are queued here instead of firing immediately. Entries are not
//! cancellable; handlers re-check that their target still exists and is
//! still active. The clock only advances while the session is playing.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::balloon::BalloonKind;

/// Score awarded by a cascade pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeScore {
    /// The balloon's own table value
    Own,
    Flat(u64),
}

/// A deferred action
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Pop a balloon without combo or secondary effects
    CascadePop { balloon_id: u32, score: CascadeScore },
    /// Pop a balloon through the full hit path
    AutoPop { balloon_id: u32 },
    /// Spawn one balloon, optionally of a forced kind
    Spawn(Option<BalloonKind>),
    /// Bring in the next boss
    SpawnBoss,
}

#[derive(Debug, Clone)]
struct Scheduled {
    fire_at_ms: f64,
    seq: u64,
    action: Deferred,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at_ms
            .total_cmp(&other.fire_at_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred actions ordered by fire time, then insertion order
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f32, action: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            fire_at_ms: now_ms + f64::from(delay_ms.max(0.0)),
            seq,
            action,
        }));
    }

    /// Remove and return the earliest action due at `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Deferred> {
        match self.heap.peek() {
            Some(Reverse(next)) if next.fire_at_ms <= now_ms => {
                self.heap.pop().map(|Reverse(s)| s.action)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(0.0, 300.0, Deferred::SpawnBoss);
        s.schedule(0.0, 100.0, Deferred::Spawn(None));
        s.schedule(0.0, 200.0, Deferred::Spawn(Some(BalloonKind::Bomb)));

        assert_eq!(s.pop_due(50.0), None);
        assert_eq!(s.pop_due(250.0), Some(Deferred::Spawn(None)));
        assert_eq!(s.pop_due(250.0), Some(Deferred::Spawn(Some(BalloonKind::Bomb))));
        assert_eq!(s.pop_due(250.0), None);
        assert_eq!(s.pop_due(300.0), Some(Deferred::SpawnBoss));
        assert!(s.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut s = Scheduler::new();
        for id in 0..5 {
            s.schedule(10.0, 0.0, Deferred::AutoPop { balloon_id: id });
        }
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(10.0)).collect();
        let expected: Vec<_> = (0..5).map(|id| Deferred::AutoPop { balloon_id: id }).collect();
        assert_eq!(order, expected);
    }
}
