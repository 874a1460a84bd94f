//! Deadline-ordered timer callbacks.
//!
//! Ticks live in a min-heap keyed by deadline. Cancelling a tick invalidates
//! its token; stale heap entries are skipped when they surface.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use slotmap::{SlotMap, new_key_type};
use tracing::debug;

use crate::error::{Error, Result};

new_key_type! {
    /// Token identifying a scheduled tick.
    pub struct TickToken;
}

/// Heap entry. Ordered by deadline, then by scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    /// Absolute deadline in milliseconds.
    deadline: u64,
    /// Monotonic sequence number for stable ordering.
    seq: u64,
    /// Owning tick.
    token: TickToken,
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

/// A scheduled tick.
#[derive(Debug)]
struct Entry<T> {
    /// Current deadline.
    deadline: u64,
    /// Re-arm period. Zero makes the tick one-shot.
    period: u64,
    /// Task payload, absent while the tick is being run.
    task: Option<T>,
}

/// A tick that has come due, handed out by [`TickScheduler::pop_due`].
#[derive(Debug)]
pub struct Due<T> {
    /// Token of the tick.
    pub token: TickToken,
    /// Deadline that was reached.
    pub deadline: u64,
    /// Task payload.
    pub task: T,
}

/// A bounded table of one-shot and periodic ticks.
#[derive(Debug)]
pub struct TickScheduler<T> {
    /// Deadline heap, possibly holding stale entries.
    heap: BinaryHeap<Reverse<Pending>>,
    /// Live ticks.
    entries: SlotMap<TickToken, Entry<T>>,
    /// Next sequence number.
    seq: u64,
    /// Maximum number of live ticks.
    capacity: usize,
}

impl<T> TickScheduler<T> {
    /// Create a scheduler holding at most `capacity` ticks.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: SlotMap::with_key(),
            seq: 0,
            capacity,
        }
    }

    /// Number of live ticks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no live ticks?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push a heap entry for a tick.
    fn arm(&mut self, token: TickToken, deadline: u64) {
        self.seq += 1;
        self.heap.push(Reverse(Pending {
            deadline,
            seq: self.seq,
            token,
        }));
    }

    /// Schedule `task` to run `delay` milliseconds after `now`, then every
    /// `period` milliseconds for as long as the task asks to be re-armed.
    pub fn schedule(&mut self, now: u64, delay: u64, period: u64, task: T) -> Result<TickToken> {
        if self.entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "tick table full");
            return Err(Error::TickTableFull(self.capacity));
        }
        let deadline = now.saturating_add(delay);
        let token = self.entries.insert(Entry {
            deadline,
            period,
            task: Some(task),
        });
        self.arm(token, deadline);
        Ok(token)
    }

    /// Invalidate a tick. Returns false if the token was not live.
    pub fn cancel(&mut self, token: TickToken) -> bool {
        self.entries.remove(token).is_some()
    }

    /// Is the tick still scheduled or running?
    pub fn is_live(&self, token: TickToken) -> bool {
        self.entries.contains_key(token)
    }

    /// The earliest live deadline.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_stale();
        self.heap.peek().map(|Reverse(p)| p.deadline)
    }

    /// Drop stale entries from the top of the heap.
    fn discard_stale(&mut self) {
        while let Some(Reverse(top)) = self.heap.peek() {
            let live = self
                .entries
                .get(top.token)
                .is_some_and(|e| e.deadline == top.deadline && e.task.is_some());
            if live {
                break;
            }
            self.heap.pop();
        }
    }

    /// Take the next tick whose deadline is at or before `now`. The tick stays
    /// reserved until it is handed back through [`finish`](Self::finish).
    pub fn pop_due(&mut self, now: u64) -> Option<Due<T>> {
        self.discard_stale();
        let Reverse(top) = *self.heap.peek()?;
        if top.deadline > now {
            return None;
        }
        self.heap.pop();
        let task = self.entries.get_mut(top.token)?.task.take()?;
        Some(Due {
            token: top.token,
            deadline: top.deadline,
            task,
        })
    }

    /// Return a tick that has run. With `rearm` set, periodic ticks are armed
    /// again one period after the deadline that was reached; everything else
    /// is removed. Ticks cancelled while running are dropped.
    pub fn finish(&mut self, due: Due<T>, rearm: bool) {
        let Some(entry) = self.entries.get_mut(due.token) else {
            return;
        };
        if rearm && entry.period > 0 {
            let deadline = due.deadline.saturating_add(entry.period);
            entry.deadline = deadline;
            entry.task = Some(due.task);
            self.arm(due.token, deadline);
        } else {
            self.entries.remove(due.token);
        }
    }

    /// Run every due tick through `f`, re-arming those for which it returns
    /// true. Returns the number of ticks run.
    pub fn run_due(&mut self, now: u64, mut f: impl FnMut(TickToken, &mut T) -> bool) -> usize {
        let mut n = 0;
        while let Some(mut due) = self.pop_due(now) {
            let rearm = f(due.token, &mut due.task);
            self.finish(due, rearm);
            n += 1;
        }
        n
    }

    /// Drop every tick.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_and_one_shot() -> Result<()> {
        let mut s = TickScheduler::new(8);
        s.schedule(0, 100, 0, "late")?;
        s.schedule(0, 10, 0, "early")?;
        s.schedule(0, 10, 0, "early2")?;
        assert_eq!(s.next_deadline(), Some(10));

        let mut fired = vec![];
        s.run_due(50, |_, t| {
            fired.push(*t);
            true
        });
        assert_eq!(fired, vec!["early", "early2"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_deadline(), Some(100));
        Ok(())
    }

    #[test]
    fn periodic_rearm_catches_up() -> Result<()> {
        let mut s = TickScheduler::new(8);
        s.schedule(0, 100, 30, 0u32)?;
        assert_eq!(s.run_due(99, |_, _| true), 0);
        // Deadlines at 100, 130, 160 and 190.
        let mut count = 0;
        s.run_due(190, |_, c| {
            *c += 1;
            count = *c;
            true
        });
        assert_eq!(count, 4);
        assert_eq!(s.next_deadline(), Some(220));
        Ok(())
    }

    #[test]
    fn returning_false_stops() -> Result<()> {
        let mut s = TickScheduler::new(8);
        let t = s.schedule(0, 5, 5, ())?;
        assert_eq!(s.run_due(5, |_, _| false), 1);
        assert!(!s.is_live(t));
        assert!(s.is_empty());
        Ok(())
    }

    #[test]
    fn cancel_invalidates_token() -> Result<()> {
        let mut s = TickScheduler::new(8);
        let t = s.schedule(0, 5, 5, ())?;
        assert!(s.cancel(t));
        assert!(!s.cancel(t));
        assert_eq!(s.run_due(1000, |_, _| true), 0);
        assert_eq!(s.next_deadline(), None);
        Ok(())
    }

    #[test]
    fn cancel_while_running() -> Result<()> {
        let mut s = TickScheduler::new(8);
        let t = s.schedule(0, 5, 5, ())?;
        let due = s.pop_due(5).ok_or(Error::Internal("not due".into()))?;
        assert!(s.cancel(t));
        s.finish(due, true);
        assert!(s.is_empty());
        assert_eq!(s.next_deadline(), None);
        Ok(())
    }

    #[test]
    fn table_full() -> Result<()> {
        let mut s = TickScheduler::new(2);
        s.schedule(0, 1, 0, 1)?;
        s.schedule(0, 1, 0, 2)?;
        assert_eq!(s.schedule(0, 1, 0, 3), Err(Error::TickTableFull(2)));
        assert_eq!(s.len(), 2);
        Ok(())
    }
}
