//! One-shot timer queue.
//!
//! Timers are measured against a monotonic clock owned by the queue. The
//! host advances the clock (from its event loop, or explicitly in tests) and
//! receives the timers that became due, in firing order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

use crate::error::TimerError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    /// When this timer fires, relative to the queue's epoch.
    fire_at: Duration,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_at: Duration,
    /// Insertion order, used to keep equal deadlines first-in first-out.
    sequence: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.sequence == other.sequence
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Queue of pending one-shot timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of fire times. Cancelled timers are skipped lazily.
    queue: BinaryHeap<TimerQueueEntry>,
    /// Time elapsed since the queue was created.
    now: Duration,
    sequence: u64,
}

impl TimerQueue {
    /// Create an empty queue with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time of the queue's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Start a one-shot timer that fires after `delay`.
    pub fn start_one_shot(&mut self, delay: Duration) -> TimerId {
        let fire_at = self.now + delay;
        let id = self.timers.insert(TimerData { fire_at });
        self.sequence += 1;
        self.queue.push(TimerQueueEntry {
            id,
            fire_at,
            sequence: self.sequence,
        });
        tracing::trace!(target: targets::TIMER, ?id, ?delay, "timer started");
        id
    }

    /// Cancel a pending timer.
    pub fn cancel(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.timers
            .remove(id)
            .map(|_| tracing::trace!(target: targets::TIMER, ?id, "timer cancelled"))
            .ok_or(TimerError::InvalidTimerId)
    }

    /// Whether a timer is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Number of pending timers.
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Advance the clock by `elapsed` and return the timers that fired.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerId> {
        self.now += elapsed;
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.fire_at > self.now {
                break;
            }
            let entry = *entry;
            self.queue.pop();
            // Skip entries whose timer was cancelled.
            if self.timers.remove(entry.id).is_some() {
                fired.push(entry.id);
            }
        }

        if !fired.is_empty() {
            tracing::trace!(target: targets::TIMER, count = fired.len(), "timers fired");
        }
        fired
    }

    /// Time until the next pending timer fires, if any.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers
            .values()
            .map(|timer| timer.fire_at.saturating_sub(self.now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_after_delay() {
        let mut queue = TimerQueue::new();
        let id = queue.start_one_shot(Duration::from_millis(250));

        assert!(queue.advance(Duration::from_millis(249)).is_empty());
        assert_eq!(queue.advance(Duration::from_millis(1)), vec![id]);
        assert!(!queue.is_pending(id));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.start_one_shot(Duration::from_millis(10));

        assert!(queue.cancel(id).is_ok());
        assert!(queue.cancel(id).is_err());
        assert!(queue.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_fire_order() {
        let mut queue = TimerQueue::new();
        let late = queue.start_one_shot(Duration::from_millis(30));
        let early = queue.start_one_shot(Duration::from_millis(10));
        let same = queue.start_one_shot(Duration::from_millis(10));

        assert_eq!(queue.advance(Duration::from_millis(50)), vec![early, same, late]);
    }

    #[test]
    fn test_time_until_next() {
        let mut queue = TimerQueue::new();
        assert_eq!(queue.time_until_next(), None);
        queue.start_one_shot(Duration::from_millis(100));
        queue.advance(Duration::from_millis(40));
        assert_eq!(queue.time_until_next(), Some(Duration::from_millis(60)));
    }
}
