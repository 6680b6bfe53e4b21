// Event scheduling for the animation domain
// Holds one-shot delayed events ordered by due time

use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;

/// Handle returned when an event is scheduled; used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A pending event
#[derive(Debug, Clone)]
pub struct Scheduled<E> {
    pub token: TimerToken,
    /// Absolute due time in clock seconds
    pub due: f64,
    pub payload: E,
}

/// Queue of events sorted by due time, then by scheduling order
#[derive(Debug)]
pub struct EventQueue<E> {
    events: Vec<Scheduled<E>>,
    next_id: u64,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        EventQueue {
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an event due at an absolute time
    pub fn schedule_at(&mut self, due: f64, payload: E) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;

        // Insert after every event due at or before `due` so equal due times
        // fire in the order they were scheduled.
        let pos = self.events.partition_point(|e| e.due <= due);
        self.events.insert(pos, Scheduled { token, due, payload });
        token
    }

    /// Remove a pending event. Returns its payload if it had not fired yet.
    pub fn cancel(&mut self, token: TimerToken) -> Option<E> {
        let pos = self.events.iter().position(|e| e.token == token)?;
        Some(self.events.remove(pos).payload)
    }

    /// Check whether an event is still pending
    pub fn contains(&self, token: TimerToken) -> bool {
        self.events.iter().any(|e| e.token == token)
    }

    /// Pop the earliest event due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<Scheduled<E>> {
        match self.events.first() {
            Some(first) if first.due <= now => Some(self.events.remove(0)),
            _ => None,
        }
    }

    /// Due time of the earliest pending event
    pub fn next_due(&self) -> Option<f64> {
        self.events.first().map(|e| e.due)
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Delayed-event scheduler bound to a clock
///
/// `after(delay, event)` is the only way the animation domain defers work.
/// Tests drive it with a `ManualClock` instead of sleeping.
pub struct Scheduler<E> {
    clock: Arc<dyn Clock>,
    queue: EventQueue<E>,
}

impl<E> Scheduler<E> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: EventQueue::new(),
        }
    }

    /// Current clock time in seconds
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Schedule `event` to fire `delay` from now
    pub fn after(&mut self, delay: Duration, event: E) -> TimerToken {
        let due = self.clock.now() + delay.as_secs_f64();
        self.queue.schedule_at(due, event)
    }

    /// Cancel a pending event; a no-op if it already fired
    pub fn cancel(&mut self, token: TimerToken) -> Option<E> {
        self.queue.cancel(token)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.queue.contains(token)
    }

    /// Pop the next event that is due right now
    pub fn pop_due(&mut self) -> Option<Scheduled<E>> {
        let now = self.clock.now();
        self.queue.pop_due(now)
    }

    /// Time until the next event fires (zero if one is already due)
    pub fn time_until_next(&self) -> Option<Duration> {
        self.queue.next_due().map(|due| {
            let wait = due - self.clock.now();
            if wait > 0.0 {
                Duration::from_secs_f64(wait)
            } else {
                Duration::ZERO
            }
        })
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::clock::ManualClock;

    #[test]
    fn test_queue_orders_by_due_time() {
        let mut queue = EventQueue::new();
        queue.schedule_at(2.0, "late");
        queue.schedule_at(1.0, "early");
        queue.schedule_at(1.5, "middle");

        assert_eq!(queue.pop_due(10.0).map(|e| e.payload), Some("early"));
        assert_eq!(queue.pop_due(10.0).map(|e| e.payload), Some("middle"));
        assert_eq!(queue.pop_due(10.0).map(|e| e.payload), Some("late"));
        assert!(queue.pop_due(10.0).is_none());
    }

    #[test]
    fn test_queue_equal_due_keeps_schedule_order() {
        let mut queue = EventQueue::new();
        queue.schedule_at(1.0, 1);
        queue.schedule_at(1.0, 2);
        queue.schedule_at(1.0, 3);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_due(1.0).map(|e| e.payload)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_queue_not_due_yet() {
        let mut queue = EventQueue::new();
        queue.schedule_at(1.0, ());
        assert!(queue.pop_due(0.999).is_none());
        assert!(queue.pop_due(1.0).is_some());
    }

    #[test]
    fn test_cancel() {
        let mut queue = EventQueue::new();
        let a = queue.schedule_at(1.0, 'a');
        let b = queue.schedule_at(2.0, 'b');

        assert_eq!(queue.cancel(a), Some('a'));
        assert_eq!(queue.cancel(a), None);
        assert!(queue.contains(b));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_scheduler_after_uses_clock() {
        let clock = ManualClock::starting_at(10.0);
        let mut scheduler = Scheduler::new(Arc::new(clock.clone()));

        scheduler.after(Duration::from_millis(500), "hold");
        assert!(scheduler.pop_due().is_none());
        assert_eq!(scheduler.time_until_next(), Some(Duration::from_millis(500)));

        clock.advance(Duration::from_millis(500));
        let fired = scheduler.pop_due().unwrap();
        assert_eq!(fired.payload, "hold");
        assert_eq!(fired.due, 10.5);
        assert_eq!(scheduler.time_until_next(), None);
    }

    #[test]
    fn test_scheduler_cancel_pending() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(Arc::new(clock.clone()));
        let token = scheduler.after(Duration::from_millis(50), 7);
        assert!(scheduler.is_pending(token));
        assert_eq!(scheduler.cancel(token), Some(7));

        clock.advance(Duration::from_secs(1));
        assert!(scheduler.pop_due().is_none());
    }
}
