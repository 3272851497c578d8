//! Cooperative single-threaded timer facility.
//!
//! Timers carry a plain payload instead of a callback. The owner pops due
//! timers one at a time and dispatches them itself, so callbacks never
//! overlap and are observed in due-time order.

use std::collections::BTreeMap;

/// Opaque handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    OneShot,
    Periodic { period_ms: u64 },
}

/// A timer taken off the queue, with the time it was due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub due_ms: u64,
    pub payload: E,
}

#[derive(Debug, Clone)]
struct Timer<E> {
    due_ms: u64,
    kind: TimerKind,
    payload: E,
}

/// Set of pending timers keyed by handle
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    timers: BTreeMap<TimerHandle, Timer<E>>,
    next_id: u64,
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, payload: E) -> TimerHandle {
        self.insert(now_ms.saturating_add(delay_ms), TimerKind::OneShot, payload)
    }

    /// First fire happens one full period after `now_ms`.
    pub fn schedule_periodic(&mut self, now_ms: u64, period_ms: u64, payload: E) -> TimerHandle {
        let period_ms = period_ms.max(1);
        self.insert(
            now_ms.saturating_add(period_ms),
            TimerKind::Periodic { period_ms },
            payload,
        )
    }

    fn insert(&mut self, due_ms: u64, kind: TimerKind, payload: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            handle,
            Timer {
                due_ms,
                kind,
                payload,
            },
        );
        handle
    }

    /// Removes the timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest due time among pending timers
    pub fn next_due(&self) -> Option<u64> {
        self.timers.values().map(|t| t.due_ms).min()
    }

    /// Takes the earliest timer due at or before `now_ms`. Ties go to the
    /// timer scheduled first. Periodic timers are re-armed in place.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<E>> {
        let (&handle, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(h, t)| (t.due_ms, **h))?;

        let timer = self.timers.get_mut(&handle)?;
        let due_ms = timer.due_ms;
        let kind = timer.kind;
        match kind {
            TimerKind::Periodic { period_ms } => match due_ms.checked_add(period_ms) {
                Some(next_due) => {
                    timer.due_ms = next_due;
                    Some(Fired {
                        due_ms,
                        payload: timer.payload.clone(),
                    })
                }
                // no representable next fire time
                None => self.timers.remove(&handle).map(|t| Fired {
                    due_ms,
                    payload: t.payload,
                }),
            },
            TimerKind::OneShot => self.timers.remove(&handle).map(|t| Fired {
                due_ms,
                payload: t.payload,
            }),
        }
    }

    /// Number of pending periodic timers
    pub fn periodic_count(&self) -> usize {
        self.timers
            .values()
            .filter(|t| matches!(t.kind, TimerKind::Periodic { .. }))
            .count()
    }
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, now_ms: u64) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(fired_timer) = queue.pop_due(now_ms) {
            fired.push(fired_timer.payload);
        }
        fired
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(0, 100, "done");

        assert!(queue.pop_due(99).is_none());
        assert_eq!(
            queue.pop_due(150),
            Some(Fired {
                due_ms: 100,
                payload: "done"
            })
        );
        assert!(queue.pop_due(1_000).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn timers_fire_in_due_order_then_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(0, 30, "c");
        queue.schedule_once(0, 10, "a");
        queue.schedule_once(0, 20, "b1");
        queue.schedule_once(0, 20, "b2");

        assert_eq!(drain(&mut queue, 50), vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn periodic_rearms_without_drift() {
        let mut queue = TimerQueue::new();
        queue.schedule_periodic(0, 90, "tick");

        // Late wake-up: all three missed periods are still delivered.
        assert_eq!(drain(&mut queue, 275), vec!["tick", "tick", "tick"]);
        assert_eq!(queue.next_due(), Some(360));
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.periodic_count(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let tick = queue.schedule_periodic(0, 10, "tick");
        let once = queue.schedule_once(0, 5, "once");

        assert!(queue.cancel(tick));
        assert!(queue.cancel(once));
        assert!(!queue.cancel(once));
        assert!(queue.is_empty());
        assert!(drain(&mut queue, 1_000).is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = TimerQueue::new();
        queue.schedule_periodic(0, 10, "tick");
        queue.schedule_once(0, 5, "once");
        queue.clear();
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn next_due_tracks_earliest_timer() {
        let mut queue = TimerQueue::new();
        let tick = queue.schedule_periodic(100, 170, "tick");
        queue.schedule_once(100, 500, "once");
        assert_eq!(queue.next_due(), Some(270));
        assert_eq!(queue.periodic_count(), 1);

        queue.cancel(tick);
        assert_eq!(queue.next_due(), Some(600));
        assert_eq!(queue.periodic_count(), 0);
    }

    #[test]
    fn huge_delays_saturate_instead_of_overflowing() {
        let mut queue = TimerQueue::new();
        queue.schedule_periodic(u64::MAX - 1, u64::MAX, "tick");
        queue.schedule_once(10, u64::MAX, "once");
        assert_eq!(queue.next_due(), Some(u64::MAX));

        assert_eq!(drain(&mut queue, u64::MAX), vec!["tick", "once"]);
        // a periodic timer that cannot be re-armed is retired
        assert!(queue.is_empty());
    }
}
