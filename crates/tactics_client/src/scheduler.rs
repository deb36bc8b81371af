//! Pausable timer registry.
//!
//! The [`Scheduler`] never talks to a host timer. It stores every pending
//! task with its delay and start time and hands out due tasks when asked.
//! Pausing converts each running timer into its remaining delay
//! (`delay - (pause - start)`); resuming restarts it from there. Tasks
//! deferred while paused are kept in a resolver queue and handed back on
//! resume, so nothing requested during a pause is dropped.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Source of the current time, relative to an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug)]
struct TimerEntry<T> {
    /// Remaining delay, measured from `start`.
    delay: Duration,
    /// When the timer (re)started. `None` while suspended.
    start: Option<Duration>,
    task: T,
}

impl<T> TimerEntry<T> {
    fn deadline(&self) -> Option<Duration> {
        self.start.map(|start| start + self.delay)
    }
}

/// Timer registry with pause/resume support.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    timers: BTreeMap<TimerId, TimerEntry<T>>,
    paused_at: Option<Duration>,
    resolvers: VecDeque<T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty, running scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            timers: BTreeMap::new(),
            paused_at: None,
            resolvers: VecDeque::new(),
        }
    }

    /// Run `task` once `delay` has elapsed after `now`.
    ///
    /// A timer scheduled while paused does not start counting until resume.
    pub fn schedule(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let start = if self.paused_at.is_some() {
            None
        } else {
            Some(now)
        };
        self.timers.insert(id, TimerEntry { delay, start, task });
        id
    }

    /// Cancel a timer, returning its task if it was still pending.
    pub fn clear(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(&id).map(|entry| entry.task)
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Remove and return every task due at `now`, earliest deadline first.
    ///
    /// Returns nothing while paused.
    pub fn due(&mut self, now: Duration) -> Vec<T> {
        std::iter::from_fn(|| self.pop_due(now)).collect()
    }

    /// Remove and return the earliest task due at `now`. Ties go to the
    /// timer scheduled first.
    pub fn pop_due(&mut self, now: Duration) -> Option<T> {
        if self.paused_at.is_some() {
            return None;
        }
        let (_, id) = self
            .timers
            .iter()
            .filter_map(|(id, entry)| entry.deadline().map(|deadline| (deadline, *id)))
            .filter(|(deadline, _)| *deadline <= now)
            .min()?;
        self.timers.remove(&id).map(|entry| entry.task)
    }

    /// The earliest deadline among running timers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().filter_map(TimerEntry::deadline).min()
    }

    /// Suspend every running timer, keeping its remaining delay.
    pub fn pause(&mut self, now: Duration) {
        if self.paused_at.is_some() {
            return;
        }
        for entry in self.timers.values_mut() {
            if let Some(start) = entry.start.take() {
                let elapsed = now.saturating_sub(start);
                entry.delay = entry.delay.saturating_sub(elapsed);
            }
        }
        self.paused_at = Some(now);
    }

    /// Restart suspended timers from `now` and hand back deferred tasks in
    /// the order they were deferred.
    pub fn resume(&mut self, now: Duration) -> Vec<T> {
        if self.paused_at.take().is_none() {
            return Vec::new();
        }
        for entry in self.timers.values_mut() {
            entry.start.get_or_insert(now);
        }
        self.resolvers.drain(..).collect()
    }

    /// Keep `task` until the next resume. Returns it back when not paused.
    pub fn defer(&mut self, task: T) -> Option<T> {
        if self.paused_at.is_some() {
            self.resolvers.push_back(task);
            None
        } else {
            Some(task)
        }
    }

    /// Whether the scheduler is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Remaining delay of a timer: exact while paused, measured from `now`
    /// while running.
    #[must_use]
    pub fn remaining(&self, id: TimerId, now: Duration) -> Option<Duration> {
        self.timers.get(&id).map(|entry| match entry.deadline() {
            Some(deadline) => deadline.saturating_sub(now),
            None => entry.delay,
        })
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer and no deferred task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_due_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(0), ms(30), "late");
        scheduler.schedule(ms(0), ms(10), "early");
        scheduler.schedule(ms(5), ms(100), "pending");

        assert!(scheduler.due(ms(9)).is_empty());
        assert_eq!(scheduler.due(ms(30)), vec!["early", "late"]);
        assert_eq!(scheduler.next_deadline(), Some(ms(105)));
    }

    #[test]
    fn test_clear_cancels() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(ms(0), ms(10), 1);
        assert_eq!(scheduler.clear(id), Some(1));
        assert_eq!(scheduler.clear(id), None);
        assert!(scheduler.due(ms(100)).is_empty());
    }

    #[test]
    fn test_pause_preserves_remaining_delay() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(ms(0), ms(100), "timer");
        scheduler.pause(ms(40));
        assert_eq!(scheduler.remaining(id, ms(500)), Some(ms(60)));
        assert!(scheduler.due(ms(1000)).is_empty());
        assert_eq!(scheduler.next_deadline(), None);

        scheduler.resume(ms(1000));
        assert!(scheduler.due(ms(1059)).is_empty());
        assert_eq!(scheduler.due(ms(1060)), vec!["timer"]);
    }

    #[test]
    fn test_timer_scheduled_while_paused_starts_on_resume() {
        let mut scheduler = Scheduler::new();
        scheduler.pause(ms(0));
        scheduler.schedule(ms(10), ms(50), "timer");
        scheduler.resume(ms(200));
        assert!(scheduler.due(ms(249)).is_empty());
        assert_eq!(scheduler.due(ms(250)), vec!["timer"]);
    }

    #[test]
    fn test_deferred_tasks_flush_on_resume() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.defer("now"), Some("now"));
        scheduler.pause(ms(0));
        assert_eq!(scheduler.defer("first"), None);
        assert_eq!(scheduler.defer("second"), None);
        assert!(!scheduler.is_empty());
        assert_eq!(scheduler.resume(ms(1)), vec!["first", "second"]);
        assert!(scheduler.is_empty());
    }

    proptest! {
        #[test]
        fn prop_resume_never_fires_early(delay in 1u64..10_000, elapsed in 0u64..10_000, gap in 0u64..10_000) {
            let elapsed = elapsed.min(delay - 1);
            let mut scheduler = Scheduler::new();
            scheduler.schedule(ms(0), ms(delay), ());
            prop_assert!(scheduler.due(ms(elapsed)).is_empty());
            scheduler.pause(ms(elapsed));
            let resumed = elapsed + gap;
            scheduler.resume(ms(resumed));
            let remaining = delay - elapsed;
            prop_assert!(scheduler.due(ms(resumed + remaining - 1)).is_empty());
            prop_assert_eq!(scheduler.due(ms(resumed + remaining)).len(), 1);
        }
    }
}
