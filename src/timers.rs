//! Cancellable auto-dismiss deadlines
//!
//! Alerts and announcements hide themselves after a while. Instead of
//! detached sleeps that may fire late and clobber newer state, every pending
//! dismissal is an entry keyed by `(kind, id)`. The client loop sleeps until
//! [`TimerQueue::next_deadline`] and drains expired keys on the same task
//! that runs ticks, so there is exactly one writer per state machine.

use std::collections::HashMap;
use std::fmt;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    Alert,
    Announcement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey {
    pub kind: TimerKind,
    pub id: u64,
}

impl TimerKey {
    pub fn alert(id: u64) -> Self {
        Self {
            kind: TimerKind::Alert,
            id,
        }
    }

    pub fn announcement(id: u64) -> Self {
        Self {
            kind: TimerKind::Announcement,
            id,
        }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TimerKind::Alert => "alert",
            TimerKind::Announcement => "announcement",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    deadlines: HashMap<TimerKey, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) a timer. Returns the deadline it replaced.
    pub fn schedule(&mut self, key: TimerKey, deadline: Instant) -> Option<Instant> {
        self.deadlines.insert(key, deadline)
    }

    /// Disarm a timer. Returns whether it was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.deadlines.contains_key(&key)
    }

    pub fn deadline(&self, key: TimerKey) -> Option<Instant> {
        self.deadlines.get(&key).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_expired(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut expired: Vec<(Instant, TimerKey)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, *key))
            .collect();
        expired.sort();
        for (_, key) in &expired {
            self.deadlines.remove(key);
        }
        expired.into_iter().map(|(_, key)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_expired_keys_come_out_in_deadline_order() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKey::announcement(7), start + Duration::from_secs(5));
        timers.schedule(TimerKey::alert(1), start + Duration::from_secs(2));
        timers.schedule(TimerKey::alert(2), start + Duration::from_secs(30));

        let expired = timers.take_expired(start + Duration::from_secs(10));
        assert_eq!(expired, vec![TimerKey::alert(1), TimerKey::announcement(7)]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(start + Duration::from_secs(30)));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKey::announcement(1), start + Duration::from_secs(1));
        assert!(timers.cancel(TimerKey::announcement(1)));
        assert!(!timers.cancel(TimerKey::announcement(1)));
        assert!(timers.take_expired(start + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let key = TimerKey::alert(3);
        timers.schedule(key, start + Duration::from_secs(1));
        let replaced = timers.schedule(key, start + Duration::from_secs(9));
        assert_eq!(replaced, Some(start + Duration::from_secs(1)));
        assert!(timers.take_expired(start + Duration::from_secs(2)).is_empty());
        assert_eq!(timers.deadline(key), Some(start + Duration::from_secs(9)));
    }

    #[test]
    fn test_alert_and_announcement_ids_do_not_collide() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKey::alert(1), start);
        timers.schedule(TimerKey::announcement(1), start);
        assert!(timers.cancel(TimerKey::announcement(1)));
        assert!(timers.is_pending(TimerKey::alert(1)));
        assert_eq!(timers.len(), 1);
    }
}
