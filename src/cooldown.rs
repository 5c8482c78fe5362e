//! Keyed cooldown tracking
//!
//! A cooldown key is a `(scope, command)` pair where scope is a user, a room, or `"global"`.
//! Expiry instants come from `tokio::time`, so paused-clock tests drive them deterministically.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Scope used for commands rate-limited across the whole room set
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CooldownKey {
    scope: String,
    command: String,
}

impl CooldownKey {
    fn new(scope: &str, command: &str) -> Self {
        Self {
            scope: scope.to_lowercase(),
            command: command.to_lowercase(),
        }
    }
}

/// Thread-safe map of cooldown expiries
#[derive(Debug, Default)]
pub struct CooldownTracker {
    expiries: DashMap<CooldownKey, Instant>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self {
            expiries: DashMap::new(),
        }
    }

    /// Check-and-arm: returns `true` if `(scope, command)` is still cooling down.
    /// Otherwise arms a fresh window of `duration` and returns `false`.
    pub fn is_on_cooldown(&self, scope: &str, command: &str, duration: Duration) -> bool {
        let now = Instant::now();
        let key = CooldownKey::new(scope, command);

        // The entry guard holds the shard lock, so check and arm cannot interleave.
        let mut entry = self.expiries.entry(key).or_insert(now);
        if now < *entry {
            return true;
        }
        *entry = now + duration;
        false
    }

    /// Time left before `(scope, command)` may run again, without arming anything
    pub fn remaining(&self, scope: &str, command: &str) -> Option<Duration> {
        let now = Instant::now();
        self.expiries
            .get(&CooldownKey::new(scope, command))
            .and_then(|expiry| expiry.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// Arm `(scope, command)` unconditionally
    pub fn arm(&self, scope: &str, command: &str, duration: Duration) {
        self.expiries
            .insert(CooldownKey::new(scope, command), Instant::now() + duration);
    }

    /// Forget `(scope, command)` so it can run immediately
    pub fn clear(&self, scope: &str, command: &str) {
        self.expiries.remove(&CooldownKey::new(scope, command));
    }

    /// Drop expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.expiries.len();
        self.expiries.retain(|_, expiry| *expiry > now);
        before - self.expiries.len()
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_use_arms_cooldown() {
        let tracker = CooldownTracker::new();

        assert!(!tracker.is_on_cooldown("global", "roulette", Duration::from_secs(5)));
        assert!(tracker.is_on_cooldown("global", "roulette", Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let tracker = CooldownTracker::new();
        tracker.is_on_cooldown("alice", "daily", Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(!tracker.is_on_cooldown("alice", "daily", Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent_and_case_folded() {
        let tracker = CooldownTracker::new();
        tracker.arm("Alice", "Daily", Duration::from_secs(60));

        assert!(tracker.remaining("alice", "daily").is_some());
        assert!(tracker.remaining("bob", "daily").is_none());
        assert!(tracker.remaining("alice", "roulette").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_does_not_arm() {
        let tracker = CooldownTracker::new();

        assert!(tracker.remaining("lobby", "trivia").is_none());
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let tracker = CooldownTracker::new();
        tracker.arm("a", "x", Duration::from_secs(1));
        tracker.arm("b", "x", Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(tracker.purge_expired(), 1);
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let tracker = CooldownTracker::new();
        tracker.arm("a", "x", Duration::from_secs(10));
        tracker.clear("a", "x");

        assert!(!tracker.is_on_cooldown("a", "x", Duration::from_secs(10)));
    }
}
