//! In-process counters for rounds and wagers

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct GameMetrics {
    rounds_started: AtomicU64,
    rounds_solved: AtomicU64,
    rounds_timed_out: AtomicU64,
    rounds_stopped: AtomicU64,
    close_calls: AtomicU64,
    wagers_won: AtomicU64,
    wagers_lost: AtomicU64,
    points_wagered: AtomicU64,
    points_awarded: AtomicU64,
}

/// Point-in-time copy of [`GameMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rounds_started: u64,
    pub rounds_solved: u64,
    pub rounds_timed_out: u64,
    pub rounds_stopped: u64,
    pub close_calls: u64,
    pub wagers_won: u64,
    pub wagers_lost: u64,
    pub points_wagered: u64,
    pub points_awarded: u64,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_round_started(&self) {
        self.rounds_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_solved(&self, points: u64) {
        self.rounds_solved.fetch_add(1, Ordering::Relaxed);
        self.points_awarded.fetch_add(points, Ordering::Relaxed);
    }

    pub fn record_round_timed_out(&self) {
        self.rounds_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_stopped(&self) {
        self.rounds_stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close_call(&self) {
        self.close_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wager(&self, won: bool, amount: u64) {
        if won {
            self.wagers_won.fetch_add(1, Ordering::Relaxed);
        } else {
            self.wagers_lost.fetch_add(1, Ordering::Relaxed);
        }
        self.points_wagered.fetch_add(amount, Ordering::Relaxed);
    }

    /// Points handed out outside of games (daily bonus, admin grants)
    pub fn record_points_awarded(&self, points: u64) {
        self.points_awarded.fetch_add(points, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rounds_started: self.rounds_started.load(Ordering::Relaxed),
            rounds_solved: self.rounds_solved.load(Ordering::Relaxed),
            rounds_timed_out: self.rounds_timed_out.load(Ordering::Relaxed),
            rounds_stopped: self.rounds_stopped.load(Ordering::Relaxed),
            close_calls: self.close_calls.load(Ordering::Relaxed),
            wagers_won: self.wagers_won.load(Ordering::Relaxed),
            wagers_lost: self.wagers_lost.load(Ordering::Relaxed),
            points_wagered: self.points_wagered.load(Ordering::Relaxed),
            points_awarded: self.points_awarded.load(Ordering::Relaxed),
        }
    }
}
