//! Read-only rankings over a ledger snapshot

use crate::ledger::{account_key, Account, PointsLedger};
use std::sync::Arc;

/// One row of a top-N listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub value: u64,
}

/// 1-based positions on both metrics; ties share a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub balance: usize,
    pub gamble_loss: usize,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    ledger: Arc<PointsLedger>,
}

impl Leaderboard {
    pub fn new(ledger: Arc<PointsLedger>) -> Self {
        Self { ledger }
    }

    pub fn top_by_balance(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.top_by(n, |account| account.balance)
    }

    pub fn top_by_gamble_loss(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.top_by(n, |account| account.gamble_loss)
    }

    /// Position of `user` on each metric: one more than the number of accounts strictly ahead.
    /// Unknown users are ranked as if they held zero.
    pub fn rank(&self, user: &str) -> Rank {
        let key = account_key(user);
        let accounts = self.ledger.snapshot();
        let me = accounts.iter().find(|a| a.username == key);
        let balance = me.map_or(0, |a| a.balance);
        let loss = me.map_or(0, |a| a.gamble_loss);

        Rank {
            balance: 1 + accounts.iter().filter(|a| a.balance > balance).count(),
            gamble_loss: 1 + accounts.iter().filter(|a| a.gamble_loss > loss).count(),
        }
    }

    fn top_by<F>(&self, n: usize, metric: F) -> Vec<LeaderboardEntry>
    where
        F: Fn(&Account) -> u64,
    {
        let mut accounts = self.ledger.snapshot();
        // Stable sort keeps first-seen order among equal values
        accounts.sort_by(|a, b| metric(b).cmp(&metric(a)));

        accounts
            .into_iter()
            .take(n)
            .map(|account| LeaderboardEntry {
                value: metric(&account),
                username: account.username,
            })
            .collect()
    }
}
