//! Points ledger
//!
//! The authoritative store of balances and cumulative gamble losses. Every mutation takes the
//! write lock for its whole multi-step update, so readers never observe a half-applied transfer.
//! Accounts are keyed by case-folded username and keep first-seen order, which the leaderboard
//! uses to break ties.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, info, warn};

/// One participant's account. Serialized as `{username, points, gamble_loss}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(rename = "points")]
    pub balance: u64,
    #[serde(default)]
    pub gamble_loss: u64,
}

impl Account {
    fn new(username: String) -> Self {
        Self {
            username,
            balance: 0,
            gamble_loss: 0,
        }
    }
}

/// Balance mutation decided inside [`PointsLedger::apply_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Credit(u64),
    Debit(u64),
    /// Debit that is also added to the gamble-loss counter
    DebitAsLoss(u64),
    Unchanged,
}

#[derive(Debug, Default)]
struct Accounts {
    entries: Vec<Account>,
    index: HashMap<String, usize>,
}

impl Accounts {
    fn get(&self, key: &str) -> Option<&Account> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    fn get_or_create(&mut self, key: &str) -> &mut Account {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.entries.push(Account::new(key.to_string()));
                let i = self.entries.len() - 1;
                self.index.insert(key.to_string(), i);
                i
            }
        };
        &mut self.entries[i]
    }
}

/// Readers-writer locked account collection
#[derive(Debug, Default)]
pub struct PointsLedger {
    accounts: RwLock<Accounts>,
}

/// Case-folded account key
pub fn account_key(user: &str) -> String {
    user.trim().to_lowercase()
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `user`, or 0 for unknown users. Never creates an account.
    pub fn get_balance(&self, user: &str) -> u64 {
        self.read()
            .get(&account_key(user))
            .map_or(0, |account| account.balance)
    }

    pub fn gamble_loss(&self, user: &str) -> u64 {
        self.read()
            .get(&account_key(user))
            .map_or(0, |account| account.gamble_loss)
    }

    /// Credit `amount` and return the new balance
    pub fn add_points(&self, user: &str, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let key = account_key(user);
        let mut accounts = self.write();
        let account = accounts.get_or_create(&key);
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow { user: key.clone() })?;

        debug!(user = %key, amount, balance = account.balance, "Points added");
        Ok(account.balance)
    }

    /// Debit up to `amount`; the balance floors at zero instead of failing
    pub fn subtract_points(&self, user: &str, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let key = account_key(user);
        let mut accounts = self.write();
        let account = accounts.get_or_create(&key);
        account.balance = account.balance.saturating_sub(amount);

        debug!(user = %key, amount, balance = account.balance, "Points subtracted");
        Ok(account.balance)
    }

    /// Move `amount` from `sender` to `receiver`; returns both new balances.
    ///
    /// Either both legs apply or the ledger is left exactly as it was.
    pub fn transfer(
        &self,
        sender: &str,
        receiver: &str,
        amount: u64,
    ) -> Result<(u64, u64), LedgerError> {
        let from = account_key(sender);
        let to = account_key(receiver);

        if amount == 0 {
            return Err(LedgerError::InvalidTransfer {
                reason: "amount must be positive".to_string(),
            });
        }
        if from == to {
            return Err(LedgerError::InvalidTransfer {
                reason: "sender and receiver are the same account".to_string(),
            });
        }

        let mut accounts = self.write();
        let available = accounts.get(&from).map_or(0, |a| a.balance);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        let sender_account = accounts.get_or_create(&from);
        sender_account.balance -= amount;
        let sender_balance = sender_account.balance;

        let receiver_account = accounts.get_or_create(&to);
        match receiver_account.balance.checked_add(amount) {
            Some(balance) => receiver_account.balance = balance,
            None => {
                accounts.get_or_create(&from).balance += amount;
                warn!(sender = %from, receiver = %to, amount, "Transfer rolled back");
                return Err(LedgerError::Overflow { user: to });
            }
        }
        let receiver_balance = receiver_account.balance;

        info!(sender = %from, receiver = %to, amount, "Transfer completed");
        Ok((sender_balance, receiver_balance))
    }

    /// Accrue `amount` to the gamble-loss counter; returns the new total
    pub fn add_gamble_loss(&self, user: &str, amount: u64) -> u64 {
        let key = account_key(user);
        let mut accounts = self.write();
        let account = accounts.get_or_create(&key);
        account.gamble_loss = account.gamble_loss.saturating_add(amount);
        account.gamble_loss
    }

    /// Read the balance and apply the change `decide` picks, under one write lock.
    ///
    /// Returns the balance after the change along with `decide`'s value. `Unchanged` creates
    /// no account. A debit larger than the balance floors at zero.
    pub fn apply_with<T, F>(&self, user: &str, decide: F) -> Result<(u64, T), LedgerError>
    where
        F: FnOnce(u64) -> (BalanceChange, T),
    {
        let key = account_key(user);
        let mut accounts = self.write();
        let before = accounts.get(&key).map_or(0, |a| a.balance);

        let (change, value) = decide(before);
        let after = match change {
            BalanceChange::Unchanged => return Ok((before, value)),
            BalanceChange::Credit(amount) => before
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Overflow { user: key.clone() })?,
            BalanceChange::Debit(amount) | BalanceChange::DebitAsLoss(amount) => {
                before.saturating_sub(amount)
            }
        };

        let account = accounts.get_or_create(&key);
        account.balance = after;
        if let BalanceChange::DebitAsLoss(amount) = change {
            account.gamble_loss = account.gamble_loss.saturating_add(amount);
        }

        debug!(user = %key, ?change, before, after, "Balance updated");
        Ok((after, value))
    }

    /// All accounts in first-seen order
    pub fn snapshot(&self) -> Vec<Account> {
        self.read().entries.clone()
    }

    /// Replace the whole ledger with `accounts`.
    ///
    /// Usernames are case-folded; when two records fold to the same name the later one wins.
    pub fn restore(&self, accounts: Vec<Account>) {
        let mut restored = Accounts::default();
        for mut account in accounts {
            account.username = account_key(&account.username);
            if account.username.is_empty() {
                warn!("Skipping account record without a username");
                continue;
            }
            match restored.index.get(&account.username) {
                Some(&i) => {
                    warn!(user = %account.username, "Duplicate account record, keeping the later one");
                    restored.entries[i] = account;
                }
                None => {
                    restored
                        .index
                        .insert(account.username.clone(), restored.entries.len());
                    restored.entries.push(account);
                }
            }
        }

        let count = restored.entries.len();
        *self.write() = restored;
        info!(accounts = count, "Ledger restored");
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Sum of all balances
    pub fn total_points(&self) -> u128 {
        self.read().entries.iter().map(|a| a.balance as u128).sum()
    }

    fn read(&self) -> RwLockReadGuard<'_, Accounts> {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Accounts> {
        self.accounts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_unknown_user_has_zero_and_is_not_created() {
        let ledger = PointsLedger::new();

        assert_eq!(ledger.get_balance("ghost"), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_usernames_are_case_folded() {
        let ledger = PointsLedger::new();
        ledger.add_points("Alice", 10).unwrap();

        assert_eq!(ledger.get_balance("alice"), 10);
        assert_eq!(ledger.get_balance(" ALICE "), 10);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_zero_amounts_are_rejected() {
        let ledger = PointsLedger::new();

        assert_eq!(ledger.add_points("a", 0), Err(LedgerError::InvalidAmount));
        assert_eq!(ledger.subtract_points("a", 0), Err(LedgerError::InvalidAmount));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        let ledger = PointsLedger::new();
        ledger.add_points("bob", 20).unwrap();

        assert_eq!(ledger.subtract_points("bob", 5).unwrap(), 15);
        assert_eq!(ledger.subtract_points("bob", 100).unwrap(), 0);
        assert_eq!(ledger.subtract_points("new", 3).unwrap(), 0);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_add_overflow() {
        let ledger = PointsLedger::new();
        ledger.add_points("rich", u64::MAX).unwrap();

        assert!(matches!(
            ledger.add_points("rich", 1),
            Err(LedgerError::Overflow { .. })
        ));
        assert_eq!(ledger.get_balance("rich"), u64::MAX);
    }

    #[test]
    fn test_transfer_conserves_points() {
        let ledger = PointsLedger::new();
        ledger.add_points("a", 50).unwrap();
        ledger.add_points("b", 5).unwrap();

        assert_eq!(ledger.transfer("a", "b", 30).unwrap(), (20, 35));
        assert_eq!(ledger.get_balance("a") + ledger.get_balance("b"), 55);
    }

    #[test]
    fn test_transfer_insufficient_funds_leaves_state() {
        let ledger = PointsLedger::new();
        ledger.add_points("a", 20).unwrap();

        assert_eq!(
            ledger.transfer("a", "b", 30),
            Err(LedgerError::InsufficientFunds {
                needed: 30,
                available: 20
            })
        );
        assert_eq!(ledger.get_balance("a"), 20);
        assert_eq!(ledger.get_balance("b"), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_transfer_rejects_self_and_zero() {
        let ledger = PointsLedger::new();
        ledger.add_points("a", 20).unwrap();

        assert!(matches!(
            ledger.transfer("a", "A", 5),
            Err(LedgerError::InvalidTransfer { .. })
        ));
        assert!(matches!(
            ledger.transfer("a", "b", 0),
            Err(LedgerError::InvalidTransfer { .. })
        ));
        assert_eq!(ledger.get_balance("a"), 20);
    }

    #[test]
    fn test_transfer_rolls_back_on_overflow() {
        let ledger = PointsLedger::new();
        ledger.add_points("a", 10).unwrap();
        ledger.add_points("whale", u64::MAX).unwrap();

        assert!(matches!(
            ledger.transfer("a", "whale", 10),
            Err(LedgerError::Overflow { .. })
        ));
        assert_eq!(ledger.get_balance("a"), 10);
        assert_eq!(ledger.get_balance("whale"), u64::MAX);
    }

    #[test]
    fn test_apply_with_unchanged_creates_nothing() {
        let ledger = PointsLedger::new();
        let (balance, seen) = ledger
            .apply_with("nobody", |b| (BalanceChange::Unchanged, b))
            .unwrap();

        assert_eq!((balance, seen), (0, 0));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_apply_with_loss_accrues() {
        let ledger = PointsLedger::new();
        ledger.add_points("c", 100).unwrap();

        let (after, before) = ledger
            .apply_with("c", |b| (BalanceChange::DebitAsLoss(b), b))
            .unwrap();

        assert_eq!((before, after), (100, 0));
        assert_eq!(ledger.gamble_loss("c"), 100);
    }

    #[test]
    fn test_gamble_loss_is_independent_of_balance() {
        let ledger = PointsLedger::new();
        ledger.add_points("d", 5).unwrap();

        assert_eq!(ledger.add_gamble_loss("d", 7), 7);
        assert_eq!(ledger.add_gamble_loss("d", 0), 7);
        assert_eq!(ledger.get_balance("d"), 5);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let ledger = PointsLedger::new();
        ledger.add_points("x", 3).unwrap();
        ledger.add_points("y", 9).unwrap();
        ledger.add_gamble_loss("y", 4);

        let restored = PointsLedger::new();
        restored.restore(ledger.snapshot());

        assert_eq!(restored.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_restore_folds_and_deduplicates() {
        let ledger = PointsLedger::new();
        ledger.add_points("stale", 1).unwrap();
        ledger.restore(vec![
            Account {
                username: "Eve".to_string(),
                balance: 1,
                gamble_loss: 0,
            },
            Account {
                username: "frank".to_string(),
                balance: 2,
                gamble_loss: 0,
            },
            Account {
                username: "eve".to_string(),
                balance: 8,
                gamble_loss: 2,
            },
        ]);

        assert_eq!(ledger.get_balance("stale"), 0);
        assert_eq!(ledger.get_balance("EVE"), 8);
        assert_eq!(ledger.snapshot()[0].username, "eve");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_account_serialization_shape() {
        let account = Account {
            username: "gabi".to_string(),
            balance: 12,
            gamble_loss: 3,
        };
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["points"], 12);
        assert_eq!(json["gamble_loss"], 3);
        assert!(json.get("balance").is_none());
    }

    #[test]
    fn test_concurrent_transfers_conserve_total() {
        let ledger = Arc::new(PointsLedger::new());
        ledger.add_points("a", 1_000).unwrap();
        ledger.add_points("b", 1_000).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let (from, to) = if i % 2 == 0 { ("a", "b") } else { ("b", "a") };
                    for _ in 0..100 {
                        let _ = ledger.transfer(from, to, 3);
                        assert_eq!(ledger.total_points(), 2_000);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.total_points(), 2_000);
    }
}
