//! Wager parsing and resolution
//!
//! Wager text from chat is one of `N` (fixed), `N%` (percent of balance) or `all`.
//! Resolution reads the balance, flips the coin and applies the result inside a single
//! ledger write, so the reported balances are exactly the ones that were mutated.

use crate::{
    errors::{LedgerError, WagerError},
    ledger::{BalanceChange, PointsLedger},
};
use rand::Rng;
use std::{fmt, str::FromStr, sync::Arc};
use tracing::info;

/// Parsed wager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wager {
    Fixed(u64),
    /// Percent of the current balance; values above 100 parse but never resolve
    Percent(u64),
    AllIn,
}

impl FromStr for Wager {
    type Err = WagerError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WagerError::Empty);
        }
        if text.eq_ignore_ascii_case("all") {
            return Ok(Wager::AllIn);
        }

        let (digits, percent) = match text.strip_suffix('%') {
            Some(digits) => (digits, true),
            None => (text, false),
        };
        let amount: i64 = digits
            .parse()
            .map_err(|_| WagerError::Malformed(text.to_string()))?;
        if amount <= 0 {
            return Err(WagerError::NonPositive);
        }

        let amount = amount as u64;
        Ok(if percent {
            Wager::Percent(amount)
        } else {
            Wager::Fixed(amount)
        })
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wager::Fixed(amount) => write!(f, "{}", amount),
            Wager::Percent(pct) => write!(f, "{}%", pct),
            Wager::AllIn => f.write_str("all"),
        }
    }
}

impl Wager {
    /// Amount at stake for `balance`, or the outcome that prevents the bet
    pub fn amount_for(&self, balance: u64) -> Result<u64, WagerOutcome> {
        let amount = match *self {
            Wager::Fixed(amount) => amount,
            Wager::Percent(pct) if pct > 100 => return Err(WagerOutcome::InvalidPercent),
            Wager::Percent(pct) => (balance as u128 * pct as u128 / 100) as u64,
            Wager::AllIn => balance,
        };

        if amount == 0 || amount > balance {
            return Err(WagerOutcome::InsufficientFunds);
        }
        Ok(amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerOutcome {
    Win,
    Loss,
    /// Balance was zero; nothing else was checked
    NoPoints,
    InsufficientFunds,
    InvalidPercent,
}

/// Result of one resolved wager.
///
/// `delta` is the amount won or lost and is zero for outcomes that did not touch the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WagerResolution {
    pub outcome: WagerOutcome,
    pub new_balance: u64,
    pub delta: u64,
}

/// Resolves wagers through the ledger's atomic update
#[derive(Debug, Clone)]
pub struct Gambler {
    ledger: Arc<PointsLedger>,
}

impl Gambler {
    pub fn new(ledger: Arc<PointsLedger>) -> Self {
        Self { ledger }
    }

    /// Settle `wager` for `user`, winning with probability `win_probability`
    pub fn resolve(
        &self,
        user: &str,
        wager: Wager,
        win_probability: f64,
    ) -> Result<WagerResolution, LedgerError> {
        let (new_balance, (outcome, delta)) = self.ledger.apply_with(user, |balance| {
            if balance == 0 {
                return (BalanceChange::Unchanged, (WagerOutcome::NoPoints, 0));
            }
            let amount = match wager.amount_for(balance) {
                Ok(amount) => amount,
                Err(outcome) => return (BalanceChange::Unchanged, (outcome, 0)),
            };

            if rand::thread_rng().gen::<f64>() < win_probability {
                (BalanceChange::Credit(amount), (WagerOutcome::Win, amount))
            } else {
                (BalanceChange::DebitAsLoss(amount), (WagerOutcome::Loss, amount))
            }
        })?;

        if matches!(outcome, WagerOutcome::Win | WagerOutcome::Loss) {
            info!(user, %wager, ?outcome, delta, new_balance, "Wager resolved");
        }

        Ok(WagerResolution {
            outcome,
            new_balance,
            delta,
        })
    }
}
