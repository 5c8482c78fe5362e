//! Parlor - chat minigames and a points economy
//!
//! Two timed guessing games (trivia and word scramble) run on one round engine, and winners
//! are paid out of a concurrent points ledger that also backs transfers, wagers and
//! leaderboards. Chat transport is left to the caller: messages come in through [`Parlor`]
//! and go out through an [`outbound::Outbound`] implementation.

pub mod config;
pub mod content;
pub mod cooldown;
pub mod errors;
pub mod gambler;
pub mod games;
pub mod leaderboard;
pub mod ledger;
pub mod matcher;
pub mod metrics;
pub mod outbound;
pub mod services;
pub mod storage;

pub use config::{ConfigLoader, ParlorConfig};
pub use errors::{ParlorError, ParlorResult};
pub use games::GameKind;
pub use services::{DailyOutcome, Parlor, ServiceBuilder};
