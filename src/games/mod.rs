//! Timed guessing games
//!
//! One [`GameSession`] engine serves every game kind; the kind decides how a prompt is shown
//! and which message strategy renders its chat lines.

pub mod messages;
pub mod session;
pub mod types;

pub use messages::{formatter_for, MessageFormatter, ScrambleMessages, TriviaMessages};
pub use session::{GameSession, SessionDeps};
pub use types::{GameKind, GuessOutcome, StartOutcome, StopOutcome};
