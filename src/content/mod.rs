//! Prompt sources for the guessing games
//!
//! Each source owns a reloadable in-memory collection. A running round keeps its own copy
//! of the drawn [`Prompt`], so reloading never disturbs a round in flight.

pub mod scramble;
pub mod trivia;

pub use scramble::{ScrambleSource, ScrambleWord};
pub use trivia::{TriviaQuestion, TriviaSource};

use crate::errors::ContentError;
use std::path::Path;

/// One drawable item: the text shown to chat and the answer it is scored against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    pub answer: String,
}

/// Supplies random prompts to a game session
pub trait ContentProvider: Send + Sync {
    /// Draw a random enabled prompt, or `None` when nothing is enabled
    fn next_prompt(&self) -> Option<Prompt>;

    /// Re-read the backing file; returns the number of drawable prompts
    fn reload(&self) -> Result<usize, ContentError>;

    /// Number of prompts that can currently be drawn
    fn enabled_count(&self) -> usize;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| ContentError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ContentError::Decode {
        path: display,
        source,
    })
}
