use crate::content::{scramble::scramble_word, Prompt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Supported guessing games
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Trivia,
    Scramble,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Trivia => "trivia",
            GameKind::Scramble => "scramble",
        }
    }

    /// The form shown to chat: the question itself, or a shuffled word
    pub fn present(&self, prompt: &Prompt) -> String {
        match self {
            GameKind::Trivia => prompt.text.clone(),
            GameKind::Scramble => scramble_word(&prompt.answer, &mut rand::thread_rng()),
        }
    }
}

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { round_id: Uuid, generation: u64 },
    /// A round is live; `announced` is false inside the grace window
    AlreadyRunning { announced: bool },
    /// Silently rejected by the anti-spam window
    CoolingDown,
    ContentUnavailable,
}

/// Result of a submitted guess
#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    /// No live round, or the guess was too long
    Ignored,
    Miss,
    Close { score: f64 },
    Solved {
        winner: String,
        answer: String,
        points: u64,
        score: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Mutable state of one room's round, guarded by the session's per-room lock
#[derive(Debug, Default)]
pub(crate) struct RoundState {
    pub active: bool,
    pub prompt: Option<Prompt>,
    /// Question text or scrambled word as shown to chat
    pub display: String,
    pub started_at: Option<Instant>,
    pub hint_given: bool,
    pub generation: u64,
    pub round_id: Option<Uuid>,
}

impl RoundState {
    /// True while the round started as `generation` is still live
    pub fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.map_or(std::time::Duration::ZERO, |t| t.elapsed())
    }

    pub fn answer(&self) -> Option<&str> {
        self.prompt.as_ref().map(|p| p.answer.as_str())
    }

    pub fn begin(&mut self, prompt: Prompt, display: String, now: Instant) -> (Uuid, u64) {
        let round_id = Uuid::new_v4();
        self.generation += 1;
        self.active = true;
        self.prompt = Some(prompt);
        self.display = display;
        self.started_at = Some(now);
        self.hint_given = false;
        self.round_id = Some(round_id);
        (round_id, self.generation)
    }
}
