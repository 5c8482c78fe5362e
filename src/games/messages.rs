//! Chat text for each game kind
//!
//! A session picks its formatter once, when it is built.

use super::types::GameKind;

/// Renders every line a game session can emit
pub trait MessageFormatter: Send + Sync {
    fn prompt(&self, display: &str) -> String;
    fn correct(&self, user: &str, answer: &str, points: u64) -> String;
    fn close(&self, user: &str, guess: &str, score: f64) -> String;
    fn hint(&self, hint: &str) -> String;
    fn timeout(&self, answer: &str) -> String;
    fn already_running(&self, user: &str) -> String;
    fn stopped(&self) -> String;
    fn no_content(&self) -> String;
}

/// Default formatter for `kind`
pub fn formatter_for(kind: GameKind) -> Box<dyn MessageFormatter> {
    match kind {
        GameKind::Trivia => Box::new(TriviaMessages),
        GameKind::Scramble => Box::new(ScrambleMessages),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriviaMessages;

impl MessageFormatter for TriviaMessages {
    fn prompt(&self, display: &str) -> String {
        format!("[Quiz] {}", display)
    }

    fn correct(&self, user: &str, answer: &str, points: u64) -> String {
        format!(
            "[Quiz] @{} got it right and earned {} points! The answer was: \"{}\"",
            user, points, answer
        )
    }

    fn close(&self, user: &str, guess: &str, score: f64) -> String {
        format!(
            "[Quiz] @{} \"{}\" is close. [Similarity {:.0}%]",
            user,
            guess.trim(),
            score * 100.0
        )
    }

    fn hint(&self, hint: &str) -> String {
        format!("[Quiz] Hint: {}", hint)
    }

    fn timeout(&self, answer: &str) -> String {
        format!("[Quiz] Nobody got it. The answer was: {}", answer)
    }

    fn already_running(&self, user: &str) -> String {
        format!("[Quiz] @{} A quiz is already running.", user)
    }

    fn stopped(&self) -> String {
        "[Quiz] Quiz stopped.".to_string()
    }

    fn no_content(&self) -> String {
        "[Quiz] No questions available.".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrambleMessages;

impl MessageFormatter for ScrambleMessages {
    fn prompt(&self, display: &str) -> String {
        format!("[Scramble] Unscramble this word: {}", display)
    }

    fn correct(&self, user: &str, answer: &str, points: u64) -> String {
        format!(
            "[Scramble] @{} Congratulations, you earned {} points! The word was: \"{}\"",
            user, points, answer
        )
    }

    fn close(&self, user: &str, guess: &str, score: f64) -> String {
        format!(
            "[Scramble] @{} \"{}\" is close! [Similarity {:.0}%]",
            user,
            guess.trim(),
            score * 100.0
        )
    }

    fn hint(&self, hint: &str) -> String {
        format!("[Scramble] Hint: {}", hint)
    }

    fn timeout(&self, answer: &str) -> String {
        format!("[Scramble] Time's up! The word was: {}", answer)
    }

    fn already_running(&self, user: &str) -> String {
        format!("[Scramble] @{} A scramble is already running.", user)
    }

    fn stopped(&self) -> String {
        "[Scramble] Scramble stopped.".to_string()
    }

    fn no_content(&self) -> String {
        "[Scramble] No words available.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_formats_percentage() {
        let text = TriviaMessages.close("ana", " carminho ", 0.875);
        assert!(text.contains("\"carminho\""));
        assert!(text.contains("88%"));
    }

    #[test]
    fn test_formatter_for_kind() {
        assert!(formatter_for(GameKind::Trivia).stopped().starts_with("[Quiz]"));
        assert!(formatter_for(GameKind::Scramble).stopped().starts_with("[Scramble]"));
    }
}
