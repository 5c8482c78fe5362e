//! Trivia question bank

use super::{read_json, ContentProvider, Prompt};
use crate::errors::ContentError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tracing::{info, warn};

/// A question and its expected free-text answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaQuestion {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Question")]
    pub question: String,
    #[serde(alias = "Answer")]
    pub answer: String,
    #[serde(alias = "Enabled", default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl TriviaQuestion {
    pub fn new(id: &str, question: &str, answer: &str) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            enabled: true,
        }
    }

    fn is_drawable(&self) -> bool {
        self.enabled && !self.answer.trim().is_empty()
    }

    fn to_prompt(&self) -> Prompt {
        Prompt {
            id: self.id.clone(),
            text: self.question.clone(),
            answer: self.answer.clone(),
        }
    }
}

/// In-memory question bank, optionally backed by a JSON file.
///
/// Disabled questions stay in the bank so moderators can re-enable them; they are never drawn.
#[derive(Debug)]
pub struct TriviaSource {
    questions: RwLock<Vec<TriviaQuestion>>,
    path: Option<PathBuf>,
}

impl TriviaSource {
    /// Load from `path`, falling back to the built-in bank if the file is unusable
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let source = Self {
            questions: RwLock::new(Vec::new()),
            path: Some(path.clone()),
        };

        if let Err(e) = source.reload() {
            warn!(path = %path.display(), error = %e, "Failed to load trivia questions, using built-in set");
            *source.write() = builtin_questions();
        }
        source
    }

    /// Bank with a fixed question list and no backing file
    pub fn from_questions(questions: Vec<TriviaQuestion>) -> Self {
        Self {
            questions: RwLock::new(questions),
            path: None,
        }
    }

    pub fn add_question(&self, question: TriviaQuestion) {
        self.write().push(question);
    }

    pub fn question_by_id(&self, id: &str) -> Option<TriviaQuestion> {
        self.read().iter().find(|q| q.id == id).cloned()
    }

    /// Returns `false` if no question has this id
    pub fn enable_question(&self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    /// Returns `false` if no question has this id
    pub fn disable_question(&self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    pub fn question_count(&self) -> usize {
        self.read().len()
    }

    /// Write the whole bank, disabled questions included
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ContentError> {
        let path = path.as_ref();
        let questions = self.read().clone();
        let json = serde_json::to_vec_pretty(&questions).map_err(ContentError::Encode)?;
        std::fs::write(path, json).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;

        info!(count = questions.len(), path = %path.display(), "Saved trivia questions");
        Ok(())
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut questions = self.write();
        match questions.iter_mut().find(|q| q.id == id) {
            Some(q) => {
                q.enabled = enabled;
                true
            }
            None => false,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TriviaQuestion>> {
        self.questions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<TriviaQuestion>> {
        self.questions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentProvider for TriviaSource {
    fn next_prompt(&self) -> Option<Prompt> {
        let questions = self.read();
        let drawable: Vec<&TriviaQuestion> = questions.iter().filter(|q| q.is_drawable()).collect();
        drawable
            .choose(&mut rand::thread_rng())
            .map(|q| q.to_prompt())
    }

    fn reload(&self) -> Result<usize, ContentError> {
        let Some(path) = &self.path else {
            return Ok(self.enabled_count());
        };

        let questions: Vec<TriviaQuestion> = read_json(path)?;
        let total = questions.len();
        *self.write() = questions;

        let enabled = self.enabled_count();
        info!(total, enabled, path = %path.display(), "Loaded trivia questions");
        Ok(enabled)
    }

    fn enabled_count(&self) -> usize {
        self.read().iter().filter(|q| q.is_drawable()).count()
    }
}

fn builtin_questions() -> Vec<TriviaQuestion> {
    [
        ("t0000000001", "Which planet is known as the Red Planet?", "Mars"),
        ("t0000000002", "What is the largest ocean on Earth?", "Pacific"),
        ("t0000000003", "Which element has the chemical symbol O?", "Oxygen"),
        ("t0000000004", "Who painted the Mona Lisa?", "Leonardo da Vinci"),
        ("t0000000005", "What is the capital city of Australia?", "Canberra"),
        ("t0000000006", "How many sides does a hexagon have?", "six"),
        ("t0000000007", "Which instrument has 88 keys?", "piano"),
        ("t0000000008", "What gas do plants absorb from the air?", "carbon dioxide"),
        ("t0000000009", "In which country did the Olympic Games originate?", "Greece"),
        ("t0000000010", "What is the hardest natural substance?", "diamond"),
    ]
    .into_iter()
    .map(|(id, question, answer)| TriviaQuestion::new(id, question, answer))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> TriviaSource {
        TriviaSource::from_questions(vec![
            TriviaQuestion::new("q1", "Red planet?", "Mars"),
            TriviaQuestion::new("q2", "Largest ocean?", "Pacific"),
        ])
    }

    #[test]
    fn test_draws_only_enabled() {
        let source = bank();
        assert!(source.disable_question("q1"));

        for _ in 0..20 {
            let prompt = source.next_prompt().unwrap();
            assert_eq!(prompt.id, "q2");
            assert_eq!(prompt.answer, "Pacific");
        }
        assert_eq!(source.enabled_count(), 1);
        assert_eq!(source.question_count(), 2);
    }

    #[test]
    fn test_no_enabled_questions() {
        let source = bank();
        source.disable_question("q1");
        source.disable_question("q2");

        assert!(source.next_prompt().is_none());
        assert!(source.enable_question("q2"));
        assert!(source.next_prompt().is_some());
    }

    #[test]
    fn test_unknown_id() {
        let source = bank();
        assert!(!source.enable_question("nope"));
        assert!(source.question_by_id("nope").is_none());
        assert_eq!(source.question_by_id("q2").unwrap().question, "Largest ocean?");
    }

    #[test]
    fn test_blank_answers_are_never_drawn() {
        let source = TriviaSource::from_questions(vec![TriviaQuestion::new("q", "?", "   ")]);
        assert!(source.next_prompt().is_none());
    }

    #[test]
    fn test_open_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = TriviaSource::open(dir.path().join("missing.json"));

        assert!(source.enabled_count() > 0);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivia.json");

        let source = bank();
        source.add_question(TriviaQuestion::new("q3", "Hexagon sides?", "six"));
        source.disable_question("q1");
        source.save_to_file(&path).unwrap();

        let reopened = TriviaSource::open(&path);
        assert_eq!(reopened.question_count(), 3);
        assert_eq!(reopened.enabled_count(), 2);
        assert!(!reopened.question_by_id("q1").unwrap().enabled);
    }

    #[test]
    fn test_accepts_capitalized_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivia.json");
        std::fs::write(
            &path,
            r#"[{"ID": "t1", "Question": "Q?", "Answer": "A", "Enabled": true}]"#,
        )
        .unwrap();

        let source = TriviaSource::open(&path);
        assert_eq!(source.question_by_id("t1").unwrap().answer, "A");
    }

    #[test]
    fn test_failed_reload_keeps_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivia.json");
        bank().save_to_file(&path).unwrap();

        let source = TriviaSource::open(&path);
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(source.reload(), Err(ContentError::Decode { .. })));
        assert_eq!(source.question_count(), 2);
    }
}
