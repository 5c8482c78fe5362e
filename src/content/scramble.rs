//! Word list for the scramble game

use super::{read_json, ContentProvider, Prompt};
use crate::errors::ContentError;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleWord {
    pub id: String,
    pub word: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ScrambleWord {
    pub fn new(id: &str, word: &str) -> Self {
        Self {
            id: id.to_string(),
            word: word.to_string(),
            enabled: true,
        }
    }

    fn is_usable(&self) -> bool {
        self.enabled && !self.word.trim().is_empty()
    }
}

/// Pool of enabled words. Disabled or blank entries are dropped when the pool is filled.
#[derive(Debug)]
pub struct ScrambleSource {
    words: RwLock<Vec<ScrambleWord>>,
    path: Option<PathBuf>,
}

impl ScrambleSource {
    /// Load from `path`; an unreadable file leaves the pool empty
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let source = Self {
            words: RwLock::new(Vec::new()),
            path: Some(path.clone()),
        };

        if let Err(e) = source.reload() {
            warn!(path = %path.display(), error = %e, "Failed to load scramble words");
        }
        source
    }

    pub fn from_words(words: Vec<ScrambleWord>) -> Self {
        Self {
            words: RwLock::new(words.into_iter().filter(ScrambleWord::is_usable).collect()),
            path: None,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ScrambleWord>> {
        self.words.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentProvider for ScrambleSource {
    fn next_prompt(&self) -> Option<Prompt> {
        self.read().choose(&mut rand::thread_rng()).map(|w| Prompt {
            id: w.id.clone(),
            text: w.word.clone(),
            answer: w.word.clone(),
        })
    }

    fn reload(&self) -> Result<usize, ContentError> {
        let Some(path) = &self.path else {
            return Ok(self.enabled_count());
        };

        let words: Vec<ScrambleWord> = read_json(path)?;
        let total = words.len();
        let usable: Vec<ScrambleWord> = words.into_iter().filter(ScrambleWord::is_usable).collect();
        let enabled = usable.len();
        *self.words.write().unwrap_or_else(PoisonError::into_inner) = usable;

        info!(total, enabled, path = %path.display(), "Loaded scramble words");
        Ok(enabled)
    }

    fn enabled_count(&self) -> usize {
        self.read().len()
    }
}

/// Shuffle the characters of `word`.
///
/// A shuffle that reproduces the word (ignoring case) is redrawn once; words whose letters
/// are all alike can still come back unchanged.
pub fn scramble_word<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let chars: Vec<char> = word.trim().chars().collect();
    if chars.len() <= 1 {
        return chars.into_iter().collect();
    }

    let original = word.trim().to_lowercase();
    let mut shuffled = chars.clone();
    shuffled.shuffle(rng);
    let mut result: String = shuffled.iter().collect();

    if result.to_lowercase() == original {
        shuffled.shuffle(rng);
        result = shuffled.iter().collect();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_disabled_and_blank_words_are_dropped() {
        let mut disabled = ScrambleWord::new("w2", "paralelepipedo");
        disabled.enabled = false;
        let source = ScrambleSource::from_words(vec![
            ScrambleWord::new("w1", "gaules"),
            disabled,
            ScrambleWord::new("w3", "  "),
        ]);

        assert_eq!(source.enabled_count(), 1);
        for _ in 0..10 {
            let prompt = source.next_prompt().unwrap();
            assert_eq!(prompt.answer, "gaules");
            assert_eq!(prompt.text, "gaules");
        }
    }

    #[test]
    fn test_empty_pool() {
        let source = ScrambleSource::from_words(Vec::new());
        assert!(source.next_prompt().is_none());
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScrambleSource::open(dir.path().join("missing.json"));

        assert_eq!(source.enabled_count(), 0);
        assert!(matches!(source.reload(), Err(ContentError::Io { .. })));
    }

    #[test]
    fn test_reload_filters_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "s1", "word": "casimiro", "enabled": true},
                {"id": "s2", "word": "podpah", "enabled": false},
                {"id": "s3", "word": "carminha"}
            ]"#,
        )
        .unwrap();

        let source = ScrambleSource::open(&path);
        assert_eq!(source.enabled_count(), 2);
        assert_eq!(source.reload().unwrap(), 2);
    }

    #[test]
    fn test_scramble_keeps_letters() {
        let mut rng = StdRng::seed_from_u64(7);
        let word = "carminha";

        for _ in 0..50 {
            let scrambled = scramble_word(word, &mut rng);
            let mut a: Vec<char> = scrambled.chars().collect();
            let mut b: Vec<char> = word.chars().collect();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_scramble_short_words() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(scramble_word("a", &mut rng), "a");
        assert_eq!(scramble_word("", &mut rng), "");
        assert_eq!(scramble_word("aaa", &mut rng), "aaa");
    }

    #[test]
    fn test_scramble_usually_differs() {
        let mut rng = StdRng::seed_from_u64(42);
        let changed = (0..100)
            .filter(|_| scramble_word("paralelepipedo", &mut rng) != "paralelepipedo")
            .count();

        assert!(changed >= 99);
    }
}
