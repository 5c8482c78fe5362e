//! Guess scoring and hint generation
//!
//! Scores are computed over Unicode scalar values after trimming and case-folding, so
//! accented answers ("Kéfera") compare character by character rather than byte by byte.

/// Placeholder used for masked hint characters
pub const HINT_MASK: char = '_';

/// Per-kind thresholds deciding whether a guess ends the round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub correct: f64,
    pub close: f64,
}

/// Classification of a guess against the answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchVerdict {
    Correct(f64),
    Close(f64),
    Miss(f64),
}

impl MatchVerdict {
    pub fn score(&self) -> f64 {
        match *self {
            MatchVerdict::Correct(s) | MatchVerdict::Close(s) | MatchVerdict::Miss(s) => s,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, MatchVerdict::Correct(_))
    }
}

/// Trim and case-fold
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Similarity in `[0, 1]`: the better of positional overlap and LCS ratio,
/// both relative to the longer string.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();

    if a == b {
        return 1.0;
    }

    let (longer, shorter) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    if longer.is_empty() {
        return 1.0;
    }

    let positional = shorter
        .iter()
        .zip(longer.iter())
        .filter(|(s, l)| s == l)
        .count();
    let subsequence = longest_common_subsequence(&a, &b);

    let len = longer.len() as f64;
    (positional as f64 / len).max(subsequence as f64 / len)
}

/// Score `guess` against `answer`. An exact or containing guess always counts as correct.
pub fn evaluate(guess: &str, answer: &str, thresholds: MatchThresholds) -> MatchVerdict {
    let guess = normalize(guess);
    let answer = normalize(answer);

    if guess.is_empty() || answer.is_empty() {
        return MatchVerdict::Miss(0.0);
    }
    if guess == answer || guess.contains(&answer) {
        return MatchVerdict::Correct(1.0);
    }

    let score = similarity(&guess, &answer);
    if score >= thresholds.correct {
        MatchVerdict::Correct(score)
    } else if score >= thresholds.close {
        MatchVerdict::Close(score)
    } else {
        MatchVerdict::Miss(score)
    }
}

/// Reveal first and last characters and mask the interior.
///
/// Answers of up to two characters are shown whole; whitespace inside multi-word
/// answers stays visible so the word shape survives.
pub fn hint(answer: &str) -> String {
    let chars: Vec<char> = answer.trim().chars().collect();
    let count = chars.len();

    if count <= 2 {
        return chars.into_iter().collect();
    }

    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if i == 0 || i == count - 1 || c.is_whitespace() {
                c
            } else {
                HINT_MASK
            }
        })
        .collect()
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Rolling single row over `b`
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIVIA: MatchThresholds = MatchThresholds {
        correct: 0.90,
        close: 0.75,
    };

    #[test]
    fn test_identity_is_one() {
        for word in ["a", "casimiro", "Big Brother Brasil", "Kéfera"] {
            assert_eq!(similarity(word, word), 1.0);
        }
    }

    #[test]
    fn test_normalization() {
        assert_eq!(similarity("  PODPAH ", "podpah"), 1.0);
    }

    #[test]
    fn test_bounds() {
        let pairs = [
            ("", "abc"),
            ("abc", ""),
            ("xyz", "abc"),
            ("gaules", "gauless"),
            ("carminha", "ahnimrac"),
        ];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{} vs {} gave {}", a, b, s);
        }
    }

    #[test]
    fn test_positional_overlap_rewards_prefix() {
        // 7 of 8 positions line up
        let s = similarity("carminha", "carminho");
        assert!((s - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_lcs_rewards_transposition() {
        // Dropping the first letter shifts every position, but the LCS is 7 of 8
        let s = similarity("asimiro", "casimiro");
        assert!((s - 0.875).abs() < 1e-9);
        assert_eq!(longest_common_subsequence(&['a', 'b', 'c'], &['a', 'c']), 2);
    }

    #[test]
    fn test_lcs_uses_longer_length() {
        let s = similarity("abc", "abcdef");
        assert!((s - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_exact_and_substring() {
        assert_eq!(evaluate("Casimiro", "casimiro", TRIVIA), MatchVerdict::Correct(1.0));
        assert_eq!(
            evaluate("acho que é casimiro!", "Casimiro", TRIVIA),
            MatchVerdict::Correct(1.0)
        );
    }

    #[test]
    fn test_evaluate_close_and_miss() {
        match evaluate("carminho", "carminha", TRIVIA) {
            MatchVerdict::Close(s) => assert!(s >= 0.75 && s < 0.90),
            other => panic!("expected close call, got {:?}", other),
        }
        assert!(matches!(evaluate("xyz", "carminha", TRIVIA), MatchVerdict::Miss(_)));
        assert_eq!(evaluate("   ", "carminha", TRIVIA), MatchVerdict::Miss(0.0));
    }

    #[test]
    fn test_evaluate_fuzzy_correct() {
        let lenient = MatchThresholds {
            correct: 0.85,
            close: 0.70,
        };
        let verdict = evaluate("campeonatu", "campeonato", lenient);
        assert!(verdict.is_correct());
        assert!(verdict.score() < 1.0);
    }

    #[test]
    fn test_hint_masks_interior() {
        assert_eq!(hint("gaules"), "g____s");
        assert_eq!(hint("Dum Ice"), "D__ __e");
    }

    #[test]
    fn test_hint_short_answers() {
        assert_eq!(hint("ok"), "ok");
        assert_eq!(hint("a"), "a");
        assert_eq!(hint(""), "");
        assert_eq!(hint("sol"), "s_l");
    }

    #[test]
    fn test_hint_counts_characters_not_bytes() {
        assert_eq!(hint("Júlia"), "J___a");
    }
}
