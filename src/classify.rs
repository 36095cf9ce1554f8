//! Keyword/pattern content classifier.
//!
//! Assigns a content-type and difficulty label to a text span. Pure and
//! deterministic: the same text always gets the same labels. The
//! content-type decision is first-match-wins in a fixed order (question,
//! formula, definition, example, explanation) so a formula embedded in a
//! question still classifies as a question.

use crate::models::{ContentType, Difficulty};

const INTERROGATIVE_LEADS: &[&str] = &["what", "why", "how", "when", "where", "which", "who"];

const DEFINITION_PHRASES: &[&str] = &[
    "is defined as",
    "refers to",
    "means that",
    "is called",
    "definition:",
];

const EXAMPLE_PHRASES: &[&str] = &["for example", "e.g.", "for instance", "example:"];

/// Math symbols that mark a formula even without an `=` sign.
const FORMULA_SYMBOLS: &[char] = &['×', '÷', '−', '∫', '∑', '√', '²', '³', '∂', '±', 'π'];

const REASONING_CONNECTIVES: &[&str] = &[
    "therefore",
    "because",
    "however",
    "consequently",
    "hence",
    "thus",
];

/// Words longer than this count toward vocabulary complexity.
const LONG_WORD_CHARS: usize = 7;

/// Classify a text span. First match in the decision order wins.
pub fn classify(text: &str) -> (ContentType, Difficulty) {
    (classify_content_type(text), estimate_difficulty(text))
}

pub fn classify_content_type(text: &str) -> ContentType {
    let lower = text.to_lowercase();
    let trimmed = lower.trim();

    if text.contains('?')
        || INTERROGATIVE_LEADS
            .iter()
            .any(|lead| starts_with_word(trimmed, lead))
    {
        return ContentType::Question;
    }

    if has_equation(text) || text.chars().any(|c| FORMULA_SYMBOLS.contains(&c)) {
        return ContentType::Formula;
    }

    if DEFINITION_PHRASES.iter().any(|p| lower.contains(p)) {
        return ContentType::Definition;
    }

    if EXAMPLE_PHRASES.iter().any(|p| lower.contains(p)) {
        return ContentType::Example;
    }

    ContentType::Explanation
}

/// True when an `=` has a numeric or variable token on both sides,
/// skipping spaces (so `F = ma` and `c²=a²+b²` both match but prose like
/// `quality = care` over word boundaries still matches while a bare
/// trailing `=` does not).
fn has_equation(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c != '=' {
            continue;
        }
        let before = chars[..i].iter().rev().find(|c| !c.is_whitespace());
        let after = chars[i + 1..].iter().find(|c| !c.is_whitespace());
        let is_operand =
            |c: &char| c.is_alphanumeric() || FORMULA_SYMBOLS.contains(c) || *c == ')' || *c == '(';
        if before.map(&is_operand).unwrap_or(false) && after.map(&is_operand).unwrap_or(false) {
            return true;
        }
    }
    false
}

fn starts_with_word(text: &str, word: &str) -> bool {
    match text.strip_prefix(word) {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}

/// Score text complexity with three signals, each worth one point:
/// long average sentence length, a high fraction of long words, and
/// multi-step reasoning connectives. 0-1 easy, 2 medium, 3 hard.
pub fn estimate_difficulty(text: &str) -> Difficulty {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Difficulty::Easy;
    }

    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let avg_sentence_len = words.len() as f64 / sentence_count as f64;

    let long_words = words
        .iter()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() > LONG_WORD_CHARS)
        .count();
    let long_word_fraction = long_words as f64 / words.len() as f64;

    let lower = text.to_lowercase();
    let has_reasoning = REASONING_CONNECTIVES.iter().any(|c| lower.contains(c));

    let mut score = 0;
    if avg_sentence_len > 15.0 {
        score += 1;
    }
    if long_word_fraction > 0.2 {
        score += 1;
    }
    if has_reasoning {
        score += 1;
    }

    match score {
        0 | 1 => Difficulty::Easy,
        2 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}
