//! String similarity scores on a 0–1 scale for the fuzzy header pass.

use std::collections::BTreeSet;

use clap::ValueEnum;
use rapidfuzz::distance::{jaro_winkler, levenshtein};
use serde::{Deserialize, Serialize};

/// Score used to rank fuzzy header candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Sørensen–Dice coefficient over header tokens. Latin words and digit
    /// runs form one token each; every CJK character is its own token.
    #[default]
    TokenOverlap,
    /// Normalized Levenshtein similarity over characters.
    Levenshtein,
    /// Jaro-Winkler similarity over characters.
    JaroWinkler,
}

impl SimilarityMetric {
    /// Scores two normalized headers. Empty input always scores zero.
    pub fn score(self, lhs: &str, rhs: &str) -> f64 {
        if lhs.is_empty() || rhs.is_empty() {
            return 0.0;
        }
        match self {
            SimilarityMetric::TokenOverlap => token_overlap(lhs, rhs),
            SimilarityMetric::Levenshtein => levenshtein::normalized_similarity(lhs.chars(), rhs.chars()),
            SimilarityMetric::JaroWinkler => jaro_winkler::similarity(lhs.chars(), rhs.chars()),
        }
    }
}

/// Dice coefficient `2|A∩B| / (|A|+|B|)` over the token sets of both strings.
pub fn token_overlap(lhs: &str, rhs: &str) -> f64 {
    let left = tokenize(lhs);
    let right = tokenize(rhs);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    (2 * shared) as f64 / (left.len() + right.len()) as f64
}

/// Splits a header into its comparison tokens.
pub fn tokenize(value: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let mut word = String::new();

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || (ch.is_alphanumeric() && !is_ideographic(ch)) {
            word.push(ch);
            continue;
        }
        if !word.is_empty() {
            tokens.insert(std::mem::take(&mut word));
        }
        if is_ideographic(ch) {
            tokens.insert(ch.to_string());
        }
    }
    if !word.is_empty() {
        tokens.insert(word);
    }

    tokens
}

fn is_ideographic(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{30FF}'   // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{20000}'..='\u{2FA1F}')
}
