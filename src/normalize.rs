//! Canonical form used whenever two header strings are compared.
//!
//! Template headers, mapping-file aliases, and source headers all go through
//! [`normalize`] with the same options so that comparisons stay symmetric.

use serde::{Deserialize, Serialize};

const DEFAULT_PUNCTUATION: &str = ":：()（）[]【】<>《》\"'“”‘’*#?？!！,，、.。";

/// How internal whitespace is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhitespaceMode {
    /// Runs of whitespace become a single space.
    #[default]
    Collapse,
    /// All whitespace is dropped, which suits CJK headers split across lines.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub whitespace: WhitespaceMode,
    pub lowercase: bool,
    /// Map full-width ASCII forms and the ideographic space to their
    /// half-width equivalents.
    pub fold_width: bool,
    /// Characters removed before comparison.
    pub punctuation: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceMode::Collapse,
            lowercase: true,
            fold_width: true,
            punctuation: DEFAULT_PUNCTUATION.to_string(),
        }
    }
}

impl NormalizeOptions {
    pub fn apply(&self, header: &str) -> String {
        normalize(header, self)
    }
}

/// Returns the canonical form of `header`.
pub fn normalize(header: &str, options: &NormalizeOptions) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_space = false;

    for raw in header.chars() {
        let ch = if options.fold_width { fold_width(raw) } else { raw };

        if ch.is_whitespace() {
            pending_space = options.whitespace == WhitespaceMode::Collapse;
            continue;
        }
        if options.punctuation.contains(ch) {
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        if options.lowercase {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

fn fold_width(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch),
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_collapses_and_lowercases() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize("  Account \t  Number\n", &options), "account number");
    }

    #[test]
    fn folds_full_width_forms() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize("ＡＢＣ\u{3000}１２", &options), "abc 12");
    }

    #[test]
    fn remove_mode_drops_all_whitespace() {
        let options = NormalizeOptions {
            whitespace: WhitespaceMode::Remove,
            ..NormalizeOptions::default()
        };
        assert_eq!(normalize(" 交易\n日 期 ", &options), "交易日期");
    }

    #[test]
    fn strips_configured_punctuation_only() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize("金额（元）:", &options), "金额元");
        assert_eq!(normalize("折/卡号/存单号", &options), "折/卡号/存单号");
    }

    #[test]
    fn punctuation_between_words_does_not_leave_double_spaces() {
        let options = NormalizeOptions::default();
        assert_eq!(normalize("Name : First", &options), "name first");
    }
}
