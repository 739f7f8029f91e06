//! Label canonicalization.
//!
//! Turns free-form ETS labels ("Éclairage - Salle 1", "straße_nord") into the
//! compact PascalCase tokens that group address names are assembled from.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::core::errors::{KnxError, Result};

/// Formats a label into a name token.
pub trait LabelFormatter {
    /// Canonicalize `text`. `None` and blank input yield an empty token.
    fn format(&self, text: Option<&str>) -> Result<String>;

    /// Convenience wrapper for labels that are always present
    fn format_str(&self, text: &str) -> Result<String> {
        self.format(Some(text))
    }
}

/// Diacritic-stripping PascalCase normalizer.
///
/// Processing order:
/// 1. mark case humps (`lowerUpper`, `1Upper`, `UPPERWord`) as word breaks
/// 2. punctuation, symbols and `_` become spaces
/// 3. invariant lowercase
/// 4. NFD, drop combining marks, `ß` → `ss`, NFC
/// 5. keep letters, digits and spaces only
/// 6. split on whitespace runs and title-case each word
///
/// Step 1 makes already-normalized tokens fixed points, so
/// `normalize(normalize(s)) == normalize(s)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self
    }

    /// Canonicalize a single label.
    pub fn normalize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let spaced: String = split_case_humps(text)
            .chars()
            .map(|c| if c == '_' || is_punctuation_or_symbol(c) { ' ' } else { c })
            .collect();

        let folded: String = spaced
            .to_lowercase()
            .replace('ß', "ss")
            .nfd()
            .filter(|&c| !is_combining_mark(c))
            .nfc()
            .filter(|&c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        let token: String = folded.split_whitespace().map(title_case).collect();

        if let Some(bad) = token.chars().find(|c| !c.is_alphanumeric()) {
            return Err(KnxError::format(
                text,
                format!("normalized token contains non-alphanumeric character {bad:?}"),
            ));
        }

        Ok(token)
    }
}

impl LabelFormatter for Normalizer {
    fn format(&self, text: Option<&str>) -> Result<String> {
        match text {
            Some(text) => self.normalize(text),
            None => Ok(String::new()),
        }
    }
}

fn is_punctuation_or_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control() && !is_combining_mark(c)
}

/// Insert a space before an uppercase letter that follows a lowercase letter or
/// a digit, or that starts a capitalized word after another capital (`LEntree`).
///
/// Runs of capitals stay together so `ECLAIRAGE` lowercases as one word.
fn split_case_humps(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let previous = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if previous.is_lowercase()
                || previous.is_numeric()
                || (previous.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

fn title_case(word: &str) -> String {
    let mut graphemes = word.graphemes(true);
    match graphemes.next() {
        Some(first) => {
            let mut out = first.to_uppercase();
            out.push_str(&graphemes.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}
