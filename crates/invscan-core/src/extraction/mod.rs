//! Invoice field extraction from recognized text.

pub mod cascade;
pub mod confidence;
mod engine;
pub mod rules;

pub use cascade::{Accept, CascadeMatch, FieldCascade, Matcher, Rule, RuleMatch};
pub use confidence::Tier;
pub use engine::FieldExtractionEngine;

use std::borrow::Cow;

/// Fold full-width ASCII variants and the ideographic space to half-width, and drop `\r`.
///
/// Japanese OCR output freely mixes `１５，０００` with `15,000`; rules only
/// need to handle the half-width form.
pub fn normalize_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_folding) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(text.chars().filter_map(fold_char).collect())
}

fn needs_folding(c: char) -> bool {
    matches!(c, '\r' | '\u{3000}' | '\u{FF01}'..='\u{FF5E}')
}

fn fold_char(c: char) -> Option<char> {
    match c {
        '\r' => None,
        '\u{3000}' => Some(' '),
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0),
        _ => Some(c),
    }
}
