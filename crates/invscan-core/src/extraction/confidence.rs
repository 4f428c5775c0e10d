//! Confidence scoring for extracted fields.
//!
//! Scores are fixed per rule and banded per tier: anything at or above
//! [`PRIMARY_FLOOR`] came from a label-anchored pattern, anything at or below
//! [`FALLBACK_CEILING`] came from a heuristic scan. Nothing lands in between.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::models::scan::RecognizedField;

/// Label that names exactly this field (e.g. `合計`).
pub const LABELED_SPECIFIC: f32 = 0.9;
/// Label-anchored, but the label is shared with other fields.
pub const LABELED: f32 = 0.85;
/// Unlabeled but structurally unambiguous (currency marks, dates).
pub const CONTEXTUAL: f32 = 0.8;

/// Strongest heuristic (comma-grouped amounts, marker-bearing tokens).
pub const FALLBACK_STRONG: f32 = 0.6;
pub const FALLBACK: f32 = 0.5;
/// Weakest heuristic (bare digit runs).
pub const FALLBACK_WEAK: f32 = 0.4;

pub const PRIMARY_FLOOR: f32 = CONTEXTUAL;
pub const FALLBACK_CEILING: f32 = FALLBACK_STRONG;

/// Which tier of a field cascade produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Label-anchored pattern.
    Primary,
    /// Heuristic scan over the whole text.
    Fallback,
}

impl Tier {
    /// Confidence band reserved for this tier.
    pub fn band(&self) -> RangeInclusive<f32> {
        match self {
            Tier::Primary => PRIMARY_FLOOR..=LABELED_SPECIFIC,
            Tier::Fallback => FALLBACK_WEAK..=FALLBACK_CEILING,
        }
    }

    /// Score a match from this tier, forcing the rule's base confidence into the band.
    pub fn score(&self, base: f32) -> f32 {
        let band = self.band();
        base.clamp(*band.start(), *band.end())
    }

    /// Recover the tier from a score alone.
    pub fn of(confidence: f32) -> Option<Tier> {
        if Tier::Primary.band().contains(&confidence) {
            Some(Tier::Primary)
        } else if Tier::Fallback.band().contains(&confidence) {
            Some(Tier::Fallback)
        } else {
            None
        }
    }
}

/// Mean confidence over the extracted fields (0.0 when nothing was found).
pub fn overall<'a>(fields: impl IntoIterator<Item = &'a RecognizedField>) -> f32 {
    let (sum, count) = fields
        .into_iter()
        .fold((0.0f32, 0usize), |(sum, count), f| (sum + f.confidence, count + 1));

    if count == 0 { 0.0 } else { sum / count as f32 }
}
