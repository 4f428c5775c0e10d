//! Rule tables for each invoice field.

pub mod amounts;
pub mod bank;
pub mod dates;
pub mod header;
pub mod patterns;

pub use amounts::parse_amount;
pub use dates::parse_date;

use regex::Captures;

use super::cascade::FieldCascade;

/// Default cascades for every field, in evaluation order.
pub fn default_cascades() -> Vec<FieldCascade> {
    let mut cascades = header::cascades();
    cascades.extend(dates::cascades());
    cascades.extend(amounts::cascades());
    cascades.extend(bank::cascades());
    cascades
}

/// The first capture group that took part in the match.
pub(crate) fn first_group<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// Trim and accept `value` if its length in characters is within `min..=max`.
pub(crate) fn bounded(value: &str, min: usize, max: usize) -> Option<String> {
    let value = value.trim();
    let len = value.chars().count();
    (min..=max).contains(&len).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::confidence::{FALLBACK_CEILING, PRIMARY_FLOOR, Tier};
    use crate::models::scan::FieldName;

    #[test]
    fn test_every_field_has_one_cascade() {
        let cascades = default_cascades();
        for field in FieldName::ALL {
            let count = cascades.iter().filter(|c| c.field == field).count();
            assert_eq!(count, 1, "{} should have exactly one cascade", field);
        }
    }

    #[test]
    fn test_rule_confidence_reveals_tier() {
        for cascade in default_cascades() {
            for rule in &cascade.primary {
                assert!(rule.confidence >= PRIMARY_FLOOR, "{}", rule.name);
                assert_eq!(Tier::of(rule.confidence), Some(Tier::Primary));
            }
            for rule in &cascade.fallback {
                assert!(rule.confidence <= FALLBACK_CEILING, "{}", rule.name);
                assert_eq!(Tier::of(rule.confidence), Some(Tier::Fallback));
            }
        }
    }

    #[test]
    fn test_bounded() {
        assert_eq!(bounded("  みずほ銀行 ", 3, 20), Some("みずほ銀行".to_string()));
        assert_eq!(bounded("銀行", 3, 20), None);
    }
}
