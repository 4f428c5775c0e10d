//! Monetary amount rules: total, subtotal and tax.

use regex::Captures;

use super::first_group;
use super::patterns::{
    BARE_CURRENCY, COMMA_GROUPED_SHAPE, NUMERIC_TOKEN, SUBTOTAL_LABELED, TAX_LABELED,
    TOTAL_AMOUNT, TOTAL_LABELED,
};
use crate::extraction::cascade::{FieldCascade, Matcher, Rule};
use crate::extraction::confidence::{CONTEXTUAL, FALLBACK_STRONG, FALLBACK, LABELED, LABELED_SPECIFIC};
use crate::models::config::ExtractionConfig;
use crate::models::scan::FieldName;

/// Parse a yen amount written with optional comma grouping ("15,000" or "15000").
///
/// Trailing commas left by OCR are ignored; any other non-digit rejects the value.
pub fn parse_amount(s: &str) -> Option<u64> {
    let s = s.trim().trim_end_matches(',');
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn plausible_amount(caps: &Captures<'_>, config: &ExtractionConfig) -> Option<String> {
    let amount = parse_amount(first_group(caps)?)?;
    config.is_plausible(amount).then(|| amount.to_string())
}

/// Tax lines are often small, so only the upper bound applies.
fn plausible_tax(caps: &Captures<'_>, config: &ExtractionConfig) -> Option<String> {
    let amount = parse_amount(first_group(caps)?)?;
    (1..=config.max_amount)
        .contains(&amount)
        .then(|| amount.to_string())
}

fn comma_grouped(caps: &Captures<'_>, config: &ExtractionConfig) -> Option<String> {
    let token = caps.get(1)?.as_str();
    if !COMMA_GROUPED_SHAPE.is_match(token) {
        return None;
    }
    plausible_amount(caps, config)
}

fn plain_digits(caps: &Captures<'_>, config: &ExtractionConfig) -> Option<String> {
    // A digit run directly followed by 年 is a year.
    if caps.get(2).is_some() {
        return None;
    }
    let token = caps.get(1)?.as_str();
    if !(4..=8).contains(&token.len()) || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    plausible_amount(caps, config)
}

pub fn cascades() -> Vec<FieldCascade> {
    vec![
        FieldCascade::new(FieldName::Total)
            .primary(Rule::new("total_labeled", &TOTAL_LABELED, plausible_amount, LABELED_SPECIFIC))
            .primary(Rule::new("total_amount", &TOTAL_AMOUNT, plausible_amount, LABELED))
            .primary(Rule::new("total_currency", &BARE_CURRENCY, plausible_amount, CONTEXTUAL))
            .fallback(
                Rule::new("total_comma_grouped", &NUMERIC_TOKEN, comma_grouped, FALLBACK_STRONG)
                    .matching(Matcher::Largest),
            )
            .fallback(
                Rule::new("total_plain_digits", &NUMERIC_TOKEN, plain_digits, FALLBACK)
                    .matching(Matcher::Largest),
            ),
        FieldCascade::new(FieldName::Subtotal).primary(Rule::new(
            "subtotal_labeled",
            &SUBTOTAL_LABELED,
            plausible_amount,
            LABELED_SPECIFIC,
        )),
        FieldCascade::new(FieldName::Tax).primary(Rule::new(
            "tax_labeled",
            &TAX_LABELED,
            plausible_tax,
            LABELED_SPECIFIC,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::confidence::Tier;

    fn run(field: FieldName, text: &str) -> Option<(String, f32, Tier)> {
        let config = ExtractionConfig::default();
        cascades()
            .into_iter()
            .find(|c| c.field == field)
            .and_then(|c| c.run(text, &config))
            .map(|m| (m.value, m.confidence, m.tier))
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("15,000"), Some(15000));
        assert_eq!(parse_amount("15000"), Some(15000));
        assert_eq!(parse_amount("1,200,"), Some(1200));
        assert_eq!(parse_amount("12a"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_labeled_total() {
        let (value, confidence, tier) = run(FieldName::Total, "合計¥15,000").unwrap();
        assert_eq!(value, "15000");
        assert_eq!(confidence, LABELED_SPECIFIC);
        assert_eq!(tier, Tier::Primary);

        let (value, _, _) = run(FieldName::Total, "ご請求金額: 48,400円").unwrap();
        assert_eq!(value, "48400");
    }

    #[test]
    fn test_implausible_label_falls_through_to_next_pattern() {
        let (value, confidence, _) = run(FieldName::Total, "Total: 5\nAmount: 12,000").unwrap();
        assert_eq!(value, "12000");
        assert_eq!(confidence, LABELED);
    }

    #[test]
    fn test_bare_currency() {
        let (value, confidence, _) = run(FieldName::Total, "お支払い ￥3,300").unwrap();
        assert_eq!(value, "3300");
        assert_eq!(confidence, CONTEXTUAL);
    }

    #[test]
    fn test_fallback_picks_largest_comma_grouped() {
        let text = "品目A 1,200\n品目B 3,400\n品目C 2,100";
        let (value, confidence, tier) = run(FieldName::Total, text).unwrap();
        assert_eq!(value, "3400");
        assert_eq!(tier, Tier::Fallback);
        assert!((0.4..=0.6).contains(&confidence));
    }

    #[test]
    fn test_fallback_plain_digits_skip_years_and_dates() {
        let text = "2024年3月1日\n発行 2024-03-01\nTEL 03-1234-5678\n作業費 8800";
        let (value, confidence, _) = run(FieldName::Total, text).unwrap();
        assert_eq!(value, "8800");
        assert_eq!(confidence, FALLBACK);
    }

    #[test]
    fn test_out_of_range_never_selected() {
        assert_eq!(run(FieldName::Total, "Page 12\n合計 99"), None);
        assert_eq!(run(FieldName::Total, "合計 ¥150,000,000\n99,999,999,999"), None);

        let (value, _, _) = run(FieldName::Total, "No. 50\n123,456,789\n4,500").unwrap();
        assert_eq!(value, "4500");
    }

    #[test]
    fn test_subtotal_and_tax() {
        let text = "小計 10,000\n消費税(10%) 1,000\n合計 11,000";
        assert_eq!(run(FieldName::Subtotal, text).unwrap().0, "10000");
        assert_eq!(run(FieldName::Tax, text).unwrap().0, "1000");
        assert_eq!(run(FieldName::Total, text).unwrap().0, "11000");

        assert_eq!(run(FieldName::Tax, "消費税 80").unwrap().0, "80");
    }

    #[test]
    fn test_tax_id_is_not_a_tax_amount() {
        assert_eq!(run(FieldName::Tax, "Tax ID: 12-3456789\nTotal: 15,000"), None);
        assert_eq!(run(FieldName::Tax, "Tax ID: 12-3456789\nTax: 1,500").unwrap().0, "1500");
    }
}
