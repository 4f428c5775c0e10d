//! Bank transfer detail rules.
//!
//! Name-like fields must carry their marker (`銀行`, `支店`/`支所`) and stay
//! within 3-20 characters; OCR noise rarely satisfies both.

use regex::Captures;

use super::patterns::{
    ACCOUNT_HOLDER_LABELED, ACCOUNT_NUMBER_AFTER_TYPE, ACCOUNT_NUMBER_BARE, ACCOUNT_NUMBER_LABELED,
    ACCOUNT_TYPE_LABELED, ACCOUNT_TYPE_TOKEN, BANK_NAME_LABELED, BANK_NAME_TOKEN, BRANCH_LABELED,
    BRANCH_TOKEN, KATAKANA_LINE,
};
use super::{bounded, first_group};
use crate::extraction::cascade::{FieldCascade, Matcher, Rule};
use crate::extraction::confidence::{CONTEXTUAL, FALLBACK, FALLBACK_WEAK, LABELED};
use crate::models::config::ExtractionConfig;
use crate::models::scan::FieldName;

const BANK_MARKER: &str = "銀行";
const BRANCH_MARKERS: [&str; 2] = ["支店", "支所"];
const NAME_MIN: usize = 3;
const NAME_MAX: usize = 20;
const ACCOUNT_NUMBER_DIGITS: usize = 7;

fn bank_name(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let raw = first_group(caps)?;
    let end = raw.find(BANK_MARKER)? + BANK_MARKER.len();
    bounded(&raw[..end], NAME_MIN, NAME_MAX)
}

fn branch_name(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let mut raw = first_group(caps)?;
    // "みずほ銀行渋谷支店" carries the bank as a prefix.
    if let Some(pos) = raw.rfind(BANK_MARKER) {
        raw = &raw[pos + BANK_MARKER.len()..];
    }
    if !BRANCH_MARKERS.iter().any(|m| raw.contains(m)) {
        return None;
    }
    bounded(raw, NAME_MIN, NAME_MAX)
}

fn account_type(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let raw = first_group(caps)?;
    let normalized = match raw.to_ascii_lowercase().as_str() {
        "savings" => "普通",
        "checking" => "当座",
        _ => raw,
    };
    Some(normalized.to_string())
}

fn account_number(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let digits: String = first_group(caps)?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    (digits.len() == ACCOUNT_NUMBER_DIGITS).then_some(digits)
}

fn account_holder(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    bounded(first_group(caps)?, NAME_MIN, NAME_MAX)
}

fn katakana_holder(caps: &Captures<'_>, config: &ExtractionConfig) -> Option<String> {
    let value = account_holder(caps, config)?;
    value.chars().any(is_katakana).then_some(value)
}

fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A1}'..='\u{30F6}' | '\u{FF66}'..='\u{FF9D}')
}

pub fn cascades() -> Vec<FieldCascade> {
    vec![
        FieldCascade::new(FieldName::BankName)
            .primary(Rule::new("bank_labeled", &BANK_NAME_LABELED, bank_name, LABELED))
            .fallback(
                Rule::new("bank_marker", &BANK_NAME_TOKEN, bank_name, FALLBACK)
                    .matching(Matcher::FirstAccepted),
            ),
        FieldCascade::new(FieldName::BranchName)
            .primary(Rule::new("branch_labeled", &BRANCH_LABELED, branch_name, LABELED))
            .fallback(
                Rule::new("branch_marker", &BRANCH_TOKEN, branch_name, FALLBACK)
                    .matching(Matcher::FirstAccepted),
            ),
        FieldCascade::new(FieldName::AccountType)
            .primary(Rule::new("account_type_labeled", &ACCOUNT_TYPE_LABELED, account_type, LABELED))
            .fallback(Rule::new("account_type_word", &ACCOUNT_TYPE_TOKEN, account_type, FALLBACK)),
        FieldCascade::new(FieldName::AccountNumber)
            .primary(Rule::new("account_number_labeled", &ACCOUNT_NUMBER_LABELED, account_number, LABELED))
            .primary(Rule::new("account_number_after_type", &ACCOUNT_NUMBER_AFTER_TYPE, account_number, CONTEXTUAL))
            .fallback(
                Rule::new("account_number_bare", &ACCOUNT_NUMBER_BARE, account_number, FALLBACK_WEAK)
                    .matching(Matcher::FirstAccepted),
            ),
        FieldCascade::new(FieldName::AccountHolder)
            .primary(Rule::new("holder_labeled", &ACCOUNT_HOLDER_LABELED, account_holder, LABELED))
            .fallback(
                Rule::new("holder_katakana_line", &KATAKANA_LINE, katakana_holder, FALLBACK)
                    .matching(Matcher::FirstAccepted),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn run_all(text: &str) -> BTreeMap<FieldName, (String, f32)> {
        let config = ExtractionConfig::default();
        cascades()
            .into_iter()
            .filter_map(|c| c.run(text, &config).map(|m| (c.field, (m.value, m.confidence))))
            .collect()
    }

    #[test]
    fn test_labeled_bank_block() {
        let text = "銀行名: みずほ銀行\n支店名: 渋谷支店\n口座種別: 普通\n口座番号: 1234567\n口座名義: カ)サンプル";
        let found = run_all(text);

        assert_eq!(found[&FieldName::BankName], ("みずほ銀行".to_string(), LABELED));
        assert_eq!(found[&FieldName::BranchName], ("渋谷支店".to_string(), LABELED));
        assert_eq!(found[&FieldName::AccountType], ("普通".to_string(), LABELED));
        assert_eq!(found[&FieldName::AccountNumber], ("1234567".to_string(), LABELED));
        assert_eq!(found[&FieldName::AccountHolder], ("カ)サンプル".to_string(), LABELED));
    }

    #[test]
    fn test_unlabeled_transfer_line() {
        let text = "お振込は下記口座へ\nみずほ銀行渋谷支店 普通 7654321\nヤマダ タロウ\n";
        let found = run_all(text);

        assert_eq!(found[&FieldName::BankName], ("みずほ銀行".to_string(), FALLBACK));
        assert_eq!(found[&FieldName::BranchName], ("渋谷支店".to_string(), FALLBACK));
        assert_eq!(found[&FieldName::AccountType], ("普通".to_string(), FALLBACK));
        assert_eq!(found[&FieldName::AccountNumber], ("7654321".to_string(), CONTEXTUAL));
        assert_eq!(found[&FieldName::AccountHolder], ("ヤマダ タロウ".to_string(), FALLBACK));
    }

    #[test]
    fn test_markers_and_length_bounds() {
        let found = run_all("振込先: ゆうちょ\n支店名: 本店");
        assert!(!found.contains_key(&FieldName::BankName));
        assert!(!found.contains_key(&FieldName::BranchName));

        let found = run_all("振込先: とてもとてもとてもとてもとても長い名前の銀行");
        assert!(!found.contains_key(&FieldName::BankName));
    }

    #[test]
    fn test_bare_account_number_fallback() {
        let found = run_all("口座 1234567\nTEL 03-1234-5678");
        assert_eq!(found[&FieldName::AccountNumber], ("1234567".to_string(), FALLBACK_WEAK));

        let found = run_all("TEL 03-1234-5678\n12345678");
        assert!(!found.contains_key(&FieldName::AccountNumber));
    }
}
