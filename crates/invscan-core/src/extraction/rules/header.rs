//! Invoice number and client name rules.

use regex::Captures;

use super::patterns::{CLIENT_HONORIFIC, CLIENT_LABELED, INVOICE_NUMBER_LABELED, INVOICE_NUMBER_TOKEN};
use super::{bounded, first_group};
use crate::extraction::cascade::{FieldCascade, Matcher, Rule};
use crate::extraction::confidence::{FALLBACK, LABELED};
use crate::models::config::ExtractionConfig;
use crate::models::scan::FieldName;

const HONORIFICS: [&str; 2] = ["御中", "様"];

/// Salutations that address the reader rather than name a client.
const GENERIC_ADDRESSEES: [&str; 4] = ["お客", "ご担当者", "御担当者", "担当者"];

fn invoice_number(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let value = first_group(caps)?.trim_end_matches(['-', '_', '/']);
    bounded(value, 1, 30)
}

fn client_name(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    let mut name = first_group(caps)?.trim();
    for honorific in HONORIFICS {
        name = name.trim_end_matches(honorific).trim_end();
    }
    if GENERIC_ADDRESSEES.contains(&name) {
        return None;
    }
    bounded(name, 2, 50)
}

pub fn cascades() -> Vec<FieldCascade> {
    vec![
        FieldCascade::new(FieldName::InvoiceNumber)
            .primary(Rule::new("invoice_number_labeled", &INVOICE_NUMBER_LABELED, invoice_number, LABELED))
            .fallback(
                Rule::new("invoice_number_token", &INVOICE_NUMBER_TOKEN, invoice_number, FALLBACK)
                    .matching(Matcher::FirstAccepted),
            ),
        FieldCascade::new(FieldName::ClientName)
            .primary(Rule::new("client_labeled", &CLIENT_LABELED, client_name, LABELED))
            .fallback(
                Rule::new("client_honorific", &CLIENT_HONORIFIC, client_name, FALLBACK)
                    .matching(Matcher::FirstAccepted),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(field: FieldName, text: &str) -> Option<(String, f32)> {
        let config = ExtractionConfig::default();
        cascades()
            .into_iter()
            .find(|c| c.field == field)
            .and_then(|c| c.run(text, &config))
            .map(|m| (m.value, m.confidence))
    }

    #[test]
    fn test_labeled_invoice_number() {
        assert_eq!(
            run(FieldName::InvoiceNumber, "請求書番号: INV-001\n合計¥15,000"),
            Some(("INV-001".to_string(), LABELED))
        );
        assert_eq!(
            run(FieldName::InvoiceNumber, "Invoice No. 2024/0042"),
            Some(("2024/0042".to_string(), LABELED))
        );
    }

    #[test]
    fn test_invoice_number_token_fallback() {
        assert_eq!(
            run(FieldName::InvoiceNumber, "請求書\nINV-2024-017"),
            Some(("INV-2024-017".to_string(), FALLBACK))
        );
        assert_eq!(run(FieldName::InvoiceNumber, "請求書\n御見積"), None);
    }

    #[test]
    fn test_client_name() {
        assert_eq!(
            run(FieldName::ClientName, "請求先: 株式会社サンプル 御中"),
            Some(("株式会社サンプル".to_string(), LABELED))
        );
        assert_eq!(
            run(FieldName::ClientName, "請求書\n山田商事株式会社 御中\n"),
            Some(("山田商事株式会社".to_string(), FALLBACK))
        );
    }

    #[test]
    fn test_english_labels_need_whole_words() {
        assert_eq!(run(FieldName::InvoiceNumber, "Invoice November 2024\nTotal: 15,000"), None);
        assert_eq!(run(FieldName::InvoiceNumber, "Invoice Notes: thank you"), None);
        assert_eq!(
            run(FieldName::ClientName, "Client Name: ACME Corp"),
            Some(("ACME Corp".to_string(), LABELED))
        );
    }

    #[test]
    fn test_generic_salutation_is_not_a_client() {
        assert_eq!(run(FieldName::ClientName, "お客様\n請求書"), None);
        assert_eq!(
            run(FieldName::ClientName, "ご担当者様\n株式会社テスト 御中\n"),
            Some(("株式会社テスト".to_string(), FALLBACK))
        );
    }
}
