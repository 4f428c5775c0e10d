//! Regex patterns for Japanese invoice extraction.
//!
//! Patterns run against text that has already been folded to half-width
//! (see [`crate::extraction::normalize_text`]), so ASCII digits and colons
//! are enough here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number
    pub static ref INVOICE_NUMBER_LABELED: Regex = Regex::new(
        r"(?:請求書番号|請求番号|伝票番号|(?i:\binvoice[ \t]*(?:no\b\.?|number\b|#)))[:\s#]*([A-Za-z0-9][A-Za-z0-9\-_/]*)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_TOKEN: Regex = Regex::new(
        r"(?i)\b(INV[\-_]?[0-9][A-Za-z0-9\-_/]*)"
    ).unwrap();

    // Client name
    pub static ref CLIENT_LABELED: Regex = Regex::new(
        r"(?:宛先|請求先|お客様名|(?i:(?:\bbill[ \t]*to\b|\bclient\b)(?:[ \t]*name\b)?))[:\s]*([^\n]+)"
    ).unwrap();

    pub static ref CLIENT_HONORIFIC: Regex = Regex::new(
        r"(?m)^[ \t]*([^\n]+?)[ \t]*(?:御中|様)[ \t]*$"
    ).unwrap();

    // Dates: 2024年03月01日, 2024/03/01, 2024-03-01
    pub static ref DATE: Regex = Regex::new(
        r"([0-9]{4})[ \t]*[年/\-][ \t]*([0-9]{1,2})[ \t]*[月/\-][ \t]*([0-9]{1,2})[ \t]*日?"
    ).unwrap();

    // Monetary amounts
    pub static ref TOTAL_LABELED: Regex = Regex::new(
        r"(?:(?:合計|総額|請求額)(?:金額)?|(?i:\btotal\b))[:\s¥￥円]*([0-9][0-9,]*)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?:金額|(?i:\bamount\b))[:\s¥￥円]*([0-9][0-9,]*)"
    ).unwrap();

    pub static ref BARE_CURRENCY: Regex = Regex::new(
        r"[¥￥][ \t]*([0-9][0-9,]*)|([0-9][0-9,]*)[ \t]*円"
    ).unwrap();

    pub static ref SUBTOTAL_LABELED: Regex = Regex::new(
        r"(?:小計|(?i:\bsub[ \t]*total\b))[:\s¥￥円]*([0-9][0-9,]*)"
    ).unwrap();

    pub static ref TAX_LABELED: Regex = Regex::new(
        r"(?:消費税額?|税額|(?i:\btax\b))(?:[ \t]*\(?[0-9]{1,2}[ \t]*[%％]\)?)?[:\s¥￥円]*([0-9][0-9,]*)"
    ).unwrap();

    /// Numeric runs, keeping date and phone separators inside one token so
    /// `2024-03-01` or `03-1234-5678` never split into plausible amounts.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(
        r"([0-9](?:[0-9,/\-]*[0-9])?)(年)?"
    ).unwrap();

    pub static ref COMMA_GROUPED_SHAPE: Regex = Regex::new(
        r"^[0-9]{1,3}(?:,[0-9]{3})+$"
    ).unwrap();

    // Bank / payment details
    pub static ref BANK_NAME_LABELED: Regex = Regex::new(
        r"(?:銀行名|金融機関名?|振込先|(?i:\bbank(?:[ \t]*name)?\b))[:\s]*([^\s:]+)"
    ).unwrap();

    pub static ref BANK_NAME_TOKEN: Regex = Regex::new(
        r"([^\s:、,。()]+?銀行)"
    ).unwrap();

    pub static ref BRANCH_LABELED: Regex = Regex::new(
        r"(?:支店名|(?i:\bbranch(?:[ \t]*name)?\b))[:\s]*([^\s:]+)"
    ).unwrap();

    pub static ref BRANCH_TOKEN: Regex = Regex::new(
        r"([^\s:、,。()]+?(?:支店|支所))"
    ).unwrap();

    pub static ref ACCOUNT_TYPE_LABELED: Regex = Regex::new(
        r"(?:口座種別|預金種目|口座種類|種別|(?i:\baccount[ \t]*type\b))[:\s]*(普通|当座|貯蓄|(?i:savings|checking))"
    ).unwrap();

    pub static ref ACCOUNT_TYPE_TOKEN: Regex = Regex::new(
        r"(普通|当座|貯蓄)(?:預金)?"
    ).unwrap();

    pub static ref ACCOUNT_NUMBER_LABELED: Regex = Regex::new(
        r"(?:口座番号|(?i:\baccount[ \t]*(?:no\b\.?|number\b|#)))[:\s]*([0-9][0-9\-]*[0-9])"
    ).unwrap();

    pub static ref ACCOUNT_NUMBER_AFTER_TYPE: Regex = Regex::new(
        r"(?:普通|当座|貯蓄)(?:預金)?[:\s]*([0-9]{7})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref ACCOUNT_NUMBER_BARE: Regex = Regex::new(
        r"(?:^|[^0-9\-])([0-9]{7})(?:[^0-9\-]|$)"
    ).unwrap();

    pub static ref ACCOUNT_HOLDER_LABELED: Regex = Regex::new(
        r"(?:口座名義人?|名義人?|受取人|(?i:\baccount[ \t]*holder\b))[:\s]*([^\n]+)"
    ).unwrap();

    pub static ref KATAKANA_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*([ァ-ヶーｦ-ﾟ・() ]+?)[ \t]*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_label_does_not_match_subtotal() {
        assert!(TOTAL_LABELED.captures("Subtotal: 10,000").is_none());
        assert_eq!(&TOTAL_LABELED.captures("Total: 10,000").unwrap()[1], "10,000");
    }

    #[test]
    fn test_numeric_token_keeps_dates_whole() {
        let tokens: Vec<&str> = NUMERIC_TOKEN
            .captures_iter("2024-03-01 03-1234-5678 1,500")
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(tokens, vec!["2024-03-01", "03-1234-5678", "1,500"]);
    }

    #[test]
    fn test_invoice_label_needs_whole_word() {
        assert!(INVOICE_NUMBER_LABELED.captures("Invoice November 2024").is_none());
        assert!(INVOICE_NUMBER_LABELED.captures("Invoice Notes: thank you").is_none());
        assert_eq!(&INVOICE_NUMBER_LABELED.captures("Invoice No.: A-17").unwrap()[1], "A-17");
        assert_eq!(&INVOICE_NUMBER_LABELED.captures("INVOICE NUMBER 88").unwrap()[1], "88");
    }

    #[test]
    fn test_client_label_skips_name_suffix() {
        assert_eq!(&CLIENT_LABELED.captures("Client Name: ACME Corp").unwrap()[1], "ACME Corp");
        assert_eq!(&CLIENT_LABELED.captures("Bill To Name: Globex").unwrap()[1], "Globex");
        assert_eq!(&CLIENT_LABELED.captures("Client: Namco Ltd").unwrap()[1], "Namco Ltd");
    }

    #[test]
    fn test_tax_label_ignores_tax_id() {
        assert!(TAX_LABELED.captures("Tax ID: 12-3456789").is_none());
        assert!(TAX_LABELED.captures("Tax No. 1234567").is_none());
        assert_eq!(&TAX_LABELED.captures("Tax (10%): 1,500").unwrap()[1], "1,500");
    }

    #[test]
    fn test_katakana_line() {
        let caps = KATAKANA_LINE.captures("振込先\nヤマダ タロウ\n").unwrap();
        assert_eq!(&caps[1], "ヤマダ タロウ");
    }
}
