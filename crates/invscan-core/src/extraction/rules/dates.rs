//! Date rules.
//!
//! Dates are assigned by position: the first valid date in the document is
//! the issue date, the second is the due date. No label is consulted.

use chrono::NaiveDate;
use regex::Captures;

use super::patterns::DATE;
use crate::extraction::cascade::{FieldCascade, Matcher, Rule};
use crate::extraction::confidence::CONTEXTUAL;
use crate::models::config::ExtractionConfig;
use crate::models::scan::FieldName;

/// Parse year/month/day strings into a calendar date.
pub fn parse_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn iso_date(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<String> {
    parse_date(caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn cascades() -> Vec<FieldCascade> {
    vec![
        FieldCascade::new(FieldName::IssueDate).primary(
            Rule::new("first_date", &DATE, iso_date, CONTEXTUAL).matching(Matcher::Nth(0)),
        ),
        FieldCascade::new(FieldName::DueDate).primary(
            Rule::new("second_date", &DATE, iso_date, CONTEXTUAL).matching(Matcher::Nth(1)),
        ),
    ]
}
