//! Generic runner for ordered extraction rule tables.
//!
//! Each field is described by a [`FieldCascade`]: a primary tier of
//! label-anchored rules and a fallback tier of heuristics. Rules are tried in
//! order and the first one that yields an accepted value wins.

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::models::config::ExtractionConfig;
use crate::models::scan::{FieldName, RecognizedField};

use super::confidence::Tier;

/// Turns a regex match into a normalized value, or rejects it.
///
/// Plausibility checks live here, so a rejected match never reaches the result.
pub type Accept = fn(&Captures<'_>, &ExtractionConfig) -> Option<String>;

/// How a rule walks the occurrences of its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Only the leftmost occurrence counts; if it is rejected the rule fails.
    Leading,
    /// The first occurrence the acceptor takes.
    FirstAccepted,
    /// The accepted occurrence with the largest numeric value.
    Largest,
    /// The n-th accepted occurrence in document order.
    Nth(usize),
}

/// A single extraction rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Short identifier, used in logs and explanations.
    pub name: &'static str,
    pub pattern: &'static Regex,
    pub matcher: Matcher,
    pub accept: Accept,
    /// Base confidence, banded by the tier the rule is placed in.
    pub confidence: f32,
}

/// Value produced by one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub value: String,
    /// Byte span of the whole match in the searched text.
    pub span: (usize, usize),
}

impl Rule {
    /// Create a rule that looks at the leftmost occurrence only.
    pub fn new(name: &'static str, pattern: &'static Regex, accept: Accept, confidence: f32) -> Self {
        Self {
            name,
            pattern,
            matcher: Matcher::Leading,
            accept,
            confidence,
        }
    }

    /// Change how occurrences are walked.
    pub fn matching(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Apply the rule to `text`.
    pub fn apply(&self, text: &str, config: &ExtractionConfig) -> Option<RuleMatch> {
        match self.matcher {
            Matcher::Leading => {
                let caps = self.pattern.captures(text)?;
                let accepted = self.accept_captures(&caps, config);
                if accepted.is_none() {
                    trace!("rule {} rejected leading match {:?}", self.name, &caps[0]);
                }
                accepted
            }
            Matcher::FirstAccepted => self.accepted(text, config).next(),
            Matcher::Largest => self
                .accepted(text, config)
                .filter_map(|m| m.value.parse::<u64>().ok().map(|n| (n, m)))
                .max_by_key(|(n, _)| *n)
                .map(|(_, m)| m),
            Matcher::Nth(n) => self.accepted(text, config).nth(n),
        }
    }

    fn accepted<'a>(
        &'a self,
        text: &'a str,
        config: &'a ExtractionConfig,
    ) -> impl Iterator<Item = RuleMatch> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(move |caps| self.accept_captures(&caps, config))
    }

    fn accept_captures(&self, caps: &Captures<'_>, config: &ExtractionConfig) -> Option<RuleMatch> {
        let whole = caps.get(0)?;
        (self.accept)(caps, config).map(|value| RuleMatch {
            value,
            span: (whole.start(), whole.end()),
        })
    }
}

/// Winning value for a field, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeMatch {
    pub field: FieldName,
    pub value: String,
    pub confidence: f32,
    pub tier: Tier,
    /// Name of the rule that produced the value.
    pub rule: &'static str,
    pub span: (usize, usize),
}

impl From<CascadeMatch> for RecognizedField {
    fn from(m: CascadeMatch) -> Self {
        RecognizedField::new(m.value, m.confidence)
    }
}

/// Ordered rule table for one field.
#[derive(Debug, Clone)]
pub struct FieldCascade {
    pub field: FieldName,
    pub primary: Vec<Rule>,
    pub fallback: Vec<Rule>,
}

impl FieldCascade {
    pub fn new(field: FieldName) -> Self {
        Self {
            field,
            primary: Vec::new(),
            fallback: Vec::new(),
        }
    }

    /// Append a label-anchored rule.
    pub fn primary(mut self, rule: Rule) -> Self {
        self.primary.push(rule);
        self
    }

    /// Append a heuristic rule, tried only after every primary rule failed.
    pub fn fallback(mut self, rule: Rule) -> Self {
        self.fallback.push(rule);
        self
    }

    /// Run the cascade; the first rule yielding a value wins.
    pub fn run(&self, text: &str, config: &ExtractionConfig) -> Option<CascadeMatch> {
        let tiers = [(Tier::Primary, &self.primary), (Tier::Fallback, &self.fallback)];

        for (tier, rules) in tiers {
            for rule in rules {
                if let Some(m) = rule.apply(text, config) {
                    let confidence = tier.score(rule.confidence);
                    debug!(
                        "{}: {:?} from rule {} ({:?}, {:.2})",
                        self.field, m.value, rule.name, tier, confidence
                    );
                    return Some(CascadeMatch {
                        field: self.field,
                        value: m.value,
                        confidence,
                        tier,
                        rule: rule.name,
                        span: m.span,
                    });
                }
            }
        }

        None
    }
}
