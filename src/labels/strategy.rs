// Cluster labeling as an ordered chain of strategies.
//
// Each strategy looks at the community's member questions and either proposes
// a label or passes. The first non-empty proposal wins:
//
//   1. TrivialCommunity: under 3 members, dominant topic or else the first
//      question (truncated)
//   2. TopicTheme: a word that recurs across the members' topic strings
//   3. DomainKeyword: best-scoring entry of the domain keyword table
//   4. StatisticalTerms: identical-text shortcut, then top TF-IDF term
//
// If every strategy passes, the label is "Cluster {size}".

use std::collections::HashMap;

use tracing::{debug, warn};

use super::domains::DomainTable;
use super::terms::TermExtractor;
use crate::output::truncate_chars;
use crate::survey::models::UNKNOWN;

/// Communities smaller than this are labeled by the trivial rule.
const TRIVIAL_SIZE: usize = 3;

/// Max characters of question text used as a trivial label.
const TRIVIAL_TEXT_CHARS: usize = 30;

/// Topic tokens must be longer than this.
const MIN_TOPIC_TOKEN_CHARS: usize = 3;

/// Words kept by the identical-text shortcut.
const IDENTICAL_TEXT_WORDS: usize = 5;

/// One community member as seen by the labeler.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    /// Question text (without any duplicate suffix)
    pub text: &'a str,
    pub topic: Option<&'a str>,
}

impl<'a> Member<'a> {
    pub fn new(text: &'a str, topic: Option<&'a str>) -> Self {
        Self { text, topic }
    }

    /// The topic, unless absent, blank, or "Unknown".
    fn known_topic(&self) -> Option<&'a str> {
        self.topic
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != UNKNOWN)
    }
}

/// A single labeling rule.
pub trait LabelStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose a label, or None to defer to the next strategy.
    fn propose(&self, members: &[Member<'_>]) -> Option<String>;
}

pub struct TrivialCommunity;

impl LabelStrategy for TrivialCommunity {
    fn name(&self) -> &'static str {
        "trivial"
    }

    fn propose(&self, members: &[Member<'_>]) -> Option<String> {
        if members.len() >= TRIVIAL_SIZE {
            return None;
        }
        if let Some(topic) = most_frequent(members.iter().filter_map(|m| m.known_topic())) {
            return Some(topic.0.to_string());
        }
        members
            .first()
            .map(|m| truncate_chars(m.text.trim(), TRIVIAL_TEXT_CHARS))
    }
}

pub struct TopicTheme;

impl LabelStrategy for TopicTheme {
    fn name(&self) -> &'static str {
        "topic-theme"
    }

    fn propose(&self, members: &[Member<'_>]) -> Option<String> {
        if members.len() < TRIVIAL_SIZE {
            return None;
        }

        let tokens: Vec<String> = members
            .iter()
            .filter_map(|m| m.known_topic())
            .flat_map(|t| t.split_whitespace())
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() > MIN_TOPIC_TOKEN_CHARS)
            .collect();

        let (token, count) = most_frequent(tokens.iter().map(String::as_str))?;
        let required = (members.len() as f64 / 5.0).max(2.0);
        if count as f64 >= required {
            Some(capitalize(token))
        } else {
            None
        }
    }
}

pub struct DomainKeyword {
    pub table: DomainTable,
}

impl LabelStrategy for DomainKeyword {
    fn name(&self) -> &'static str {
        "domain-keyword"
    }

    fn propose(&self, members: &[Member<'_>]) -> Option<String> {
        let texts: Vec<String> = members.iter().map(|m| m.text.to_string()).collect();
        self.table.best_match(&texts).map(str::to_string)
    }
}

pub struct StatisticalTerms {
    pub extractor: TermExtractor,
}

impl LabelStrategy for StatisticalTerms {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn propose(&self, members: &[Member<'_>]) -> Option<String> {
        let first = members.first()?;
        if members.iter().all(|m| m.text == first.text) {
            return Some(leading_words(first.text, IDENTICAL_TEXT_WORDS));
        }

        let texts: Vec<String> = members.iter().map(|m| m.text.to_string()).collect();
        match self.extractor.top_term(&texts) {
            Ok(term) => Some(capitalize(&term)),
            Err(e) => {
                warn!(error = %e, members = members.len(), "Term extraction failed, using generic label");
                None
            }
        }
    }
}

/// Runs the strategy chain for each community.
pub struct ClusterLabeler {
    strategies: Vec<Box<dyn LabelStrategy>>,
}

impl Default for ClusterLabeler {
    fn default() -> Self {
        Self::new(DomainTable::default())
    }
}

impl ClusterLabeler {
    /// The standard chain with the given domain table.
    pub fn new(domains: DomainTable) -> Self {
        Self::with_strategies(vec![
            Box::new(TrivialCommunity),
            Box::new(TopicTheme),
            Box::new(DomainKeyword { table: domains }),
            Box::new(StatisticalTerms {
                extractor: TermExtractor::default(),
            }),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn LabelStrategy>>) -> Self {
        Self { strategies }
    }

    /// Label a community. Never returns an empty string.
    pub fn label(&self, members: &[Member<'_>]) -> String {
        self.label_with_source(members).0
    }

    /// Label a community and name the strategy that produced it
    /// ("fallback" when none did).
    pub fn label_with_source(&self, members: &[Member<'_>]) -> (String, &'static str) {
        for strategy in &self.strategies {
            if let Some(label) = strategy.propose(members) {
                let label = label.trim();
                if !label.is_empty() {
                    debug!(strategy = strategy.name(), label = label, "Labeled cluster");
                    return (label.to_string(), strategy.name());
                }
            }
        }
        (format!("Cluster {}", members.len()), "fallback")
    }
}

/// Most frequent item; ties go to the one seen first.
fn most_frequent<'a>(items: impl Iterator<Item = &'a str>) -> Option<(&'a str, usize)> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut best: Option<(&'a str, usize)> = None;
    for item in order {
        let count = counts[item];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((item, count));
        }
    }
    best
}

/// Uppercase the first character.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First `n` whitespace-separated words followed by "...", or the whole text
/// when it has no more than `n` words.
fn leading_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= n {
        text.trim().to_string()
    } else {
        format!("{}...", words[..n].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("loan"), "Loan");
        assert_eq!(capitalize("repay loan"), "Repay loan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_leading_words() {
        assert_eq!(leading_words("one two three", 5), "one two three");
        assert_eq!(
            leading_words("one two three four five six", 5),
            "one two three four five..."
        );
    }

    #[test]
    fn test_most_frequent_tie_goes_to_first_seen() {
        let items = ["b", "a", "a", "b", "c"];
        assert_eq!(most_frequent(items.into_iter()), Some(("b", 2)));
        assert_eq!(most_frequent(std::iter::empty()), None);
    }

    #[test]
    fn test_known_topic_filters_unknown() {
        assert_eq!(Member::new("q", Some("Unknown")).known_topic(), None);
        assert_eq!(Member::new("q", Some("  ")).known_topic(), None);
        assert_eq!(Member::new("q", Some("Loans")).known_topic(), Some("Loans"));
    }

    #[test]
    fn test_fallback_when_chain_is_empty() {
        let labeler = ClusterLabeler::with_strategies(vec![]);
        let members = [Member::new("a", None), Member::new("b", None)];
        assert_eq!(labeler.label_with_source(&members), ("Cluster 2".to_string(), "fallback"));
    }
}
