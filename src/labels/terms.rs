// TF-IDF term extraction over unigrams and bigrams.
//
// Each member question is a document. Common English stop words (the NLTK
// list, which keeps content words like "home" or "interest") and generic
// question words are removed before bigrams are formed, so "how often do you
// repay your loan" yields "repay", "loan", "repay loan". Terms of three
// characters or fewer are dropped.
//
// Weighting: raw term counts, smoothed idf = ln((1 + n) / (1 + df)) + 1,
// per-document L2 normalization, then summed across documents. The term with
// the highest sum is the most significant; ties go to the alphabetically first.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use thiserror::Error;

/// Interrogative and survey-boilerplate words that carry no theme.
const QUESTION_WORDS: &[&str] = &[
    "what", "which", "how", "why", "when", "where", "who", "whom", "whose", "would", "should",
    "could", "does", "following", "think", "feel", "consider", "often", "much", "many",
    "currently", "usually", "rate", "describe", "question", "option", "options", "select",
    "apply", "kind", "type", "types", "main", "most",
];

/// Terms must be longer than this many characters.
const MIN_TERM_CHARS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TermError {
    #[error("No terms left after stop-word and length filtering")]
    EmptyVocabulary,
}

pub struct TermExtractor {
    stop_words: HashSet<String>,
    token_re: Regex,
}

impl Default for TermExtractor {
    fn default() -> Self {
        let mut stop_words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        stop_words.extend(QUESTION_WORDS.iter().map(|w| w.to_string()));
        Self {
            stop_words,
            token_re: Regex::new(r"\b\w\w+\b").expect("valid token regex"),
        }
    }
}

impl TermExtractor {
    fn tokens<'a>(&self, lowered: &'a str) -> Vec<&'a str> {
        self.token_re
            .find_iter(lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect()
    }

    /// Unigram and bigram counts for one document, after filtering.
    fn term_counts(&self, document: &str) -> HashMap<String, usize> {
        let lowered = document.to_lowercase();
        let tokens = self.tokens(&lowered);

        let mut counts: HashMap<String, usize> = HashMap::new();
        let unigrams = tokens.iter().map(|t| t.to_string());
        let bigrams = tokens.windows(2).map(|w| format!("{} {}", w[0], w[1]));
        for term in unigrams.chain(bigrams) {
            if term.chars().count() > MIN_TERM_CHARS {
                *counts.entry(term).or_insert(0) += 1;
            }
        }
        counts
    }

    /// All terms with their summed TF-IDF score, best first.
    pub fn ranked_terms(&self, documents: &[String]) -> Result<Vec<(String, f64)>, TermError> {
        let per_doc: Vec<HashMap<String, usize>> =
            documents.iter().map(|d| self.term_counts(d)).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for counts in &per_doc {
            for term in counts.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if doc_freq.is_empty() {
            return Err(TermError::EmptyVocabulary);
        }

        let n = documents.len() as f64;
        let idf = |term: &str| {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        };

        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for counts in &per_doc {
            let weights: Vec<(&str, f64)> = counts
                .iter()
                .map(|(term, &tf)| (term.as_str(), tf as f64 * idf(term)))
                .collect();
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (term, w) in weights {
                *totals.entry(term).or_insert(0.0) += w / norm;
            }
        }

        let mut ranked: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(term, score)| (term.to_string(), score))
            .collect();
        // BTreeMap order is alphabetical and sort_by is stable, so ties keep it.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }

    /// The single most significant term.
    pub fn top_term(&self, documents: &[String]) -> Result<String, TermError> {
        self.ranked_terms(documents)?
            .into_iter()
            .next()
            .map(|(term, _)| term)
            .ok_or(TermError::EmptyVocabulary)
    }
}
