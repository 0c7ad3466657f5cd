// Dataset loading and Item construction.
//
// An Item is the unit that gets embedded and clustered: the question text plus
// its answer options joined into one string. Percentages are dropped here:
// only wording drives similarity.
//
// Duplicate questions are kept as separate items. Their identity is the
// composite key (trimmed text, occurrence index), and the display id for
// later occurrences carries an explicit " (k)" suffix so no two nodes ever
// share an id.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::models::{SurveyRecord, UNKNOWN};
use crate::error::PipelineError;

/// Separator between answer options in the combined text.
const OPTION_SEPARATOR: &str = " | ";

/// Ordered survey dataset: question text → record, in input order.
#[derive(Debug, Clone, Default)]
pub struct SurveyDataset {
    entries: Vec<(String, SurveyRecord)>,
}

/// Composite identity of an item: the question text and which occurrence of
/// that text it is (0 for the first).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub text: String,
    pub occurrence: usize,
}

/// One question prepared for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: ItemKey,
    /// Unique node identifier.
    pub id: String,
    /// Option texts joined with " | ".
    pub options: String,
    /// "{question} - {options}": the text handed to the encoder.
    pub combined_text: String,
    pub topic: Option<String>,
    pub survey_name: Option<String>,
    pub sample_size: Option<u64>,
}

impl Item {
    /// The question text without any disambiguation suffix.
    pub fn text(&self) -> &str {
        &self.key.text
    }

    /// Topic for display, "Unknown" when absent.
    pub fn topic_or_unknown(&self) -> &str {
        self.topic.as_deref().unwrap_or(UNKNOWN)
    }
}

impl SurveyDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, record: SurveyRecord) {
        self.entries.push((question.into(), record));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the clean survey JSON document. Key order is preserved.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).context("Survey data is not a JSON object")?;

        let mut dataset = Self::new();
        for (question, value) in map {
            let record: SurveyRecord = serde_json::from_value(value)
                .with_context(|| format!("Malformed record for question {question:?}"))?;
            dataset.push(question, record);
        }

        debug!(questions = dataset.len(), "Parsed survey dataset");
        Ok(dataset)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read survey data from {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Validate every record and build the items, in input order.
    ///
    /// Fails with `PipelineError::MissingInput` on the first record with an
    /// empty question, absent `Responses`, or an option without text.
    pub fn items(&self) -> Result<Vec<Item>> {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut items = Vec::with_capacity(self.entries.len());

        for (question, record) in &self.entries {
            let text = question.trim();
            if text.is_empty() {
                return Err(PipelineError::missing(question.as_str(), "question text").into());
            }

            let responses = record
                .responses
                .as_ref()
                .ok_or_else(|| PipelineError::missing(text, "Responses"))?;

            let option_texts = responses
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    r.option
                        .as_deref()
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .ok_or_else(|| PipelineError::missing(text, format!("Responses[{i}].Option")))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let options = option_texts.join(OPTION_SEPARATOR);
            let combined_text = format!("{text} - {options}");

            let occurrence = occurrences.entry(text.to_string()).or_insert(0);
            let key = ItemKey {
                text: text.to_string(),
                occurrence: *occurrence,
            };
            *occurrence += 1;

            let id = unique_id(&key, &taken);
            taken.insert(id.clone());

            items.push(Item {
                key,
                id,
                options,
                combined_text,
                topic: non_empty(record.topic.as_deref()),
                survey_name: non_empty(record.survey_name.as_deref()),
                sample_size: record.sample_size,
            });
        }

        Ok(items)
    }
}

/// Render a display id for a key, bumping the suffix until it's unused.
fn unique_id(key: &ItemKey, taken: &HashSet<String>) -> String {
    if key.occurrence == 0 && !taken.contains(&key.text) {
        return key.text.clone();
    }
    let mut n = key.occurrence.max(1) + 1;
    loop {
        let candidate = format!("{} ({n})", key.text);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
