// Survey record types: the clean, already-normalized survey document.
//
// This is the shape produced by the data-cleaning step: a JSON object keyed by
// question text, each value carrying the question's metadata and its ordered
// response options. Spreadsheet parsing happens upstream and is not modeled.

use serde::{Deserialize, Serialize};

/// Placeholder shown for absent topic / survey name values.
pub const UNKNOWN: &str = "Unknown";

/// Metadata and response options for one survey question.
///
/// Every field is optional at the serde level so that absence can be reported
/// as a MissingInput error with the offending question, instead of a generic
/// JSON decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyRecord {
    #[serde(rename = "Topic", alias = "topic", default)]
    pub topic: Option<String>,
    #[serde(rename = "Survey Name", alias = "survey_name", default)]
    pub survey_name: Option<String>,
    #[serde(rename = "Sample Size", alias = "sample_size", default)]
    pub sample_size: Option<u64>,
    #[serde(rename = "Responses", alias = "responses", default)]
    pub responses: Option<Vec<ResponseOption>>,
}

/// A single answer option with the share of respondents who picked it.
///
/// Percentages are carried for display only and never reach the encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseOption {
    #[serde(rename = "Option", alias = "option", default)]
    pub option: Option<String>,
    #[serde(rename = "Percentage", alias = "percentage", default)]
    pub percentage: Option<f64>,
    #[serde(rename = "Confidence", alias = "confidence", default)]
    pub confidence: bool,
}

impl ResponseOption {
    pub fn new(option: &str, percentage: f64) -> Self {
        Self {
            option: Some(option.to_string()),
            percentage: Some(percentage),
            confidence: false,
        }
    }
}
