// Composition tests: the full pipeline from survey dataset to labeled graph.
//
// These tests exercise the data flow between modules:
//   SurveyDataset -> Items -> Encoder -> Similarity -> Edges -> Louvain -> Labels -> Graph
// using fixture encoders (fixed vectors, counting, failing) so nothing touches
// the network or the ONNX model.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use surveygraph::embedding::hashing::HashingEncoder;
use surveygraph::embedding::traits::TextEncoder;
use surveygraph::error::PipelineError;
use surveygraph::graph::assemble::Graph;
use surveygraph::labels::strategy::ClusterLabeler;
use surveygraph::pipeline::{run, run_items, PipelineConfig};
use surveygraph::survey::items::SurveyDataset;
use surveygraph::survey::models::{ResponseOption, SurveyRecord};

// ============================================================
// Fixture encoders
// ============================================================

/// Returns preset vectors in input order and counts how often it was called.
struct FixedEncoder {
    vectors: Vec<Vec<f64>>,
    calls: AtomicUsize,
}

impl FixedEncoder {
    fn new(vectors: Vec<Vec<f64>>) -> Self {
        Self {
            vectors,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextEncoder for FixedEncoder {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectors.iter().take(texts.len()).cloned().collect())
    }
}

struct FailingEncoder;

#[async_trait]
impl TextEncoder for FailingEncoder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn encode_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>> {
        anyhow::bail!("model not loaded")
    }
}

// ============================================================
// Fixture data
// ============================================================

fn record(topic: Option<&str>, sample_size: Option<u64>, options: &[&str]) -> SurveyRecord {
    SurveyRecord {
        topic: topic.map(str::to_string),
        survey_name: Some("Digest Survey (Jan 2025)".to_string()),
        sample_size,
        responses: Some(
            options
                .iter()
                .map(|o| ResponseOption::new(o, 1.0 / options.len() as f64))
                .collect(),
        ),
    }
}

/// Three loan questions, three payment questions, one unrelated question.
fn finance_dataset() -> SurveyDataset {
    let mut ds = SurveyDataset::new();
    ds.push(
        "How do you repay your home loan?",
        record(Some("Loans"), Some(500), &["Monthly EMI", "Lump sum"]),
    );
    ds.push(
        "Have you taken a personal loan?",
        record(Some("Loans"), Some(480), &["Yes", "No"]),
    );
    ds.push(
        "Would you borrow to fund a vacation?",
        record(Some("Loans"), None, &["Yes", "No", "Maybe"]),
    );
    ds.push(
        "Which UPI app do you use?",
        record(None, Some(300), &["GPay", "PhonePe", "Paytm"]),
    );
    ds.push(
        "Do you pay bills with a mobile wallet?",
        record(None, Some(0), &["Always", "Sometimes", "Never"]),
    );
    ds.push(
        "How often do you use contactless payment?",
        record(None, Some(300), &["Daily", "Weekly", "Rarely"]),
    );
    ds.push(
        "What is your age group?",
        record(Some("Demographics"), Some(1000), &["18-25", "26-35", "36+"]),
    );
    ds
}

/// Vectors matching `finance_dataset` order: two tight groups and an outlier.
fn finance_vectors() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 0.1, 0.0, 0.0],
        vec![1.0, 0.0, 0.1, 0.0],
        vec![1.0, 0.05, 0.05, 0.0],
        vec![0.0, 1.0, 0.1, 0.0],
        vec![0.1, 1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.1],
        vec![0.0, 0.0, 0.0, 1.0],
    ]
}

async fn build_finance_graph(config: &PipelineConfig) -> Graph {
    let encoder = FixedEncoder::new(finance_vectors());
    run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        config,
    )
    .await
    .unwrap()
}

// ============================================================
// End-to-end structure and labels
// ============================================================

#[tokio::test]
async fn finance_dataset_forms_three_labeled_clusters() {
    let graph = build_finance_graph(&PipelineConfig::default()).await;

    assert_eq!(graph.nodes.len(), 7);
    assert_eq!(graph.clusters.len(), 3);

    let labels: Vec<&str> = graph.clusters.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Loans", "Digital Payments", "Demographics"]);

    let sizes: Vec<usize> = graph.clusters.iter().map(|c| c.size).collect();
    assert_eq!(sizes, vec![3, 3, 1]);

    // Three intra-group links per triangle, nothing across groups.
    assert_eq!(graph.links.len(), 6);
}

#[tokio::test]
async fn node_fields_carry_metadata_and_clusters() {
    let graph = build_finance_graph(&PipelineConfig::default()).await;

    let node = graph.node("Do you pay bills with a mobile wallet?").unwrap();
    assert_eq!(node.size, 1, "zero sample size defaults to 1");
    assert_eq!(node.topic, "Unknown");
    assert_eq!(node.options, "Always | Sometimes | Never");
    assert_eq!(node.survey_name, "Digest Survey (Jan 2025)");
    assert_eq!(node.cluster_id, Some(1));
    assert_eq!(node.cluster_label.as_deref(), Some("Digital Payments"));

    let loan = graph.node("How do you repay your home loan?").unwrap();
    assert_eq!(loan.size, 500);
}

#[tokio::test]
async fn isolated_question_is_its_own_cluster() {
    let graph = build_finance_graph(&PipelineConfig::default()).await;

    let node = graph.node("What is your age group?").unwrap();
    let cluster = graph.cluster(node.cluster_id.unwrap()).unwrap();
    assert_eq!(cluster.size, 1);
    assert!(graph
        .links
        .iter()
        .all(|l| l.source != node.id && l.target != node.id));
}

#[tokio::test]
async fn every_node_in_exactly_one_cluster() {
    let graph = build_finance_graph(&PipelineConfig::default()).await;

    let mut seen = HashSet::new();
    for cluster in &graph.clusters {
        for member in graph.cluster_members(cluster.id) {
            assert!(seen.insert(member.to_string()), "{member} in two clusters");
        }
    }
    assert_eq!(seen.len(), graph.nodes.len());

    let summed: usize = graph.clusters.iter().map(|c| c.size).sum();
    assert_eq!(summed, graph.nodes.len());
    assert!(graph.clusters.iter().all(|c| !c.label.is_empty()));
}

#[tokio::test]
async fn links_are_unique_and_never_self() {
    let graph = build_finance_graph(&PipelineConfig {
        similarity_threshold: 0.0,
        ..PipelineConfig::default()
    })
    .await;

    let mut pairs = HashSet::new();
    for link in &graph.links {
        assert_ne!(link.source, link.target);
        let key = if link.source < link.target {
            (link.source.clone(), link.target.clone())
        } else {
            (link.target.clone(), link.source.clone())
        };
        assert!(pairs.insert(key), "duplicate link");
    }
}

#[tokio::test]
async fn link_source_precedes_target_in_input_order() {
    let graph = build_finance_graph(&PipelineConfig::default()).await;
    let position = |id: &str| graph.nodes.iter().position(|n| n.id == id).unwrap();
    for link in &graph.links {
        assert!(position(&link.source) < position(&link.target));
    }
}

#[tokio::test]
async fn raising_threshold_never_adds_links() {
    let mut previous = usize::MAX;
    for threshold in [0.0, 0.1, 0.2, 0.5, 0.9, 0.995, 1.0] {
        let graph = build_finance_graph(&PipelineConfig {
            similarity_threshold: threshold,
            ..PipelineConfig::default()
        })
        .await;
        assert!(
            graph.links.len() <= previous,
            "threshold {threshold} produced {} links, previous {previous}",
            graph.links.len()
        );
        previous = graph.links.len();
    }
    assert_eq!(previous, 0, "nothing is strictly above 1.0");
}

#[tokio::test]
async fn identical_input_gives_identical_graph() {
    let config = PipelineConfig::default();
    let first = build_finance_graph(&config).await;
    let second = build_finance_graph(&config).await;
    assert_eq!(first, second);

    let json_a = serde_json::to_string(&first).unwrap();
    let json_b = serde_json::to_string(&second).unwrap();
    assert_eq!(json_a, json_b);
}

#[tokio::test]
async fn link_just_above_threshold_is_kept() {
    let mut ds = SurveyDataset::new();
    ds.push("First question here", record(None, None, &["a"]));
    ds.push("Second question here", record(None, None, &["b"]));
    ds.push("Third question here", record(None, None, &["c"]));

    let encoder = FixedEncoder::new(vec![
        vec![1.0, 0.0],
        vec![0.51, (1.0_f64 - 0.51 * 0.51).sqrt()],
        vec![0.0, 1.0],
    ]);
    let graph = run(
        &ds,
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();

    let link = graph
        .links
        .iter()
        .find(|l| l.source == "First question here")
        .unwrap();
    assert_eq!(link.target, "Second question here");
    assert_eq!(link.strength, 0.51);
}

#[tokio::test]
async fn encoder_called_once_with_full_batch() {
    let encoder = FixedEncoder::new(finance_vectors());
    run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(encoder.calls(), 1);
}

#[tokio::test]
async fn whitespace_duplicates_stay_separate_nodes() {
    let mut ds = SurveyDataset::new();
    let options = &["Hiking", "Cooking"];
    ds.push("Favourite weekend activity", record(None, None, options));
    ds.push("Favourite weekend activity ", record(None, None, options));
    ds.push("Favourite weekend activity  ", record(None, None, options));

    let graph = run(
        &ds,
        &HashingEncoder::default(),
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Favourite weekend activity",
            "Favourite weekend activity (2)",
            "Favourite weekend activity (3)",
        ]
    );
    assert_eq!(graph.clusters.len(), 1);
    assert_eq!(graph.clusters[0].label, "Favourite weekend activity");
    assert!(graph.links.iter().all(|l| l.strength == 1.0));
}

#[tokio::test]
async fn empty_dataset_gives_empty_graph() {
    let encoder = FixedEncoder::new(vec![]);
    let graph = run(
        &SurveyDataset::new(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();
    assert!(graph.nodes.is_empty());
    assert!(graph.clusters.is_empty());
    assert_eq!(encoder.calls(), 0);
}

// ============================================================
// Fatal errors abort before producing a graph
// ============================================================

#[tokio::test]
async fn missing_responses_aborts_before_encoding() {
    let mut ds = finance_dataset();
    ds.push(
        "Orphan question",
        SurveyRecord {
            topic: Some("Misc".to_string()),
            ..Default::default()
        },
    );
    let encoder = FixedEncoder::new(finance_vectors());

    let err = run(
        &ds,
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::MissingInput { .. })
    ));
    assert_eq!(encoder.calls(), 0);
}

#[tokio::test]
async fn encoder_error_is_encoding_failure() {
    let err = run(
        &finance_dataset(),
        &FailingEncoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::EncodingFailure(msg)) => assert!(msg.contains("model not loaded")),
        other => panic!("expected EncodingFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn short_vector_batch_is_encoding_failure() {
    let mut vectors = finance_vectors();
    vectors.pop();
    let encoder = FixedEncoder::new(vectors);

    let err = run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::EncodingFailure(_))
    ));
}

#[tokio::test]
async fn ragged_vectors_are_encoding_failure() {
    let mut vectors = finance_vectors();
    vectors[2] = vec![1.0, 0.0];
    let encoder = FixedEncoder::new(vectors);

    let err = run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::EncodingFailure(_))
    ));
}

#[tokio::test]
async fn zero_vector_is_degenerate_not_fatal() {
    let mut vectors = finance_vectors();
    vectors[6] = vec![0.0, 0.0, 0.0, 0.0];
    let encoder = FixedEncoder::new(vectors);

    let graph = run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();

    let node = graph.node("What is your age group?").unwrap();
    assert_eq!(graph.cluster(node.cluster_id.unwrap()).unwrap().size, 1);
}

#[tokio::test]
async fn repeated_item_id_aborts_before_encoding() {
    let mut items = finance_dataset().items().unwrap();
    items[1].id = items[0].id.clone();
    let encoder = FixedEncoder::new(finance_vectors());

    let err = run_items(
        &items,
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::DuplicateId(id)) if id == "How do you repay your home loan?"
    ));
    assert_eq!(encoder.calls(), 0);
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let encoder = FixedEncoder::new(finance_vectors());
    let err = run(
        &finance_dataset(),
        &encoder,
        &ClusterLabeler::default(),
        &PipelineConfig {
            similarity_threshold: 1.5,
            ..PipelineConfig::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidConfig(_))
    ));
    assert_eq!(encoder.calls(), 0);
}

// ============================================================
// Survey JSON document -> graph JSON document
// ============================================================

#[tokio::test]
async fn clean_survey_json_to_graph_json() {
    let json = r#"{
        "Do you invest in mutual funds?": {
            "Topic": "Investing",
            "Survey Name": "Digest Survey",
            "Sample Size": 250,
            "Responses": [
                {"Option": "Yes", "Percentage": 62.0, "Confidence": true},
                {"Option": "No", "Percentage": 38.0, "Confidence": false}
            ]
        },
        "How much of your income do you save?": {
            "Topic": null,
            "Survey Name": "Digest Survey",
            "Sample Size": null,
            "Responses": [
                {"Option": "Under 10%", "Percentage": 40.0},
                {"Option": "Over 10%", "Percentage": 60.0}
            ]
        }
    }"#;
    let ds = SurveyDataset::from_json_str(json).unwrap();
    let graph = run(
        &ds,
        &HashingEncoder::default(),
        &ClusterLabeler::default(),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();

    // Input order is preserved.
    assert_eq!(graph.nodes[0].id, "Do you invest in mutual funds?");
    assert_eq!(graph.nodes[1].topic, "Unknown");
    assert_eq!(graph.nodes[1].size, 1);

    let value = serde_json::to_value(&graph).unwrap();
    assert!(value["nodes"].is_array());
    assert!(value["links"].is_array());
    assert!(value["clusters"].is_array());

    let back: Graph = serde_json::from_value(value).unwrap();
    assert_eq!(back, graph);
}
