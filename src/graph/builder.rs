// Graph construction: one node per item, one edge per sufficiently similar pair.
//
// Edges are kept index-based here (positions in the item list) so the
// community detector can work on plain integers; the assembler translates
// them to id-based links for the output document.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::SimilarityMatrix;
use crate::survey::items::Item;
use crate::survey::models::UNKNOWN;

/// Default minimum (exclusive) similarity for an edge.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// A graph vertex as it appears in the output document.
///
/// `cluster_id` / `cluster_label` stay `None` until the assembler attaches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub options: String,
    pub topic: String,
    pub size: u64,
    pub survey_name: String,
    pub cluster_id: Option<usize>,
    pub cluster_label: Option<String>,
}

impl Node {
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            options: item.options.clone(),
            topic: item.topic_or_unknown().to_string(),
            // Absent or zero sample size still gets a visible node.
            size: item.sample_size.filter(|&s| s > 0).unwrap_or(1),
            survey_name: item
                .survey_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            cluster_id: None,
            cluster_label: None,
        }
    }
}

/// Undirected weighted edge between two item positions, `source < target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
}

/// Round a similarity score to two decimal places.
pub fn round_strength(similarity: f64) -> f64 {
    (similarity * 100.0).round() / 100.0
}

/// Emit an edge for every pair i < j whose similarity is strictly above the
/// threshold. Self pairs are never visited and each pair is emitted once.
pub fn build_edges(matrix: &SimilarityMatrix, threshold: f64) -> Vec<Edge> {
    let edges: Vec<Edge> = matrix
        .upper_pairs()
        .filter(|&(_, _, sim)| sim > threshold)
        .map(|(i, j, sim)| Edge {
            source: i,
            target: j,
            strength: round_strength(sim),
        })
        .collect();

    debug!(
        nodes = matrix.len(),
        edges = edges.len(),
        threshold = threshold,
        "Thresholded similarity matrix"
    );
    edges
}

/// One node per item, in item order. Isolated items are included.
pub fn build_nodes(items: &[Item]) -> Vec<Node> {
    items.iter().map(Node::from_item).collect()
}
