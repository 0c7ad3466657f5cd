// End-to-end pipeline: survey dataset in, labeled similarity graph out.
//
//   items → encoder (one batch) → cosine matrix → thresholded edges
//         → Louvain communities → labels → assembled graph
//
// Every stage consumes the previous stage's complete output. Any fatal error
// aborts the run before anything is returned, so callers never see a partial
// graph.

use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, info};

use crate::embedding::traits::TextEncoder;
use crate::error::PipelineError;
use crate::graph::assemble::{assemble, Community, Graph};
use crate::graph::builder::{build_edges, build_nodes, DEFAULT_SIMILARITY_THRESHOLD};
use crate::graph::louvain::{modularity, CommunityDetector, DEFAULT_SEED};
use crate::graph::similarity::SimilarityMatrix;
use crate::labels::strategy::{ClusterLabeler, Member};
use crate::survey::items::{Item, SurveyDataset};

/// Tunables injected into a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Links require similarity strictly above this (0.0–1.0)
    pub similarity_threshold: f64,
    /// Seed for the community detector's node order
    pub seed: u64,
    /// Louvain resolution
    pub resolution: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            seed: DEFAULT_SEED,
            resolution: 1.0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() || !(0.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            ))
            .into());
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            ))
            .into());
        }
        Ok(())
    }
}

/// Run the full pipeline over a dataset.
pub async fn run(
    dataset: &SurveyDataset,
    encoder: &dyn TextEncoder,
    labeler: &ClusterLabeler,
    config: &PipelineConfig,
) -> Result<Graph> {
    config.validate()?;
    let items = dataset.items()?;
    run_items(&items, encoder, labeler, config).await
}

/// Run the pipeline over prepared items. Item ids must be unique.
pub async fn run_items(
    items: &[Item],
    encoder: &dyn TextEncoder,
    labeler: &ClusterLabeler,
    config: &PipelineConfig,
) -> Result<Graph> {
    config.validate()?;
    check_unique_ids(items)?;
    info!(items = items.len(), encoder = encoder.name(), "Building survey graph");

    let embeddings = encode_items(items, encoder).await?;
    let matrix = SimilarityMatrix::from_embeddings(&embeddings);

    let nodes = build_nodes(items);
    let edges = build_edges(&matrix, config.similarity_threshold);

    let detector = CommunityDetector {
        seed: config.seed,
        resolution: config.resolution,
        ..CommunityDetector::default()
    };
    let partition = detector.detect(items.len(), &edges);

    info!(
        links = edges.len(),
        communities = partition.len(),
        modularity = modularity(items.len(), &edges, &partition, config.resolution),
        "Detected communities"
    );

    let communities: Vec<Community> = partition
        .iter()
        .enumerate()
        .map(|(id, members)| Community {
            id,
            members: members.iter().map(|&i| items[i].id.clone()).collect(),
        })
        .collect();

    let labels: Vec<String> = partition
        .iter()
        .map(|members| {
            let members: Vec<Member<'_>> = members
                .iter()
                .map(|&i| Member::new(items[i].text(), items[i].topic.as_deref()))
                .collect();
            labeler.label(&members)
        })
        .collect();

    assemble(nodes, &edges, &communities, &labels)
}

fn check_unique_ids(items: &[Item]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    match items.iter().find(|item| !seen.insert(item.id.as_str())) {
        Some(item) => Err(PipelineError::DuplicateId(item.id.clone()).into()),
        None => Ok(()),
    }
}

/// Encode every item's combined text in a single batch and check the result
/// lines up with the input.
async fn encode_items(items: &[Item], encoder: &dyn TextEncoder) -> Result<Vec<Vec<f64>>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(item) = items.iter().find(|i| i.text().trim().is_empty()) {
        return Err(PipelineError::EncodingFailure(format!(
            "empty question text for item {:?}",
            item.id
        ))
        .into());
    }

    let texts: Vec<String> = items.iter().map(|i| i.combined_text.clone()).collect();
    let embeddings = encoder.encode_batch(&texts).await.map_err(|e| {
        PipelineError::EncodingFailure(format!("{} encoder failed: {e:#}", encoder.name()))
    })?;

    if embeddings.len() != texts.len() {
        return Err(PipelineError::EncodingFailure(format!(
            "expected {} vectors, encoder returned {}",
            texts.len(),
            embeddings.len()
        ))
        .into());
    }

    let dim = embeddings[0].len();
    if dim == 0 || embeddings.iter().any(|e| e.len() != dim) {
        return Err(PipelineError::EncodingFailure(
            "encoder returned vectors of inconsistent or zero dimension".to_string(),
        )
        .into());
    }

    debug!(count = embeddings.len(), dim = dim, "Encoded items");
    Ok(embeddings)
}
