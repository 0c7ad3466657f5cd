// Text encoder trait: the injected embedding capability.
//
// The pipeline only needs "N texts in, N equal-length vectors out, same text
// gives the same vector". The default implementation runs a local sentence
// transformer through ONNX; the hashing encoder covers offline runs and tests.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning a batch of texts into dense vectors comparable by
/// cosine similarity.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Encode all texts in one call, returning vectors in input order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}
