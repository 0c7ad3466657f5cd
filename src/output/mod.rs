// Output: graph JSON document and terminal summary.

pub mod terminal;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::graph::assemble::Graph;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..30]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like ₹ or accented letters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Write the graph as pretty-printed JSON, creating parent directories.
pub fn write_graph(graph: &Graph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(graph).context("Failed to serialize graph")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write graph to {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "Wrote graph JSON"
    );
    Ok(())
}

/// Read a graph JSON document written by `write_graph`.
pub fn read_graph(path: &Path) -> Result<Graph> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid graph JSON in {}", path.display()))
}
