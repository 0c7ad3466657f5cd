// Colored terminal output for graph and cluster summaries.

use std::collections::HashSet;

use colored::Colorize;

use crate::graph::assemble::Graph;

/// Member previews shown per cluster.
const PREVIEW_MEMBERS: usize = 3;

/// Display the cluster legend: one row per cluster, largest first, with a few
/// member questions underneath.
pub fn display_cluster_summary(graph: &Graph) {
    if graph.nodes.is_empty() {
        println!("Graph is empty: no questions in the input.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Survey Graph ({} questions, {} links, {} clusters) ===",
            graph.nodes.len(),
            graph.links.len(),
            graph.clusters.len()
        )
        .bold()
    );
    println!();

    println!(
        "  {:>4}  {:<36} {:>5}",
        "ID".dimmed(),
        "Label".dimmed(),
        "Size".dimmed(),
    );
    println!("  {}", "-".repeat(48).dimmed());

    let mut clusters: Vec<_> = graph.clusters.iter().collect();
    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));

    for cluster in clusters {
        println!(
            "  {:>4}  {:<36} {:>5}",
            cluster.id,
            colorize_size(&cluster.label, cluster.size),
            cluster.size,
        );
        for member in graph.cluster_members(cluster.id).iter().take(PREVIEW_MEMBERS) {
            println!("          {}", super::truncate_chars(member, 70).dimmed());
        }
    }

    let isolated = isolated_count(graph);
    println!();
    if isolated > 0 {
        println!(
            "  {} {} isolated questions (no link above threshold)",
            "~".yellow(),
            isolated
        );
    }
}

/// Nodes that appear in no link. A singleton cluster can still have links.
fn isolated_count(graph: &Graph) -> usize {
    let linked: HashSet<&str> = graph
        .links
        .iter()
        .flat_map(|l| [l.source.as_str(), l.target.as_str()])
        .collect();
    graph
        .nodes
        .iter()
        .filter(|n| !linked.contains(n.id.as_str()))
        .count()
}

/// Larger clusters stand out more.
fn colorize_size(label: &str, size: usize) -> colored::ColoredString {
    match size {
        0..=1 => label.dimmed(),
        2..=4 => label.normal(),
        5..=9 => label.bright_yellow(),
        _ => label.bright_green().bold(),
    }
}
