// Graph assembly: the output document handed to the visualization front end.
//
// Wire contract:
//   { "nodes":    [{id, options, topic, size, survey_name, cluster_id, cluster_label}],
//     "links":    [{source, target, strength}],
//     "clusters": [{id, label, size}] }
//
// Cluster fields are attached through an id → position index built once, so
// labeling N nodes costs N lookups rather than a scan per community.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::builder::{Edge, Node};
use crate::error::PipelineError;

/// An undirected link between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub strength: f64,
}

/// One legend entry per community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub label: String,
    pub size: usize,
}

/// A detected community: its emission index and member node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Community {
    pub id: usize,
    pub members: Vec<String>,
}

/// The complete output graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub clusters: Vec<ClusterSummary>,
}

/// Node id → position in the node list.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    positions: HashMap<String, usize>,
}

impl NodeIndex {
    /// Fails with `PipelineError::DuplicateId` if two nodes share an id.
    pub fn build(nodes: &[Node]) -> Result<Self> {
        let mut positions = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if positions.insert(node.id.clone(), i).is_some() {
                return Err(PipelineError::DuplicateId(node.id.clone()).into());
            }
        }
        Ok(Self { positions })
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }
}

/// Merge nodes, edges, and labeled communities into the output graph.
///
/// `labels[k]` is the label of `communities[k]`. Fails if a community names a
/// node that doesn't exist, two nodes share an id, or the label count doesn't
/// match.
pub fn assemble(
    mut nodes: Vec<Node>,
    edges: &[Edge],
    communities: &[Community],
    labels: &[String],
) -> Result<Graph> {
    if communities.len() != labels.len() {
        anyhow::bail!(
            "Got {} labels for {} communities",
            labels.len(),
            communities.len()
        );
    }

    let index = NodeIndex::build(&nodes)?;

    let mut clusters = Vec::with_capacity(communities.len());
    for (community, label) in communities.iter().zip(labels) {
        for member in &community.members {
            let pos = index
                .get(member)
                .ok_or_else(|| anyhow::anyhow!("Community {} references unknown node {member:?}", community.id))?;
            let node = &mut nodes[pos];
            node.cluster_id = Some(community.id);
            node.cluster_label = Some(label.clone());
        }
        clusters.push(ClusterSummary {
            id: community.id,
            label: label.clone(),
            size: community.members.len(),
        });
    }

    let links = edges
        .iter()
        .map(|e| {
            let source = nodes
                .get(e.source)
                .ok_or_else(|| anyhow::anyhow!("Edge source {} out of range", e.source))?;
            let target = nodes
                .get(e.target)
                .ok_or_else(|| anyhow::anyhow!("Edge target {} out of range", e.target))?;
            Ok(Link {
                source: source.id.clone(),
                target: target.id.clone(),
                strength: e.strength,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Graph {
        nodes,
        links,
        clusters,
    })
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn cluster(&self, id: usize) -> Option<&ClusterSummary> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Member ids of a cluster, in node order.
    pub fn cluster_members(&self, id: usize) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.cluster_id == Some(id))
            .map(|n| n.id.as_str())
            .collect()
    }
}
