// Community detection with the Louvain method.
//
// Two phases, repeated until nothing changes:
//
//   1. Local moving: visit every node (in a seeded random order) and move it
//      to the neighbouring community with the best modularity gain. Sweep
//      again until a full pass makes no move.
//   2. Aggregation: collapse each community into a single node. Edges inside
//      a community become a self-loop, edges between communities are summed.
//
// Gain of inserting node i (degree k_i) into community C:
//
//   ΔQ ∝ k_i,C − γ · Σ_tot(C) · k_i / 2m
//
// where k_i,C is the edge weight from i into C and Σ_tot(C) the summed degree
// of C. Only strictly better moves are taken, so the result is reproducible for
// a fixed seed. Nodes without edges never move and come out as singletons.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::builder::Edge;

/// Default RNG seed for node visiting order.
pub const DEFAULT_SEED: u64 = 42;

/// Moves must beat the current placement by more than this to count.
const MOVE_EPSILON: f64 = 1e-12;

/// Louvain parameters.
#[derive(Debug, Clone)]
pub struct CommunityDetector {
    pub seed: u64,
    /// Resolution γ (1.0 = standard modularity; higher gives smaller communities)
    pub resolution: f64,
    /// Stop aggregating once a level improves modularity by less than this
    pub min_gain: f64,
    /// Upper bound on aggregation levels
    pub max_levels: usize,
}

impl Default for CommunityDetector {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            resolution: 1.0,
            min_gain: 1e-7,
            max_levels: 32,
        }
    }
}

impl CommunityDetector {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Partition nodes `0..node_count` into disjoint communities.
    ///
    /// Each community is a sorted list of node indices. Communities are
    /// emitted in order of their smallest member, and together they cover
    /// every node exactly once.
    pub fn detect(&self, node_count: usize, edges: &[Edge]) -> Vec<Vec<usize>> {
        if node_count == 0 {
            return Vec::new();
        }

        let mut graph = LevelGraph::from_edges(node_count, edges);
        // membership[original node] = node index in the current level graph
        let mut membership: Vec<usize> = (0..node_count).collect();

        if graph.total_degree() > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let singletons: Vec<usize> = (0..graph.len()).collect();
            let mut current_q = graph.modularity(&singletons, graph.len(), self.resolution);

            for level in 0..self.max_levels {
                let (assignment, count, moved) = self.local_moving(&graph, &mut rng);
                if !moved {
                    break;
                }

                let new_q = graph.modularity(&assignment, count, self.resolution);
                for m in membership.iter_mut() {
                    *m = assignment[*m];
                }
                graph = graph.aggregate(&assignment, count);

                debug!(
                    level = level,
                    communities = count,
                    modularity = new_q,
                    "Louvain level complete"
                );

                if new_q - current_q < self.min_gain {
                    break;
                }
                current_q = new_q;
            }
        }

        group_by_membership(&membership)
    }

    /// Phase 1. Returns (community per node, community count, whether any node moved).
    /// Community ids are renumbered 0.. in order of first appearance.
    fn local_moving(&self, graph: &LevelGraph, rng: &mut StdRng) -> (Vec<usize>, usize, bool) {
        let n = graph.len();
        let m2 = graph.total_degree();
        let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();

        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = degrees.clone();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut any_move = false;
        loop {
            let mut moved = false;

            for &i in &order {
                let current = community[i];
                let k_i = degrees[i];

                let mut links_to: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &graph.adjacency[i] {
                    *links_to.entry(community[j]).or_insert(0.0) += w;
                }

                totals[current] -= k_i;

                let gain = |c: usize, w: f64| w - self.resolution * totals[c] * k_i / m2;
                let mut best = current;
                let mut best_gain = gain(current, links_to.get(&current).copied().unwrap_or(0.0));
                for (&c, &w) in &links_to {
                    let g = gain(c, w);
                    if g > best_gain + MOVE_EPSILON {
                        best = c;
                        best_gain = g;
                    }
                }

                totals[best] += k_i;
                community[i] = best;
                if best != current {
                    moved = true;
                    any_move = true;
                }
            }

            if !moved {
                break;
            }
        }

        let (renumbered, count) = renumber(&community);
        (renumbered, count, any_move)
    }
}

/// Modularity of a partition of nodes `0..node_count` over the given edges.
///
/// Q = Σ_c [ in_c / 2m − γ (tot_c / 2m)² ]. Returns 0.0 for a graph without
/// edge weight.
pub fn modularity(
    node_count: usize,
    edges: &[Edge],
    communities: &[Vec<usize>],
    resolution: f64,
) -> f64 {
    let graph = LevelGraph::from_edges(node_count, edges);
    let mut assignment = vec![0usize; node_count];
    for (c, members) in communities.iter().enumerate() {
        for &node in members {
            assignment[node] = c;
        }
    }
    graph.modularity(&assignment, communities.len(), resolution)
}

/// Weighted undirected graph for one Louvain level. `adjacency` excludes
/// self-loops, which are tracked separately in `loops`.
struct LevelGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    loops: Vec<f64>,
}

impl LevelGraph {
    fn from_edges(node_count: usize, edges: &[Edge]) -> Self {
        let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); node_count];
        let mut loops = vec![0.0; node_count];

        for e in edges {
            if e.source == e.target {
                loops[e.source] += e.strength;
                continue;
            }
            *merged[e.source].entry(e.target).or_insert(0.0) += e.strength;
            *merged[e.target].entry(e.source).or_insert(0.0) += e.strength;
        }

        Self {
            adjacency: merged.into_iter().map(|m| m.into_iter().collect()).collect(),
            loops,
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Weighted degree; a self-loop counts twice.
    fn degree(&self, i: usize) -> f64 {
        self.adjacency[i].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.loops[i]
    }

    /// Sum of all degrees (2m).
    fn total_degree(&self) -> f64 {
        (0..self.len()).map(|i| self.degree(i)).sum()
    }

    fn modularity(&self, assignment: &[usize], count: usize, resolution: f64) -> f64 {
        let m2 = self.total_degree();
        if m2 <= 0.0 {
            return 0.0;
        }

        let mut internal = vec![0.0; count];
        let mut totals = vec![0.0; count];
        for i in 0..self.len() {
            let c = assignment[i];
            totals[c] += self.degree(i);
            internal[c] += 2.0 * self.loops[i];
            for &(j, w) in &self.adjacency[i] {
                if assignment[j] == c {
                    internal[c] += w;
                }
            }
        }

        internal
            .iter()
            .zip(totals.iter())
            .map(|(&inner, &tot)| inner / m2 - resolution * (tot / m2).powi(2))
            .sum()
    }

    /// Phase 2: one node per community.
    fn aggregate(&self, assignment: &[usize], count: usize) -> Self {
        let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut loops = vec![0.0; count];

        for i in 0..self.len() {
            let ci = assignment[i];
            loops[ci] += self.loops[i];
            for &(j, w) in &self.adjacency[i] {
                let cj = assignment[j];
                if ci == cj {
                    // Each internal edge is seen from both endpoints.
                    loops[ci] += w / 2.0;
                } else {
                    *merged[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }

        Self {
            adjacency: merged.into_iter().map(|m| m.into_iter().collect()).collect(),
            loops,
        }
    }
}

/// Map arbitrary community ids to 0.. in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = community
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

fn group_by_membership(membership: &[usize]) -> Vec<Vec<usize>> {
    let (assignment, count) = renumber(membership);
    let mut communities = vec![Vec::new(); count];
    for (node, &c) in assignment.iter().enumerate() {
        communities[c].push(node);
    }
    communities
}
