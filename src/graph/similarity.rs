// Pairwise cosine similarity over item embeddings.
//
// The matrix is computed once per unordered pair and mirrored, so
// sim(i, j) == sim(j, i) holds bit-for-bit. The diagonal is stored as 1.0 for
// completeness but nothing downstream reads it.

use anyhow::Result;

/// Cosine similarity between two embedding vectors.
///
/// Returns a value in [-1.0, 1.0]. Zero-norm vectors, empty vectors and
/// mismatched dimensions are degenerate and give 0.0 instead of an error.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Square, symmetric similarity matrix over N items (row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute the matrix for a set of embeddings.
    pub fn from_embeddings(embeddings: &[Vec<f64>]) -> Self {
        let n = embeddings.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Self { n, values }
    }

    /// Build a matrix from explicit rows. Only the upper triangle is read;
    /// the lower triangle is mirrored from it.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            anyhow::bail!(
                "Similarity matrix must be square: row {i} has {} entries, expected {n}",
                row.len()
            );
        }

        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = rows[i][j].clamp(-1.0, 1.0);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }
        Ok(Self { n, values })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Iterate the upper triangle: every unordered pair (i < j) exactly once.
    pub fn upper_pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| ((i + 1)..self.n).map(move |j| (i, j, self.get(i, j))))
    }
}
