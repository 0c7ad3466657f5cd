// Similarity graph: cosine matrix, thresholded edges, Louvain communities,
// and the assembled output document.

pub mod assemble;
pub mod builder;
pub mod louvain;
pub mod similarity;
