// Cluster labeling: domain keyword table, TF-IDF terms, and the strategy chain.

pub mod domains;
pub mod strategy;
pub mod terms;
