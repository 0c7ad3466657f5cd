// surveygraph: semantic similarity graphs for survey questions
//
// This is the library root. Each module corresponds to a stage or
// collaborator of the graph pipeline.

pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod labels;
pub mod output;
pub mod pipeline;
pub mod survey;
