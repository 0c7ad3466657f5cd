use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::embedding::download;
use crate::graph::builder::DEFAULT_SIMILARITY_THRESHOLD;
use crate::graph::louvain::DEFAULT_SEED;
use crate::labels::domains::DomainTable;
use crate::pipeline::PipelineConfig;

/// Which text encoder to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncoderBackend {
    /// Local all-MiniLM-L6-v2 via ONNX (default); needs `download-model` once
    Onnx,
    /// Feature hashing: no model files, lexical similarity only
    Hashing,
}

impl EncoderBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(EncoderBackend::Onnx),
            "hashing" => Ok(EncoderBackend::Hashing),
            other => anyhow::bail!("Unknown encoder {other:?} (expected \"onnx\" or \"hashing\")"),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. CLI flags override these
/// values per run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for model files (SURVEYGRAPH_MODEL_DIR)
    pub model_dir: PathBuf,
    /// SURVEYGRAPH_ENCODER: "onnx" (default) or "hashing"
    pub encoder: EncoderBackend,
    /// SURVEYGRAPH_THRESHOLD, default 0.5
    pub similarity_threshold: f64,
    /// SURVEYGRAPH_SEED, default 42
    pub seed: u64,
    /// Optional JSON domain table (SURVEYGRAPH_DOMAINS); built-in table otherwise
    pub domains_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables. Everything has a default.
    pub fn load() -> Result<Self> {
        let encoder = match env::var("SURVEYGRAPH_ENCODER") {
            Ok(v) => EncoderBackend::parse(&v)?,
            Err(_) => EncoderBackend::Onnx,
        };

        let similarity_threshold = match env::var("SURVEYGRAPH_THRESHOLD") {
            Ok(v) => v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("SURVEYGRAPH_THRESHOLD is not a number: {v:?}"))?,
            Err(_) => DEFAULT_SIMILARITY_THRESHOLD,
        };

        let seed = match env::var("SURVEYGRAPH_SEED") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SURVEYGRAPH_SEED is not an unsigned integer: {v:?}"))?,
            Err(_) => DEFAULT_SEED,
        };

        Ok(Self {
            model_dir: env::var("SURVEYGRAPH_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| download::default_model_dir()),
            encoder,
            similarity_threshold,
            seed,
            domains_path: env::var("SURVEYGRAPH_DOMAINS").ok().map(PathBuf::from),
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            similarity_threshold: self.similarity_threshold,
            seed: self.seed,
            ..PipelineConfig::default()
        }
    }

    /// The configured domain table, or the built-in one.
    pub fn domain_table(&self) -> Result<DomainTable> {
        match &self.domains_path {
            Some(path) => DomainTable::from_json_file(path),
            None => Ok(DomainTable::default()),
        }
    }

    /// Validate that the chosen encoder has what it needs.
    pub fn require_encoder(&self) -> Result<()> {
        match self.encoder {
            EncoderBackend::Onnx => {
                if !download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `surveygraph download-model` to download them.\n\
                         Or set SURVEYGRAPH_ENCODER=hashing to run without a model.",
                        download::embedding_model_dir(&self.model_dir).display()
                    );
                }
                Ok(())
            }
            EncoderBackend::Hashing => Ok(()),
        }
    }
}
