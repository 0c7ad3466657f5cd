use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use surveygraph::config::{Config, EncoderBackend};
use surveygraph::embedding::traits::TextEncoder;

/// surveygraph: semantic similarity graphs for survey questions.
///
/// Embeds each question with its answer options, links questions whose
/// wording is similar, and groups them into labeled clusters for a
/// force-directed visualization.
#[derive(Parser)]
#[command(name = "surveygraph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph JSON from a clean survey JSON file
    Build {
        /// Clean survey data (question → metadata and responses)
        #[arg(long)]
        input: PathBuf,

        /// Where to write the graph JSON
        #[arg(long, default_value = "semantic_graph.json")]
        output: PathBuf,

        /// Minimum similarity (exclusive) for a link; overrides SURVEYGRAPH_THRESHOLD
        #[arg(long)]
        threshold: Option<f64>,

        /// Encoder backend: onnx or hashing; overrides SURVEYGRAPH_ENCODER
        #[arg(long)]
        encoder: Option<String>,

        /// Community detection seed; overrides SURVEYGRAPH_SEED
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the cluster summary of an existing graph JSON file
    Summary {
        /// Graph JSON written by `build`
        graph: PathBuf,
    },

    /// Download the ONNX sentence embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("surveygraph=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            threshold,
            encoder,
            seed,
        } => {
            let mut config = Config::load()?;
            if let Some(t) = threshold {
                config.similarity_threshold = t;
            }
            if let Some(e) = encoder {
                config.encoder = EncoderBackend::parse(&e)?;
            }
            if let Some(s) = seed {
                config.seed = s;
            }
            config.require_encoder()?;

            println!("Loading survey data from {}...", input.display());
            let dataset = surveygraph::survey::items::SurveyDataset::from_json_file(&input)?;
            println!("Found {} questions", dataset.len());

            let encoder = create_encoder(&config)?;
            let labeler = surveygraph::labels::strategy::ClusterLabeler::new(config.domain_table()?);

            let graph = surveygraph::pipeline::run(
                &dataset,
                encoder.as_ref(),
                &labeler,
                &config.pipeline(),
            )
            .await?;

            surveygraph::output::write_graph(&graph, &output)?;
            surveygraph::output::terminal::display_cluster_summary(&graph);

            println!(
                "\n{} {}",
                "Graph saved to".bold(),
                output.display().to_string().bold()
            );
            println!(
                "Created {} nodes and {} connections",
                graph.nodes.len(),
                graph.links.len()
            );
        }

        Commands::Summary { graph } => {
            let graph = surveygraph::output::read_graph(&graph)?;
            surveygraph::output::terminal::display_cluster_summary(&graph);
        }

        Commands::DownloadModel => {
            let config = Config::load()?;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", config.model_dir.display());

            surveygraph::embedding::download::download_model(&config.model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `surveygraph build --input <survey.json>`.");
        }
    }

    Ok(())
}

/// Create a text encoder based on the configured backend.
fn create_encoder(config: &Config) -> Result<Box<dyn TextEncoder>> {
    match config.encoder {
        EncoderBackend::Onnx => {
            info!("Using local ONNX sentence encoder");
            let dir = surveygraph::embedding::download::embedding_model_dir(&config.model_dir);
            let encoder = surveygraph::embedding::onnx::SentenceEmbedder::load(&dir)?;
            Ok(Box::new(encoder))
        }
        EncoderBackend::Hashing => {
            info!("Using feature-hashing encoder");
            Ok(Box::new(
                surveygraph::embedding::hashing::HashingEncoder::default(),
            ))
        }
    }
}
