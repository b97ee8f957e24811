//! CLI entry point for the conjugraph converters.
//!
//! Reads a JSON document, converts it into MERGE statements, and either
//! writes them to a Cypher script or executes them against Neo4j.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use conjugraph_core::sink::drain;
use conjugraph_core::{CypherWriter, StatementSink};
use conjugraph_graph::{GraphClient, GraphConfig, GraphSink};

use conjugraph_ingest::config::{IngestConfig, ParticipleGenders};
use conjugraph_ingest::conjugation::ConjugationWalker;
use conjugraph_ingest::document::ConjugationDocument;
use conjugraph_ingest::tree::{generate_statements, load_tree};

#[derive(Parser)]
#[command(name = "conjugraph")]
#[command(about = "Convert nested JSON hierarchies into idempotent Neo4j MERGE statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: conjugraph).
    #[arg(short, long, default_value = "conjugraph", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a generic labeled tree (label/value/lineage/children).
    Tree {
        /// Input JSON document.
        #[arg(short, long)]
        input: PathBuf,

        /// Output Cypher script (default: ingest.tree_output from config).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Execute against Neo4j instead of writing a script.
        #[arg(long, conflicts_with = "output")]
        live: bool,
    },
    /// Convert an Arabic verb conjugation document.
    Conjugations {
        /// Input JSON document.
        #[arg(short, long)]
        input: PathBuf,

        /// Write a Cypher script instead of executing against Neo4j.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Participle gender mode: carried, per-key.
        #[arg(long)]
        participle_genders: Option<ParticipleGenders>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ingest_config = load_ingest_config(&cli.config)?;

    match cli.command {
        Command::Tree {
            input,
            output,
            live,
        } => {
            let tree = load_tree(&input)?;
            let statements = generate_statements(&tree);

            let target = if live {
                None
            } else {
                Some(output.unwrap_or_else(|| PathBuf::from(&ingest_config.tree_output)))
            };
            let mut sink = open_sink(target.as_deref(), &cli.config).await?;
            let count = drain(sink.as_mut(), &statements).await?;

            match target {
                Some(path) => {
                    tracing::info!(statements = count, path = %path.display(), "Cypher queries written")
                }
                None => tracing::info!(statements = count, "Cypher queries executed"),
            }
        }
        Command::Conjugations {
            input,
            output,
            participle_genders,
        } => {
            let doc = ConjugationDocument::load(&input)?;
            let mode = participle_genders.unwrap_or(ingest_config.participle_genders);

            let mut sink = open_sink(output.as_deref(), &cli.config).await?;
            let summary = ConjugationWalker::new(&doc)
                .participle_genders(mode)
                .run(sink.as_mut())
                .await?;

            if let Some(path) = output {
                tracing::info!(statements = summary.statements, path = %path.display(), "Cypher queries written");
            }
        }
    }

    Ok(())
}

/// A script writer when `output` is given, otherwise a live Neo4j session.
async fn open_sink(
    output: Option<&Path>,
    config_prefix: &str,
) -> anyhow::Result<Box<dyn StatementSink>> {
    match output {
        Some(path) => Ok(Box::new(CypherWriter::create(path)?)),
        None => {
            let graph_config = load_graph_config(config_prefix)?;
            let client = GraphClient::connect(&graph_config).await?;
            Ok(Box::new(GraphSink::new(client)))
        }
    }
}

fn load_settings(file_prefix: &str) -> anyhow::Result<config::Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("CONJUGRAPH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

fn load_ingest_config(file_prefix: &str) -> anyhow::Result<IngestConfig> {
    let cfg = load_settings(file_prefix)?;
    match cfg.get::<IngestConfig>("ingest") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(IngestConfig::default()),
        Err(e) => Err(e.into()),
    }
}

fn load_graph_config(file_prefix: &str) -> anyhow::Result<GraphConfig> {
    let cfg = load_settings(file_prefix)?;
    match cfg.get::<GraphConfig>("neo4j") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(GraphConfig::default()),
        Err(e) => Err(e.into()),
    }
}
