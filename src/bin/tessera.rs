//! Tessera CLI — outline intelligence pipeline over fragment files.
//!
//! Usage:
//!   tessera research --fragments cards.json [--clusters clusters.json]
//!   tessera review --fragments cards.json --outline outline.json
//!   tessera generate --fragments cards.json [--outline outline.json] [--max-sections N]

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tessera::classify::{resolve_functions, LexicalClassifier};
use tessera::{
    load_fragments, outline, Fragment, GeneratedOutline, OrderedSection, OutlineGenerator,
    OutlineReview, OutlineReviewer, OutlineStructure, PipelineConfig, PipelineResult,
    ResearchPipeline, ResearchResult, SemanticCluster,
};

#[derive(Parser)]
#[command(
    name = "tessera",
    version,
    about = "Outline intelligence pipeline for harvested text fragments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run theme/arc/coverage research over a fragment file
    Research {
        /// Path to a JSON array of fragments
        #[arg(long)]
        fragments: PathBuf,
        /// Optional JSON array of precomputed semantic clusters
        #[arg(long)]
        clusters: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Review a proposed outline against the fragment material
    Review {
        /// Path to a JSON array of fragments
        #[arg(long)]
        fragments: PathBuf,
        /// Path to a proposed outline structure (JSON)
        #[arg(long)]
        outline: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Generate an outline (research → review → merge → order)
    Generate {
        /// Path to a JSON array of fragments
        #[arg(long)]
        fragments: PathBuf,
        /// Optional proposed outline structure (JSON)
        #[arg(long)]
        outline: Option<PathBuf>,
        /// Optional JSON array of precomputed semantic clusters
        #[arg(long)]
        clusters: Option<PathBuf>,
        /// Maximum number of generated sections
        #[arg(long)]
        max_sections: Option<usize>,
        /// Keep every proposed item regardless of coverage
        #[arg(long)]
        keep_proposed: bool,
        /// Disable narrative-flow reordering
        #[arg(long)]
        no_reorder: bool,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

/// Full output of the `generate` subcommand
#[derive(Serialize)]
struct GenerateBundle {
    research: ResearchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    review: Option<OutlineReview>,
    outline: GeneratedOutline,
    sections: Vec<OrderedSection>,
}

fn load_clusters(path: Option<&PathBuf>) -> PipelineResult<Vec<SemanticCluster>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(Vec::new()),
    }
}

fn load_outline(path: &Path) -> PipelineResult<OutlineStructure> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> PipelineResult<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}

async fn research(
    fragments: &[Fragment],
    clusters: &[SemanticCluster],
    config: &PipelineConfig,
) -> PipelineResult<ResearchResult> {
    let resolved = resolve_functions(&LexicalClassifier::new(), fragments).await;
    ResearchPipeline::new()
        .with_config(config.clone())
        .research(fragments, clusters, &resolved)
}

async fn run(cli: Cli) -> PipelineResult<()> {
    match cli.command {
        Commands::Research {
            fragments,
            clusters,
            pretty,
        } => {
            let fragments = load_fragments(&fragments)?;
            let clusters = load_clusters(clusters.as_ref())?;
            let result = research(&fragments, &clusters, &PipelineConfig::default()).await?;
            print_json(&result, pretty)
        }
        Commands::Review {
            fragments,
            outline,
            pretty,
        } => {
            let fragments = load_fragments(&fragments)?;
            let proposed = load_outline(&outline)?;
            let result = research(&fragments, &[], &PipelineConfig::default()).await?;
            let review = OutlineReviewer::new().review(&proposed, &fragments, &result)?;
            print_json(&review, pretty)
        }
        Commands::Generate {
            fragments,
            outline: proposed_path,
            clusters,
            max_sections,
            keep_proposed,
            no_reorder,
            pretty,
        } => {
            let fragments = load_fragments(&fragments)?;
            let clusters = load_clusters(clusters.as_ref())?;
            let mut config = PipelineConfig::default()
                .with_keep_proposed(keep_proposed)
                .with_narrative_reorder(!no_reorder);
            if let Some(max) = max_sections {
                config = config.with_max_sections(max);
            }

            let result = research(&fragments, &clusters, &config).await?;

            let reviewed = match proposed_path {
                Some(path) => {
                    let proposed = load_outline(&path)?;
                    let review = OutlineReviewer::new()
                        .with_config(config.clone())
                        .review(&proposed, &fragments, &result)?;
                    Some((proposed, review))
                }
                None => None,
            };

            let generated = OutlineGenerator::new().with_config(config.clone()).generate(
                reviewed.as_ref().map(|(o, r)| (o, r)),
                &result,
                &fragments,
            )?;
            let sections = outline::order_sections(&generated, &fragments, &result)?;

            print_json(
                &GenerateBundle {
                    research: result,
                    review: reviewed.map(|(_, r)| r),
                    outline: generated,
                    sections,
                },
                pretty,
            )
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
