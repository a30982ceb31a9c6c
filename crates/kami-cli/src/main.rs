//! CLI binary for KAMI: build hierarchical signaling graphs from facts and export them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kami_core::config::KamiConfig;
use kami_core::ingest::{Ingested, ingest};
use kami_export::ExportFormat;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kami", about = "KAMI graph builder and exporter")]
struct Cli {
    /// Project root holding kami.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a fact file and write the exports
    Build {
        /// JSON array of fact records
        facts: PathBuf,

        /// Graph name (also the output file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format: dot, json, all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Skip facts that fail to decode or convert
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Print one export to stdout
    Export {
        /// JSON array of fact records
        facts: PathBuf,

        /// Output format: dot, json
        #[arg(short, long, default_value = "dot")]
        format: String,
    },

    /// Show model statistics
    Info {
        /// JSON array of fact records
        facts: PathBuf,
    },

    /// Report rejected facts and dangling relationships
    Validate {
        /// JSON array of fact records
        facts: PathBuf,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = KamiConfig::load(&project_root)
        .with_context(|| format!("failed to load config from {}", project_root.display()))?;

    match cli.command {
        Commands::Build {
            facts,
            name,
            out,
            format,
            skip_invalid,
        } => cmd_build(
            &project_root,
            &config,
            &facts,
            name,
            out,
            &format,
            skip_invalid,
        ),
        Commands::Export { facts, format } => cmd_export(&config, &facts, &format),
        Commands::Info { facts } => cmd_info(&config, &facts),
        Commands::Validate { facts } => cmd_validate(&config, &facts),
    }
}

/// Read a fact file and fold it into a graph named `name`.
fn load_graph(
    config: &KamiConfig,
    facts: &Path,
    name: &str,
    skip_invalid: bool,
) -> Result<Ingested> {
    let records = kami_core::storage::read_fact_records(facts)?;
    let ingested = ingest(
        name,
        records,
        config.model.residue_container,
        skip_invalid,
    )
    .with_context(|| format!("failed to build graph from {}", facts.display()))?;
    Ok(ingested)
}

fn parse_formats(format: &str) -> Result<Vec<ExportFormat>> {
    if format == "all" {
        return Ok(ExportFormat::ALL.to_vec());
    }
    Ok(vec![format.parse()?])
}

fn cmd_build(
    project_root: &Path,
    config: &KamiConfig,
    facts: &Path,
    name: Option<String>,
    out: Option<PathBuf>,
    format: &str,
    skip_invalid: bool,
) -> Result<()> {
    let formats = parse_formats(format)?;
    let name = name.unwrap_or_else(|| config.export.graph_name.clone());
    let mut checked = config.clone();
    checked.export.graph_name.clone_from(&name);
    checked.validate()?;

    let skip_invalid = skip_invalid || config.facts.skip_invalid;
    let ingested = load_graph(config, facts, &name, skip_invalid)?;
    ingested.graph.validate()?;

    let out_dir = out.unwrap_or_else(|| project_root.join(&config.export.output_dir));
    for format in formats {
        let path = kami_export::write_export(&ingested.graph, format, &out_dir)?;
        eprintln!("Wrote {}", path.display());
    }

    let stats = ingested.graph.stats()?;
    eprintln!(
        "Graph '{}': {} facts, {} agents, {} relationships",
        ingested.graph.name,
        ingested.facts,
        stats.agents,
        stats.directed + stats.undirected,
    );
    if !ingested.rejected.is_empty() {
        eprintln!("Skipped {} invalid facts", ingested.rejected.len());
    }
    Ok(())
}

fn cmd_export(config: &KamiConfig, facts: &Path, format: &str) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let ingested = load_graph(
        config,
        facts,
        &config.export.graph_name,
        config.facts.skip_invalid,
    )?;
    ingested.graph.validate()?;
    print!("{}", kami_export::export(&ingested.graph, format)?);
    Ok(())
}

fn cmd_info(config: &KamiConfig, facts: &Path) -> Result<()> {
    let ingested = load_graph(
        config,
        facts,
        &config.export.graph_name,
        config.facts.skip_invalid,
    )?;
    let graph = &ingested.graph;
    let stats = graph.stats()?;

    println!("Graph: {}", graph.name);
    println!("Created: {}", graph.created_at);
    println!("Facts: {}", ingested.facts);
    if !ingested.rejected.is_empty() {
        println!("Rejected: {}", ingested.rejected.len());
    }
    println!();
    println!("Agents: {}", stats.agents);
    println!("Sites: {}", stats.sites);
    println!("Key residues: {}", stats.key_residues);
    println!("Flags: {}", stats.flags);
    println!("Attributes: {}", stats.attributes);
    println!("Directed relationships: {}", stats.directed);
    println!("Undirected relationships: {}", stats.undirected);

    if stats.agents > 0 {
        println!("\nAgents:");
        for agent in graph.agents() {
            let component = graph.model().component(agent)?;
            let children = graph.model().descendants(agent)?.len() - 1;
            println!("  {} [{}] ({} nodes)", component.name, agent, children);
        }
    }
    Ok(())
}

fn cmd_validate(config: &KamiConfig, facts: &Path) -> Result<()> {
    let ingested = load_graph(config, facts, &config.export.graph_name, true)?;
    let mut issues = ingested.rejected.len();

    for rejection in &ingested.rejected {
        println!("WARN: {}", rejection);
    }
    if let Err(e) = ingested.graph.validate() {
        println!("WARN: {}", e);
        issues += 1;
    }

    if issues > 0 {
        anyhow::bail!("{} issue(s) found", issues);
    }
    println!("OK: {} facts, no issues found", ingested.facts);
    Ok(())
}
