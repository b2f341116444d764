//! navflow - command line entry point
//!
//! `navflow run <flow>` executes a graph description and prints the run
//! report; `navflow decode <file>` decodes one RINEX navigation file;
//! `navflow nodes` lists the node types.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use navflow::config::{default_config_path, RunConfig};
use navflow::gnss::rinex::NavDecoder;
use navflow::pipeline::{Executor, GraphLoader, NodeType, SchedulePolicy};
use std::path::{Path, PathBuf};

/// Run GNSS navigation data through a node graph
#[derive(Parser)]
#[command(name = "navflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a graph description
    Run {
        /// Path to the graph description (JSON)
        flow: PathBuf,

        /// Directory source paths resolve against (default: the flow's directory)
        #[arg(long)]
        fixture_root: Option<PathBuf>,

        /// Poll sources in turns instead of earliest record first
        #[arg(long)]
        round_robin: bool,

        /// Records decoded per source per round-robin turn
        #[arg(long)]
        records_per_turn: Option<usize>,
    },

    /// Decode a navigation file and print a summary
    Decode {
        /// Path to the RINEX navigation file
        file: PathBuf,

        /// Print the decoded store as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the node types a graph description can use
    Nodes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::load_or_default(),
    };
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config.logging.level = filter;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(file) = cli.log_file {
        config.logging.file = Some(file);
    }
    let _logger = config.logging.install()?;

    tracing::debug!(
        "Config: {}",
        cli.config
            .or_else(default_config_path)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<defaults>".into())
    );

    match cli.command {
        Commands::Run {
            flow,
            fixture_root,
            round_robin,
            records_per_turn,
        } => {
            if fixture_root.is_some() {
                config.fixture_root = fixture_root;
            }
            if round_robin {
                config.scheduler.policy = SchedulePolicy::RoundRobin;
            }
            if let Some(n) = records_per_turn {
                config.scheduler.records_per_turn = n;
            }
            run_flow(&flow, &config)
        }
        Commands::Decode { file, json } => decode_file(&file, json),
        Commands::Nodes => {
            list_node_types();
            Ok(())
        }
    }
}

fn run_flow(flow: &Path, config: &RunConfig) -> Result<()> {
    let loader = GraphLoader::with_fixture_root(config.fixture_root_for(flow));
    let graph = loader
        .load_file(flow)
        .with_context(|| format!("Failed to load {}", flow.display()))?;

    let handle = Executor::new(graph)
        .with_config(config.scheduler.clone())
        .spawn()?;
    let finished = handle.wait().context("Run failed")?;

    print!("{}", finished.report);
    for node in &finished.report.nodes {
        for warning in &node.warnings {
            eprintln!("warning: {}: {}", node.handle, warning);
        }
    }

    let failed = finished.report.failures().count();
    if failed > 0 {
        bail!("{} node(s) failed", failed);
    }
    Ok(())
}

fn list_node_types() {
    for node_type in NodeType::all() {
        let role = if node_type.is_source() { "source" } else { "transform" };
        println!("{} ({})", node_type, role);
        for line in node_type.description().lines() {
            println!("    {}", line);
        }
    }
}

fn decode_file(file: &Path, json: bool) -> Result<()> {
    let mut decoder = NavDecoder::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let info = decoder.decode_all()?;

    for warning in decoder.warnings() {
        eprintln!("warning: {}", warning);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let header = decoder.header();
    println!(
        "RINEX {} navigation, {} satellites, {} messages",
        header.version,
        info.satellite_count(),
        info.message_count()
    );
    for (sat, records) in info.iter() {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            continue;
        };
        println!(
            "  {}  {:>3} messages  {} .. {}",
            sat,
            records.len(),
            first.toc,
            last.toc
        );
    }
    Ok(())
}
