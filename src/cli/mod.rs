//! CLI module for Cartographer.
//!
//! Commands:
//! - Build: scan
//! - Read: map, stats, risk, context, graphs
//! - Analysis: mri

pub mod commands;

pub use commands::execute;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cartographer")]
#[command(about = "Dependency maps for Python repositories")]
#[command(override_help = HELP_TEXT)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: <root>/.cartographer/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

const HELP_TEXT: &str = "
cartographer - dependency maps for Python repositories

Build:
  scan [PATH]               Scan a repository and store its graph
    --prune                 Drop modules with no connections

Read:
  map <GRAPH_ID>            Layout + styling for the renderer
  stats <GRAPH_ID>          Module and connection counts
  risk <GRAPH_ID>           Markdown risk report
  context <GRAPH_ID> <MOD>  Dependencies, dependents and risk of a module
  graphs                    Stored scans, newest first

Analysis:
  mri <GRAPH_ID>            Attach AI findings and build the report
    --force                 Ignore cached findings
    --findings <FILE>       Findings JSON to attach

Options:
  -r, --root <PATH>         Project root (default: .)
  -c, --config <FILE>       Config file

Logging goes to stderr; set RUST_LOG to adjust.
";

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Build ──────────────────────────────────────────────────────
    /// Scan a repository and persist its dependency graph
    Scan {
        /// Directory to scan (default: the project root)
        path: Option<PathBuf>,

        /// Remove modules with no incoming and no outgoing edges
        #[arg(long)]
        prune: bool,
    },

    // ─── Read ───────────────────────────────────────────────────────
    /// Renderable map of a stored graph
    Map { graph_id: String },

    /// Statistics of a stored graph
    Stats { graph_id: String },

    /// Markdown risk report of a stored graph
    Risk { graph_id: String },

    /// Neighbourhood of one module
    Context { graph_id: String, module: String },

    /// List stored scans
    Graphs,

    // ─── Analysis ───────────────────────────────────────────────────
    /// Run the architectural MRI on a stored graph
    Mri {
        graph_id: String,

        /// Ask the analyzer again even if findings are cached
        #[arg(long)]
        force: bool,

        /// JSON file with `risk_scores` and `hidden_links`
        #[arg(long)]
        findings: Option<PathBuf>,
    },
}
