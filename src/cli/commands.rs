//! Command execution. Every command returns the text to print.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{Cli, Commands};
use crate::analysis::{
    run_architectural_mri, MriAnalyzer, MriOptions, NoopAnalyzer, StaticAnalyzer,
};
use crate::config::{CartographerConfig, STORAGE_DIR_NAME};
use crate::graph::scan_repository;
use crate::query::{self, Lookup};
use crate::storage::FileStore;

const CONFIG_FILE_NAME: &str = "config.toml";

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| cli.root.join(STORAGE_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

fn open_store(config: &CartographerConfig, root: &Path) -> Result<FileStore> {
    let dir = config.resolve_storage_dir(root);
    FileStore::open(&dir).with_context(|| format!("failed to open storage at {}", dir.display()))
}

/// Run one CLI command and return its output.
pub async fn execute(cli: &Cli) -> Result<String> {
    let mut config = CartographerConfig::load(&config_path(cli));
    let store = open_store(&config, &cli.root)?;

    match &cli.command {
        Commands::Scan { path, prune } => {
            if *prune {
                config.scanner.prune_orphans = true;
            }
            let target = path.as_deref().unwrap_or(cli.root.as_path());
            let result = scan_repository(target, &config.scanner, &store);
            pretty(&json!({
                "analyzed_files": result.analyzed_files,
                "most_central": result.most_central,
                "path": result.path,
                "graph_id": result.graph_id,
            }))
        }

        Commands::Map { graph_id } => pretty(&query::quick_map(&store, graph_id, &config.layout)?),

        Commands::Stats { graph_id } => pretty(&query::graph_stats(&store, graph_id)?),

        Commands::Risk { graph_id } => {
            match query::risk_report(&store, graph_id, config.storage.high_risk_threshold)? {
                Lookup::Found(report) => Ok(report.to_markdown()),
                Lookup::NotFound { graph_id } => bail!("graph `{}` not found", graph_id),
                Lookup::UnknownModule { module, .. } => bail!("unknown module `{}`", module),
            }
        }

        Commands::Context { graph_id, module } => {
            pretty(&query::module_context(&store, graph_id, module)?)
        }

        Commands::Graphs => pretty(&query::list_graphs(&store)?),

        Commands::Mri {
            graph_id,
            force,
            findings,
        } => {
            let analyzer: Box<dyn MriAnalyzer> = match findings {
                Some(path) => Box::new(
                    StaticAnalyzer::from_file(path)
                        .with_context(|| format!("failed to read findings {}", path.display()))?,
                ),
                None => Box::new(NoopAnalyzer),
            };
            let options = MriOptions::from_config(&config, *force);
            let outcome =
                run_architectural_mri(&store, analyzer.as_ref(), graph_id, &options).await?;
            pretty(&outcome)
        }
    }
}
