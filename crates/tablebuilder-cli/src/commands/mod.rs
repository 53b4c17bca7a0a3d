//! Command implementations

mod config;
mod locations;
mod periods;
mod query;

use crate::cli::{Cli, Commands, HierarchyArgs};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use std::path::Path;
use tablebuilder_core::config::{CliConfigOverrides, LayeredConfig};
use tablebuilder_core::models::{BoundaryLevelId, LocationHierarchies};
use tokio_util::sync::CancellationToken;

/// Configuration file read when `--config` is not given, if present
const DEFAULT_CONFIG_FILE: &str = "tablebuilder.toml";

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(
        cli.config.as_deref(),
        CliConfigOverrides {
            max_table_cells_allowed: cli.max_table_cells,
            cropped_table_max_rows: cli.cropped_max_rows,
        },
    )?;

    match cli.command {
        Commands::Query(args) => query::execute(args, &config, &output, &interrupt_token()).await,
        Commands::Locations(args) => locations::execute(args, &output).await,
        Commands::Periods(args) => periods::execute(args, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Layered configuration: defaults, file, environment, then CLI flags
fn load_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match path {
        Some(path) => {
            config = config
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            config = config
                .load_from_file(DEFAULT_CONFIG_FILE)
                .context("Failed to load configuration file")?;
        }
        None => {}
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

/// Token cancelled on Ctrl-C
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling query");
            on_interrupt.cancel();
        }
    });
    cancel
}

impl HierarchyArgs {
    pub fn location_hierarchies(&self) -> LocationHierarchies {
        self.hierarchies.iter().cloned().collect()
    }

    pub fn boundary_level_id(&self) -> Option<BoundaryLevelId> {
        self.boundary_level.map(BoundaryLevelId)
    }
}
