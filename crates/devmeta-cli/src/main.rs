//! devmeta - Command-line tool for device metadata catalogs
//!
//! Loads a catalog file, indexes its aspect trees and answers matching,
//! lookup and validation queries against it.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devmeta_engine::Registry;
use devmeta_store::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::SelectablesArgs;
use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "devmeta")]
#[command(author, version, about = "Device metadata matching CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Catalog file (.yaml, .yml or .json)
    #[arg(long, env = "DEVMETA_CATALOG")]
    catalog: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "DEVMETA_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List aspect nodes
    AspectNodes {
        /// Aspect ids (all nodes when omitted)
        ids: Vec<String>,

        /// Only aspects used with measuring functions
        #[arg(long, conflicts_with = "ids")]
        measuring: bool,

        /// With --measuring: include ancestor aspects
        #[arg(long, requires = "measuring")]
        ancestors: bool,

        /// With --measuring: include descendant aspects
        #[arg(long, requires = "measuring")]
        descendants: bool,
    },

    /// Find device types serving capability criteria
    Selectables(SelectablesArgs),

    /// Show a device type (plain or composite id)
    DeviceType {
        /// Device type ID
        id: String,
    },

    /// Show a function
    Function {
        /// Function ID
        id: String,
    },

    /// Show a device (plain or composite id)
    Device {
        /// Device ID
        id: String,
    },

    /// Show the generated device group of a device
    GroupCriteria {
        /// Device ID
        device_id: String,
    },

    /// Validate a device group of the catalog
    ValidateGroup {
        /// Device group ID
        group_id: String,
    },

    /// Decode a composite id
    SplitId {
        /// Plain or composite id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let format = match (cli.output, config.output.as_deref()) {
        (Some(format), _) => format,
        (None, Some(name)) => name
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid output format in config file")?,
        (None, None) => OutputFormat::default(),
    };

    let ctx = OutputContext::new(
        format,
        cli.no_color || config.no_color.unwrap_or(false),
        cli.quiet,
    );

    // split-id needs no catalog
    if let Commands::SplitId { id } = &cli.command {
        return commands::split_id(id, &ctx);
    }

    let merged = config.merge_with_args(cli.catalog.as_deref())?;
    let registry = open_registry(&merged).await?;
    run(&registry, &cli.command, &ctx).await
}

/// Execute a command against a loaded catalog
async fn run(registry: &Registry, command: &Commands, ctx: &OutputContext) -> Result<()> {
    match command {
        Commands::AspectNodes {
            ids,
            measuring,
            ancestors,
            descendants,
        } => {
            commands::aspect_nodes(registry, ids, *measuring, *ancestors, *descendants, ctx).await
        }

        Commands::Selectables(args) => commands::selectables(registry, args, ctx).await,

        Commands::DeviceType { id } => commands::device_type(registry, id, ctx).await,

        Commands::Function { id } => commands::function(registry, id, ctx).await,

        Commands::Device { id } => commands::device(registry, id, ctx).await,

        Commands::GroupCriteria { device_id } => {
            commands::group_criteria(registry, device_id, ctx).await
        }

        Commands::ValidateGroup { group_id } => {
            commands::validate_group(registry, group_id, ctx).await
        }

        Commands::SplitId { id } => commands::split_id(id, ctx),
    }
}

/// Load the catalog and index its aspect trees
async fn open_registry(config: &MergedConfig) -> Result<Registry> {
    let store = MemoryStore::from_file(&config.catalog)
        .with_context(|| format!("Failed to load catalog: {}", config.catalog.display()))?;
    let roots = store.aspect_roots();
    let meta = store.meta();
    let registry = Registry::new(Arc::new(store), config.engine.clone());

    for root in &roots {
        registry
            .rebuild_aspect_subtree(root)
            .await
            .with_context(|| format!("Failed to index aspect tree {}", root.id))?;
    }
    info!(
        catalog = %config.catalog.display(),
        name = meta.name.as_deref().unwrap_or("-"),
        version = meta.version.as_deref().unwrap_or("-"),
        aspect_trees = roots.len(),
        "Catalog loaded"
    );
    Ok(registry)
}
