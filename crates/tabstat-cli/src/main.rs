#![allow(clippy::doc_markdown)]
//! `tabstat` CLI - statistics pipeline over CSV datasets
//!
//! Usage:
//!   `tabstat init`
//!   `tabstat load ./water.csv`
//!   `tabstat run`
//!   `tabstat run --stage statistics`
//!   `tabstat export ./result_data`

mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tabstat_core::config::DEFAULT_CONFIG_FILE;
use tabstat_core::{Stage, TabstatConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabstat")]
#[command(
    author,
    version,
    about = "tabstat CLI - descriptive statistics and derived tables for CSV datasets"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path; must exist when given (default: `tabstat.toml` if present)
    #[arg(short, long, value_name = "FILE", global = true, env = "TABSTAT_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides `storage.data_dir`)
    #[arg(short, long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Output format for results
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum FormatArg {
    #[default]
    Table,
    Json,
}

/// CLI stage option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StageArg {
    Normalize,
    Statistics,
    Frequencies,
    BelowMean,
    AboveMean,
    EmbedCategorical,
    EmbedContinuous,
    Threshold,
    Query,
}

impl From<StageArg> for Stage {
    fn from(s: StageArg) -> Self {
        match s {
            StageArg::Normalize => Stage::Normalize,
            StageArg::Statistics => Stage::Statistics,
            StageArg::Frequencies => Stage::Frequencies,
            StageArg::BelowMean => Stage::BelowMean,
            StageArg::AboveMean => Stage::AboveMean,
            StageArg::EmbedCategorical => Stage::EmbedCategorical,
            StageArg::EmbedContinuous => Stage::EmbedContinuous,
            StageArg::Threshold => Stage::Threshold,
            StageArg::Query => Stage::Query,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Data(DataCommands),
}

/// Commands that work on the database
#[derive(Subcommand)]
enum DataCommands {
    /// Load a CSV file into the dataset collection
    Load {
        /// CSV file (defaults to `dataset.csv_path`)
        csv: Option<PathBuf>,

        /// Target collection (defaults to `dataset.collection`)
        #[arg(long)]
        collection: Option<String>,

        /// Show progress bar
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        progress: bool,
    },

    /// Report documents with missing values without changing them
    Missing {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },

    /// Run the pipeline, or a single stage
    Run {
        /// Only run this stage
        #[arg(short, long, value_enum)]
        stage: Option<StageArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },

    /// Run the compound-index query on the dataset
    Query {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },

    /// Show database info
    Info,

    /// Drop collections (defaults to the derived collections)
    Drop {
        /// Collection names
        collections: Vec<String>,
    },

    /// Drop every collection of the database
    DropDb,

    /// Export every collection to `<DIR>/<collection>.json`
    Export {
        /// Output directory
        dir: PathBuf,
    },
}

fn init_logging(config: &TabstatConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (e.g. in tests); keep it
    let _ = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init { output, force } => return commands::init(&output, force),
        Commands::Data(command) => command,
    };

    let mut config = match &cli.config {
        Some(path) => TabstatConfig::load_existing(path)?,
        None => TabstatConfig::load_from_path(DEFAULT_CONFIG_FILE)?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.display().to_string();
    }
    config.validate()?;
    init_logging(&config, cli.verbose);

    let db = tabstat_core::Database::open(&config.storage.data_dir)?;

    match command {
        DataCommands::Load {
            csv,
            collection,
            progress,
        } => commands::load(&db, &config, csv, collection, progress)?,
        DataCommands::Missing { format } => commands::missing(&db, &config, format)?,
        DataCommands::Run { stage, format } => {
            commands::run(&db, &config, stage.map(Stage::from), format)?;
        }
        DataCommands::Query { format } => commands::query(&db, &config, format)?,
        DataCommands::Info => commands::info(&db)?,
        DataCommands::Drop { collections } => commands::drop(&db, &config, &collections)?,
        DataCommands::DropDb => commands::drop_db(&db)?,
        DataCommands::Export { dir } => commands::export(&db, &dir)?,
    }

    Ok(())
}
