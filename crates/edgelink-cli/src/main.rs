//! edgelink command-line tool.
//!
//! Provides the `edgelink` binary for inspecting and editing an edge table
//! in a SQLite database. Configuration comes from flags, falling back to
//! environment variables:
//! - `EDGELINK_DB_PATH`: SQLite database file path (default: "edgelink.db")
//! - `EDGELINK_TABLE`, `EDGELINK_DEFAULT_TYPE`, `EDGELINK_PAGE_SIZE`: see
//!   [`StoreConfig::from_env`]
//!
//! Log verbosity follows `RUST_LOG` (default: `warn`).

use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use edgelink_core::{EdgeError, EdgeStore, EdgeType, Linked, StoreConfig, Weight};
use edgelink_storage::SqliteExecutor;

const ENV_DB_PATH: &str = "EDGELINK_DB_PATH";
const DEFAULT_DB_PATH: &str = "edgelink.db";

/// Typed, weighted edges in a SQLite table.
#[derive(Parser)]
#[command(name = "edgelink", about = "Typed, weighted edges in a SQLite table")]
struct Cli {
    /// Path to the database file.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Edge table name.
    #[arg(long, global = true)]
    table: Option<String>,

    /// Edge type; overrides the configured default type.
    #[arg(long = "type", global = true)]
    edge_type: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create the edge table and its indexes if missing.
    Install {
        /// Print the DDL without executing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Create or update the edge SOURCE -> TARGET.
    Link {
        source: i64,
        target: i64,
        #[command(flatten)]
        weight: WeightArgs,
    },
    /// Print the targets of each source, ordered by weight.
    Targets {
        #[arg(required = true)]
        sources: Vec<i64>,
    },
    /// Print the sources of each target.
    Sources {
        #[arg(required = true)]
        targets: Vec<i64>,
    },
    /// Delete every edge leaving the given sources.
    ClearSource {
        #[arg(required = true)]
        sources: Vec<i64>,
    },
    /// Delete every edge entering the given targets.
    ClearTarget {
        #[arg(required = true)]
        targets: Vec<i64>,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct WeightArgs {
    /// Ordering weight (default: 0).
    #[arg(long, allow_negative_numbers = true)]
    weight: Option<i64>,

    /// Leave the weight of an existing edge untouched.
    #[arg(long)]
    keep_weight: bool,
}

impl WeightArgs {
    fn weight(&self) -> Weight {
        match (self.keep_weight, self.weight) {
            (true, _) => Weight::Keep,
            (false, weight) => Weight::Value(weight.unwrap_or(0)),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(cli));
}

/// Runs one subcommand.
///
/// Returns exit code: 0 = success, 1 = configuration or edge type error,
/// 3 = storage error.
fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(()) => 0,
        Err(err @ (EdgeError::InvalidEdgeType | EdgeError::InvalidConfig { .. })) => {
            eprintln!("Error: {}", err);
            1
        }
        Err(err) => {
            eprintln!("Storage error: {}", err);
            3
        }
    }
}

fn execute(cli: Cli) -> Result<(), EdgeError> {
    let db_path = cli
        .db
        .or_else(|| std::env::var(ENV_DB_PATH).ok())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let mut config = StoreConfig::from_env()?;
    if let Some(table) = cli.table {
        config.table_name = table;
    }
    let edge_type = cli.edge_type.map(EdgeType);

    tracing::debug!(db = %db_path, table = %config.table_name, "opening edge store");
    let store = EdgeStore::new(SqliteExecutor::open(&db_path)?, config)?;

    match cli.command {
        Commands::Install { dry_run } => {
            for sql in store.install(!dry_run)? {
                println!("{};", sql);
            }
        }
        Commands::Link {
            source,
            target,
            weight,
        } => {
            let linked = store.link_with_outcome(source, target, weight.weight(), edge_type)?;
            let edge = store.find(source, target, edge_type)?;
            print_json(&serde_json::json!({
                "created": matches!(linked, Linked::Created(_)),
                "edge": edge,
            }));
        }
        Commands::Targets { sources } => {
            print_json(&store.targets_of_many(&sources, edge_type)?);
        }
        Commands::Sources { targets } => {
            print_json(&store.sources_of_many(&targets, edge_type)?);
        }
        Commands::ClearSource { sources } => {
            let deleted = store.clear_using_source(sources, edge_type)?;
            print_json(&serde_json::json!({ "deleted": deleted }));
        }
        Commands::ClearTarget { targets } => {
            let deleted = store.clear_using_target(targets, edge_type)?;
            print_json(&serde_json::json!({ "deleted": deleted }));
        }
    }
    Ok(())
}

/// Prints a value as pretty JSON to stdout for machine-readable output.
fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}
