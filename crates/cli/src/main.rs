//! occstore CLI: runs contention scenarios against an in-memory catalog.
//!
//! Every command seeds the sample catalog first, then prints its result as
//! JSON on stdout. Logs go to stderr, filtered by `RUST_LOG` (default `info`).
//!
//! - `occstore seed` prints the seeded catalog
//! - `occstore simulate` races snapshot writers on one product
//! - `occstore storm` hammers one product's stock with delta updates

mod error;
mod scenario;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use occstore::{Config, Database};

#[derive(Parser)]
#[command(name = "occstore", about = "Optimistic concurrency scenarios", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override retry.max_attempts
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the catalog and print it
    Seed,
    /// Race snapshot writers on one product; exactly one wins
    Simulate {
        /// Catalog position of the contended product (1-5)
        #[arg(long, default_value_t = 1)]
        product: usize,
        /// Concurrent writers
        #[arg(long, default_value_t = 5)]
        writers: usize,
    },
    /// Hammer one product's stock with concurrent delta updates
    Storm {
        /// Catalog position of the contended product (1-5)
        #[arg(long, default_value_t = 1)]
        product: usize,
        /// Worker threads
        #[arg(long, default_value_t = 8)]
        writers: usize,
        /// Updates per worker
        #[arg(long, default_value_t = 10)]
        rounds: usize,
        /// Stock delta applied by each update
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        delta: i64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let db = match open_database(&cli) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let output = match &cli.command {
        Command::Seed => scenario::seed(&db),
        Command::Simulate { product, writers } => scenario::simulate(&db, *product, *writers),
        Command::Storm {
            product,
            writers,
            rounds,
            delta,
        } => scenario::storm(&db, *product, *writers, *rounds, *delta),
    };

    match output {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn open_database(cli: &Cli) -> occstore::Result<Database> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut builder = Database::builder().config(config).catalog();
    if let Some(n) = cli.max_attempts {
        builder = builder.max_attempts(n);
    }
    builder.open()
}
