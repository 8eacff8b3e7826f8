// ABOUTME: CLI entry point for movies-migration-checker
// ABOUTME: Parses commands and routes to appropriate handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use movies_migration_checker::{commands, config, interactive, mapping};

#[derive(Parser)]
#[command(name = "movies-migration-checker")]
#[command(
    about = "Consistency checker for SQLite to PostgreSQL movie catalog migrations",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ConnectArgs {
    /// Path to the legacy SQLite database file (default: ./db.sqlite)
    #[arg(long)]
    sqlite: Option<PathBuf>,
    /// Path to a TOML file with target connection settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to a .env file to load before reading the DB_* variables
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Tables to check (comma-separated; default: all five)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,
    /// Rows fetched per page during the data comparison (default: 1000)
    #[arg(long)]
    batch_size: Option<u64>,
    /// Select tables interactively before running
    #[arg(long)]
    interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare per-table row counts between the two databases
    Counts {
        #[command(flatten)]
        connect: ConnectArgs,
    },
    /// Compare row-level data between the two databases
    Data {
        #[command(flatten)]
        connect: ConnectArgs,
    },
    /// Run the full consistency check: counts first, then data
    Check {
        #[command(flatten)]
        connect: ConnectArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Counts { connect } => {
            let (config, tables) = prepare(&connect)?;
            commands::counts(&config, &tables).await
        }
        Commands::Data { connect } => {
            let (config, tables) = prepare(&connect)?;
            commands::data(&config, &tables).await
        }
        Commands::Check { connect } => {
            let (config, tables) = prepare(&connect)?;
            commands::check(&config, &tables).await
        }
    }
}

/// Resolve configuration and the table selection for one run.
///
/// Precedence for settings: CLI flags over environment variables over
/// the TOML file over built-in defaults.
fn prepare(
    args: &ConnectArgs,
) -> anyhow::Result<(config::CheckerConfig, Vec<mapping::TableSpec>)> {
    config::load_dotenv(args.env_file.as_deref())?;

    let mut checker_config = config::CheckerConfig::load(args.config.as_deref())?;
    if let Some(path) = &args.sqlite {
        checker_config.sqlite_path = path.clone();
    }
    if let Some(batch) = args.batch_size {
        checker_config.batch_size = batch;
    }

    let mut tables = match &args.tables {
        Some(names) => mapping::subset(names)?,
        None => mapping::MOVIES_TABLES.to_vec(),
    };
    if args.interactive {
        tables = interactive::select_tables(&tables)?;
    }

    Ok((checker_config, tables))
}
