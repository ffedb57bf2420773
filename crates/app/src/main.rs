mod report;
mod seeder;
mod telemetry;

use std::{io, process::ExitCode};

use clap::Parser;
use tracing::error;

use petguide_core::SeedCatalog;
use petguide_storage::{Database, StorageError};
use petguide_util::{load_env_file, AppConfig};

use crate::{
    report::ConsoleReporter,
    seeder::{CitySeeder, SeedMode},
};

/// Adds the built-in list of Dutch cities to the directory database.
#[derive(Debug, Parser)]
#[command(name = "seed-dutch-cities", version, long_about = None)]
struct Cli {
    /// Look everything up and report what would be added without writing rows
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(stage = "seed", error = %err, "city seed failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config)?;

    let mode = if cli.dry_run {
        SeedMode::DryRun
    } else {
        SeedMode::Apply
    };
    let database = open_database(&config.database_url, mode).await?;
    let catalog = SeedCatalog::dutch_cities()?;

    let mut reporter = ConsoleReporter::new(io::stdout());
    CitySeeder::new(database, mode)
        .run(&catalog, &mut reporter)
        .await?;

    Ok(())
}

/// Dry runs only open a database that already exists and never migrate it.
async fn open_database(database_url: &str, mode: SeedMode) -> Result<Database, StorageError> {
    match mode {
        SeedMode::DryRun => Database::open_existing(database_url).await,
        SeedMode::Apply => {
            let database = Database::connect(database_url).await?;
            database.run_migrations().await?;
            Ok(database)
        }
    }
}
