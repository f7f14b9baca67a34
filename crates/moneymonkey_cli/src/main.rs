//! `moneymonkey` admin entry point.
//!
//! # Responsibility
//! - Load `.env`, build the configuration once and start logging.
//! - Run the migration gate before any command touches data.
//! - Dispatch the parsed command and map failures to exit codes.

mod admin;
mod cli;
mod error;

use admin::{confirm_delete, SectorAdmin};
use clap::Parser;
use cli::{Cli, Command, IndustryAction, MetricAction, SectorAction};
use error::CliError;
use log::{error, info};
use moneymonkey_core::{
    init_logging, AppConfig, CatalogRepository, GateOutcome, MigrationGate,
    SqliteCatalogRepository, SqliteConnector, SqliteMigrationRunner, SqliteSectorRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Rejected) => ExitCode::from(CliError::Rejected.exit_code()),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // A missing .env file is normal outside local development.
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    let log_dir = config.log_dir.as_deref().map(absolute).transpose()?;
    init_logging(&config.log_level, log_dir.as_deref())?;
    info!(
        "event=cli_start module=cli status=ok core_version={} {}",
        moneymonkey_core::core_version(),
        config.summary()
    );

    let connector = SqliteConnector::new(config.db.clone());
    let outcome = MigrationGate::new(&config, &connector, SqliteMigrationRunner::new(&connector))
        .check_and_apply_migrations()
        .map_err(|err| {
            error!("event=cli_start module=cli status=error error_code=migration_failed error={err}");
            CliError::Startup(err)
        })?;

    match cli.command {
        Command::Migrate => {
            print_outcome(&outcome);
            Ok(())
        }
        Command::Sectors(args) => run_sector_action(&connector, args.action),
        Command::Industries(args) => match args.action {
            IndustryAction::List { sector } => {
                let catalog = SqliteCatalogRepository::new(&connector);
                print_names(&catalog.list_industries(sector.trim())?, "No industries found.");
                Ok(())
            }
        },
        Command::Metrics(args) => match args.action {
            MetricAction::List => {
                let catalog = SqliteCatalogRepository::new(&connector);
                print_names(&catalog.list_metric_names()?, "No metric names found.");
                Ok(())
            }
        },
    }
}

fn run_sector_action(connector: &SqliteConnector, action: SectorAction) -> Result<(), CliError> {
    let repo = SqliteSectorRepository::new(connector);
    let admin = SectorAdmin::new(&repo);

    let feedback = match action {
        SectorAction::List => match admin.list() {
            Ok(names) => {
                print_names(&names, "No sectors found. Add a sector to get started.");
                return Ok(());
            }
            Err(feedback) => feedback,
        },
        SectorAction::Add { name } => admin.add(&name),
        SectorAction::Rename { old_name, new_name } => admin.rename(&old_name, &new_name),
        SectorAction::Delete { name, yes } => {
            let confirmed = yes || {
                let stdin = std::io::stdin();
                confirm_delete(&name, &mut stdin.lock(), &mut std::io::stdout())?
            };
            if !confirmed {
                println!("Deletion cancelled.");
                return Ok(());
            }
            admin.delete(&name)
        }
    };

    if feedback.is_error() {
        eprintln!("{feedback}");
        return Err(CliError::Rejected);
    }
    println!("{feedback}");
    Ok(())
}

fn print_outcome(outcome: &GateOutcome) {
    match outcome {
        GateOutcome::UpToDate { version } => println!("Schema is up to date ({version})."),
        GateOutcome::Upgraded { from, applied } => println!(
            "Schema upgraded from {} by applying: {}",
            from.as_deref().unwrap_or("empty database"),
            if applied.is_empty() {
                "nothing".to_string()
            } else {
                applied.join(", ")
            }
        ),
    }
}

fn print_names(names: &[String], empty_message: &str) {
    if names.is_empty() {
        println!("{empty_message}");
        return;
    }
    for name in names {
        println!("{name}");
    }
}

fn absolute(dir: &std::path::Path) -> Result<PathBuf, CliError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(dir))
}
