//! `leaftracker` command line entry point.
//!
//! # Responsibility
//! - Manage the aggregate indexes of one SQLite database.
//! - Run the nursery use cases and print references or JSON.
//!
//! Errors go to stderr and the process exits with status 1.

use clap::{Parser, Subcommand, ValueEnum};
use leaftracker_core::config::{DATABASE_VAR, INDEX_PREFIX_VAR};
use leaftracker_core::repo::{BATCH_INDEX, SOURCE_OF_STOCK_INDEX, SPECIES_INDEX};
use leaftracker_core::{
    create_all_indexes, init_logging, list_indexes, open_db, refresh_all_indexes, BatchType,
    Config, ConfigError, DocumentStore, IndexLifecycle, Mappings, NurseryService,
    SqliteDocumentStore, SqliteLifecycle, StockSize, UnitOfWork,
};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "leaftracker")]
#[command(about = "Track nursery stock: species, sources and batches")]
struct Cli {
    /// SQLite database holding the document indexes.
    #[arg(long, env = "LEAFTRACKER_DATABASE")]
    database: Option<PathBuf>,
    /// Prefix applied to every index name.
    #[arg(long, env = "LEAFTRACKER_INDEX_PREFIX")]
    index_prefix: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the source, species and batch indexes if missing.
    CreateIndexes,
    /// Delete every index whose name starts with the prefix.
    DeleteIndexes {
        #[arg(long, default_value = "test_")]
        prefix: String,
    },
    /// Make all pending writes visible to counts.
    Refresh,
    /// Print the number of searchable documents in an index.
    Count { index: String },
    AddNursery { name: String },
    AddProgram { name: String },
    AddSpecies { scientific_name: String },
    RenameSpecies { reference: String, new_name: String },
    AddBatch {
        source_reference: String,
        #[arg(long, value_enum, default_value_t = BatchKind::Order)]
        batch_type: BatchKind,
    },
    AddStock {
        batch_reference: String,
        species_reference: String,
        quantity: u32,
        #[arg(long, value_enum, default_value_t = SizeKind::Tube)]
        size: SizeKind,
    },
    /// Print one aggregate as JSON.
    Show {
        #[arg(value_enum)]
        kind: ShowKind,
        reference: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchKind {
    Order,
    Delivery,
    Pickup,
}

impl From<BatchKind> for BatchType {
    fn from(value: BatchKind) -> Self {
        match value {
            BatchKind::Order => Self::Order,
            BatchKind::Delivery => Self::Delivery,
            BatchKind::Pickup => Self::Pickup,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SizeKind {
    Tube,
    Pot,
}

impl From<SizeKind> for StockSize {
    fn from(value: SizeKind) -> Self {
        match value {
            SizeKind::Tube => Self::Tube,
            SizeKind::Pot => Self::Pot,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowKind {
    Species,
    Source,
    Batch,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let config = load_config(
        cli.database.as_deref(),
        cli.index_prefix.as_deref(),
        |name| std::env::var(name).ok(),
    )?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.database)?;
    match cli.command {
        Command::CreateIndexes => {
            for name in create_all_indexes(&conn, &config.index_prefix)? {
                println!("{name}");
            }
            Ok(())
        }
        Command::DeleteIndexes { prefix } => delete_indexes(&conn, &prefix),
        Command::Refresh => Ok(refresh_all_indexes(&conn, &config.index_prefix)?),
        Command::Count { index } => {
            let count = SqliteDocumentStore::new(&conn, config.index_name(&index)).count()?;
            println!("{count}");
            Ok(())
        }
        Command::AddNursery { name } => with_service(&conn, &config, |service| {
            println!("{}", service.add_nursery(&name)?);
            Ok(())
        }),
        Command::AddProgram { name } => with_service(&conn, &config, |service| {
            println!("{}", service.add_program(&name)?);
            Ok(())
        }),
        Command::AddSpecies { scientific_name } => with_service(&conn, &config, |service| {
            println!("{}", service.add_species(&scientific_name)?);
            Ok(())
        }),
        Command::RenameSpecies {
            reference,
            new_name,
        } => with_service(&conn, &config, |service| {
            Ok(service.rename_species(&reference, &new_name)?)
        }),
        Command::AddBatch {
            source_reference,
            batch_type,
        } => with_service(&conn, &config, |service| {
            println!("{}", service.add_batch(&source_reference, batch_type.into())?);
            Ok(())
        }),
        Command::AddStock {
            batch_reference,
            species_reference,
            quantity,
            size,
        } => with_service(&conn, &config, |service| {
            Ok(service.add_stock(&batch_reference, &species_reference, quantity, size.into())?)
        }),
        Command::Show { kind, reference } => with_service(&conn, &config, |service| {
            let json = match kind {
                ShowKind::Species => serde_json::to_string_pretty(&service.species(&reference)?)?,
                ShowKind::Source => {
                    serde_json::to_string_pretty(&service.source_of_stock(&reference)?)?
                }
                ShowKind::Batch => serde_json::to_string_pretty(&service.batch(&reference)?)?,
            };
            println!("{json}");
            Ok(())
        }),
    }
}

/// Builds the config with command line values taking precedence over the
/// environment, so a flag masks a bad variable of the same setting.
fn load_config(
    database: Option<&Path>,
    index_prefix: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    Config::from_lookup(|name| match name {
        DATABASE_VAR if database.is_some() => {
            database.map(|path| path.to_string_lossy().into_owned())
        }
        INDEX_PREFIX_VAR if index_prefix.is_some() => index_prefix.map(str::to_string),
        _ => env(name),
    })
}

fn delete_indexes(conn: &Connection, prefix: &str) -> CliResult {
    for name in list_indexes(conn)?
        .into_iter()
        .filter(|name| name.starts_with(prefix))
    {
        SqliteLifecycle::new(conn, name.as_str(), Mappings::dynamic()).delete()?;
        info!("event=cli_index_delete module=cli status=ok index={name}");
        println!("{name}");
    }
    Ok(())
}

/// Runs `work` against a service over the configured aggregate indexes.
fn with_service(
    conn: &Connection,
    config: &Config,
    work: impl FnOnce(&mut NurseryService<'_>) -> CliResult,
) -> CliResult {
    let sources = SqliteDocumentStore::new(conn, config.index_name(SOURCE_OF_STOCK_INDEX));
    let species = SqliteDocumentStore::new(conn, config.index_name(SPECIES_INDEX));
    let batches = SqliteDocumentStore::new(conn, config.index_name(BATCH_INDEX));
    let mut service = NurseryService::new(UnitOfWork::from_stores(&sources, &species, &batches));
    work(&mut service)
}
