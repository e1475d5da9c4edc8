mod cli;
mod error;
mod logging;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use gutensync_config::Config;
use gutensync_extract::models::Record;
use gutensync_library::{ExistenceStrategy, RdfExtractor, Synchronizer, read_record};
use gutensync_store::StoreHandle;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return ExitCode::FAILURE;
        },
    };
    logging::init(&config.sync.log_level, cli.verbose);
    match Config::source_file(cli.config.as_deref()) {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded configuration file"),
        _ => tracing::debug!("No configuration file; using defaults and environment"),
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Sync { root, preload, json } => {
            with_store(&config, |store| sync(store, &config, root, preload, json)).await
        },
        Command::Show { id, root, json } => show(&config, root, &id, json).await,
        Command::Get { ids, json } => with_store(&config, |store| get(store, ids, json)).await,
        Command::List { json } => with_store(&config, |store| list(store, json)).await,
        Command::Delete { id } => with_store(&config, |store| delete(store, id)).await,
    }
}

/// Opens the configured store, runs `f` against it, and closes it again
/// whatever `f` returned.
async fn with_store<F, Fut>(config: &Config, f: F) -> Result<()>
where
    F: FnOnce(StoreHandle) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    config.ensure_database_dir().or_raise(|| ErrorKind::Config)?;
    let store = gutensync_store::open(&config.database).await.or_raise(|| ErrorKind::Store)?;
    tracing::debug!(backend = store.name(), "Catalog store open");
    let outcome = f(Arc::clone(&store)).await;
    store.close().await;
    outcome
}

async fn sync(store: StoreHandle, config: &Config, root: Option<PathBuf>, preload: bool, json: bool) -> Result<()> {
    let root = catalog_root(config, root.as_deref())?;
    let strategy = if preload { ExistenceStrategy::Preload } else { config.sync.existence };
    let result = Synchronizer::new(store)
        .with_scheme(config.catalog.scheme())
        .with_strategy(strategy)
        .run(root)
        .await
        .or_raise(|| ErrorKind::Sync)?;
    if json {
        let output = serde_json::to_string_pretty(&result).or_raise(|| ErrorKind::Output)?;
        println!("{output}");
    } else {
        println!("{result}");
    }
    Ok(())
}

async fn show(config: &Config, root: Option<PathBuf>, id: &str, json: bool) -> Result<()> {
    let root = catalog_root(config, root.as_deref())?;
    let record = read_record(root, &config.catalog.scheme(), &RdfExtractor, id)
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    print_records(&[record], json)
}

async fn get(store: StoreHandle, ids: Vec<String>, json: bool) -> Result<()> {
    let records = store.get_many(&ids).await.or_raise(|| ErrorKind::Store)?;
    for id in ids.iter().filter(|id| !records.iter().any(|r| &r.id == *id)) {
        tracing::warn!(id, "No stored record");
    }
    if records.is_empty() {
        exn::bail!(ErrorKind::NotFound(ids.join(", ")));
    }
    print_records(&records, json)
}

async fn list(store: StoreHandle, json: bool) -> Result<()> {
    let records = store.list().await.or_raise(|| ErrorKind::Store)?;
    print_records(&records, json)
}

async fn delete(store: StoreHandle, id: String) -> Result<()> {
    if !store.delete(&id).await.or_raise(|| ErrorKind::Store)? {
        exn::bail!(ErrorKind::NotFound(id));
    }
    println!("Deleted {id}");
    Ok(())
}

/// The `--root` override, else the configured catalog root.
fn catalog_root<'a>(config: &'a Config, root: Option<&'a Path>) -> Result<&'a Path> {
    match root {
        Some(root) => Ok(root),
        None => config.catalog_root().or_raise(|| ErrorKind::Config),
    }
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(records).or_raise(|| ErrorKind::Output)?;
        println!("{output}");
    } else {
        records.iter().for_each(|record| println!("{record}"));
    }
    Ok(())
}
