mod cli;
mod config;
mod secrets;

use std::{future::Future, path::PathBuf, sync::Arc};

use crate::cli::ConfigCommand;
use authinfo_core::CredentialStore;
use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point: one command, then exit. Errors become a non-zero status.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    block_on_detached(run(cli))
}

async fn run(cli: cli::Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    match cli.command {
        cli::Command::Get { aliases } => run_get(aliases, &config, cli.store).await?,
        cli::Command::List => run_list(&config, cli.store).await?,
        cli::Command::Check => run_check(&config, cli.store).await?,
        cli::Command::Providers => print_providers(&config),
        cli::Command::Version => print_version(),
        cli::Command::Config(ConfigCommand::Init) => init_config(cli.config)?,
    }

    Ok(())
}

/// Drive `future` to completion without waiting on leftover blocking tasks.
/// A timed-out decrypt keeps its worker thread; shutting down in the
/// background lets the process exit instead of waiting for gpg.
fn block_on_detached<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(future);
    runtime.shutdown_background();
    result
}

fn init_tracing() {
    // stdout carries secrets; diagnostics go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("authinfo {}", env!("CARGO_PKG_VERSION"));
}

async fn run_get(
    aliases: Vec<String>,
    config: &config::Config,
    store: Option<PathBuf>,
) -> Result<()> {
    let source = secrets::secret_source(config, store);
    let found = secrets::fetch_secrets(source, aliases, config.timeout()).await?;
    for secret in &found {
        println!("{}", secret.expose_secret());
    }
    Ok(())
}

async fn load_store(config: &config::Config, store: Option<PathBuf>) -> Result<CredentialStore> {
    let reader = Arc::new(secrets::production_reader(config, store));
    secrets::fetch_store(reader, config.timeout()).await
}

async fn run_list(config: &config::Config, store: Option<PathBuf>) -> Result<()> {
    let store = load_store(config, store).await?;
    print!("{}", render_listing(&store));
    if let Some(note) = skipped_note(&store) {
        eprintln!("{note}");
    }
    Ok(())
}

/// Decrypts and parses the store without resolving anything.
async fn run_check(config: &config::Config, store: Option<PathBuf>) -> Result<()> {
    let store = load_store(config, store).await?;
    println!(
        "Store: ok ({} entries, {} skipped)",
        store.len(),
        store.skipped_lines().len()
    );
    if let Some(note) = skipped_note(&store) {
        eprintln!("{note}");
    }
    Ok(())
}

fn print_providers(config: &config::Config) {
    let options = secrets::reader_options(config, None);
    for name in options.providers.names() {
        println!("{name}");
    }
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config::default_path()?,
    };
    let path = config::write_if_missing(&config::Config::with_defaults(), &path)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

/// One `host<TAB>login` line per record; secrets are never rendered.
fn render_listing(store: &CredentialStore) -> String {
    store
        .iter()
        .filter_map(|record| {
            record
                .host()
                .map(|host| format!("{host}\t{}\n", record.login_value))
        })
        .collect()
}

fn skipped_note(store: &CredentialStore) -> Option<String> {
    let lines = store.skipped_lines();
    if lines.is_empty() {
        return None;
    }
    let numbers: Vec<String> = lines.iter().map(|n| n.to_string()).collect();
    Some(format!(
        "warning: ignored malformed machine entries on line(s) {}",
        numbers.join(", ")
    ))
}
