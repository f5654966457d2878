use std::{path::PathBuf, sync::Arc, time::Duration};

use authinfo_core::{CredentialStore, Decryptor, ProviderAllowList, SecretString};
use authinfo_gpg::{GpgDecryptor, GpgSettings};
use authinfo_reader::{AuthinfoReader, CachedReader, ReaderOptions, SecretSource};
use color_eyre::Result;
use tracing::debug;

use crate::config::Config;

/// Reader options from config, with an optional store override from the CLI.
pub fn reader_options(config: &Config, store_override: Option<PathBuf>) -> ReaderOptions {
    let defaults = ReaderOptions::default();
    ReaderOptions {
        store_path: store_override
            .or_else(|| config.store_path.clone())
            .unwrap_or(defaults.store_path),
        providers: config
            .providers
            .as_ref()
            .map(|names| ProviderAllowList::new(names.iter().cloned()))
            .unwrap_or(defaults.providers),
        match_policy: config.match_policy.unwrap_or_default(),
    }
}

pub fn gpg_settings(config: &Config) -> GpgSettings {
    let defaults = GpgSettings::default();
    let gpg = config.gpg.clone().unwrap_or_default();
    GpgSettings {
        program: gpg.program.unwrap_or(defaults.program),
        args: gpg.args.unwrap_or(defaults.args),
    }
}

/// Build the production reader backed by the user's gpg-agent.
pub fn production_reader(
    config: &Config,
    store_override: Option<PathBuf>,
) -> AuthinfoReader<GpgDecryptor> {
    let options = reader_options(config, store_override);
    let settings = gpg_settings(config);
    debug!(store = %options.store_path.display(), program = %settings.program, "building reader");
    AuthinfoReader::new(GpgDecryptor::new(settings), options)
}

/// Run a blocking, decrypt-bearing closure, bounded by `timeout` when set.
pub async fn with_timeout<T, F>(timeout: Option<Duration>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            color_eyre::eyre::eyre!("decryption timed out after {limit:?}")
        })?,
        None => task.await,
    };
    joined.map_err(|e| color_eyre::eyre::eyre!("decrypt task failed: {e}"))?
}

/// Resolve each alias in order; stops at the first failure.
pub async fn fetch_secrets<S>(
    source: Arc<S>,
    aliases: Vec<String>,
    timeout: Option<Duration>,
) -> Result<Vec<SecretString>>
where
    S: SecretSource + ?Sized + 'static,
{
    with_timeout(timeout, move || {
        let mut secrets = Vec::with_capacity(aliases.len());
        for alias in &aliases {
            secrets.push(source.get_secret(alias)?);
        }
        Ok(secrets)
    })
    .await
}

/// A `SecretSource` from config: cached when `cache_ttl_secs` is set.
pub fn secret_source(
    config: &Config,
    store_override: Option<PathBuf>,
) -> Arc<dyn SecretSource> {
    let reader = production_reader(config, store_override);
    match config.cache_ttl() {
        Some(ttl) => Arc::new(CachedReader::new(reader, ttl)),
        None => Arc::new(reader),
    }
}

pub async fn fetch_store<D>(
    reader: Arc<AuthinfoReader<D>>,
    timeout: Option<Duration>,
) -> Result<CredentialStore>
where
    D: Decryptor + 'static,
{
    with_timeout(timeout, move || Ok(reader.load_store()?)).await
}
