//! `get_secret(alias)` over an encrypted authinfo store: allow-list gate,
//! decrypt, parse, resolve. Each call starts from the file unless the caller
//! opts into [`CachedReader`].

pub mod cache;

use std::path::{Path, PathBuf};

use authinfo_core::{
    parse, paths::default_store_path, resolve, CredentialStore, DecryptError, Decryptor,
    MatchPolicy, ProviderAllowList, ResolveError, SecretString,
};
use thiserror::Error;
use tracing::{instrument, warn};

pub use cache::CachedReader;

/// Failure returned to orchestration callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// The one contract exposed to callers: alias in, secret or typed failure out.
pub trait SecretSource: Send + Sync {
    fn get_secret(&self, alias: &str) -> Result<SecretString, ReaderError>;
}

/// Options shared by every reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub store_path: PathBuf,
    pub providers: ProviderAllowList,
    pub match_policy: MatchPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            providers: ProviderAllowList::default(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Stateless reader; every call re-reads and re-decrypts the store.
pub struct AuthinfoReader<D: Decryptor> {
    decryptor: D,
    options: ReaderOptions,
}

impl<D: Decryptor> AuthinfoReader<D> {
    pub fn new(decryptor: D, options: ReaderOptions) -> Self {
        Self { decryptor, options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn store_path(&self) -> &Path {
        &self.options.store_path
    }

    /// Decrypt and parse the whole store. The plaintext is zeroed before
    /// this returns; the store zeroes its secrets when dropped.
    #[instrument(skip_all, fields(path = %self.options.store_path.display()))]
    pub fn load_store(&self) -> Result<CredentialStore, DecryptError> {
        let plaintext = self.decryptor.decrypt(&self.options.store_path)?;
        let store = parse(plaintext.as_str());
        drop(plaintext);

        if !store.skipped_lines().is_empty() {
            warn!(
                lines = ?store.skipped_lines(),
                "ignored malformed machine entries"
            );
        }
        Ok(store)
    }

    /// Resolve against an already loaded store.
    pub fn lookup(
        &self,
        store: &CredentialStore,
        alias: &str,
    ) -> Result<SecretString, ResolveError> {
        resolve(
            store,
            alias,
            &self.options.providers,
            self.options.match_policy,
        )
        .cloned()
    }
}

impl<D: Decryptor> SecretSource for AuthinfoReader<D> {
    #[instrument(skip(self))]
    fn get_secret(&self, alias: &str) -> Result<SecretString, ReaderError> {
        self.options.providers.check(alias)?;
        let store = self.load_store()?;
        Ok(self.lookup(&store, alias)?)
    }
}
