use std::{
    fs,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant, SystemTime},
};

use authinfo_core::{paths::expand_home, CredentialStore, Decryptor, SecretString};
use tracing::{debug, instrument};

use crate::{AuthinfoReader, ReaderError, SecretSource};

struct CachedStore {
    store: CredentialStore,
    loaded_at: Instant,
    modified: Option<SystemTime>,
}

/// Keeps the parsed store in memory for at most `ttl`, and only while the
/// file's modification time is unchanged. Dropping an entry zeroes its secrets.
pub struct CachedReader<D: Decryptor> {
    reader: AuthinfoReader<D>,
    ttl: Duration,
    entry: Mutex<Option<CachedStore>>,
}

impl<D: Decryptor> CachedReader<D> {
    pub fn new(reader: AuthinfoReader<D>, ttl: Duration) -> Self {
        Self {
            reader,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Drop any cached store now.
    pub fn invalidate(&self) {
        self.lock().take();
    }

    pub fn is_cached(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedStore>> {
        // A panic mid-update leaves nothing worth keeping.
        self.entry.lock().unwrap_or_else(|poisoned| {
            self.entry.clear_poison();
            let mut guard = PoisonError::into_inner(poisoned);
            guard.take();
            guard
        })
    }

    fn store_mtime(&self) -> Option<SystemTime> {
        let path = expand_home(self.reader.store_path()).ok()?;
        fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    fn is_fresh(&self, cached: &CachedStore, modified: Option<SystemTime>) -> bool {
        cached.loaded_at.elapsed() < self.ttl
            && cached.modified.is_some()
            && cached.modified == modified
    }
}

impl<D: Decryptor> SecretSource for CachedReader<D> {
    #[instrument(skip(self))]
    fn get_secret(&self, alias: &str) -> Result<SecretString, ReaderError> {
        self.reader.options().providers.check(alias)?;

        let modified = self.store_mtime();
        let mut guard = self.lock();
        let cached = match guard.take() {
            Some(cached) if self.is_fresh(&cached, modified) => {
                debug!("using cached store");
                cached
            }
            stale => {
                // Zero the stale store before decrypting a new one.
                drop(stale);
                CachedStore {
                    store: self.reader.load_store()?,
                    loaded_at: Instant::now(),
                    modified,
                }
            }
        };

        let secret = self.reader.lookup(&cached.store, alias);
        *guard = Some(cached);
        Ok(secret?)
    }
}
