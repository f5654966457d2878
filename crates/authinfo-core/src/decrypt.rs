use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use thiserror::Error;

use crate::secret::Plaintext;

/// Errors produced by decryptor implementations.
///
/// Messages carry paths and agent diagnostics only, never ciphertext or
/// decrypted content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecryptError {
    /// Store file is missing or unreadable.
    #[error("cannot read credential store {}: {reason}", path.display())]
    FileAccess { path: PathBuf, reason: String },
    /// The decryption agent could not be started.
    #[error("failed to launch decryption agent `{program}`: {reason}")]
    AgentLaunch { program: String, reason: String },
    /// The agent ran and reported failure.
    #[error("decryption failed: {diagnostic}")]
    Decrypt { diagnostic: String },
}

/// Turns an encrypted file into plaintext. Implementations block until the
/// agent returns and must not retry on failure.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, path: &Path) -> Result<Plaintext, DecryptError>;
}

impl<D: Decryptor + ?Sized> Decryptor for &D {
    fn decrypt(&self, path: &Path) -> Result<Plaintext, DecryptError> {
        (**self).decrypt(path)
    }
}

impl<D: Decryptor + ?Sized> Decryptor for Arc<D> {
    fn decrypt(&self, path: &Path) -> Result<Plaintext, DecryptError> {
        (**self).decrypt(path)
    }
}

/// Decryptor with canned output for tests and dry runs. Counts invocations so
/// callers can assert that no decryption was attempted.
#[derive(Debug)]
pub struct InMemoryDecryptor {
    outcome: Result<String, DecryptError>,
    calls: AtomicUsize,
}

impl InMemoryDecryptor {
    pub fn with_plaintext(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(diagnostic: impl Into<String>) -> Self {
        Self::with_error(DecryptError::Decrypt {
            diagnostic: diagnostic.into(),
        })
    }

    pub fn with_error(err: DecryptError) -> Self {
        Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decryptor for InMemoryDecryptor {
    fn decrypt(&self, _path: &Path) -> Result<Plaintext, DecryptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(text) => Ok(Plaintext::new(text.clone())),
            Err(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_returns_plaintext_and_counts_calls() {
        let decryptor = InMemoryDecryptor::with_plaintext("machine a login b password c");
        let path = Path::new("/unused");

        let first = decryptor.decrypt(path).expect("decrypt");
        let _second = decryptor.decrypt(path).expect("decrypt again");

        assert_eq!(first.as_str(), "machine a login b password c");
        assert_eq!(decryptor.calls(), 2);
    }

    #[test]
    fn in_memory_failure_repeats_error() {
        let decryptor = InMemoryDecryptor::failing("gpg: decryption failed: No secret key");
        let err = decryptor.decrypt(Path::new("/unused")).expect_err("fails");
        assert_eq!(
            err.to_string(),
            "decryption failed: gpg: decryption failed: No secret key"
        );
    }

    #[test]
    fn file_access_error_names_path() {
        let err = DecryptError::FileAccess {
            path: PathBuf::from("/home/u/.authinfo.gpg"),
            reason: "No such file or directory".into(),
        };
        assert!(err.to_string().contains("/home/u/.authinfo.gpg"));
    }
}
