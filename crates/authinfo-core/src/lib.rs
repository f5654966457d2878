//! Core types for reading a GPG-encrypted authinfo credential store:
//! record model, line parser, alias resolver and the decryptor contract.
//! Concrete decryptors live in `authinfo-gpg`.

pub mod decrypt;
pub mod paths;
pub mod resolve;
pub mod secret;
pub mod store;

pub use decrypt::{DecryptError, Decryptor, InMemoryDecryptor};
pub use resolve::{resolve, MatchPolicy, ProviderAllowList, ResolveError};
pub use secret::{Plaintext, SecretString};
pub use store::{parse, CredentialRecord, CredentialStore, ScopeKind};
