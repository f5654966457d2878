//! Production decryptor for authinfo stores: delegates to an external `gpg`
//! process backed by the user's running gpg-agent.

pub mod gpg_decryptor;

pub use gpg_decryptor::{GpgDecryptor, GpgSettings, DEFAULT_GPG_ARGS};
