use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A credential value that is zeroed when dropped and never printed.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Borrow the raw secret. Callers must not log the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.inner.as_bytes(), other.inner.as_bytes())
    }
}

impl Eq for SecretString {}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Decrypted store contents. Zeroed on drop; only ever borrowed by the parser.
pub struct Plaintext {
    text: Zeroizing<String>,
}

impl Plaintext {
    pub fn new(text: String) -> Self {
        Self {
            text: Zeroizing::new(text),
        }
    }

    /// Take ownership of raw agent output. On invalid UTF-8 the bytes are
    /// wiped before returning and only the byte offset is reported.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, usize> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(text)),
            Err(err) => {
                let offset = err.utf8_error().valid_up_to();
                let mut bytes = err.into_bytes();
                bytes.zeroize();
                Err(offset)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plaintext")
            .field("len", &self.text.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug_and_display() {
        let secret = SecretString::new("sk-live-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "sk-live-123");
    }

    #[test]
    fn secret_equality_compares_contents() {
        assert_eq!(SecretString::from("abc"), SecretString::from("abc"));
        assert_ne!(SecretString::from("abc"), SecretString::from("abd"));
        assert_ne!(SecretString::from("abc"), SecretString::from("abcd"));
    }

    #[test]
    fn zeroize_clears_secret() {
        let mut secret = SecretString::new("sk-live-123");
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn plaintext_debug_hides_contents() {
        let text = Plaintext::new("machine h login l password hunter2".into());
        let rendered = format!("{text:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("len"));
    }

    #[test]
    fn plaintext_rejects_invalid_utf8_with_offset_only() {
        let err = Plaintext::from_utf8(vec![b'o', b'k', 0xff, 0xfe]).expect_err("invalid utf8");
        assert_eq!(err, 2);
    }
}
