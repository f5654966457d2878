use std::path::{Path, PathBuf};

use crate::decrypt::DecryptError;

/// Store location used when nothing is configured.
pub const DEFAULT_STORE_PATH: &str = "~/.authinfo.gpg";

/// Expand a leading `~` to the caller's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf, DecryptError> {
    expand_with(path, dirs::home_dir())
}

fn expand_with(path: &Path, home: Option<PathBuf>) -> Result<PathBuf, DecryptError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = home.ok_or_else(|| DecryptError::FileAccess {
        path: path.to_path_buf(),
        reason: "home directory is not available".to_string(),
    })?;
    if rest.as_os_str().is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// `~/.authinfo.gpg`, unexpanded.
pub fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tilde_prefix() {
        let home = Some(PathBuf::from("/home/alice"));
        let out = expand_with(Path::new("~/.authinfo.gpg"), home).expect("expand");
        assert_eq!(out, PathBuf::from("/home/alice/.authinfo.gpg"));
    }

    #[test]
    fn bare_tilde_is_home() {
        let out = expand_with(Path::new("~"), Some(PathBuf::from("/home/alice"))).expect("expand");
        assert_eq!(out, PathBuf::from("/home/alice"));
    }

    #[test]
    fn leaves_other_paths_alone() {
        let out = expand_with(Path::new("/etc/authinfo.gpg"), None).expect("absolute");
        assert_eq!(out, PathBuf::from("/etc/authinfo.gpg"));
        let out = expand_with(Path::new("~user/file"), None).expect("named home is not expanded");
        assert_eq!(out, PathBuf::from("~user/file"));
    }

    #[test]
    fn missing_home_is_file_access_error() {
        let err = expand_with(Path::new("~/.authinfo.gpg"), None).expect_err("no home");
        assert!(matches!(err, DecryptError::FileAccess { .. }));
    }
}
