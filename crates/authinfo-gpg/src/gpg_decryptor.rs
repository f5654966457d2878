use std::{
    fs::File,
    io::ErrorKind,
    path::Path,
    process::{Command, Output, Stdio},
};

use authinfo_core::{paths::expand_home, DecryptError, Decryptor, Plaintext};
use tracing::{debug, instrument};
use zeroize::Zeroize;

/// Arguments passed to `gpg` when none are configured. The agent supplies the
/// key; pinentry may still prompt if the cached passphrase has expired.
pub const DEFAULT_GPG_ARGS: [&str; 4] = ["--batch", "--quiet", "--no-tty", "--decrypt"];

/// Settings for the external decryption agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpgSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for GpgSettings {
    fn default() -> Self {
        Self {
            program: "gpg".to_string(),
            args: DEFAULT_GPG_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Decrypts by streaming the store file into a `gpg` process on stdin and
/// collecting stdout. Blocks for as long as the agent does.
#[derive(Debug, Clone, Default)]
pub struct GpgDecryptor {
    settings: GpgSettings,
}

impl GpgDecryptor {
    pub fn new(settings: GpgSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GpgSettings {
        &self.settings
    }

    fn run_agent(&self, file: File) -> Result<Output, DecryptError> {
        Command::new(&self.settings.program)
            .args(&self.settings.args)
            .stdin(Stdio::from(file))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| DecryptError::AgentLaunch {
                program: self.settings.program.clone(),
                reason: err.to_string(),
            })
    }
}

impl Decryptor for GpgDecryptor {
    #[instrument(skip_all, fields(path = %path.display(), program = %self.settings.program))]
    fn decrypt(&self, path: &Path) -> Result<Plaintext, DecryptError> {
        let path = expand_home(path)?;
        let file = open_store(&path)?;

        // The handle moves into the child's stdin and is closed when `output` returns.
        let Output {
            status,
            mut stdout,
            stderr,
        } = self.run_agent(file)?;

        if !status.success() {
            stdout.zeroize();
            let diagnostic = agent_diagnostic(&stderr, status.code());
            debug!(code = ?status.code(), "decryption agent reported failure");
            return Err(DecryptError::Decrypt { diagnostic });
        }

        let plaintext = Plaintext::from_utf8(stdout).map_err(|offset| DecryptError::Decrypt {
            diagnostic: format!("decrypted content is not valid UTF-8 (at byte {offset})"),
        })?;
        debug!(bytes = plaintext.len(), "store decrypted");
        Ok(plaintext)
    }
}

fn open_store(path: &Path) -> Result<File, DecryptError> {
    File::open(path).map_err(|err| DecryptError::FileAccess {
        path: path.to_path_buf(),
        reason: match err.kind() {
            ErrorKind::NotFound => "file does not exist".to_string(),
            ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => err.to_string(),
        },
    })
}

fn agent_diagnostic(stderr: &[u8], code: Option<i32>) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    match (text.is_empty(), code) {
        (false, _) => text.to_string(),
        (true, Some(code)) => format!("agent exited with status {code}"),
        (true, None) => "agent terminated by signal".to_string(),
    }
}
