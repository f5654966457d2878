use tracing::instrument;

use crate::secret::SecretString;

const MACHINE: &str = "machine";
const DEFAULT: &str = "default";
const LOGIN: &str = "login";
const PASSWORD: &str = "password";

/// Literal first token of an authinfo line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Machine,
    Default,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Machine => MACHINE,
            ScopeKind::Default => DEFAULT,
        }
    }
}

/// One parsed `machine <host> login <id> password <secret>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub scope_kind: ScopeKind,
    /// Host or service identifier; `None` for `default` scope.
    pub scope_value: Option<String>,
    pub login_value: String,
    pub secret_value: SecretString,
}

impl CredentialRecord {
    pub fn machine(
        host: impl Into<String>,
        login: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            scope_kind: ScopeKind::Machine,
            scope_value: Some(host.into()),
            login_value: login.into(),
            secret_value: SecretString::new(secret),
        }
    }

    /// Host for `machine` records, `None` otherwise.
    pub fn host(&self) -> Option<&str> {
        match self.scope_kind {
            ScopeKind::Machine => self.scope_value.as_deref(),
            ScopeKind::Default => None,
        }
    }
}

/// Parsed store in file order. Dropping it zeroes every secret it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    records: Vec<CredentialRecord>,
    skipped_lines: Vec<usize>,
}

impl CredentialStore {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self {
            records,
            skipped_lines: Vec::new(),
        }
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 1-based line numbers of `machine` lines that did not fit the grammar.
    pub fn skipped_lines(&self) -> &[usize] {
        &self.skipped_lines
    }
}

/// Parse decrypted authinfo text.
///
/// Only lines that start with the token `machine` (no leading whitespace) are
/// considered; blank, comment, indented and `default` lines are ignored. A
/// `machine` line must have exactly six tokens with `login` and `password` in
/// positions three and five, or it is dropped and its line number recorded.
/// Never fails.
#[instrument(skip_all, fields(bytes = plaintext.len()))]
pub fn parse(plaintext: &str) -> CredentialStore {
    let mut store = CredentialStore::default();

    for (index, line) in plaintext.lines().enumerate() {
        if !line.starts_with(MACHINE) {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() != Some(&MACHINE) {
            continue;
        }
        match parse_machine_tokens(&tokens) {
            Some(record) => store.records.push(record),
            None => store.skipped_lines.push(index + 1),
        }
    }

    if !store.skipped_lines.is_empty() {
        tracing::debug!(
            skipped = store.skipped_lines.len(),
            "dropped malformed machine lines"
        );
    }
    store
}

fn parse_machine_tokens(tokens: &[&str]) -> Option<CredentialRecord> {
    match tokens {
        [_, host, login_kw, login, password_kw, secret]
            if *login_kw == LOGIN && *password_kw == PASSWORD =>
        {
            Some(CredentialRecord::machine(*host, *login, *secret))
        }
        _ => None,
    }
}
