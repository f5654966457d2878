use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{secret::SecretString, store::CredentialStore};

/// Providers accepted when no explicit list is configured.
pub const DEFAULT_PROVIDERS: [&str; 6] = [
    "anthropic",
    "openai",
    "deepseek",
    "alibaba",
    "google",
    "x.ai",
];

/// Errors produced while resolving an alias against a parsed store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Alias is not in the allow-list; raised before any file access.
    #[error("unknown provider `{alias}`; try one of: {}", allowed.join(", "))]
    UnknownProvider { alias: String, allowed: Vec<String> },
    /// Alias is allowed but no well-formed record matched it.
    #[error("provider `{alias}` not found in credentials")]
    ProviderNotFound { alias: String },
}

/// Ordered, de-duplicated set of provider aliases a caller may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAllowList {
    names: Vec<String>,
}

impl ProviderAllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.names.iter().any(|name| name == alias)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fail fast on aliases outside the list.
    pub fn check(&self, alias: &str) -> Result<(), ResolveError> {
        if self.contains(alias) {
            Ok(())
        } else {
            Err(ResolveError::UnknownProvider {
                alias: alias.to_string(),
                allowed: self.names.clone(),
            })
        }
    }
}

impl Default for ProviderAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDERS)
    }
}

/// How an alias is compared against a record's host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Alias appears anywhere in the host (`openai` matches `api.openai.com`).
    #[default]
    Substring,
    /// Alias equals the host.
    Exact,
    /// Alias equals a run of whole dot-separated host labels.
    Label,
}

impl MatchPolicy {
    pub fn matches(&self, alias: &str, host: &str) -> bool {
        match self {
            MatchPolicy::Substring => host.contains(alias),
            MatchPolicy::Exact => host == alias,
            MatchPolicy::Label => label_match(alias, host),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substring" => Ok(MatchPolicy::Substring),
            "exact" => Ok(MatchPolicy::Exact),
            "label" => Ok(MatchPolicy::Label),
            other => Err(format!(
                "unknown match policy `{other}` (expected substring, exact or label)"
            )),
        }
    }
}

fn label_match(alias: &str, host: &str) -> bool {
    if alias.is_empty() {
        return false;
    }
    let labels: Vec<&str> = host.split('.').collect();
    let wanted: Vec<&str> = alias.split('.').collect();
    labels.windows(wanted.len()).any(|window| window == wanted.as_slice())
}

/// Return the secret of the first `machine` record whose host matches `alias`.
#[instrument(skip_all, fields(alias, records = store.len()))]
pub fn resolve<'a>(
    store: &'a CredentialStore,
    alias: &str,
    allow_list: &ProviderAllowList,
    policy: MatchPolicy,
) -> Result<&'a SecretString, ResolveError> {
    allow_list.check(alias)?;

    store
        .iter()
        .find(|record| {
            record
                .host()
                .is_some_and(|host| policy.matches(alias, host))
        })
        .map(|record| &record.secret_value)
        .ok_or_else(|| ResolveError::ProviderNotFound {
            alias: alias.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{parse, CredentialRecord};

    fn store() -> CredentialStore {
        CredentialStore::new(vec![
            CredentialRecord::machine("api.openai.com", "apikey", "sk-first"),
            CredentialRecord::machine("openai.internal.test", "apikey", "sk-second"),
            CredentialRecord::machine("api.x.ai", "apikey", "xai-key"),
        ])
    }

    #[test]
    fn first_match_wins() {
        let store = store();
        let secret = resolve(
            &store,
            "openai",
            &ProviderAllowList::default(),
            MatchPolicy::default(),
        )
        .expect("openai should resolve");
        assert_eq!(secret.expose_secret(), "sk-first");
    }

    #[test]
    fn unknown_alias_names_allow_list() {
        let store = store();
        let err = resolve(
            &store,
            "not-a-real-provider",
            &ProviderAllowList::default(),
            MatchPolicy::default(),
        )
        .expect_err("alias must be rejected");

        match &err {
            ResolveError::UnknownProvider { alias, allowed } => {
                assert_eq!(alias, "not-a-real-provider");
                assert_eq!(allowed.len(), DEFAULT_PROVIDERS.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("anthropic, openai, deepseek"));
    }

    #[test]
    fn allowed_but_missing_alias_is_not_found() {
        let store = store();
        let err = resolve(
            &store,
            "deepseek",
            &ProviderAllowList::default(),
            MatchPolicy::default(),
        )
        .expect_err("deepseek is absent");
        assert_eq!(
            err,
            ResolveError::ProviderNotFound {
                alias: "deepseek".into()
            }
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let store = parse("machine API.OPENAI.COM login apikey password sk-upper\n");
        let err = resolve(
            &store,
            "openai",
            &ProviderAllowList::default(),
            MatchPolicy::Substring,
        )
        .expect_err("case differs");
        assert!(matches!(err, ResolveError::ProviderNotFound { .. }));
    }

    #[test]
    fn custom_allow_list_replaces_defaults() {
        let store = parse("machine dashscope.aliyuncs.com login apikey password sk-dash\n");
        let allow = ProviderAllowList::new(["dashscope"]);

        let secret =
            resolve(&store, "dashscope", &allow, MatchPolicy::Substring).expect("resolves");
        assert_eq!(secret.expose_secret(), "sk-dash");
        assert!(matches!(
            resolve(&store, "openai", &allow, MatchPolicy::Substring),
            Err(ResolveError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn allow_list_deduplicates_in_order() {
        let allow = ProviderAllowList::new(["b", "a", "b"]);
        assert_eq!(allow.names(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn policies_differ_on_partial_labels() {
        assert!(MatchPolicy::Substring.matches("openai", "notopenai.com"));
        assert!(!MatchPolicy::Label.matches("openai", "notopenai.com"));
        assert!(MatchPolicy::Label.matches("openai", "api.openai.com"));
        assert!(MatchPolicy::Label.matches("x.ai", "api.x.ai"));
        assert!(!MatchPolicy::Label.matches("x.ai", "box.aim.test"));
        assert!(MatchPolicy::Exact.matches("api.x.ai", "api.x.ai"));
        assert!(!MatchPolicy::Exact.matches("x.ai", "api.x.ai"));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("label".parse::<MatchPolicy>(), Ok(MatchPolicy::Label));
        assert!("fuzzy".parse::<MatchPolicy>().is_err());
    }
}
