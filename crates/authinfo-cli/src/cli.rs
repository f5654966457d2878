use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "authinfo",
    about = "Read API secrets from a GPG-encrypted authinfo file",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Config file to load instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Encrypted store to read (overrides `store_path` from config).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the secret for each provider alias (e.g. `openai`), one per line.
    Get {
        #[arg(required = true)]
        aliases: Vec<String>,
    },
    /// List hosts and logins in the store (secrets are never shown).
    List,
    /// Decrypt and parse the store, reporting entry counts.
    Check,
    /// Print the configured provider allow-list.
    Providers,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
