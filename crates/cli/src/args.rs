use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use skuforge_catalog::CompositionMode;

#[derive(Debug, Parser)]
#[command(name = "skuforge")]
#[command(version = "0.1.0")]
#[command(about = "Compose, register, import and export SKU codes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Where SKUs live: a local SQLite file or the registry API
    #[arg(long, global = true, env = "SKUFORGE_STORE", default_value = "local", value_enum)]
    pub store: StoreMode,

    /// Base URL of the registry API (remote store)
    #[arg(long, global = true, env = "SKUFORGE_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Bearer token for the registry API (remote store)
    #[arg(long, global = true, env = "SKUFORGE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQLite file for the local store (defaults to the user data directory)
    #[arg(long, global = true, env = "SKUFORGE_LOCAL_DB")]
    pub db: Option<PathBuf>,

    /// Vocabulary JSON file for local composition
    #[arg(long, global = true, env = "SKU_VOCABULARY_FILE")]
    pub vocabulary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreMode {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Product,
    Corporate,
}

impl From<ModeArg> for CompositionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Product => CompositionMode::Product,
            ModeArg::Corporate => CompositionMode::Corporate,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the stone/metal/product/client vocabularies
    Vocabulary,

    /// Compose a code from vocabulary tokens and register it
    Compose {
        #[arg(long)]
        stone: String,
        #[arg(long)]
        metal: String,
        #[arg(long)]
        product: String,
        #[arg(long, default_value = "product", value_enum)]
        mode: ModeArg,
        /// Corporate client token (corporate mode only)
        #[arg(long)]
        client: Option<String>,
        /// Free-form trailing segment
        #[arg(long)]
        suffix: Option<String>,
        /// Print the code without registering it
        #[arg(long)]
        dry_run: bool,
    },

    /// Register a code as typed
    Add { code: String },

    /// List registered codes, most recent first
    List,

    /// Delete a record by id (deleting an unknown id is not an error)
    Delete { id: String },

    /// Bulk import codes from the first column of a CSV file
    Import { file: PathBuf },

    /// Write all records to CSV (defaults to SKU_List_<date>.csv)
    Export { path: Option<PathBuf> },

    /// Total, duplicate and unique counts
    Stats,

    /// Obtain a bearer token (remote store only)
    Login(AccountArgs),

    /// Create an account (remote store only)
    Register(AccountArgs),
}

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "SKUFORGE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compose_flags_parse() {
        let cli = Cli::try_parse_from([
            "skuforge", "--store", "remote", "compose", "--stone", "A", "--metal", "BR", "--product", "NL",
            "--mode", "corporate", "--client", "HBL",
        ])
        .unwrap();

        assert_eq!(cli.store, StoreMode::Remote);
        match cli.command {
            Command::Compose { mode, client, dry_run, .. } => {
                assert_eq!(CompositionMode::from(mode), CompositionMode::Corporate);
                assert_eq!(client.as_deref(), Some("HBL"));
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
