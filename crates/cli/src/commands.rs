use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;

use skuforge_auth::Credentials;
use skuforge_catalog::{csv, CodeComponents, VocabularySet};
use skuforge_core::SkuId;
use skuforge_infra::{RemoteSkuStore, SkuStore, SqliteSkuStore};

use crate::args::{AccountArgs, Cli, Command, StoreMode};
use crate::output;

/// Execute one parsed command, writing user-facing output to `out`.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    match &cli.command {
        Command::Login(account) => login(&cli, account, out).await,
        Command::Register(account) => register_account(&cli, account, out).await,
        command => {
            let store = open_store(&cli).await?;
            execute(&cli, command, store.as_ref(), out).await
        }
    }
}

async fn execute<W: Write>(cli: &Cli, command: &Command, store: &dyn SkuStore, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Vocabulary => {
            let vocabulary = load_vocabulary(cli).await?;
            write!(out, "{}", output::vocabulary_text(&vocabulary))?;
        }
        Command::Compose {
            stone,
            metal,
            product,
            mode,
            client,
            suffix,
            dry_run,
        } => {
            let mut components = CodeComponents::new(stone, metal, product, (*mode).into());
            components.corporate_client = client.clone();
            components.custom_suffix = suffix.clone();
            let vocabulary = load_vocabulary(cli).await?;

            if *dry_run {
                vocabulary.validate(&components)?;
                writeln!(out, "{}", components.compose()?)?;
            } else {
                let record = store.register_components(&vocabulary, &components, None).await?;
                writeln!(out, "Registered {} ({})", record.code(), record.id_typed())?;
            }
        }
        Command::Add { code } => {
            let record = store.register(code, None).await?;
            writeln!(out, "Registered {} ({})", record.code(), record.id_typed())?;
        }
        Command::List => {
            let records = store.list().await?;
            write!(out, "{}", output::records_table(&records))?;
        }
        Command::Delete { id } => {
            let id: SkuId = id.parse()?;
            store.delete(id).await?;
            writeln!(out, "Deleted {id}")?;
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
            let codes = csv::parse_import(&text).with_context(|| format!("failed to parse {}", file.display()))?;
            let summary = store.import_batch(codes, None).await?;
            write!(out, "{}", output::import_text(&summary))?;
        }
        Command::Export { path } => {
            let records = store.list().await?;
            let text = csv::write_export(&records)?;
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(csv::export_file_name(Utc::now().date_naive())));
            std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "Exported {} SKUs to {}", records.len(), path.display())?;
        }
        Command::Stats => {
            let stats = store.stats().await?;
            write!(out, "{}", output::stats_text(&stats))?;
        }
        Command::Login(_) | Command::Register(_) => bail!("account commands do not take a store"),
    }

    Ok(())
}

async fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn SkuStore>> {
    match cli.store {
        StoreMode::Local => {
            let path = local_db_path(cli)?;
            tracing::debug!(path = %path.display(), "using local sku store");
            let store = SqliteSkuStore::open(&path)
                .await
                .with_context(|| format!("failed to open local store at {}", path.display()))?;
            Ok(Box::new(store))
        }
        StoreMode::Remote => {
            tracing::debug!(api_url = %cli.api_url, "using remote sku store");
            Ok(Box::new(remote_client(cli)))
        }
    }
}

fn remote_client(cli: &Cli) -> RemoteSkuStore {
    match &cli.token {
        Some(token) => RemoteSkuStore::with_token(cli.api_url.clone(), token.clone()),
        None => RemoteSkuStore::new(cli.api_url.clone()),
    }
}

fn local_db_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.db {
        return Ok(path.clone());
    }
    let data_dir = dirs::data_dir().context("no user data directory; pass --db or set SKUFORGE_LOCAL_DB")?;
    Ok(data_dir.join("skuforge").join("skus.db"))
}

/// The vocabulary composition is checked against.
///
/// Remote mode asks the server, so the CLI validates against what the server enforces.
async fn load_vocabulary(cli: &Cli) -> anyhow::Result<VocabularySet> {
    match cli.store {
        StoreMode::Remote => remote_client(cli)
            .vocabulary()
            .await
            .context("fetching the server vocabulary (needs --token or SKUFORGE_TOKEN)"),
        StoreMode::Local => match &cli.vocabulary {
            None => Ok(VocabularySet::standard()),
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
                Ok(VocabularySet::from_json(&text)?)
            }
        },
    }
}

fn require_remote(cli: &Cli, what: &str) -> anyhow::Result<RemoteSkuStore> {
    if cli.store != StoreMode::Remote {
        bail!("{what} needs --store remote");
    }
    Ok(remote_client(cli))
}

async fn login<W: Write>(cli: &Cli, account: &AccountArgs, out: &mut W) -> anyhow::Result<()> {
    let client = require_remote(cli, "login")?;
    let token = client
        .login(&Credentials::new(&account.email, &account.password))
        .await
        .context("login failed")?;
    writeln!(out, "{token}")?;
    Ok(())
}

async fn register_account<W: Write>(cli: &Cli, account: &AccountArgs, out: &mut W) -> anyhow::Result<()> {
    let client = require_remote(cli, "register")?;
    client
        .register_account(&Credentials::new(&account.email, &account.password))
        .await
        .context("registration failed")?;
    writeln!(out, "Registered account {}", account.email)?;
    Ok(())
}
