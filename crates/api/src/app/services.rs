use std::sync::Arc;

use anyhow::Context;

use skuforge_auth::{Hs256TokenIssuer, TokenIssuer};
use skuforge_catalog::VocabularySet;
use skuforge_infra::{
    AppConfig, InMemorySkuStore, InMemoryUserDirectory, SkuStore, SqliteSkuStore, SqliteUserDirectory, StoreKind,
    UserDirectory,
};

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    pub skus: Arc<dyn SkuStore>,
    pub users: Arc<dyn UserDirectory>,
    pub vocabulary: VocabularySet,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppServices {
    /// Process-lifetime stores with the standard vocabulary.
    pub fn in_memory(tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            skus: Arc::new(InMemorySkuStore::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
            vocabulary: VocabularySet::standard(),
            tokens,
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let vocabulary = config.load_vocabulary().context("failed to load vocabulary")?;
    let tokens: Arc<dyn TokenIssuer> = Arc::new(Hs256TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl));

    let (skus, users): (Arc<dyn SkuStore>, Arc<dyn UserDirectory>) = match config.store {
        StoreKind::Memory => (Arc::new(InMemorySkuStore::new()), Arc::new(InMemoryUserDirectory::new())),
        StoreKind::Sqlite => {
            let skus = SqliteSkuStore::open(&config.sqlite_path)
                .await
                .with_context(|| format!("failed to open sqlite store at {:?}", config.sqlite_path))?;
            let users = SqliteUserDirectory::new(skus.pool().clone())
                .await
                .context("failed to prepare users table")?;
            (Arc::new(skus), Arc::new(users))
        }
    };

    tracing::info!(store = ?config.store, "sku store ready");

    Ok(AppServices {
        skus,
        users,
        vocabulary,
        tokens,
    })
}
