//! SQLite-backed SKU store.
//!
//! Each mutation runs in one `BEGIN IMMEDIATE` transaction: load the stored
//! records whose case-folded code collides with a candidate, apply the catalog
//! rule to them, insert the accepted records, commit. Within a process an async
//! mutex serializes writers. Across processes the immediate transaction takes
//! SQLite's write lock up front, so a second writer waits (up to the busy
//! timeout) and then sees the first writer's rows.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tokio::sync::Mutex;

use skuforge_catalog::{import_candidates, lookup_key, ImportSummary, Registry, RegistryStats, SkuRecord};
use skuforge_core::{Clock, IdGenerator, PrincipalId, SkuId, SystemClock, UuidV7Generator};

use super::{SkuStore, StoreError};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Keys per `IN (..)` lookup, well under SQLite's bound-parameter limit.
const KEY_CHUNK: usize = 500;

const SELECT_RECORD: &str = "SELECT id, code, issued_at, issued_by FROM skus";

pub struct SqliteSkuStore {
    pool: SqlitePool,
    writer: Mutex<()>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl core::fmt::Debug for SqliteSkuStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqliteSkuStore").field("pool", &self.pool).finish_non_exhaustive()
    }
}

impl SqliteSkuStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::database("create_dir", e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::database("connect", e))?;

        tracing::debug!(path = %path.display(), "opened sqlite sku store");
        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single never-recycled connection keeps it alive.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| StoreError::database("connect", e))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::database("connect", e))?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating or upgrading the `skus` table if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS skus (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT NOT NULL UNIQUE,
                code       TEXT NOT NULL,
                code_key   TEXT NULL,
                issued_at  TEXT NOT NULL,
                issued_by  TEXT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("create_skus_table", e))?;

        let has_key: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('skus') WHERE name = 'code_key'")
                .fetch_one(&pool)
                .await
                .map_err(|e| StoreError::database("inspect_skus_table", e))?;
        if has_key == 0 {
            sqlx::query("ALTER TABLE skus ADD COLUMN code_key TEXT NULL")
                .execute(&pool)
                .await
                .map_err(|e| StoreError::database("add_code_key", e))?;
        }
        backfill_code_keys(&pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS skus_code_key ON skus (code_key)")
            .execute(&pool)
            .await
            .map_err(|e| StoreError::database("create_code_key_index", e))?;

        Ok(Self {
            pool,
            writer: Mutex::new(()),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidV7Generator),
        })
    }

    pub fn with_collaborators(mut self, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        self.clock = clock;
        self.ids = ids;
        self
    }

    /// The underlying pool, for sharing the database file with other tables.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn snapshot(&self) -> Result<Registry, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_RECORD} ORDER BY seq ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database("load_skus", e))?;

        let records = rows.iter().map(record_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Registry::with_records(records, self.clock.clone(), self.ids.clone()))
    }

    /// Stored records whose `code_key` is one of `keys`, in stored order.
    async fn load_colliding(
        &self,
        conn: &mut SqliteConnection,
        keys: &BTreeSet<String>,
    ) -> Result<Vec<SkuRecord>, StoreError> {
        let keys: Vec<&String> = keys.iter().collect();
        let mut records = Vec::new();

        for chunk in keys.chunks(KEY_CHUNK) {
            let mut query = QueryBuilder::<Sqlite>::new(SELECT_RECORD);
            query.push(" WHERE code_key IN (");
            let mut bound = query.separated(", ");
            for key in chunk {
                bound.push_bind((*key).clone());
            }
            bound.push_unseparated(") ORDER BY seq ASC");

            let rows = query
                .build()
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| StoreError::database("load_colliding_skus", e))?;
            for row in &rows {
                records.push(record_from_row(row)?);
            }
        }

        Ok(records)
    }

    /// Apply `apply` to the records colliding with `keys` and persist what it appended.
    async fn mutate<T>(
        &self,
        keys: BTreeSet<String>,
        apply: impl FnOnce(&mut Registry) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError>
    where
        T: Send,
    {
        let _writer = self.writer.lock().await;
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| StoreError::database("begin", e))?;

        let colliding = self.load_colliding(&mut *tx, &keys).await?;
        let mut registry = Registry::with_records(colliding, self.clock.clone(), self.ids.clone());
        let before = registry.len();
        let out = apply(&mut registry)?;

        for record in &registry.records()[before..] {
            sqlx::query("INSERT INTO skus (id, code, code_key, issued_at, issued_by) VALUES (?, ?, ?, ?, ?)")
                .bind(record.id_typed().to_string())
                .bind(record.code())
                .bind(record.identity_key())
                .bind(record.issued_at().to_rfc3339())
                .bind(record.issued_by().map(|p| p.to_string()))
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::database("insert_sku", e))?;
        }

        tx.commit().await.map_err(|e| StoreError::database("commit", e))?;
        Ok(out)
    }
}

/// Fill `code_key` for rows written before the column existed.
async fn backfill_code_keys(pool: &SqlitePool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await.map_err(|e| StoreError::database("begin", e))?;
    let rows = sqlx::query(&format!("{SELECT_RECORD} WHERE code_key IS NULL"))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::database("load_unkeyed_skus", e))?;
    if rows.is_empty() {
        return Ok(());
    }

    for row in &rows {
        let record = record_from_row(row)?;
        sqlx::query("UPDATE skus SET code_key = ? WHERE id = ?")
            .bind(record.identity_key())
            .bind(record.id_typed().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::database("backfill_code_key", e))?;
    }

    tx.commit().await.map_err(|e| StoreError::database("commit", e))?;
    tracing::info!(rows = rows.len(), "backfilled sku code keys");
    Ok(())
}

fn record_from_row(row: &SqliteRow) -> Result<SkuRecord, StoreError> {
    let id: String = row.try_get("id").map_err(|e| StoreError::database("read_row", e))?;
    let code: String = row.try_get("code").map_err(|e| StoreError::database("read_row", e))?;
    let issued_at: String = row.try_get("issued_at").map_err(|e| StoreError::database("read_row", e))?;
    let issued_by: Option<String> = row.try_get("issued_by").map_err(|e| StoreError::database("read_row", e))?;

    let id = SkuId::from_str(&id).map_err(|e| StoreError::Decode(format!("stored sku id: {e}")))?;
    let issued_at = DateTime::parse_from_rfc3339(&issued_at)
        .map_err(|e| StoreError::Decode(format!("stored timestamp '{issued_at}': {e}")))?
        .with_timezone(&Utc);
    let issued_by = issued_by
        .map(|p| PrincipalId::from_str(&p))
        .transpose()
        .map_err(|e| StoreError::Decode(format!("stored principal id: {e}")))?;

    Ok(SkuRecord::restore(id, code, issued_at, issued_by))
}

#[async_trait]
impl SkuStore for SqliteSkuStore {
    async fn list(&self) -> Result<Vec<SkuRecord>, StoreError> {
        Ok(self.snapshot().await?.list_recent())
    }

    #[tracing::instrument(skip(self))]
    async fn register(&self, code: &str, issued_by: Option<PrincipalId>) -> Result<SkuRecord, StoreError> {
        let keys = BTreeSet::from([lookup_key(code)]);
        let record = self
            .mutate(keys, |registry| Ok(registry.register(code, issued_by)?))
            .await?;
        tracing::info!(sku_id = %record.id_typed(), code = record.code(), "sku registered");
        Ok(record)
    }

    #[tracing::instrument(skip(self, raw_codes), fields(candidates = raw_codes.len()))]
    async fn import_batch(
        &self,
        raw_codes: Vec<String>,
        issued_by: Option<PrincipalId>,
    ) -> Result<ImportSummary, StoreError> {
        let keys = import_candidates(&raw_codes).map(|code| lookup_key(&code)).collect();
        let summary = self
            .mutate(keys, move |registry| Ok(registry.import_batch(raw_codes, issued_by)))
            .await?;
        tracing::info!(
            imported = summary.imported_count,
            duplicates = summary.duplicate_count,
            "sku import applied"
        );
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: SkuId) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let result = sqlx::query("DELETE FROM skus WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("delete_sku", e))?;

        if result.rows_affected() > 0 {
            tracing::info!(sku_id = %id, "sku deleted");
        } else {
            tracing::debug!(sku_id = %id, "delete of unknown sku ignored");
        }
        Ok(())
    }

    async fn stats(&self) -> Result<RegistryStats, StoreError> {
        Ok(self.snapshot().await?.compute_stats())
    }
}
