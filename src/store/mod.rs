// store/mod.rs - The store client the tests talk to
//
// Store wraps a SQLite pool plus the query settings the client consults on
// every request. It plays the part an ORM client would: per-entity CRUD,
// batched writes in one transaction, and raw SQL for cross-checking.
//
// Settings are shared between clones of the same Store, so a scoped
// override (override_query_batch_size) is visible to every clone until the
// guard is dropped.

pub mod models;
pub mod read;
pub mod write;

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, SqlitePool};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::fixtures::tables::{PostsTable, StaffTable, TagsTable};
use crate::fixtures::TestTable;

pub use models::{Entity, NewVacancy, Post, PostWithTags, StaffMember, Tag, TagOnPost, Vacancy};
pub use read::{SortOrder, TagQuery};
pub use write::{WriteOp, MAX_BIND_VALUES};

#[derive(Debug)]
struct QuerySettings {
    query_batch_size: usize,
}

/// Handle to the external store. Cheap to clone; clones share the pool and settings.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    settings: Arc<Mutex<QuerySettings>>,
}

impl Store {
    /// Open the pool described by `config` and make sure every table exists
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);

        // An in-memory database only lives as long as its connection
        let pool_options = if config.is_in_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options
                .max_connections(config.max_connections)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(60))
                .max_lifetime(Duration::from_secs(1800))
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::info!(url = %config.database_url, "connected to store");

        let store = Self {
            pool,
            settings: Arc::new(Mutex::new(QuerySettings {
                query_batch_size: config.query_batch_size,
            })),
        };

        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<(), StoreError> {
        self.apply_table::<TagsTable>().await?;
        self.apply_table::<PostsTable>().await?;
        self.apply_table::<StaffTable>().await?;
        tracing::info!("schema ready");
        Ok(())
    }

    async fn apply_table<T: TestTable>(&self) -> Result<(), StoreError> {
        // Execute each command in order
        for sql in T::setup_sql() {
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn settings(&self) -> MutexGuard<'_, QuerySettings> {
        lock(&self.settings)
    }

    /// The configured IN chunk size
    pub fn query_batch_size(&self) -> usize {
        self.settings().query_batch_size
    }

    /// Chunk size actually used for IN lists
    pub(crate) fn effective_batch_size(&self) -> usize {
        self.query_batch_size().clamp(1, MAX_BIND_VALUES)
    }

    /// Replace the batch size for as long as the returned guard lives
    pub fn override_query_batch_size(&self, size: usize) -> QueryBatchSizeGuard {
        let previous = std::mem::replace(&mut self.settings().query_batch_size, size);
        tracing::debug!(previous, size, "query batch size overridden");

        QueryBatchSizeGuard {
            settings: Arc::clone(&self.settings),
            previous,
        }
    }

    /// Submit queued writes as one atomic batch.
    ///
    /// Returns the affected row count per operation. The first failure rolls
    /// the whole batch back and is returned as is.
    pub async fn transaction(&self, ops: Vec<WriteOp>) -> Result<Vec<u64>, StoreError> {
        tracing::debug!(operations = ops.len(), "BEGIN");
        let mut tx = self.pool.begin().await?;

        let mut affected = Vec::with_capacity(ops.len());
        for op in &ops {
            affected.push(op.execute(&mut *tx).await?);
        }

        tx.commit().await?;
        tracing::debug!(operations = ops.len(), "COMMIT");
        Ok(affected)
    }

    /// `staffMember.create({ data: { name } })`
    pub async fn create_staff_member(&self, name: &str) -> Result<StaffMember, StoreError> {
        let staff_member = sqlx::query_as::<_, StaffMember>(
            "INSERT INTO StaffMember (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = staff_member.id, "INSERT INTO StaffMember");
        Ok(staff_member)
    }

    /// `vacancy.createMany({ data })`: batched multi-row insert, not one statement per row
    pub async fn create_many_vacancies(&self, rows: &[NewVacancy]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let affected = write::insert_vacancies(&mut *tx, rows).await?;
        tx.commit().await?;
        Ok(affected)
    }

    /// Row count of one table
    pub async fn count(&self, entity: Entity) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// `$queryRawUnsafe`: the SQL is sent verbatim, nothing is bound
    pub async fn query_raw_unsafe<T>(&self, sql: &str) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        tracing::debug!(sql = sql.trim(), "raw query");
        let rows = sqlx::query_as::<_, T>(sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// `$executeRawUnsafe`
    pub async fn execute_raw_unsafe(&self, sql: &str) -> Result<u64, StoreError> {
        tracing::debug!(sql = sql.trim(), "raw execute");
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn lock(settings: &Mutex<QuerySettings>) -> MutexGuard<'_, QuerySettings> {
    settings.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Restores the previous query batch size on drop, including during a panic unwind
#[must_use = "the previous batch size is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct QueryBatchSizeGuard {
    settings: Arc<Mutex<QuerySettings>>,
    previous: usize,
}

impl QueryBatchSizeGuard {
    pub fn previous(&self) -> usize {
        self.previous
    }
}

impl Drop for QueryBatchSizeGuard {
    fn drop(&mut self) {
        lock(&self.settings).query_batch_size = self.previous;
        tracing::debug!(restored = self.previous, "query batch size restored");
    }
}
