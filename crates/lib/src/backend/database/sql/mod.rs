//! SQL-based executor implementations for Trellis collections.
//!
//! This module provides SQL database executors that implement the
//! `AtomicExecutor` trait, storing every collection's nodes and ordered edges
//! in relational tables.
//!
//! ## Available Backends
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The SQL executor uses sqlx with `AnyPool` for multi-database support.
//! Each operation runs in one transaction: mutating operations first lock the
//! collection, then load it, run the operation script, and write back only
//! the nodes the script touched before committing. A failed script or a
//! dropped future rolls the transaction back.
//!
//! ## Schema and Migrations
//!
//! The database schema is defined in the [`schema`] module and automatically
//! initialized when connecting. See its documentation for adding migrations.

mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::{AtomicExecutor, BackendError};
use crate::codec::{Arg, Command, Operation, Reply};
use crate::forest::Forest;
use crate::script;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database backend kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL-based executor implementing `AtomicExecutor` using sqlx.
///
/// This executor supports both SQLite and PostgreSQL through sqlx's `AnyPool`.
///
/// # Test Isolation
///
/// For PostgreSQL, each executor instance can use its own schema for test
/// isolation. Use `connect_postgres_isolated()` to create one.
#[derive(Debug)]
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn db_kind(&self) -> DbKind {
        self.kind
    }

    /// Check if this backend is using SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    /// Check if this backend is using PostgreSQL.
    pub fn is_postgres(&self) -> bool {
        self.kind == DbKind::Postgres
    }

    /// A consistent copy of one collection, read in its own transaction.
    pub async fn snapshot(&self, collection: &str) -> Result<Forest> {
        let mut tx = self.begin_read().await?;
        let forest = storage::load(&mut tx, collection).await?;
        tx.commit().await.sql_context("Failed to commit snapshot")?;
        Ok(forest)
    }

    /// Names of all collections that currently hold nodes, sorted.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .sql_context("Failed to acquire connection")?;
        storage::collections(&mut conn).await
    }

    /// Opens a transaction whose reads all see the same committed state.
    async fn begin_read(&self) -> Result<sqlx::Transaction<'static, sqlx::Any>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        // SQLite read transactions already hold one snapshot; PostgreSQL's
        // default READ COMMITTED would let the node and edge queries disagree.
        if self.is_postgres() {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
                .execute(&mut *tx)
                .await
                .sql_context("Failed to set isolation level")?;
        }
        Ok(tx)
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use trellis::backend::database::sql::SqlxBackend;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let backend = SqlxBackend::open_sqlite("trees.db").await.unwrap();
    /// }
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // Pragmas are per connection, so every pooled connection runs them.
        // In-memory databases don't need WAL mode (all in RAM).
        // - journal_mode=WAL: readers don't block the writer
        // - synchronous=NORMAL: Balanced durability (safe with WAL)
        // - busy_timeout=5000: Wait up to 5s for the write lock before failing
        let pragmas = if is_in_memory {
            "PRAGMA busy_timeout = 5000;"
        } else {
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;"
        };

        let mut pool_options = AnyPoolOptions::new().max_connections(5);
        if is_in_memory {
            // An in-memory database disappears with its last connection, so
            // keep one open for the lifetime of the pool.
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(pragmas).await?;
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        let backend = Self {
            pool,
            kind: DbKind::Sqlite,
        };
        schema::initialize(&backend).await?;
        Ok(backend)
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    /// Useful for testing.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database;
        // a unique name per instance so tests don't share it.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// This connects to the default (public) schema. For test isolation,
    /// use `connect_postgres_isolated()` instead.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect to a PostgreSQL database with a specific schema for isolation.
    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();
        if schema_name.is_some() {
            // Many isolated test pools at once must not exhaust max_connections
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let backend = Self {
            pool,
            kind: DbKind::Postgres,
        };
        schema::initialize(&backend).await?;
        Ok(backend)
    }

    /// Connect to a PostgreSQL database with test isolation.
    ///
    /// Creates a unique schema for this executor instance, so tests running
    /// in parallel don't see each other's collections.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        // PostgreSQL schema names must start with a letter and be lowercase
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let schema_name = format!("test_{unique_id}");
        Self::connect_postgres_with_schema(url, Some(schema_name)).await
    }
}

#[async_trait]
impl AtomicExecutor for SqlxBackend {
    async fn execute_op(&self, op: Operation, collection: &str, args: &[Arg]) -> Result<Reply> {
        let command = Command::decode(op, args)?;

        if !op.is_mutating() {
            let mut tx = self.begin_read().await?;
            let forest = storage::load(&mut tx, collection).await?;
            let reply = script::run_read(&forest, &command)?;
            tx.commit().await.sql_context("Failed to commit read")?;
            return Ok(reply);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        storage::lock_collection(&mut tx, collection).await?;
        let mut forest = storage::load(&mut tx, collection).await?;

        // An error drops `tx`, rolling back the revision bump with it.
        let reply = script::run(&mut forest, command)?;
        let written = storage::store(&mut tx, collection, &mut forest).await?;
        tx.commit().await.sql_context("Failed to commit operation")?;

        tracing::trace!(collection, %op, written, "committed");
        Ok(reply)
    }

    fn kind(&self) -> &'static str {
        match self.kind {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;

#[cfg(feature = "postgres")]
/// Convenience type alias for PostgreSQL backend using sqlx.
pub type Postgres = SqlxBackend;
