//! Executor creation and utility functions.

use std::{path::PathBuf, sync::Arc, time::Duration};

use trellis::{
    TreeEngine,
    backend::{
        AtomicExecutor,
        database::{InMemory, Postgres, Sqlite},
        remote::HttpBackend,
    },
};

use crate::cli::{Backend, BackendArgs};

pub const SQLITE_FILE: &str = "trellis.db";
pub const JSON_FILE: &str = "trellis.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

pub fn data_dir(args: &BackendArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Create the appropriate executor based on configuration
pub async fn create_executor(
    args: &BackendArgs,
) -> Result<Arc<dyn AtomicExecutor>, Box<dyn std::error::Error>> {
    match args.backend {
        Backend::Sqlite => {
            let data_dir = data_dir(args);
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or TRELLIS_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {}: {}", display_url, e).into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir(args).join(JSON_FILE);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            Ok(Arc::new(InMemory::load_from_file(&json_path).await?))
        }
        Backend::Remote => {
            let url = args
                .remote_url
                .as_ref()
                .ok_or("Remote backend requires --remote-url or TRELLIS_REMOTE_URL")?;
            tracing::info!("Using remote backend at {url}");
            let backend = match args.timeout_ms {
                Some(ms) => HttpBackend::with_timeout(url.as_str(), Duration::from_millis(ms))?,
                None => HttpBackend::new(url.as_str())?,
            };
            Ok(Arc::new(backend))
        }
    }
}

/// Wrap `executor` in an engine honoring `--timeout-ms`.
pub fn engine(executor: Arc<dyn AtomicExecutor>, args: &BackendArgs) -> TreeEngine {
    let engine = TreeEngine::new(executor);
    match args.timeout_ms {
        Some(ms) => engine.with_timeout(Duration::from_millis(ms)),
        None => engine,
    }
}

/// Persist the store if it only lives in memory. Other executors write through.
pub async fn save_if_in_memory(
    executor: &dyn AtomicExecutor,
    args: &BackendArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = executor.as_any().downcast_ref::<InMemory>() {
        let json_path = data_dir(args).join(JSON_FILE);
        if let Some(parent) = json_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        in_memory.save_to_file(&json_path).await?;
        tracing::info!("Store saved to {}", json_path.display());
    }
    Ok(())
}
