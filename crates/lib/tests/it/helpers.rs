use std::sync::Arc;

use trellis::{
    TreeEngine,
    backend::{AtomicExecutor, database::InMemory},
    forest::Forest,
    tree::{ChildrenOptions, Placement},
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// A single point of change for backend matrix testing via TEST_BACKEND.

/// Creates a test executor based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory executor (default)
/// - "sqlite": SQLite in-memory executor (requires `sqlite` feature)
/// - "postgres": PostgreSQL executor (requires `postgres` feature and TEST_POSTGRES_URL)
/// - "remote": HttpBackend talking to an in-process server over InMemory
///   (requires `remote` feature)
///
/// # Example
/// ```bash
/// TEST_BACKEND=sqlite cargo test
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/trellis_test" cargo test
/// ```
pub async fn test_executor() -> Arc<dyn AtomicExecutor> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use trellis::backend::database::Sqlite;
                Arc::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite executor"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use trellis::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/trellis_test".to_string());
                Arc::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("remote") => {
            #[cfg(feature = "remote")]
            {
                use trellis::backend::remote::HttpBackend;
                let base_url = spawn_server(Arc::new(InMemory::new())).await;
                Arc::new(HttpBackend::new(base_url).expect("Failed to create HTTP executor"))
            }
            #[cfg(not(feature = "remote"))]
            {
                panic!("TEST_BACKEND=remote requires the 'remote' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => {
            panic!(
                "Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres, remote"
            )
        }
    }
}

/// Creates an engine over a fresh [`test_executor`].
pub async fn test_engine() -> TreeEngine {
    TreeEngine::new(test_executor().await)
}

/// Serves `executor` on an ephemeral local port for the rest of the test.
///
/// Returns the base URL to hand to `HttpBackend`.
#[cfg(feature = "remote")]
pub async fn spawn_server(executor: Arc<dyn AtomicExecutor>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind address");
    let addr = listener.local_addr().expect("Failed to get local address");
    let router = trellis::backend::remote::router(executor);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    format!("http://{addr}")
}

// ==========================
// SCENARIOS
// ==========================

/// Inserts the five-edge scenario with a shared child:
///
/// ```text
/// 1 -> [2, 3, 4]
/// 2 -> [5]
/// 5 -> [4]
/// ```
pub async fn build_scenario(engine: &TreeEngine, collection: &str) {
    engine
        .insert(collection, "1", "2", Placement::end())
        .await
        .unwrap();
    engine
        .insert(collection, "1", "4", Placement::end())
        .await
        .unwrap();
    engine
        .insert(collection, "1", "3", Placement::before("4"))
        .await
        .unwrap();
    engine
        .insert(collection, "2", "5", Placement::Index(1000))
        .await
        .unwrap();
    engine
        .insert(collection, "5", "4", Placement::end())
        .await
        .unwrap();
}

/// Ids of `node`'s immediate children.
pub async fn child_ids(engine: &TreeEngine, collection: &str, node: &str) -> Vec<String> {
    engine
        .children(collection, node, ChildrenOptions::immediate())
        .await
        .unwrap()
        .into_iter()
        .map(|child| child.node.clone())
        .collect()
}

// ==========================
// INVARIANT CHECKS
// ==========================

/// Cross-checks every child list against every parent-set, through the
/// engine API only, for the given nodes.
pub async fn assert_symmetric(engine: &TreeEngine, collection: &str, nodes: &[&str]) {
    for node in nodes {
        for child in child_ids(engine, collection, node).await {
            let parents = engine.parents(collection, &child).await.unwrap();
            assert!(
                parents.iter().any(|p| p == node),
                "{child} is a child of {node} but its parents are {parents:?}"
            );
        }
        for parent in engine.parents(collection, node).await.unwrap() {
            let children = child_ids(engine, collection, &parent).await;
            assert!(
                children.iter().any(|c| c == node),
                "{parent} is a parent of {node} but its children are {children:?}"
            );
        }
    }
}

/// Reads the stored collection directly, when the executor allows it.
///
/// Returns `None` for executors that only expose the operation vocabulary.
pub async fn stored_forest(executor: &dyn AtomicExecutor, collection: &str) -> Option<Forest> {
    if let Some(store) = executor.as_any().downcast_ref::<InMemory>() {
        return Some(store.snapshot(collection).await);
    }
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    if let Some(store) = executor
        .as_any()
        .downcast_ref::<trellis::backend::database::SqlxBackend>()
    {
        return Some(store.snapshot(collection).await.unwrap());
    }
    None
}

/// Full structural integrity check of the stored collection.
pub async fn assert_integrity(engine: &TreeEngine, collection: &str) {
    if let Some(forest) = stored_forest(engine.executor().as_ref(), collection).await {
        forest
            .check_integrity()
            .unwrap_or_else(|e| panic!("collection {collection} is corrupt: {e}"));
    }
}
