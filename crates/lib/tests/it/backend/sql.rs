use std::sync::Arc;

use trellis::{
    TreeEngine,
    backend::{AtomicExecutor, database::SqlxBackend},
    tree::{MoveMode, Placement},
};

use crate::helpers::*;

#[tokio::test]
async fn test_sqlite_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trees.db");

    {
        let backend = Arc::new(SqlxBackend::open_sqlite(&path).await.unwrap());
        let engine = TreeEngine::new(backend.clone());
        build_scenario(&engine, "c").await;
        engine.rename("c", "3", "three").await.unwrap();
        backend.pool().close().await;
    }

    let backend = Arc::new(SqlxBackend::open_sqlite(&path).await.unwrap());
    assert!(backend.is_sqlite());
    assert_eq!(backend.collections().await.unwrap(), vec!["c"]);

    let engine = TreeEngine::new(backend.clone());
    assert_eq!(child_ids(&engine, "c", "1").await, vec!["2", "three", "4"]);
    assert_eq!(engine.path("c", "1", "4").await.unwrap(), vec!["1", "4"]);
    backend.snapshot("c").await.unwrap().check_integrity().unwrap();
}

#[tokio::test]
async fn test_sqlite_failed_operation_rolls_back() {
    let backend = Arc::new(SqlxBackend::sqlite_in_memory().await.unwrap());
    let engine = TreeEngine::new(backend.clone());
    build_scenario(&engine, "c").await;
    let before = backend.snapshot("c").await.unwrap();

    let err = engine
        .move_children("c", "1", "5", MoveMode::Append)
        .await
        .unwrap_err();
    assert!(err.is_invariant_violation());

    let after = backend.snapshot("c").await.unwrap();
    assert_eq!(before.child_lists(), after.child_lists());
    assert_eq!(before.node_ids(), after.node_ids());
}

#[tokio::test]
async fn test_sqlite_writes_only_touched_rows() {
    let backend = Arc::new(SqlxBackend::sqlite_in_memory().await.unwrap());
    let engine = TreeEngine::new(backend.clone());
    for i in 0..20 {
        engine
            .insert("c", "root", &format!("n{i}"), Placement::end())
            .await
            .unwrap();
    }
    engine.insert("c", "root", "mid", Placement::Index(10)).await.unwrap();
    engine.destroy("c", "n3").await.unwrap();

    let forest = backend.snapshot("c").await.unwrap();
    forest.check_integrity().unwrap();
    let children = forest.children("root");
    assert_eq!(children.len(), 20);
    assert_eq!(children[9], "mid");
    assert!(!forest.contains("n3"));
}

#[tokio::test]
async fn test_sqlite_reads_do_not_create_collections() {
    let backend = Arc::new(SqlxBackend::sqlite_in_memory().await.unwrap());
    let engine = TreeEngine::new(backend.clone());

    assert!(!engine.exists("c", "x").await.unwrap());
    assert!(engine.parents("c", "x").await.unwrap().is_empty());
    assert!(backend.collections().await.unwrap().is_empty());
    assert_eq!(backend.kind(), "sqlite");
}
