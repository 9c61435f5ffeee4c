use std::sync::Arc;

use trellis::{
    TreeEngine,
    backend::database::InMemory,
    tree::{ChildrenOptions, Placement, TreeNode},
};

use crate::helpers::*;

#[tokio::test]
async fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(InMemory::new());
    let engine = TreeEngine::new(store.clone());
    build_scenario(&engine, "a").await;
    engine.insert("b", "lonely", "x", Placement::end()).await.unwrap();
    engine.destroy("b", "lonely").await.unwrap();
    engine.insert("b", "root", "leaf", Placement::end()).await.unwrap();
    store.save_to_file(&path).await.unwrap();

    let loaded = Arc::new(InMemory::load_from_file(&path).await.unwrap());
    assert_eq!(loaded.collections().await, vec!["a", "b"]);

    let engine = TreeEngine::new(loaded.clone());
    let before = store.snapshot("a").await;
    let after = loaded.snapshot("a").await;
    assert_eq!(before.child_lists(), after.child_lists());
    assert_eq!(before.node_ids(), after.node_ids());

    let mut parents = engine.parents("a", "4").await.unwrap();
    parents.sort();
    assert_eq!(parents, vec!["1", "5"]);
    assert_eq!(
        engine
            .children("a", "1", ChildrenOptions::immediate())
            .await
            .unwrap()
            .len(),
        3
    );
    after.check_integrity().unwrap();
}

#[tokio::test]
async fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemory::load_from_file(dir.path().join("absent.json"))
        .await
        .unwrap();
    assert!(store.collections().await.is_empty());
}

#[tokio::test]
async fn test_load_rejects_cyclic_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(
        &path,
        r#"{"collections": {"c": {"nodes": ["a", "b"], "children": {"a": ["b"], "b": ["a"]}}}}"#,
    )
    .unwrap();

    let err = InMemory::load_from_file(&path).await.unwrap_err();
    assert!(err.is_integrity_error());
}

#[tokio::test]
async fn test_load_rejects_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    std::fs::write(&path, r#"{"_v": 3, "collections": {}}"#).unwrap();

    let err = InMemory::load_from_file(&path).await.unwrap_err();
    assert!(err.is_io_error());
}

#[tokio::test]
async fn test_roots_and_isolated_nodes_survive_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(InMemory::new());
    let engine = TreeEngine::new(store.clone());
    engine.insert("c", "p", "n", Placement::end()).await.unwrap();
    engine.insert("c", "q", "m", Placement::end()).await.unwrap();
    // Moving q's children away leaves q as a childless root.
    engine
        .move_children("c", "q", "p", Default::default())
        .await
        .unwrap();
    store.save_to_file(&path).await.unwrap();

    let engine = TreeEngine::new(Arc::new(InMemory::load_from_file(&path).await.unwrap()));
    assert!(engine.exists("c", "q").await.unwrap());
    assert_eq!(child_ids(&engine, "c", "p").await, vec!["n", "m"]);
}

#[tokio::test]
async fn test_children_of_engine_built_deep_chain() {
    let depth: usize = 20_000;
    let engine = TreeEngine::new(Arc::new(InMemory::new()));
    // Bottom up, so each insert's cycle check starts from a parentless node.
    for i in (0..depth).rev() {
        engine
            .insert("c", &format!("n{i}"), &format!("n{}", i + 1), Placement::end())
            .await
            .unwrap();
    }

    let nodes = engine
        .children("c", "n0", ChildrenOptions::default())
        .await
        .unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].size(), depth);
    let (level, deepest) = TreeNode::walk(&nodes).last().unwrap();
    assert_eq!(level, depth - 1);
    assert_eq!(deepest.node, format!("n{depth}"));
    assert!(!deepest.has_child);

    assert_eq!(engine.destroy("c", "n0").await.unwrap(), depth + 1);
}
