//! Many engines hammering one collection at once.

use std::collections::HashSet;

use trellis::tree::{MoveMode, Placement};

use crate::helpers::*;

const C: &str = "concurrent";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_under_one_parent() {
    let engine = test_engine().await;
    let mut tasks = Vec::new();
    for i in 0..32 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .insert(C, "hub", &format!("n{i}"), Placement::end())
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let children: HashSet<String> = child_ids(&engine, C, "hub").await.into_iter().collect();
    assert_eq!(children.len(), 32);
    for i in 0..32 {
        assert_eq!(
            engine.parents(C, &format!("n{i}")).await.unwrap(),
            vec!["hub"]
        );
    }
    assert_integrity(&engine, C).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_opposite_edges_never_form_a_cycle() {
    let engine = test_engine().await;
    let mut tasks = Vec::new();
    for i in 0..16 {
        let (a, b) = if i % 2 == 0 { ("x", "y") } else { ("y", "x") };
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.insert(C, a, b, Placement::end()).await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(err.is_invariant_violation(), "unexpected {err}"),
        }
    }
    // Exactly one of x -> y or y -> x wins; every other attempt is a
    // duplicate or a cycle.
    assert_eq!(accepted, 1);
    let forward = engine.path(C, "x", "y").await.unwrap();
    let backward = engine.path(C, "y", "x").await.unwrap();
    assert!(forward.is_empty() != backward.is_empty());
    assert_integrity(&engine, C).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_mutations_keep_symmetry() {
    let engine = test_engine().await;
    for i in 0..8 {
        engine
            .insert(C, "src", &format!("s{i}"), Placement::end())
            .await
            .unwrap();
        engine
            .insert(C, &format!("s{i}"), &format!("leaf{i}"), Placement::end())
            .await
            .unwrap();
    }

    let mut tasks = Vec::new();
    {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .move_children(C, "src", "dst", MoveMode::Append)
                .await
                .map(|_| ())
        }));
    }
    for i in 0..8 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .insert(C, &format!("s{i}"), &format!("extra{i}"), Placement::start())
                .await
                .map(|_| ())
        }));
    }
    for i in 0..4 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .rename(C, &format!("leaf{i}"), &format!("renamed{i}"))
                .await
                .map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(child_ids(&engine, C, "src").await.is_empty());
    assert_eq!(child_ids(&engine, C, "dst").await.len(), 8);
    let mut nodes = vec!["src".to_string(), "dst".to_string()];
    for i in 0..8 {
        nodes.push(format!("s{i}"));
        nodes.push(format!("extra{i}"));
    }
    let nodes: Vec<&str> = nodes.iter().map(String::as_str).collect();
    assert_symmetric(&engine, C, &nodes).await;
    assert_integrity(&engine, C).await;
}
