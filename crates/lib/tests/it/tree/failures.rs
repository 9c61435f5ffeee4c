//! Rejected operations, typed failures, and deadlines.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use trellis::{
    Result, TreeEngine,
    backend::AtomicExecutor,
    codec::{Arg, Operation, Reply},
    tree::{ChildrenOptions, MoveMode, MremOptions, Placement, TreeError},
};

use crate::helpers::*;

const C: &str = "failures";

fn tree_error(err: trellis::Error) -> TreeError {
    match err {
        trellis::Error::Tree(tree_err) => tree_err,
        other => panic!("expected a tree error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_insert_rejections_change_nothing() {
    let engine = test_engine().await;
    build_scenario(&engine, C).await;

    let err = engine
        .insert(C, "1", "1", Placement::end())
        .await
        .unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(matches!(tree_error(err), TreeError::CycleDetected { .. }));

    let err = engine
        .insert(C, "4", "2", Placement::end())
        .await
        .unwrap_err();
    assert!(matches!(
        tree_error(err),
        TreeError::CycleDetected { ref parent, ref node } if parent == "4" && node == "2"
    ));

    let err = engine
        .insert(C, "1", "3", Placement::end())
        .await
        .unwrap_err();
    assert!(matches!(tree_error(err), TreeError::DuplicateEdge { .. }));

    let err = engine
        .insert(C, "1", "fresh", Placement::after("5"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(tree_error(err), TreeError::SiblingNotFound { .. }));

    assert!(!engine.exists(C, "fresh").await.unwrap());
    assert_eq!(child_ids(&engine, C, "1").await, vec!["2", "3", "4"]);
    assert_eq!(child_ids(&engine, C, "4").await, Vec::<String>::new());
    assert_integrity(&engine, C).await;
}

#[tokio::test]
async fn test_not_found_failures() {
    let engine = test_engine().await;
    build_scenario(&engine, C).await;

    let err = engine.rem(C, "3", 0, "4").await.unwrap_err();
    assert!(matches!(tree_error(err), TreeError::EdgeNotFound { .. }));

    let err = engine
        .mrem(C, "ghost", MremOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(tree_error(err), TreeError::NodeNotFound { .. }));

    let err = engine.destroy(C, "ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rename_collision() {
    let engine = test_engine().await;
    build_scenario(&engine, C).await;

    let err = engine.rename(C, "3", "5").await.unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(matches!(tree_error(err), TreeError::NameCollision { .. }));

    // Both ids keep their own edges.
    assert_eq!(engine.parents(C, "3").await.unwrap(), vec!["1"]);
    assert_eq!(engine.parents(C, "5").await.unwrap(), vec!["2"]);
}

#[tokio::test]
async fn test_move_children_cycle_is_all_or_nothing() {
    let engine = test_engine().await;
    build_scenario(&engine, C).await;

    // 5 sits below 2, one of the children being moved.
    let err = engine
        .move_children(C, "1", "5", MoveMode::Append)
        .await
        .unwrap_err();
    assert!(matches!(tree_error(err), TreeError::CycleDetected { .. }));
    assert_eq!(child_ids(&engine, C, "1").await, vec!["2", "3", "4"]);
    assert_eq!(child_ids(&engine, C, "5").await, vec!["4"]);
    assert_integrity(&engine, C).await;
}

#[tokio::test]
async fn test_unsupported_operation_never_reaches_store() {
    let executor = Arc::new(SlowExecutor::new(Duration::ZERO));
    let err = executor.execute("tflatten", C, &[]).await.unwrap_err();
    assert!(err.is_unsupported_operation());
    assert_eq!(executor.calls(), 0);

    let executor = test_executor().await;
    let err = executor
        .execute("tflatten", C, &[Arg::from("x")])
        .await
        .unwrap_err();
    assert!(err.is_unsupported_operation());
}

#[tokio::test]
async fn test_timeout_is_a_connectivity_error() {
    let engine = TreeEngine::new(Arc::new(SlowExecutor::new(Duration::from_secs(5))))
        .with_timeout(Duration::from_millis(20));

    let err = engine.exists(C, "x").await.unwrap_err();
    assert!(err.is_timeout_error());
    assert!(err.is_connectivity_error());
}

#[tokio::test]
async fn test_mismatched_reply_is_a_decode_error() {
    let engine = TreeEngine::new(Arc::new(SlowExecutor::new(Duration::ZERO)));

    // The executor always answers `Text`, which no operation produces.
    let err = engine.exists(C, "x").await.unwrap_err();
    assert!(err.is_decode_error());
    let err = engine
        .children(C, "x", ChildrenOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_decode_error());
    let err = engine.insert(C, "p", "x", Placement::end()).await.unwrap_err();
    assert!(err.is_decode_error());
}

/// Answers every operation with `Text` after a delay, counting calls.
struct SlowExecutor {
    delay: Duration,
    calls: std::sync::atomic::AtomicUsize,
}

impl SlowExecutor {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Default::default(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl AtomicExecutor for SlowExecutor {
    async fn execute_op(&self, _op: Operation, _collection: &str, _args: &[Arg]) -> Result<Reply> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Reply::Text("unexpected".to_string()))
    }

    fn kind(&self) -> &'static str {
        "slow"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
