//! Raw argument lists sent straight to an executor, as a non-Rust client
//! of the executor contract would send them.

use trellis::codec::{Arg, Reply, decode_nodes};

use crate::helpers::*;

const C: &str = "raw";

fn args(items: &[&str]) -> Vec<Arg> {
    items.iter().map(|s| Arg::from(*s)).collect()
}

#[tokio::test]
async fn test_raw_insert_vocabulary() {
    let executor = test_executor().await;

    let reply = executor.execute("insert", C, &args(&["p", "a"])).await.unwrap();
    assert_eq!(reply, Reply::Integer(0));

    let reply = executor
        .execute("insert", C, &args(&["p", "b", "BEFORE", "a"]))
        .await
        .unwrap();
    assert_eq!(reply, Reply::Integer(0));

    let reply = executor
        .execute(
            "INSERT",
            C,
            &[Arg::from("p"), Arg::from("c"), Arg::from("index"), Arg::Int(1)],
        )
        .await
        .unwrap();
    assert_eq!(reply, Reply::Integer(1));

    let reply = executor.execute("parents", C, &args(&["a"])).await.unwrap();
    assert_eq!(reply, Reply::Strings(vec!["p".to_string()]));

    let reply = executor
        .execute("children", C, &[Arg::from("p"), Arg::from("LEVEL"), Arg::Int(1)])
        .await
        .unwrap();
    let ids: Vec<String> = decode_nodes(reply).unwrap().into_iter().map(|n| n.node.clone()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_raw_mrem_and_movechildren() {
    let executor = test_executor().await;
    for (parent, node) in [("p", "n"), ("q", "n"), ("r", "n")] {
        executor.execute("insert", C, &args(&[parent, node])).await.unwrap();
    }

    let reply = executor
        .execute("mrem", C, &args(&["n", "NOT", "q"]))
        .await
        .unwrap();
    assert_eq!(reply, Reply::Array(vec![Reply::Integer(2), Reply::Integer(0)]));

    let reply = executor
        .execute("movechildren", C, &args(&["q", "p", "PREPEND"]))
        .await
        .unwrap();
    assert_eq!(reply, Reply::Integer(1));

    let reply = executor.execute("exists", C, &args(&["n"])).await.unwrap();
    assert_eq!(reply, Reply::Boolean(true));
}

#[tokio::test]
async fn test_raw_arguments_are_validated() {
    let executor = test_executor().await;

    let err = executor.execute("insert", C, &args(&["only-parent"])).await.unwrap_err();
    assert!(err.is_invalid_arguments());

    let err = executor
        .execute("insert", C, &args(&["p", "n", "SIDEWAYS", "x"]))
        .await
        .unwrap_err();
    assert!(err.is_invalid_arguments());

    let err = executor
        .execute("rem", C, &args(&["p", "not-a-number", "n"]))
        .await
        .unwrap_err();
    assert!(err.is_invalid_arguments());

    let err = executor
        .execute("exists", C, &args(&["n", "extra"]))
        .await
        .unwrap_err();
    assert!(err.is_invalid_arguments());

    // Nothing above reached a script.
    let reply = executor.execute("exists", C, &args(&["p"])).await.unwrap();
    assert_eq!(reply, Reply::Boolean(false));
}
