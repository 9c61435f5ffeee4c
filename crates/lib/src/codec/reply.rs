//! Typed decoding of executor replies.

use super::{CodecError, Operation, Reply};
use crate::tree::{MremResult, TreeBuilder, TreeNode};

fn mismatch(op: Operation, expected: &'static str, found: &Reply) -> CodecError {
    CodecError::Decode {
        op,
        expected,
        found: found.kind(),
    }
}

fn non_negative(op: Operation, expected: &'static str, reply: &Reply) -> Result<usize, CodecError> {
    match reply {
        Reply::Integer(n) => usize::try_from(*n).map_err(|_| mismatch(op, expected, reply)),
        other => Err(mismatch(op, expected, other)),
    }
}

/// Decode the index returned by `insert`.
pub fn decode_position(op: Operation, reply: Reply) -> Result<usize, CodecError> {
    non_negative(op, "non-negative position", &reply)
}

/// Decode a non-negative count (`rem`, `destroy`, `movechildren`).
pub fn decode_count(op: Operation, reply: Reply) -> Result<usize, CodecError> {
    non_negative(op, "non-negative count", &reply)
}

/// Decode a boolean reply (`exists`, `rename`, `prune`).
pub fn decode_bool(op: Operation, reply: Reply) -> Result<bool, CodecError> {
    match reply {
        Reply::Boolean(b) => Ok(b),
        other => Err(mismatch(op, "boolean", &other)),
    }
}

/// Decode a list of node ids (`parents`, `path`).
pub fn decode_strings(op: Operation, reply: Reply) -> Result<Vec<String>, CodecError> {
    match reply {
        Reply::Strings(items) => Ok(items),
        other => Err(mismatch(op, "list of strings", &other)),
    }
}

/// Encode the `mrem` outcome as `Array[Integer removed, Integer destroyed]`.
pub fn encode_mrem(result: MremResult) -> Reply {
    Reply::Array(vec![
        Reply::Integer(result.removed as i64),
        Reply::Integer(result.destroyed as i64),
    ])
}

/// Decode the `mrem` outcome.
pub fn decode_mrem(reply: Reply) -> Result<MremResult, CodecError> {
    const EXPECTED: &str = "array of two counts";
    let op = Operation::Mrem;
    match &reply {
        Reply::Array(items) if items.len() == 2 => Ok(MremResult {
            removed: non_negative(op, EXPECTED, &items[0])?,
            destroyed: non_negative(op, EXPECTED, &items[1])?,
        }),
        other => Err(mismatch(op, EXPECTED, other)),
    }
}

/// Encode tree snapshot rows given in depth-first preorder.
///
/// Each `(id, child_count, level)` row becomes `Array[Text id, Integer
/// child_count, Integer level]`. `child_count` counts all stored children
/// even when the depth bound left them out of the snapshot.
pub fn encode_nodes(rows: Vec<(String, usize, usize)>) -> Reply {
    Reply::Array(
        rows.into_iter()
            .map(|(id, child_count, level)| {
                Reply::Array(vec![
                    Reply::Text(id),
                    Reply::Integer(child_count as i64),
                    Reply::Integer(level as i64),
                ])
            })
            .collect(),
    )
}

/// Decode the snapshot rows returned by `children` into nested snapshots.
pub fn decode_nodes(reply: Reply) -> Result<Vec<TreeNode>, CodecError> {
    const EXPECTED: &str = "preorder rows [id, child_count, level]";
    let op = Operation::Children;
    let rows = match reply {
        Reply::Array(rows) => rows,
        other => return Err(mismatch(op, "array of nodes", &other)),
    };

    let mut builder = TreeBuilder::default();
    for row in rows {
        let fields = match row {
            Reply::Array(fields) if fields.len() == 3 => fields,
            other => return Err(mismatch(op, EXPECTED, &other)),
        };
        let child_count = non_negative(op, EXPECTED, &fields[1])?;
        let level = non_negative(op, EXPECTED, &fields[2])?;
        let mut fields = fields.into_iter();
        let node = match fields.next() {
            Some(Reply::Text(id)) => id,
            Some(other) => return Err(mismatch(op, EXPECTED, &other)),
            None => return Err(mismatch(op, EXPECTED, &Reply::Array(Vec::new()))),
        };
        if !builder.push(node, child_count > 0, level) {
            return Err(CodecError::Decode {
                op,
                expected: EXPECTED,
                found: format!("row skipping to level {level}"),
            });
        }
    }
    Ok(builder.finish())
}
