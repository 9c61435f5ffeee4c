//! Wire codec between the tree engine and an atomic executor.
//!
//! An executor only ever sees an operation name, a collection key and an
//! ordered list of primitive [`Arg`]s, and it only ever answers with a
//! primitive [`Reply`]. This module owns both directions of that translation:
//!
//! * [`Command`] encodes typed engine arguments into an argument list, and
//!   decodes an argument list back into typed arguments on the executor side.
//! * The `decode_*` functions turn a [`Reply`] into the exact result type of
//!   each operation, rejecting any other shape with [`CodecError::Decode`].
//!
//! Tree snapshots travel flat, one `Array[Text id, Integer child_count,
//! Integer level]` row per node in depth-first preorder, so a reply nests at
//! most two arrays deep whatever the depth of the tree.

mod command;
mod errors;
mod reply;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use command::Command;
pub use errors::CodecError;
pub use reply::{
    decode_bool, decode_count, decode_mrem, decode_nodes, decode_position, decode_strings,
    encode_mrem, encode_nodes,
};

/// The fixed operation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Children,
    Parents,
    Path,
    Rem,
    Mrem,
    Destroy,
    Exists,
    Rename,
    Prune,
    MoveChildren,
}

impl Operation {
    /// Every operation, in vocabulary order.
    pub const ALL: [Operation; 11] = [
        Operation::Insert,
        Operation::Children,
        Operation::Parents,
        Operation::Path,
        Operation::Rem,
        Operation::Mrem,
        Operation::Destroy,
        Operation::Exists,
        Operation::Rename,
        Operation::Prune,
        Operation::MoveChildren,
    ];

    /// The wire name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Children => "children",
            Operation::Parents => "parents",
            Operation::Path => "path",
            Operation::Rem => "rem",
            Operation::Mrem => "mrem",
            Operation::Destroy => "destroy",
            Operation::Exists => "exists",
            Operation::Rename => "rename",
            Operation::Prune => "prune",
            Operation::MoveChildren => "movechildren",
        }
    }

    /// Whether the operation may change the collection.
    ///
    /// Executors take an exclusive lock for mutating operations and a shared
    /// one for the rest.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Operation::Children | Operation::Parents | Operation::Path | Operation::Exists
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CodecError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CodecError::UnsupportedOperation {
                name: name.to_string(),
            })
    }
}

/// A single primitive argument.
///
/// Serialized untagged, so an argument list is a plain JSON array of strings
/// and integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Int(i64),
    Str(String),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "integer",
            Arg::Str(_) => "string",
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(n) => write!(f, "{n}"),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

/// A primitive reply from an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Integer(i64),
    Boolean(bool),
    Text(String),
    Strings(Vec<String>),
    Array(Vec<Reply>),
}

impl Reply {
    /// Short description of the reply's shape, used in decode errors.
    pub fn kind(&self) -> String {
        match self {
            Reply::Integer(n) => format!("integer {n}"),
            Reply::Boolean(b) => format!("boolean {b}"),
            Reply::Text(_) => "text".to_string(),
            Reply::Strings(items) => format!("list of {} strings", items.len()),
            Reply::Array(items) => format!("array of {} replies", items.len()),
        }
    }
}
