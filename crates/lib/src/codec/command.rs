//! Typed operation arguments and their argument-list encoding.

use super::{Arg, CodecError, Operation};
use crate::tree::{MoveMode, Placement};

const INDEX: &str = "INDEX";
const BEFORE: &str = "BEFORE";
const AFTER: &str = "AFTER";
const LEVEL: &str = "LEVEL";
const NOT: &str = "NOT";
const APPEND: &str = "APPEND";
const PREPEND: &str = "PREPEND";

/// One fully-typed operation invocation, minus the collection key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert {
        parent: String,
        node: String,
        placement: Placement,
    },
    Children {
        node: String,
        depth: Option<usize>,
    },
    Parents {
        node: String,
    },
    Path {
        from: String,
        to: String,
    },
    Rem {
        parent: String,
        count: i64,
        node: String,
    },
    Mrem {
        node: String,
        exclude: Option<String>,
    },
    Destroy {
        node: String,
    },
    Exists {
        node: String,
    },
    Rename {
        node: String,
        new_id: String,
    },
    Prune {
        node: String,
    },
    MoveChildren {
        source: String,
        target: String,
        mode: MoveMode,
    },
}

impl Command {
    /// The operation this command invokes.
    pub fn op(&self) -> Operation {
        match self {
            Command::Insert { .. } => Operation::Insert,
            Command::Children { .. } => Operation::Children,
            Command::Parents { .. } => Operation::Parents,
            Command::Path { .. } => Operation::Path,
            Command::Rem { .. } => Operation::Rem,
            Command::Mrem { .. } => Operation::Mrem,
            Command::Destroy { .. } => Operation::Destroy,
            Command::Exists { .. } => Operation::Exists,
            Command::Rename { .. } => Operation::Rename,
            Command::Prune { .. } => Operation::Prune,
            Command::MoveChildren { .. } => Operation::MoveChildren,
        }
    }

    /// Encode into the ordered argument list an executor receives.
    pub fn encode(&self) -> Vec<Arg> {
        match self {
            Command::Insert {
                parent,
                node,
                placement,
            } => {
                let mut args = vec![Arg::from(parent.as_str()), Arg::from(node.as_str())];
                match placement {
                    Placement::Index(index) => {
                        args.push(INDEX.into());
                        args.push(Arg::Int(*index));
                    }
                    Placement::Before(sibling) => {
                        args.push(BEFORE.into());
                        args.push(sibling.as_str().into());
                    }
                    Placement::After(sibling) => {
                        args.push(AFTER.into());
                        args.push(sibling.as_str().into());
                    }
                }
                args
            }
            Command::Children { node, depth } => {
                let mut args = vec![Arg::from(node.as_str())];
                if let Some(depth) = depth {
                    args.push(LEVEL.into());
                    args.push(Arg::Int(i64::try_from(*depth).unwrap_or(i64::MAX)));
                }
                args
            }
            Command::Parents { node }
            | Command::Destroy { node }
            | Command::Exists { node }
            | Command::Prune { node } => vec![node.as_str().into()],
            Command::Path { from, to } => vec![from.as_str().into(), to.as_str().into()],
            Command::Rem {
                parent,
                count,
                node,
            } => vec![parent.as_str().into(), Arg::Int(*count), node.as_str().into()],
            Command::Mrem { node, exclude } => {
                let mut args = vec![Arg::from(node.as_str())];
                if let Some(exclude) = exclude {
                    args.push(NOT.into());
                    args.push(exclude.as_str().into());
                }
                args
            }
            Command::Rename { node, new_id } => {
                vec![node.as_str().into(), new_id.as_str().into()]
            }
            Command::MoveChildren {
                source,
                target,
                mode,
            } => {
                let mode = match mode {
                    MoveMode::Append => APPEND,
                    MoveMode::Prepend => PREPEND,
                };
                vec![source.as_str().into(), target.as_str().into(), mode.into()]
            }
        }
    }

    /// Decode an argument list received for `op`.
    ///
    /// Keywords are matched case-insensitively; integers are also accepted as
    /// their decimal string form.
    pub fn decode(op: Operation, args: &[Arg]) -> Result<Self, CodecError> {
        let mut reader = ArgReader::new(op, args);
        let command = match op {
            Operation::Insert => {
                let parent = reader.string("parent")?;
                let node = reader.string("node")?;
                let placement = match reader.keyword()?.as_deref() {
                    None => Placement::end(),
                    Some(INDEX) => Placement::Index(reader.int("index")?),
                    Some(BEFORE) => Placement::Before(reader.string("sibling")?),
                    Some(AFTER) => Placement::After(reader.string("sibling")?),
                    Some(other) => {
                        return Err(reader.invalid(format!("unknown placement {other}")));
                    }
                };
                Command::Insert {
                    parent,
                    node,
                    placement,
                }
            }
            Operation::Children => {
                let node = reader.string("node")?;
                let depth = match reader.keyword()?.as_deref() {
                    None => None,
                    Some(LEVEL) => {
                        let level = reader.int("level")?;
                        let level = usize::try_from(level)
                            .map_err(|_| reader.invalid(format!("negative level {level}")))?;
                        Some(level)
                    }
                    Some(other) => return Err(reader.invalid(format!("unknown option {other}"))),
                };
                Command::Children { node, depth }
            }
            Operation::Parents => Command::Parents {
                node: reader.string("node")?,
            },
            Operation::Path => Command::Path {
                from: reader.string("from")?,
                to: reader.string("to")?,
            },
            Operation::Rem => Command::Rem {
                parent: reader.string("parent")?,
                count: reader.int("count")?,
                node: reader.string("node")?,
            },
            Operation::Mrem => {
                let node = reader.string("node")?;
                let exclude = match reader.keyword()?.as_deref() {
                    None => None,
                    Some(NOT) => Some(reader.string("exclude")?),
                    Some(other) => return Err(reader.invalid(format!("unknown option {other}"))),
                };
                Command::Mrem { node, exclude }
            }
            Operation::Destroy => Command::Destroy {
                node: reader.string("node")?,
            },
            Operation::Exists => Command::Exists {
                node: reader.string("node")?,
            },
            Operation::Rename => Command::Rename {
                node: reader.string("node")?,
                new_id: reader.string("new id")?,
            },
            Operation::Prune => Command::Prune {
                node: reader.string("node")?,
            },
            Operation::MoveChildren => {
                let source = reader.string("source")?;
                let target = reader.string("target")?;
                let mode = match reader.keyword()?.as_deref() {
                    None | Some(APPEND) => MoveMode::Append,
                    Some(PREPEND) => MoveMode::Prepend,
                    Some(other) => return Err(reader.invalid(format!("unknown mode {other}"))),
                };
                Command::MoveChildren {
                    source,
                    target,
                    mode,
                }
            }
        };
        reader.finish()?;
        Ok(command)
    }
}

/// Cursor over an argument list, producing `InvalidArguments` errors tagged
/// with the operation being decoded.
struct ArgReader<'a> {
    op: Operation,
    args: &'a [Arg],
    pos: usize,
}

impl<'a> ArgReader<'a> {
    fn new(op: Operation, args: &'a [Arg]) -> Self {
        Self { op, args, pos: 0 }
    }

    fn invalid(&self, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidArguments {
            op: self.op,
            reason: reason.into(),
        }
    }

    fn next(&mut self, name: &str) -> Result<&'a Arg, CodecError> {
        let arg = self
            .args
            .get(self.pos)
            .ok_or_else(|| self.invalid(format!("missing {name}")))?;
        self.pos += 1;
        Ok(arg)
    }

    fn string(&mut self, name: &str) -> Result<String, CodecError> {
        match self.next(name)? {
            Arg::Str(s) => Ok(s.clone()),
            Arg::Int(n) => Ok(n.to_string()),
        }
    }

    fn int(&mut self, name: &str) -> Result<i64, CodecError> {
        match self.next(name)? {
            Arg::Int(n) => Ok(*n),
            Arg::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(format!("{name} is not an integer: {s}"))),
        }
    }

    /// The next argument as an upper-cased keyword, if there is one.
    fn keyword(&mut self) -> Result<Option<String>, CodecError> {
        match self.args.get(self.pos) {
            None => Ok(None),
            Some(Arg::Str(s)) => {
                self.pos += 1;
                Ok(Some(s.to_ascii_uppercase()))
            }
            Some(other) => Err(self.invalid(format!("expected keyword, found {}", other.kind()))),
        }
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.pos < self.args.len() {
            return Err(self.invalid(format!(
                "{} unexpected trailing argument(s)",
                self.args.len() - self.pos
            )));
        }
        Ok(())
    }
}
