//! Operation scripts.
//!
//! A script is the body of one tree operation, written once against a
//! [`Forest`] and run by every executor inside whatever makes it atomic for
//! that store. Scripts check every precondition before their first mutation,
//! so a script that returns an error has not changed the forest.

mod mutate;
mod query;

use crate::Result;
use crate::codec::{CodecError, Command, Reply, encode_mrem};
use crate::forest::Forest;

/// Runs a read-only command.
///
/// Mutating commands are rejected; route those through [`run`].
pub fn run_read(forest: &Forest, command: &Command) -> Result<Reply> {
    match command {
        Command::Children { node, depth } => Ok(query::children(forest, node, *depth)),
        Command::Parents { node } => Ok(Reply::Strings(forest.parents(node))),
        Command::Path { from, to } => Ok(Reply::Strings(query::path(forest, from, to))),
        Command::Exists { node } => Ok(Reply::Boolean(forest.contains(node))),
        other => Err(CodecError::InvalidArguments {
            op: other.op(),
            reason: "operation mutates the collection".to_string(),
        }
        .into()),
    }
}

/// Runs any command against a forest the caller holds exclusively.
pub fn run(forest: &mut Forest, command: Command) -> Result<Reply> {
    let reply = match command {
        Command::Insert {
            parent,
            node,
            placement,
        } => Reply::Integer(mutate::insert(forest, &parent, &node, &placement)? as i64),
        Command::Rem {
            parent,
            count,
            node,
        } => Reply::Integer(mutate::rem(forest, &parent, count, &node)? as i64),
        Command::Mrem { node, exclude } => {
            encode_mrem(mutate::mrem(forest, &node, exclude.as_deref())?)
        }
        Command::Destroy { node } => Reply::Integer(mutate::destroy(forest, &node)? as i64),
        Command::Rename { node, new_id } => Reply::Boolean(mutate::rename(forest, &node, &new_id)?),
        Command::Prune { node } => Reply::Boolean(mutate::prune(forest, &node)),
        Command::MoveChildren {
            source,
            target,
            mode,
        } => Reply::Integer(mutate::move_children(forest, &source, &target, mode)? as i64),
        read => return run_read(forest, &read),
    };
    Ok(reply)
}
