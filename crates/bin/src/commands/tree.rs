//! Tree operation commands - one per engine operation.

use trellis::{
    TreeEngine,
    tree::{ChildrenOptions, MoveMode, MremOptions, Placement, TreeNode},
};

use crate::cli::TreeCommand;
use crate::output::{OutputFormat, print_table, print_value};

/// Run a single tree operation against `engine`
pub async fn run(
    command: &TreeCommand,
    engine: &TreeEngine,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        TreeCommand::Insert {
            collection,
            parent,
            node,
            index,
            before,
            after,
        } => {
            let placement = match (index, before, after) {
                (Some(index), _, _) => Placement::Index(*index),
                (_, Some(sibling), _) => Placement::before(sibling.as_str()),
                (_, _, Some(sibling)) => Placement::after(sibling.as_str()),
                _ => Placement::end(),
            };
            let index = engine.insert(collection, parent, node, placement).await?;
            print_value(format, "index", &index, || {
                format!("inserted {node} under {parent} at {index}")
            })?;
        }
        TreeCommand::Children {
            collection,
            node,
            depth,
        } => {
            let nodes = engine
                .children(collection, node, ChildrenOptions { depth: *depth })
                .await?;
            match format {
                OutputFormat::Human => print_nodes(&nodes),
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = TreeNode::walk(&nodes)
                        .map(|(level, node)| {
                            serde_json::json!({
                                "node": node.node,
                                "hasChild": node.has_child,
                                "depth": level,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string(&rows)?);
                }
            }
        }
        TreeCommand::Parents { collection, node } => {
            let parents = engine.parents(collection, node).await?;
            print_list(format, "parents", &parents, "No parents.")?;
        }
        TreeCommand::Path {
            collection,
            from,
            to,
        } => {
            let path = engine.path(collection, from, to).await?;
            print_value(format, "path", &path, || {
                if path.is_empty() {
                    format!("No path from {from} to {to}.")
                } else {
                    path.join(" -> ")
                }
            })?;
        }
        TreeCommand::Rem {
            collection,
            parent,
            node,
            count,
        } => {
            let destroyed = engine.rem(collection, parent, *count, node).await?;
            print_value(format, "destroyed", &destroyed, || {
                format!("removed {parent} -> {node}, destroyed {destroyed} node(s)")
            })?;
        }
        TreeCommand::Mrem {
            collection,
            node,
            exclude,
        } => {
            let options = MremOptions {
                exclude: exclude.clone(),
            };
            let result = engine.mrem(collection, node, options).await?;
            match format {
                OutputFormat::Human => println!(
                    "removed {} edge(s), destroyed {} node(s)",
                    result.removed, result.destroyed
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
            }
        }
        TreeCommand::Destroy { collection, node } => {
            let destroyed = engine.destroy(collection, node).await?;
            print_value(format, "destroyed", &destroyed, || {
                format!("destroyed {destroyed} node(s)")
            })?;
        }
        TreeCommand::Exists { collection, node } => {
            let exists = engine.exists(collection, node).await?;
            print_value(format, "exists", &exists, || exists.to_string())?;
        }
        TreeCommand::Rename {
            collection,
            node,
            new_id,
        } => {
            let renamed = engine.rename(collection, node, new_id).await?;
            print_value(format, "renamed", &renamed, || {
                if renamed {
                    format!("renamed {node} to {new_id}")
                } else {
                    format!("{node} does not exist")
                }
            })?;
        }
        TreeCommand::Prune { collection, node } => {
            let pruned = engine.prune(collection, node).await?;
            print_value(format, "pruned", &pruned, || {
                if pruned {
                    format!("pruned {node}")
                } else {
                    format!("{node} does not exist")
                }
            })?;
        }
        TreeCommand::MoveChildren {
            collection,
            source,
            target,
            prepend,
        } => {
            let mode = if *prepend {
                MoveMode::Prepend
            } else {
                MoveMode::Append
            };
            let moved = engine.move_children(collection, source, target, mode).await?;
            print_value(format, "moved", &moved, || {
                format!("moved {moved} child(ren) from {source} to {target}")
            })?;
        }
    }
    Ok(())
}

fn print_list(
    format: OutputFormat,
    key: &str,
    items: &[String],
    empty: &str,
) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Human && items.is_empty() {
        println!("{empty}");
        return Ok(());
    }
    if format == OutputFormat::Human {
        let rows: Vec<Vec<String>> = items.iter().map(|item| vec![item.clone()]).collect();
        let header = key.to_uppercase();
        print_table(&[header.as_str()], &rows);
        return Ok(());
    }
    print_value(format, key, &items, String::new)
}

/// Indented outline, marking nodes whose children were cut off by the depth bound.
fn print_nodes(nodes: &[TreeNode]) {
    for (level, node) in TreeNode::walk(nodes) {
        let cut = if node.has_child && node.children.is_empty() {
            " ..."
        } else {
            ""
        };
        println!("{:indent$}{}{cut}", "", node.node, indent = level * 2);
    }
}
