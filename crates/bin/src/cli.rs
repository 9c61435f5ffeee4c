//! CLI argument definitions for the Trellis binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database (for shared deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
    /// A running `trellis serve` instance
    Remote,
}

/// Shared, ordered, multi-parent trees
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Trellis: shared, ordered, multi-parent trees")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend_config: BackendArgs,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the trees live.
#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    /// Storage backend to use
    #[arg(short, long, global = true, default_value = "sqlite", env = "TRELLIS_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores trellis.db
    /// For InMemory: stores trellis.json
    #[arg(short = 'D', long, global = true, env = "TRELLIS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, global = true, env = "TRELLIS_POSTGRES_URL")]
    pub postgres_url: Option<String>,

    /// Server URL (required when backend=remote)
    #[arg(long, global = true, env = "TRELLIS_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Give up on an operation after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Tree(TreeCommand),
    /// Serve the chosen backend over HTTP
    Serve(ServeArgs),
    /// Check health of a running Trellis server
    Health(HealthArgs),
}

/// One subcommand per engine operation.
#[derive(Subcommand, Debug)]
pub enum TreeCommand {
    /// Link NODE under PARENT, creating either as needed
    Insert {
        collection: String,
        parent: String,
        node: String,
        /// Landing index; negative counts from the end (-1 appends)
        #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["before", "after"])]
        index: Option<i64>,
        /// Land directly before this sibling
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,
        /// Land directly after this sibling
        #[arg(long)]
        after: Option<String>,
    },
    /// List the descendants of NODE in depth-first order
    Children {
        collection: String,
        node: String,
        /// Levels to descend; the whole subtree when omitted
        #[arg(long)]
        depth: Option<usize>,
    },
    /// List the parents of NODE
    Parents { collection: String, node: String },
    /// Find a downward path between two nodes
    Path {
        collection: String,
        from: String,
        to: String,
    },
    /// Remove the edge PARENT -> NODE, destroying NODE if it was the last one
    Rem {
        collection: String,
        parent: String,
        node: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        count: i64,
    },
    /// Unlink NODE from all its parents
    Mrem {
        collection: String,
        node: String,
        /// Keep the edge from this parent
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Delete NODE and every descendant left without a parent
    Destroy { collection: String, node: String },
    /// Check whether NODE exists
    Exists { collection: String, node: String },
    /// Relabel NODE as NEW_ID
    Rename {
        collection: String,
        node: String,
        new_id: String,
    },
    /// Detach NODE from every parent and drop what becomes unreachable
    Prune { collection: String, node: String },
    /// Move every child of SOURCE under TARGET
    MoveChildren {
        collection: String,
        source: String,
        target: String,
        /// Put the moved children before TARGET's own
        #[arg(long)]
        prepend: bool,
    },
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "TRELLIS_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "TRELLIS_HOST")]
    pub host: String,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
