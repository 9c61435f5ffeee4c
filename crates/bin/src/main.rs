use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trellis=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args, &cli.backend_config).await,
        Commands::Health(args) => commands::health::run(args, cli.format).await,
        Commands::Tree(command) => {
            let executor = backend::create_executor(&cli.backend_config).await?;
            let engine = backend::engine(executor.clone(), &cli.backend_config);
            let result = commands::tree::run(command, &engine, cli.format).await;
            // Keep whatever succeeded before reporting a failure.
            backend::save_if_in_memory(executor.as_ref(), &cli.backend_config).await?;
            result
        }
    }
}
