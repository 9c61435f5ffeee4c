//! Serve command - exposes the chosen executor over HTTP.

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use trellis::backend::{AtomicExecutor, remote};

use crate::backend::{create_executor, save_if_in_memory};
use crate::cli::{BackendArgs, ServeArgs};

/// Run the Trellis server
pub async fn run(
    args: &ServeArgs,
    backend_config: &BackendArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = create_executor(backend_config).await?;
    let app = remote::router(executor.clone());

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(backend = executor.kind(), %local_addr, "Server listening");

    println!("Trellis server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  POST /api/v0/execute - Run one tree operation atomically");
    println!("  GET  /health         - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }
        })
        .await?;

    save_on_shutdown(executor, backend_config).await;
    println!("Server shut down");
    Ok(())
}

async fn save_on_shutdown(executor: Arc<dyn AtomicExecutor>, backend_config: &BackendArgs) {
    match save_if_in_memory(executor.as_ref(), backend_config).await {
        Ok(()) => {
            if executor.kind() == "inmemory" {
                println!("\nStore saved successfully");
            }
        }
        Err(e) => {
            tracing::error!("Failed to save store: {e}");
            eprintln!("Failed to save store: {e}");
        }
    }
}
