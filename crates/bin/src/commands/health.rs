//! Health check command - checks a running Trellis server.

use std::time::Duration;

use trellis::backend::remote::HttpBackend;

use crate::cli::HealthArgs;
use crate::output::OutputFormat;

/// Run the health check command
pub async fn run(args: &HealthArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let base = args.url.trim_end_matches('/');
    let base = base.strip_suffix("/health").unwrap_or(base);
    let client = HttpBackend::with_timeout(base, Duration::from_secs(args.timeout))?;

    match client.health().await {
        Ok(health) if health.status == "ok" => {
            match format {
                OutputFormat::Human => println!(
                    "healthy: {} backend, version {}",
                    health.backend, health.version
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string(&health)?),
            }
            Ok(())
        }
        Ok(health) => {
            eprintln!("unhealthy: server returned status {}", health.status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: {e}");
            std::process::exit(1);
        }
    }
}
