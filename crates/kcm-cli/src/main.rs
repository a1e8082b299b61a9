//! KcMapper CLI
//!
//! Exports an identity server's realms, clients, roles, groups, users and
//! authentication setup into Neo4j, and serves canned queries over the
//! resulting graph.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

/// Initialize tracing, optionally mirroring output to a log file.
///
/// The file is truncated. The returned guard flushes it when dropped.
fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "warn,kcmapper={level},kcm_graph={level},kcm_source={level},kcm_web={level},tower_http={level}"
        )
        .into()
    });

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; settings can come from flags or the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Export(args) => Some(args.log_file.clone()),
        _ => None,
    };
    let _guard = init_tracing(cli.log_level.as_str(), log_file.as_deref())?;

    cli.execute().await
}
