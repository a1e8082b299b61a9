//! Analyze command: the named-query web API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use kcm_graph::{QueryCatalogue, QueryGateway};

use super::{connect_graph, GraphArgs};

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 5001)]
    pub port: u16,

    /// Query catalogue replacing the built-in one
    #[arg(long, value_name = "FILE")]
    pub queries: Option<PathBuf>,
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let catalogue = match &args.queries {
        Some(path) => QueryCatalogue::from_path(path)
            .with_context(|| format!("Failed to load query catalogue {}", path.display()))?,
        None => QueryCatalogue::builtin().context("Built-in query catalogue is invalid")?,
    };

    let client = connect_graph(args.graph.clone()).await?;
    let gateway = QueryGateway::new(Arc::new(client), catalogue);

    println!(
        "{} {} queries at {}",
        "Serving".green().bold(),
        gateway.catalogue().len(),
        format!("http://{}:{}/api/queries", args.host, args.port).cyan()
    );

    kcm_web::run_server(gateway, &args.host, args.port).await
}
