//! Export command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use kcm_core::SourceConfig;
use kcm_graph::sync::ExportSummary;
use kcm_graph::{ExportOptions, GraphStore, MemoryStore};
use kcm_source::{IdentitySource, KeycloakClient, SnapshotSource};
use tracing::info;

use super::{connect_graph, GraphArgs, SourceArgs};

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    /// Drop all constraints, indexes and data before loading
    #[arg(long)]
    pub clean: bool,

    /// Only export this realm (repeatable)
    #[arg(long = "realm", value_name = "NAME")]
    pub realms: Vec<String>,

    /// Read from a JSON snapshot instead of a live server
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Load into memory instead of Neo4j and only report counts
    #[arg(long)]
    pub dry_run: bool,

    /// Log file, truncated on each run
    #[arg(long, default_value = "kcmapper_export.log")]
    pub log_file: PathBuf,
}

pub async fn execute(args: ExportArgs) -> Result<()> {
    let source = open_source(&args).await?;
    let options = ExportOptions {
        reset: args.clean,
        realms: args.realms.clone(),
    };

    println!("{}", "Exporting to Knowledge Graph...".bold());

    let summary = if args.dry_run {
        let store = MemoryStore::new();
        let summary = kcm_graph::run_export(source.as_ref(), &store, &options).await;
        let counts = store.counts().await?;
        println!(
            "{} {} nodes, {} relationships held in memory",
            "Dry run:".yellow().bold(),
            counts.nodes,
            counts.relationships
        );
        summary
    } else {
        let client = connect_graph(args.graph.clone()).await?;
        let summary = kcm_graph::run_export(source.as_ref(), &client, &options).await;
        drop(client);
        info!("Neo4j connection closed");
        summary
    };

    print_summary(&summary);
    Ok(())
}

async fn open_source(args: &ExportArgs) -> Result<Box<dyn IdentitySource>> {
    if let Some(path) = &args.snapshot {
        let source = SnapshotSource::from_path(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        info!(path = %path.display(), "Loaded snapshot");
        return Ok(Box::new(source));
    }

    let config = SourceConfig::from(args.source.clone());
    config.validate()?;
    let client = KeycloakClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Keycloak at {}", config.url))?;
    info!(realm = %config.auth_realm, "Successfully connected to Keycloak");
    Ok(Box::new(client))
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("{}", "Export summary".bold());
    println!("{}", "─".repeat(78));
    println!("  Run:     {}", summary.run_id.to_string().dimmed());
    println!("  Realms:  {}", summary.realms.join(", ").cyan());
    let elapsed = summary.finished_at - summary.started_at;
    println!("  Elapsed: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);

    if let Some(reset) = &summary.reset {
        println!(
            "  Reset:   {} constraints, {} indexes, {} nodes removed",
            reset.constraints_dropped, reset.indexes_dropped, reset.deleted.nodes
        );
    }
    if summary.schema.failed > 0 {
        println!(
            "  Schema:  {}",
            format!("{} constraint(s) could not be created", summary.schema.failed).red()
        );
    }

    println!();
    println!(
        "  {:<22} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Loader", "Nodes", "Rels", "Skipped", "Failed", "Extract"
    );
    for entry in &summary.by_loader {
        let r = &entry.result;
        println!(
            "  {:<22} {:>8} {:>8} {:>8} {:>8} {:>10}",
            entry.loader,
            r.nodes_upserted,
            r.relationships_upserted,
            r.relationships_skipped,
            colored_count(r.failed),
            colored_count(r.extraction_failures)
        );
    }

    let total = summary.total();
    println!("{}", "─".repeat(78));
    println!(
        "  {:<22} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Total",
        total.nodes_upserted,
        total.relationships_upserted,
        total.relationships_skipped,
        colored_count(total.failed),
        colored_count(total.extraction_failures)
    );

    println!();
    if total.has_errors() {
        println!("{}", "Export finished with errors; see the log file for details.".yellow());
    } else {
        println!("{}", "Export complete.".green().bold());
    }
}

fn colored_count(n: usize) -> colored::ColoredString {
    if n == 0 {
        n.to_string().normal()
    } else {
        n.to_string().red()
    }
}
