//! Status command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use kcm_graph::GraphStore;

use super::{connect_graph, GraphArgs};

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

pub async fn execute(args: StatusArgs) -> Result<()> {
    let uri = args.graph.neo4j_uri.clone();
    let client = connect_graph(args.graph).await?;

    println!("{}", "Knowledge Graph Status".bold());
    println!("{}", "─".repeat(40));

    let counts = client.counts().await?;
    println!("  Server:        {}", uri.dimmed());
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());

    let constraints = client.constraint_names().await?;
    println!("  Constraints:   {}", constraints.len().to_string().cyan());

    println!("{}", "─".repeat(40));
    Ok(())
}
