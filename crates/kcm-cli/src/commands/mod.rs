//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kcm_core::{GraphConfig, SourceConfig};

pub mod analyze;
pub mod export;
pub mod status;

/// KcMapper - map an identity server into a Neo4j graph
#[derive(Parser)]
#[command(name = "kcmapper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Logging level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the identity server configuration and load it into Neo4j
    Export(export::ExportArgs),

    /// Serve the named-query API over the loaded graph
    Analyze(analyze::AnalyzeArgs),

    /// Show graph node and relationship counts
    Status(status::StatusArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Export(args) => export::execute(args).await,
            Commands::Analyze(args) => analyze::execute(args).await,
            Commands::Status(args) => status::execute(args).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Identity server admin API connection.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Server base URL
    #[arg(long, env = "KEYCLOAK_URL", default_value = "http://localhost:8080")]
    pub keycloak_url: String,

    /// Realm to authenticate against
    #[arg(long, env = "KEYCLOAK_REALM", default_value = "master")]
    pub keycloak_realm: String,

    /// Admin client id
    #[arg(long, env = "KEYCLOAK_CLIENT_ID", default_value = "admin-cli")]
    pub keycloak_client_id: String,

    /// Admin username (omit for a client-credentials grant)
    #[arg(long, env = "KEYCLOAK_USER")]
    pub keycloak_user: Option<String>,

    #[arg(long, env = "KEYCLOAK_PASSWORD", hide_env_values = true)]
    pub keycloak_password: Option<String>,

    #[arg(long, env = "KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    pub keycloak_secret: Option<String>,

    /// One-time password, for admin accounts with OTP
    #[arg(long, env = "KEYCLOAK_TOTP", hide_env_values = true)]
    pub keycloak_totp: Option<String>,

    /// Users fetched per request
    #[arg(long, default_value_t = kcm_core::config::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl From<SourceArgs> for SourceConfig {
    fn from(args: SourceArgs) -> Self {
        Self {
            url: args.keycloak_url,
            auth_realm: args.keycloak_realm,
            client_id: args.keycloak_client_id,
            username: args.keycloak_user,
            password: args.keycloak_password,
            client_secret: args.keycloak_secret,
            totp: args.keycloak_totp,
            page_size: args.page_size,
            timeout_secs: args.timeout,
        }
    }
}

/// Neo4j connection.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://localhost:7687")]
    pub neo4j_uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    pub neo4j_user: String,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true, default_value = "")]
    pub neo4j_password: String,

    #[arg(long, env = "NEO4J_DATABASE", default_value = "neo4j")]
    pub neo4j_database: String,
}

impl From<GraphArgs> for GraphConfig {
    fn from(args: GraphArgs) -> Self {
        Self {
            uri: args.neo4j_uri,
            user: args.neo4j_user,
            password: args.neo4j_password,
            database: args.neo4j_database,
        }
    }
}

/// Connect to Neo4j, failing the command on bad settings or connectivity.
pub async fn connect_graph(args: GraphArgs) -> Result<kcm_graph::GraphClient> {
    use anyhow::Context;

    let config = GraphConfig::from(args);
    config.validate()?;
    let client = kcm_graph::GraphClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))?;
    tracing::info!(uri = %config.uri, "Successfully connected to Neo4j");
    Ok(client)
}
