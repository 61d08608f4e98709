//! Command-line interface definitions.

pub mod serve;
pub mod sign;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::Method;
use crate::error::Result;

/// pubsub-mock - Deterministic mock server for the pub/sub REST API.
#[derive(Parser, Debug)]
#[command(name = "pubsub-mock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mock server until interrupted
    Serve(ServeArgs),

    /// Print the signature for a request
    Sign(SignArgs),
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// TOML file with `[[stubs]]` tables (overrides `server.stubs`)
    #[arg(short, long)]
    pub stubs: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080 (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Account secret (falls back to PUBSUB_SECRET_KEY)
    #[arg(long)]
    pub secret_key: Option<String>,

    #[arg(long)]
    pub subscribe_key: String,

    #[arg(long)]
    pub publish_key: String,

    /// Request path, e.g. /v1/auth/grant/sub-key/demo
    #[arg(long)]
    pub path: String,

    /// HTTP method (only signed under --v2)
    #[arg(long, default_value = "GET")]
    pub method: Method,

    /// Query parameter as key=value; repeatable
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Use the v2 signature layout
    #[arg(long)]
    pub v2: bool,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// Run the parsed command.
///
/// # Errors
///
/// Returns the first error the command hits.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve::execute(args).await,
        Commands::Sign(args) => {
            println!("{}", sign::execute(&args)?);
            Ok(())
        }
    }
}
