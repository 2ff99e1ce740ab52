use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "pov",
    about = "Proof of Perspective: append-only hash-chained event ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the ledger's block files [default: pov-data]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a ledger with its genesis block
    Init,
    /// Append a JSON event payload as a new block
    Append(AppendArgs),
    /// Show blocks, newest first
    Log(LogArgs),
    /// Verify hash chain integrity
    Verify,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct AppendArgs {
    /// Payload as JSON text, e.g. '{"action":"VOTE_CAST"}'
    pub payload: String,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
