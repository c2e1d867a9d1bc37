use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use zenea_server::SourceSpec;
use zenea_types::BlockId;

#[derive(Parser)]
#[command(
    name = "zenea",
    about = "Zenea: content-addressed block storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve a block storage topology over HTTP
    Serve(ServeArgs),
    /// Store a file, or standard input, as a block
    Put(PutArgs),
    /// Fetch a block and write its content
    Fetch(FetchArgs),
    /// Check whether a block is available
    Check(CheckArgs),
    /// List every available block identifier
    List(ListArgs),
}

/// Storages to operate on. Several sources are read in order and all
/// receive puts.
#[derive(Args)]
pub struct SourceArgs {
    #[arg(short, long = "source", value_name = "SPEC", required = true)]
    pub sources: Vec<SourceSpec>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Fallback source after the local store; repeatable
    #[arg(long, value_name = "SPEC")]
    pub upstream: Vec<SourceSpec>,
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args)]
pub struct PutArgs {
    /// File to store; `-` or nothing reads standard input
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct FetchArgs {
    pub id: BlockId,
    /// Write the content here instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    pub id: BlockId,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
