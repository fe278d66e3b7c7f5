use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobfs",
    about = "blobfs — local-filesystem object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Bucket root directory. Must already exist.
    #[arg(short, long, global = true, default_value = ".")]
    pub root: String,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a local file (or stdin) under a key
    Put(PutArgs),
    /// Stream a blob to stdout
    Cat(CatArgs),
    /// Show a blob's attributes
    Stat(StatArgs),
    /// List blobs, one page at a time
    Ls(LsArgs),
    /// Delete a blob and its attributes
    Rm(RmArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    /// Local file to read; stdin when omitted.
    pub file: Option<String>,
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,
    /// Metadata entry as key=value; repeatable.
    #[arg(long = "meta")]
    pub meta: Vec<String>,
}

#[derive(Args)]
pub struct CatArgs {
    pub key: String,
    /// Byte offset to start reading from.
    #[arg(long, default_value = "0")]
    pub offset: u64,
    /// Maximum number of bytes to read.
    #[arg(long)]
    pub length: Option<u64>,
}

#[derive(Args)]
pub struct StatArgs {
    pub key: String,
}

#[derive(Args)]
pub struct LsArgs {
    /// Only list names starting with this prefix.
    #[arg(long, default_value = "")]
    pub prefix: String,
    /// Entries per page; 0 uses the backend default.
    #[arg(long, default_value = "0")]
    pub page_size: usize,
    /// Continuation token from a previous page.
    #[arg(long)]
    pub page_token: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    pub key: String,
}
