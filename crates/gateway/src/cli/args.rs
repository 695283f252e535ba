pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linkshare")]
#[command(about = "Serve stored objects through sharing links and custom domains")]
pub struct Args {
    /// Path to the gateway config file (defaults are used if not set)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
