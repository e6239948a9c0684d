use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the `roundmessenger` binary.
#[derive(Debug, Parser)]
#[command(
    name = "roundmessenger",
    version,
    about = "Send debaters and adjudicators their room assignments over Discord"
)]
pub struct Cli {
    /// Round to message; repeat or comma-separate for several
    #[arg(short, long = "round", value_delimiter = ',', required = true)]
    pub rounds: Vec<String>,

    /// File to read environment variables from
    #[arg(long, default_value = ".env")]
    pub env: PathBuf,

    /// SQLite database of participants (defaults to <TABBYCAT_SLUG>.db)
    #[arg(long)]
    pub db: Option<String>,

    /// Path to the categories TOML document
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Resolve and log every message without sending anything
    #[arg(long)]
    pub dry_run: bool,
}
