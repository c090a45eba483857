use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::commands::parse::DEFAULT_RETIRED_FILL;

#[derive(Parser, Debug)]
#[command(
    name = "penny-labels",
    version,
    about = "Pressed-penny label document parsing and catalog tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Status(StatusArgs),
    Query(QueryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// A .docx document or a directory of them.
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    /// Keep only the trailing part of dash-separated locations.
    #[arg(long, default_value_t = false)]
    pub short_location: bool,

    /// Join multi-line labels with " - ", e.g. "The Aristocats\nSomething"
    /// becomes "The Aristocats - Something".
    #[arg(long, default_value_t = false)]
    pub multi_line_dash: bool,

    /// Write only records not yet in the database.
    #[arg(short, long, default_value_t = false)]
    pub new_only: bool,

    #[arg(long, default_value_t = false)]
    pub append: bool,

    #[arg(long, default_value = "pennies.db")]
    pub db_path: PathBuf,

    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_RETIRED_FILL)]
    pub retired_fill: String,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "pennies.db")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("filter")
        .required(true)
        .args(["state", "year", "since", "digest"])
))]
pub struct QueryArgs {
    #[arg(long, default_value = "pennies.db")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    /// RFC 3339 timestamp; selects records added after it.
    #[arg(long)]
    pub since: Option<String>,

    #[arg(long)]
    pub digest: Option<String>,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
