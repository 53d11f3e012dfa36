use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(
    name = "sqlsentry",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_TIMESTAMP"), ")"),
    about = "Target environment setup and session resume for SQL injection scans"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare the environment of one or more targets
    Init(InitArgs),
    /// Show results recorded in a session file for a target
    Session(SessionArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Default)]
pub struct InitArgs {
    /// Target URL (mark a custom injection point with '*')
    #[arg(short, long, conflicts_with = "targets")]
    pub url: Option<String>,

    /// File with one target URL per line
    #[arg(short = 'm', long)]
    pub targets: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTTP method: GET, POST or PUT
    #[arg(long)]
    pub method: Option<String>,

    /// Data string to be sent through POST
    #[arg(long)]
    pub data: Option<String>,

    /// HTTP Cookie header value
    #[arg(long)]
    pub cookie: Option<String>,

    /// Extra header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Comma-separated parameters to test
    #[arg(short = 'p', long)]
    pub test_parameter: Option<String>,

    /// Connect to the database directly instead of through HTTP
    #[arg(long)]
    pub direct: bool,

    /// Force the back-end DBMS
    #[arg(long)]
    pub dbms: Option<String>,

    /// Session file (defaults to <output>/<host>/session)
    #[arg(short = 's', long)]
    pub session_file: Option<String>,

    /// Forget results stored in the session file
    #[arg(long)]
    pub flush_session: bool,

    /// Output root directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Write results as XML to this file
    #[arg(long)]
    pub xml_file: Option<String>,

    /// Dump database table entries
    #[arg(long)]
    pub dump_table: bool,

    /// Dump all databases' table entries
    #[arg(long)]
    pub dump_all: bool,

    /// Search column, table or database names
    #[arg(long)]
    pub search: bool,

    /// Read a file from the back-end file system
    #[arg(long)]
    pub read_file: Option<String>,

    /// Write a local file to the back-end file system
    #[arg(long)]
    pub write_file: Option<String>,
}

#[derive(Args, Clone)]
pub struct SessionArgs {
    /// Session file to read
    #[arg(short = 's', long)]
    pub session_file: String,

    /// Target URL whose records to show
    #[arg(short, long)]
    pub url: String,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Configuration file path
    pub config: String,
}
