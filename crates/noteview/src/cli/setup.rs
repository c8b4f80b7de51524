use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, with git hash and commit date for dev builds.
/// Release: "v0.3.0"
/// Dev: "v0.3.0\ndev: abc1234 2026-01-15 14:30"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "noteview",
    bin_name = "noteview",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Render markdown notes through rule-matched HTML views", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub vault: Option<PathBuf>,

    /// Settings file to read and update
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which view a note would be displayed with
    #[command(alias = "m")]
    Match {
        /// Note path, vault-relative or on disk
        note: PathBuf,
    },

    /// Render a note through its matching view
    #[command(alias = "r")]
    Render {
        /// Note path, vault-relative or on disk
        note: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Drop <script> blocks from the output
        #[arg(long)]
        no_scripts: bool,

        /// Emit only the view markup, not a full HTML page
        #[arg(long)]
        fragment: bool,
    },

    /// Manage the ordered view list
    Views {
        #[command(subcommand)]
        action: Option<ViewsCommands>,
    },

    /// List the properties found in the vault and their operators
    #[command(alias = "props")]
    Properties {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a filter chain against a literal value
    Chain {
        /// Input value; numbers are treated as numbers
        value: String,

        /// Filter chain, e.g. "trim | upper"
        chain: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ViewsCommands {
    /// List views in evaluation order
    #[command(alias = "ls")]
    List,

    /// Append a new view
    Add {
        /// Display name
        name: String,

        /// Read the template from a file
        #[arg(short, long, value_name = "FILE")]
        template: Option<PathBuf>,

        /// Add a rule; repeatable
        #[arg(
            short,
            long = "rule",
            num_args = 3,
            value_names = ["FIELD", "OPERATOR", "VALUE"],
            action = ArgAction::Append
        )]
        rules: Vec<String>,

        /// Match when any rule holds instead of all
        #[arg(long)]
        any: bool,
    },

    /// Remove a view by position or id
    #[command(alias = "rm")]
    Remove {
        /// 1-based position or view id
        view: String,
    },

    /// Move a view to a new position
    #[command(alias = "mv")]
    Move {
        /// Current 1-based position
        from: usize,

        /// Target 1-based position
        to: usize,
    },
}
