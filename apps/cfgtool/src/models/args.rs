//! # CLI Argument Definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lattice-cfg")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect, edit and convert project settings")]
pub(crate) struct Cli {
    /// Tool configuration file (defaults to ./lattice.toml when present)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Where the project is and which feature tags are active while reading it.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct ProjectArgs {
    /// Project directory to start the search from
    #[arg(short, long)]
    pub(crate) project: Option<PathBuf>,

    /// Search parent directories too
    #[arg(long)]
    pub(crate) upwards: bool,

    /// Mount this pack instead of reading the project from disk
    #[arg(long)]
    pub(crate) pack: Option<PathBuf>,

    /// Skip override.cfg files
    #[arg(long)]
    pub(crate) no_override: bool,

    /// Extra active feature tags (repeatable or comma-separated)
    #[arg(short = 'f', long = "feature", value_delimiter = ',')]
    pub(crate) features: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print the value of a setting, after feature overrides
    Get {
        key: String,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Change a setting and save the project
    Set {
        key: String,
        /// Value literal, e.g. 42, true, "text", Vector2(1.0, 2.0), null to remove
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Store VALUE verbatim as a string instead of parsing it
        #[arg(long)]
        string: bool,
        /// Save to this .cfg or .binary file instead of the project file
        #[arg(short, long)]
        output: Option<String>,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// List every visible setting in order
    List {
        /// Emit JSON instead of key=value lines
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// List registered autoloads
    Autoloads {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Show host, configured and project feature tags
    Features {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Convert a settings file between the text and binary formats
    Convert {
        /// Source file (.cfg or .binary)
        input: String,
        /// Destination file (.cfg or .binary)
        output: String,
    },
}
