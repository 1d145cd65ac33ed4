use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "notevault")]
#[command(about = "Versioned backup and plain-text sync for your notes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file (defaults to $NOTEVAULT_CONFIG or the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every note once and store new versions
    Check {
        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep checking for changes until interrupted
    Watch {
        /// Seconds between checks (overrides the configured interval)
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Decode a raw note payload file
    Decode {
        /// File holding the payload bytes
        file: PathBuf,
        /// What to print
        #[arg(long, value_enum, default_value_t = ContentFormat::Markdown)]
        format: ContentFormat,
    },
    /// Browse stored versions
    Versions {
        #[command(subcommand)]
        command: VersionsCommands,
    },
    /// Delete old versions beyond a retention count
    Prune {
        /// Only prune this note (all notes when omitted)
        #[arg(long, value_name = "UUID")]
        note: Option<String>,
        /// Versions to keep per note (defaults to the configured retention)
        #[arg(long, value_name = "N")]
        keep: Option<usize>,
    },
    /// Mirror a note folder to a directory of markdown files
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Export the version history of a note
    Export {
        /// Note uuid
        note: String,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ContentFormat {
    Text,
    Markdown,
    Html,
    Json,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum VersionsCommands {
    /// List tracked notes, or the versions of one note
    List {
        /// Note uuid
        note: Option<String>,
        /// Include notes deleted from the source
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one stored version
    Show {
        /// Note uuid
        note: String,
        /// Version number (latest when omitted)
        #[arg(long, short = 'v', value_name = "N")]
        version: Option<u32>,
        /// What to print
        #[arg(long, value_enum, default_value_t = ContentFormat::Markdown)]
        format: ContentFormat,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Reconcile the directory and the folder
    Run {
        #[command(flatten)]
        target: SyncTargetArgs,
        /// Resolve conflicts with the local file
        #[arg(long, conflicts_with = "force_remote")]
        force_local: bool,
        /// Resolve conflicts with the remote note
        #[arg(long)]
        force_remote: bool,
    },
    /// Show what a run would do without changing anything
    Plan {
        #[command(flatten)]
        target: SyncTargetArgs,
        /// Plan conflicts as pushes of the local file
        #[arg(long, conflicts_with = "force_remote")]
        force_local: bool,
        /// Plan conflicts as pulls of the remote note
        #[arg(long)]
        force_remote: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tracked files and their last sync state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SyncTargetArgs {
    /// Local directory (defaults to the configured one)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,
    /// Remote folder (defaults to the configured one)
    #[arg(long, value_name = "NAME")]
    pub folder: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// Directory for version files
        #[arg(long, value_name = "PATH")]
        version_root: Option<PathBuf>,
        /// Index database path
        #[arg(long, value_name = "PATH")]
        index_path: Option<PathBuf>,
        /// Note store database path
        #[arg(long, value_name = "PATH")]
        source_path: Option<PathBuf>,
        /// Seconds between checks in watch mode
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
        /// Versions to keep per note (0 keeps everything)
        #[arg(long, value_name = "N")]
        retention: Option<usize>,
        /// Directory mirrored by sync
        #[arg(long, value_name = "PATH")]
        sync_dir: Option<PathBuf>,
        /// Remote folder mirrored by sync
        #[arg(long, value_name = "NAME")]
        sync_folder: Option<String>,
    },
    /// Print the effective configuration
    Show,
}
