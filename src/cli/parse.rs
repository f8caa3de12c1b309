//! CLI parse: clap types for uprtcl. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// uprtcl CLI - content-addressed version control over a replicated store
#[derive(Parser, Debug)]
#[command(name = "uprtcl")]
#[command(about = "Contexts, perspectives and commits over a replicated content store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/ lookup)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sled store directory (overrides storage.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Author identity (overrides agent.creator_id)
    #[arg(long)]
    pub creator: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a context, a root commit and a perspective on it
    Init {
        /// Perspective name
        #[arg(default_value = "master")]
        name: String,
        /// Content address of the root commit
        #[arg(long)]
        content: String,
        /// Commit message
        #[arg(long, short, default_value = "Initial commit")]
        message: String,
    },
    /// Context commands
    Context {
        #[command(subcommand)]
        command: ContextCommands,
    },
    /// Perspective commands
    Perspective {
        #[command(subcommand)]
        command: PerspectiveCommands,
    },
    /// Content commands
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Per-entry drafts of this author
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Commit commands
    Commit {
        #[command(subcommand)]
        command: CommitCommands,
    },
    /// Merge one perspective into another
    Merge {
        /// Perspective to merge from
        from: String,
        /// Perspective to merge into
        to: String,
    },
    /// Show the history of a commit, or of a perspective's head
    Log {
        /// Commit or perspective address
        address: String,
    },
    /// Show any entry
    Show {
        address: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContextCommands {
    /// Create a context
    Create {
        /// Milliseconds since the epoch (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// List the perspectives of a context
    List {
        context: String,
    },
    /// List the contexts an author created
    Created {
        /// Author to list (defaults to the configured creator)
        #[arg(long)]
        creator: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PerspectiveCommands {
    /// Create a perspective
    Create {
        name: String,
        /// Context to group it under
        #[arg(long)]
        context: Option<String>,
        /// Initial head commit
        #[arg(long)]
        head: Option<String>,
    },
    /// Print the head as this replica sees it
    Head {
        perspective: String,
    },
    /// Point a perspective at a commit
    SetHead {
        perspective: String,
        commit: String,
        /// Wait until the replica shows the new head
        #[arg(long)]
        wait: bool,
    },
    /// Move a perspective under another context
    Move {
        perspective: String,
        context: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// Store a content object
    Put {
        /// Payload text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the payload from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Named link, as name=address (repeatable)
        #[arg(long = "link", value_name = "NAME=ADDRESS")]
        links: Vec<String>,
    },
    /// Print a content object
    Get {
        address: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Replace the draft for an entry
    Set {
        entry: String,
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long = "link", value_name = "NAME=ADDRESS")]
        links: Vec<String>,
    },
    /// Print the draft for an entry
    Get {
        entry: String,
    },
    /// Drop the draft for an entry
    Clear {
        entry: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommitCommands {
    /// Create a commit from explicit parents
    Create {
        #[arg(long)]
        content: String,
        #[arg(long = "parent")]
        parents: Vec<String>,
        #[arg(long, short)]
        message: String,
    },
    /// Commit on top of a perspective's head and advance it
    On {
        perspective: String,
        #[arg(long)]
        content: String,
        #[arg(long, short)]
        message: String,
    },
}
