use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use docsafeapp::model::{parse_expiry_date, AttachmentSlot};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.0"
/// Format for dev builds: "v0.3.0\ndev: abc1234 2024-01-15 14:30"
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

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "docsafe",
    bin_name = "docsafe",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Keep records of your documents and their scans in a local vault", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: $DOCSAFE_VAULT, then the OS data directory)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub vault: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputMode::Text,
        help_heading = "Options"
    )]
    pub output: OutputMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the vault directory and an empty index
    Init,

    /// Add a document, copying its attachment files into the vault
    Add {
        /// Document name
        name: String,

        /// Main attachment (e.g. the front of a card)
        #[arg(long, value_name = "FILE")]
        principal: PathBuf,

        /// Optional second attachment (e.g. the back of a card)
        #[arg(long, value_name = "FILE")]
        secondary: Option<PathBuf>,

        #[arg(short, long)]
        description: Option<String>,

        /// Reference URL
        #[arg(long)]
        url: Option<String>,

        /// Expiry date (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        expires: Option<NaiveDate>,

        /// Add the document as archived
        #[arg(long)]
        archived: bool,
    },

    /// List documents (active ones by default)
    #[command(alias = "ls")]
    List {
        /// Only archived documents
        #[arg(long)]
        archived: bool,

        /// Active and archived documents
        #[arg(long, conflicts_with = "archived")]
        all: bool,
    },

    /// Show one document in full
    Show {
        /// Document id or unique id prefix
        id: String,
    },

    /// Change fields of a document or replace its attachments
    Update {
        /// Document id or unique id prefix
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "clear_url")]
        url: Option<String>,

        /// Remove the reference URL
        #[arg(long)]
        clear_url: bool,

        /// Expiry date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        expires: Option<NaiveDate>,

        #[arg(long, conflicts_with = "unarchive")]
        archive: bool,

        #[arg(long)]
        unarchive: bool,

        /// Replace the main attachment
        #[arg(long, value_name = "FILE")]
        principal: Option<PathBuf>,

        /// Replace or add the second attachment
        #[arg(long, value_name = "FILE")]
        secondary: Option<PathBuf>,
    },

    /// Remove one attachment from a document and delete its file
    Detach {
        /// Document id or unique id prefix
        id: String,

        /// principal (front) or secondary (back)
        slot: AttachmentSlot,
    },

    /// Delete a document and its attachment files
    #[command(alias = "rm")]
    Delete {
        /// Document id or unique id prefix
        id: String,
    },

    /// Print the path and MIME type of an attachment, for opening or sharing it
    Path {
        /// Document id or unique id prefix
        id: String,

        /// principal (front) or secondary (back)
        #[arg(default_value = "principal")]
        slot: AttachmentSlot,
    },

    /// Check that the index and the attachment directory agree
    Doctor {
        /// Delete attachment files no document references
        #[arg(long)]
        reclaim: bool,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_expiry_date(raw).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}
