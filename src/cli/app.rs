use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlb")]
#[command(about = "Read-only SQLite table b-tree toolkit")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Raise the log level on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up rowids read from stdin, one per line
    Search {
        /// Path to SQLite database file
        #[arg(short, long)]
        file: String,

        /// Root page number of the table b-tree
        #[arg(short, long)]
        root: u32,

        /// Output one JSON object per rowid
        #[arg(long)]
        json: bool,

        /// Resolve rowids on N threads (output keeps input order)
        #[arg(long, default_value = "1")]
        threads: usize,

        /// Override page size (default: from file header)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Maximum b-tree depth before a descent is reported as corrupt
        #[arg(long = "max-depth")]
        max_depth: Option<u64>,
    },

    /// Decode the database file header
    Info {
        /// Path to SQLite database file
        #[arg(short, long)]
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show b-tree page headers and cells
    Pages {
        /// Path to SQLite database file
        #[arg(short, long)]
        file: String,

        /// Display a specific page number (default: every page)
        #[arg(short, long)]
        page: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Override page size (default: from file header)
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },

    /// Hex dump of raw page bytes
    Dump {
        /// Path to SQLite database file
        #[arg(short, long)]
        file: String,

        /// Page number to dump (default: 1)
        #[arg(short, long)]
        page: Option<u32>,

        /// Number of bytes to dump (default: page size)
        #[arg(short, long)]
        length: Option<usize>,

        /// Output raw binary bytes (no formatting)
        #[arg(long)]
        raw: bool,

        /// Override page size (default: from file header)
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
