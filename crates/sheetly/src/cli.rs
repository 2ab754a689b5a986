//! Clap derive structures for the `sheetly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sheetly -- browse shared music sheets and manage your favorites
#[derive(Debug, Parser)]
#[command(
    name = "sheetly",
    version,
    about = "Browse shared music sheets and manage your favorites",
    long_about = "Command-line client for a sheetly backend project.\n\n\
        Browse the public catalog anonymously, or sign in with a profile\n\
        to like sheets and list your favorites.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "SHEETLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend project URL (overrides profile)
    #[arg(long, short = 'u', env = "SHEETLY_URL", global = true)]
    pub url: Option<String>,

    /// Project anon key (overrides profile)
    #[arg(long, env = "SHEETLY_ANON_KEY", global = true, hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Sign-in email (password from SHEETLY_PASSWORD, keyring or profile)
    #[arg(long, short = 'e', env = "SHEETLY_EMAIL", global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHEETLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates (local stacks)
    #[arg(long, short = 'k', env = "SHEETLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SHEETLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Delay before a like/unlike completes, in milliseconds
    #[arg(long, env = "SHEETLY_LIKE_PACING_MS", global = true, hide = true)]
    pub like_pacing_ms: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show who you are signed in as
    Auth(AuthArgs),

    /// Like, unlike and list your favorite sheets
    #[command(alias = "fav", alias = "l")]
    Likes(LikesArgs),

    /// Browse the public sheet catalog
    #[command(alias = "s")]
    Sheets(SheetsArgs),

    /// Create playlists and collect sheets into them
    #[command(alias = "pl")]
    Playlists(PlaylistsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in and print the current user
    Whoami,
}

// ── Likes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LikesArgs {
    #[command(subcommand)]
    pub command: LikesCommand,
}

#[derive(Debug, Subcommand)]
pub enum LikesCommand {
    /// List the sheets you have liked
    #[command(alias = "ls")]
    List,

    /// Like a sheet
    Add {
        /// Sheet id
        sheet_id: String,
    },

    /// Remove a like
    #[command(alias = "rm")]
    Remove {
        /// Sheet id
        sheet_id: String,
    },
}

// ── Sheets ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SheetsArgs {
    #[command(subcommand)]
    pub command: SheetsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SheetsCommand {
    /// List public sheets
    #[command(alias = "ls")]
    List(SheetListArgs),

    /// Show one sheet with its current like count
    Get {
        /// Sheet id
        sheet_id: String,
    },
}

#[derive(Debug, Args)]
pub struct SheetListArgs {
    /// Match title or composer (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only these instruments (repeatable)
    #[arg(long = "instrument", short = 'i')]
    pub instruments: Vec<String>,

    /// Only this difficulty
    #[arg(long, short = 'd')]
    pub difficulty: Option<DifficultyArg>,

    /// Sort order
    #[arg(long, default_value = "recent")]
    pub sort: SortArg,

    /// Page number (1-based)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Results per page (1-100)
    #[arg(long, default_value = "12", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub per_page: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DifficultyArg {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Newest first
    Recent,
    /// Most downloaded first
    Downloads,
    /// Most liked first
    Likes,
}

// ── Playlists ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PlaylistsArgs {
    #[command(subcommand)]
    pub command: PlaylistsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PlaylistsCommand {
    /// List your playlists
    #[command(alias = "ls")]
    List,

    /// Create a playlist
    Create {
        /// Playlist title
        title: String,

        /// Optional description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Make the playlist visible to other users
        #[arg(long)]
        public: bool,
    },

    /// Show a playlist and its sheets
    Show {
        /// Playlist id
        playlist_id: String,
    },

    /// Add a sheet to the end of a playlist
    Add {
        /// Playlist id
        playlist_id: String,

        /// Sheet id
        sheet_id: String,
    },

    /// Remove a sheet from a playlist
    #[command(alias = "rm")]
    Remove {
        /// Playlist id
        playlist_id: String,

        /// Sheet id
        sheet_id: String,
    },

    /// Delete a playlist
    Delete {
        /// Playlist id
        playlist_id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, anon_key, anon_key_env, email, ca_cert,
        /// insecure, timeout, like_pacing_ms)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the active profile's sign-in password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
