//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use userdesk_core::AppMode;

/// Userdesk CLI - browse and manage directory users
///
/// Every command talks to the backend through the same HTTP adapter the
/// desk application uses, with the same credentials and error handling.
#[derive(Parser, Debug)]
#[command(
    name = "userdesk",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "USERDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Application mode; overrides USERDESK_ENV and the config file
    #[arg(long, value_enum, global = true)]
    pub mode: Option<Mode>,

    /// Origin used in production mode
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Application route the command runs under, e.g. `#/push-data/1`
    #[arg(long, global = true, default_value = "#/")]
    pub route: String,

    /// Request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout: Option<u64>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with directory users
    Users(UsersArgs),

    /// Manage the stored session credentials
    Session(SessionArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersAction {
    /// Fetch and list all users (Ctrl-C aborts the request)
    List(UsersListArgs),

    /// Create users from a JSON or YAML file holding an array of users
    Create(UsersCreateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct UsersListArgs {}

#[derive(Parser, Debug, Clone)]
pub struct UsersCreateArgs {
    /// Path to the users file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Value sent in the X-Request-Source header
    #[arg(long, value_name = "SOURCE")]
    pub request_source: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionAction {
    /// Store a bearer token (and optionally a client identifier)
    Login(LoginArgs),

    /// Forget the stored credentials
    Logout,

    /// Show what is stored
    Show,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginArgs {
    /// Bearer token sent with every request
    #[arg(long, env = "USERDESK_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Client identifier sent as `<tag>;<id>`
    #[arg(long)]
    pub client_id: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Application mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Local development server
    Development,
    /// Same-origin production backend
    Production,
}

impl From<Mode> for AppMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => AppMode::Development,
            Mode::Production => AppMode::Production,
        }
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
