//! Userdesk CLI - Command-line interface for the user directory
//!
//! This is the main entry point for the Userdesk CLI application, providing
//! commands for listing and creating users, managing the stored session,
//! and inspecting configuration.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod notifier;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use handlers::AppContext;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use std::time::Duration;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    // Logging settings may come from the config file, so load it first
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));
            process::exit(e.exit_code());
        }
    };

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            // Api failures were already shown through the notifier
            if !e.is_reported() {
                eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));
            }
            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, mut config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    config.apply_overrides(
        cli.mode.map(Into::into),
        cli.origin.as_deref(),
        cli.timeout.map(Duration::from_millis),
    );

    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        mode = ?config.adapter.mode,
        "Executing command"
    );

    match cli.command {
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Users(ref args) => {
            let ctx = AppContext::build(config, &cli)?;
            handlers::handle_users(args.clone(), &ctx, &mut output).await
        }
        Commands::Session(ref args) => {
            let ctx = AppContext::build(config, &cli)?;
            handlers::handle_session(args.clone(), &ctx, &mut output).await
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_file(&config.logging, cli.verbosity_level());

    // Apply environment overrides
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["userdesk", "-vv", "users", "list"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["userdesk", "--quiet", "session", "logout"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert!(matches!(cli.command, Commands::Session(_)));
    }

    #[test]
    fn test_help_is_required() {
        assert!(Cli::try_parse_from(["userdesk"]).is_err());
    }
}
