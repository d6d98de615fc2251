//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand
//! and the context they share.

mod config;
mod session;
mod users;

pub use config::handle_config;
pub use session::handle_session;
pub use users::handle_users;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::notifier::TerminalNotifier;
use std::sync::Arc;
use userdesk_core::{FileStore, HttpAdapter, KeyValueStore, Location, MemoryLocation, Notifier};

/// Everything a network-facing command needs
pub struct AppContext {
    pub config: Config,
    pub adapter: Arc<HttpAdapter>,
    pub store: Arc<FileStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    /// Wire the adapter to the file store, the route and the terminal
    pub fn build(config: Config, cli: &Cli) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(FileStore::new(config.storage.path.clone()));
        let location: Arc<dyn Location> = Arc::new(MemoryLocation::new(cli.route.clone()));
        let kv: Arc<dyn KeyValueStore> = store.clone();

        let adapter = HttpAdapter::builder()
            .config(config.adapter.clone())
            .store(kv)
            .location(location)
            .build()?;
        let adapter = Arc::new(adapter);

        tracing::debug!(
            base_url = %adapter.base_url(),
            storage = %store.path().display(),
            route = %cli.route,
            "Application context ready"
        );

        let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier::new(
            cli.use_color() && config.output.color,
            cli.quiet,
            config.output.progress,
        ));

        Ok(Self {
            config,
            adapter,
            store,
            notifier,
        })
    }
}
