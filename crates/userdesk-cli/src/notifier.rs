//! Terminal toasts
//!
//! Notices go to stderr so they never mix with structured output on stdout.
//! Loading toasts become spinners while stderr is a terminal.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use userdesk_core::{Notifier, Severity, ToastId, ToastOptions};

/// [`Notifier`] writing to the terminal
pub struct TerminalNotifier {
    use_color: bool,
    quiet: bool,
    spinners_enabled: bool,
    next_id: AtomicU64,
    spinners: Mutex<HashMap<ToastId, ProgressBar>>,
}

impl TerminalNotifier {
    pub fn new(use_color: bool, quiet: bool, progress: bool) -> Self {
        Self {
            use_color,
            quiet,
            spinners_enabled: progress && !quiet && std::io::stderr().is_terminal(),
            next_id: AtomicU64::new(1),
            spinners: Mutex::new(HashMap::new()),
        }
    }

    fn render(&self, severity: Severity, message: &str) -> String {
        if !self.use_color {
            return format!("[{}] {}", severity.to_string().to_uppercase(), message);
        }

        match severity {
            Severity::Info => format!("{} {}", "ℹ".blue(), message),
            Severity::Warn => format!("{} {}", "⚠".yellow(), message.yellow()),
            Severity::Error => format!("{} {}", "✗".red().bold(), message.red()),
            Severity::Success => format!("{} {}", "✓".green(), message.green()),
            Severity::Loading => format!("{} {}", "…".dimmed(), message.dimmed()),
        }
    }

    fn spinners(&self) -> std::sync::MutexGuard<'_, HashMap<ToastId, ProgressBar>> {
        self.spinners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, severity: Severity, message: &str, options: ToastOptions) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(?id, %severity, ?options, "Toast");

        if severity == Severity::Loading && self.spinners_enabled {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(spinner_style());
            spinner.set_message(message.to_string());
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinners().insert(id, spinner);
            return id;
        }

        // Errors and warnings are shown even in quiet mode
        if self.quiet && !matches!(severity, Severity::Error | Severity::Warn) {
            return id;
        }

        let line = self.render(severity, message);
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = writeln!(stderr, "{}", line) {
            tracing::debug!(error = %e, "Failed to write toast");
        }
        id
    }

    fn dismiss(&self, id: ToastId) {
        if let Some(spinner) = self.spinners().remove(&id) {
            spinner.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
