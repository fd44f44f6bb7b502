//! Terminal rendering of outcome messages, plus the pending-call spinner.

use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tsplpanel_core::{Notifier, OutcomeMessage, Severity};

/// Writes outcome messages to stderr and counts errors for the exit code.
///
/// Quiet mode drops `ok` and `warn` messages; errors always print.
pub struct ConsoleNotifier {
    color: bool,
    quiet: bool,
    errors: AtomicUsize,
    spinner: ProgressBar,
}

impl ConsoleNotifier {
    pub fn new(color: bool, quiet: bool) -> Self {
        let spinner = if quiet || !io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };

        Self {
            color,
            quiet,
            errors: AtomicUsize::new(0),
            spinner,
        }
    }

    /// Number of `err` messages seen so far.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn spinner(&self) -> ProgressBar {
        self.spinner.clone()
    }

    fn render(&self, message: &OutcomeMessage) -> String {
        let (marker, text) = (marker(message.severity), message.text.as_str());
        if !self.color {
            return format!("{marker} {text}");
        }
        match message.severity {
            Severity::Ok => format!("{} {text}", marker.green()),
            Severity::Warn => format!("{} {}", marker.yellow(), text.yellow()),
            Severity::Err => format!("{} {}", marker.red().bold(), text.red()),
        }
    }
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Ok => "✓",
        Severity::Warn => "!",
        Severity::Err => "✗",
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: OutcomeMessage) {
        tracing::debug!(severity = %message.severity, text = %message.text, "notification");
        if message.severity == Severity::Err {
            self.errors.fetch_add(1, Ordering::SeqCst);
        } else if self.quiet {
            return;
        }
        let line = self.render(&message);
        self.spinner.suspend(|| eprintln!("{line}"));
    }
}

// ── Spinner ──────────────────────────────────────────────────────────

/// Keeps the spinner in step with the pending count until dropped.
pub struct PendingSpinner {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

pub fn track_pending(bar: ProgressBar, mut pending: watch::Receiver<usize>) -> PendingSpinner {
    let task_bar = bar.clone();
    let task = tokio::spawn(async move {
        loop {
            let count = *pending.borrow_and_update();
            if count > 0 {
                if task_bar.is_finished() {
                    task_bar.reset();
                }
                task_bar.set_message(format!("Waiting for agent ({count} pending)"));
                task_bar.enable_steady_tick(Duration::from_millis(100));
            } else {
                task_bar.finish_and_clear();
            }
            if pending.changed().await.is_err() {
                break;
            }
        }
    });
    PendingSpinner { bar, task }
}

impl Drop for PendingSpinner {
    fn drop(&mut self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}
