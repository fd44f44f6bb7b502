// ── User feedback channel ──
//
// Outcome messages are fire-and-forget: the panel hands them to whatever
// notifier the front end injected and never reads them back.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How loud a message is. Front ends pick colour and prominence from it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Err,
}

/// A single piece of user feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMessage {
    pub severity: Severity,
    pub text: String,
}

impl OutcomeMessage {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Err,
            text: text.into(),
        }
    }
}

/// Sink for outcome messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: OutcomeMessage);
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<OutcomeMessage>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything notified so far.
    pub fn messages(&self) -> Vec<OutcomeMessage> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything notified so far.
    pub fn take(&self) -> Vec<OutcomeMessage> {
        self.messages
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: OutcomeMessage) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push(message);
        }
    }
}
