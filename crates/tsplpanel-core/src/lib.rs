//! Panel logic between `tsplpanel-api` and a front end (CLI today).
//!
//! - **[`tspl`]**: hardens user-authored TSPL into an agent-safe byte stream
//!   (page setup, clear, print directive, CRLF, 8-bit encoding).
//! - **[`problem`]**: pulls one human-readable line out of any failure value.
//! - **[`Orchestrator`]**: runs agent calls with a pending counter, a fixed
//!   deadline and next-turn dispatch of their outcomes.
//! - **[`PanelController`]**: devices, selection, binding and the current
//!   document, wired to the agent through [`AgentApi`].
//!
//! All user feedback flows through a [`Notifier`] as [`OutcomeMessage`]s.

pub mod agent;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod panel;
pub mod problem;
pub mod tspl;

// ── Primary re-exports ──────────────────────────────────────────────
pub use agent::{AgentApi, AgentCall};
pub use error::CoreError;
pub use notify::{MemoryNotifier, Notifier, OutcomeMessage, Severity};
pub use orchestrator::{Orchestrator, PendingCounter, REQUEST_TIMEOUT, TIMEOUT_MESSAGE};
pub use panel::{PanelController, PanelState};
pub use tspl::{HardenedDocument, harden, validate_source};

pub use tsplpanel_api::{Binding, Device};
