// ── Guarded request execution ──
//
// Every agent call runs through `Orchestrator::run`: the pending counter is
// bumped before the call starts and released exactly once by a drop guard,
// the call gets a fixed deadline, and its outcome is queued for the owner to
// apply on a later turn. Owner state is never touched from inside a task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::notify::{Notifier, OutcomeMessage};
use crate::problem;

/// Deadline for the agent's first (and only) response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Shown when [`REQUEST_TIMEOUT`] elapses.
pub const TIMEOUT_MESSAGE: &str = "API timeout. Check agent/proxy.";

// ── Pending counter ──────────────────────────────────────────────

/// Number of orchestrated calls currently in flight.
///
/// Only [`Orchestrator`] can change it. Observers subscribe to drive a
/// loading indicator; `loading == (count > 0)`.
#[derive(Debug, Clone)]
pub struct PendingCounter {
    tx: Arc<watch::Sender<usize>>,
}

impl Default for PendingCounter {
    fn default() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }
}

impl PendingCounter {
    pub fn get(&self) -> usize {
        *self.tx.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.get() > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.tx.subscribe()
    }

    fn enter(&self) -> PendingGuard {
        self.tx.send_modify(|n| *n += 1);
        trace!(pending = self.get(), "pending++");
        PendingGuard {
            counter: self.clone(),
        }
    }

    fn leave(&self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
        trace!(pending = self.get(), "pending--");
    }
}

/// Releases one pending slot when dropped, whichever way the call ended.
#[derive(Debug)]
struct PendingGuard {
    counter: PendingCounter,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.counter.leave();
    }
}

// ── Orchestrator ─────────────────────────────────────────────────

/// Outcome of one call, applied to owner state on a later turn. Yields the
/// message to notify, if any, or the failure to report.
type Dispatch<S> = Box<dyn FnOnce(&mut S) -> Result<Option<OutcomeMessage>, CoreError> + Send>;

/// Runs agent calls on behalf of an owner holding state `S`.
///
/// Completed calls queue a dispatch; the owner applies them with
/// [`turn`](Self::turn), [`drain`](Self::drain) or [`settle`](Self::settle),
/// so success handlers always run after the turn that delivered the result.
/// Failures are notified and also kept until [`take_failures`](Self::take_failures)
/// collects them, so a caller can tell a timeout from an agent rejection.
/// Spawns onto the ambient tokio runtime; a current-thread runtime gives the
/// single-threaded scheduling the panel expects.
pub struct Orchestrator<S> {
    pending: PendingCounter,
    timeout: Duration,
    notifier: Arc<dyn Notifier>,
    failures: Vec<CoreError>,
    dispatch_tx: mpsc::UnboundedSender<Dispatch<S>>,
    dispatch_rx: mpsc::UnboundedReceiver<Dispatch<S>>,
}

impl<S: Send + 'static> Orchestrator<S> {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        Self {
            pending: PendingCounter::default(),
            timeout: REQUEST_TIMEOUT,
            notifier,
            failures: Vec::new(),
            dispatch_tx,
            dispatch_rx,
        }
    }

    pub fn pending(&self) -> &PendingCounter {
        &self.pending
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Failures reported since the last call, oldest first.
    pub fn take_failures(&mut self) -> Vec<CoreError> {
        std::mem::take(&mut self.failures)
    }

    /// Start a guarded call.
    ///
    /// `start` builds the request. If it fails, the pending slot is released
    /// at once and the failure is notified and kept immediately; nothing is
    /// queued.
    /// Otherwise the call runs in the background under the deadline and its
    /// outcome is queued: `on_success` on success, an error notification on
    /// failure or timeout. An `Err` from `on_success` becomes an error
    /// notification. Nothing is retried.
    pub fn run<T, Fut, Start, OnOk>(
        &mut self,
        operation: &'static str,
        start: Start,
        on_success: OnOk,
    ) where
        Start: FnOnce() -> Result<Fut, CoreError>,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
        T: Send + 'static,
        OnOk: FnOnce(&mut S, T) -> Result<Option<OutcomeMessage>, CoreError> + Send + 'static,
    {
        let guard = self.pending.enter();

        let call = match start() {
            Ok(call) => call,
            Err(err) => {
                drop(guard);
                warn!(operation, error = %err, "request could not be started");
                self.fail(err);
                return;
            }
        };

        let deadline = self.timeout;
        let dispatch_tx = self.dispatch_tx.clone();

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(deadline, call).await;

            let dispatch: Dispatch<S> = match outcome {
                Ok(Ok(value)) => {
                    debug!(operation, "request succeeded");
                    Box::new(move |state: &mut S| {
                        on_success(state, value).inspect_err(|err| {
                            warn!(operation, error = %err, "success handler failed");
                        })
                    })
                }
                Ok(Err(err)) => {
                    warn!(operation, error = %err, "request failed");
                    Box::new(move |_: &mut S| Err(err))
                }
                Err(_) => {
                    warn!(operation, timeout = ?deadline, "request timed out");
                    let timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                    Box::new(move |_: &mut S| Err(CoreError::Timeout { timeout_ms }))
                }
            };

            // Queue before releasing the slot so an owner that sees zero
            // pending also sees this outcome. The owner may have gone away;
            // the outcome then has nowhere to land.
            let _ = dispatch_tx.send(dispatch);
            drop(guard);
        });
    }

    /// Wait for the next queued outcome and apply it.
    ///
    /// Waits indefinitely when nothing is in flight.
    pub async fn turn(&mut self, state: &mut S) {
        if let Some(dispatch) = self.dispatch_rx.recv().await {
            self.apply(dispatch, state);
        }
    }

    /// Apply every outcome already queued without waiting. Returns how many
    /// were applied.
    pub fn drain(&mut self, state: &mut S) -> usize {
        let mut applied = 0;
        while let Ok(dispatch) = self.dispatch_rx.try_recv() {
            self.apply(dispatch, state);
            applied += 1;
        }
        applied
    }

    /// Apply outcomes until nothing is in flight and nothing is queued.
    pub async fn settle(&mut self, state: &mut S) {
        loop {
            self.drain(state);
            if self.pending.get() == 0 {
                // Outcomes are queued before their slot is released.
                self.drain(state);
                break;
            }
            self.turn(state).await;
        }
    }

    fn apply(&mut self, dispatch: Dispatch<S>, state: &mut S) {
        match dispatch(state) {
            Ok(Some(message)) => self.notifier.notify(message),
            Ok(None) => {}
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: CoreError) {
        self.notifier.notify(OutcomeMessage::err(failure_text(&err)));
        self.failures.push(err);
    }
}

/// Notification text for a failed call. Timeouts, whether from the deadline
/// or the transport, share one fixed message.
fn failure_text(err: &CoreError) -> String {
    match err {
        CoreError::Timeout { .. } => TIMEOUT_MESSAGE.to_owned(),
        other => problem::extract(&other.failure_value()),
    }
}
