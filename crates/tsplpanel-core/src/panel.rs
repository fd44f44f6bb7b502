// ── Panel controller ──
//
// State glue between the agent and a front end. Every agent operation goes
// through the orchestrator; pre-condition checks run first and bail out with
// a warning without touching the pending counter or the network.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use tsplpanel_api::{
    BindRequest, BindResponse, Binding, Device, DevicesResponse, IdentityResponse, PrintRequest,
    PrintResponse,
};

use crate::agent::AgentApi;
use crate::error::CoreError;
use crate::notify::{Notifier, OutcomeMessage};
use crate::orchestrator::{Orchestrator, PendingCounter};
use crate::tspl;

const NO_SELECTION: &str = "Select TSC printer device first";
const NO_USB_IDS: &str = "Selected device has no VID/PID";
const NOT_BOUND: &str = "Printer not bound. Bind first.";
const DEFAULT_FRIENDLY_NAME: &str = "USB Device";

// ── State ────────────────────────────────────────────────────────

/// Everything the panel shows. Mutated only by the controller and by
/// dispatched success handlers.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    devices: Vec<Device>,
    selected: Option<Device>,
    binding: Option<Binding>,
}

impl PanelState {
    /// Bindable devices from the last successful listing.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected(&self) -> Option<&Device> {
        self.selected.as_ref()
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Replace the device list, keeping the selection if its device is still
    /// listed. The selection is swapped for the fresh entry.
    fn replace_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices.into_iter().filter(Device::is_bindable).collect();
        self.selected = self.selected.take().and_then(|current| {
            self.devices
                .iter()
                .find(|d| d.physical_device_id == current.physical_device_id)
                .cloned()
        });
    }
}

// ── Controller ───────────────────────────────────────────────────

pub struct PanelController {
    agent: Arc<dyn AgentApi>,
    orchestrator: Orchestrator<PanelState>,
    state: PanelState,
    document: String,
}

impl PanelController {
    pub fn new(agent: Arc<dyn AgentApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            agent,
            orchestrator: Orchestrator::new(notifier),
            state: PanelState::default(),
            document: tspl::SAMPLE_DOCUMENT.to_owned(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn set_document(&mut self, document: impl Into<String>) {
        self.document = document.into();
    }

    pub fn pending(&self) -> &PendingCounter {
        self.orchestrator.pending()
    }

    pub fn is_loading(&self) -> bool {
        self.pending().is_loading()
    }

    /// Watch the pending count, e.g. to drive a spinner.
    pub fn subscribe_pending(&self) -> watch::Receiver<usize> {
        self.pending().subscribe()
    }

    /// Failures of agent calls since the last call to this method.
    pub fn take_failures(&mut self) -> Vec<CoreError> {
        self.orchestrator.take_failures()
    }

    // ── Selection ────────────────────────────────────────────────

    pub fn select(&mut self, device: Device) {
        self.state.selected = Some(device);
    }

    /// Select a listed device by physical id. Returns `false` if no listed
    /// device has that id; the selection is then left unchanged.
    pub fn select_by_id(&mut self, physical_device_id: &str) -> bool {
        let found = self
            .state
            .devices
            .iter()
            .find(|d| d.physical_device_id == physical_device_id)
            .cloned();
        match found {
            Some(device) => {
                self.state.selected = Some(device);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }

    // ── Operations ───────────────────────────────────────────────

    pub fn refresh_all(&mut self) {
        self.load_devices();
        self.load_binding();
    }

    pub fn load_devices(&mut self) {
        self.orchestrator.run(
            "load_devices",
            || self.agent.list_devices(),
            |state: &mut PanelState, response: DevicesResponse| {
                debug!(
                    reported = response.count,
                    listed = response.devices.len(),
                    "devices received"
                );
                state.replace_devices(response.devices);
                Ok(Some(OutcomeMessage::ok(format!(
                    "Devices loaded: {}",
                    response.count
                ))))
            },
        );
    }

    pub fn load_binding(&mut self) {
        self.orchestrator.run(
            "load_binding",
            || self.agent.identity(),
            |state: &mut PanelState, response: IdentityResponse| {
                state.binding = response.binding;
                Ok(None)
            },
        );
    }

    /// Bind the selected device as the active printer.
    pub fn bind_selected(&mut self) {
        let Some(device) = self.state.selected() else {
            self.warn(NO_SELECTION);
            return;
        };
        let (Some(vid), Some(pid)) = (
            non_empty(device.vendor_id.as_deref()),
            non_empty(device.product_id.as_deref()),
        )
        else {
            self.warn(NO_USB_IDS);
            return;
        };

        let friendly_name = if device.name.is_empty() {
            DEFAULT_FRIENDLY_NAME.to_owned()
        } else {
            device.name.clone()
        };
        let request = BindRequest {
            vid: vid.to_owned(),
            pid: pid.to_owned(),
            serial: Some(device.serial.clone().unwrap_or_default()),
            friendly_name: Some(friendly_name),
        };

        self.orchestrator.run(
            "bind",
            || self.agent.bind(request),
            |state: &mut PanelState, response: BindResponse| {
                state.binding = Some(response.binding);
                Ok(Some(OutcomeMessage::ok("Bind successful")))
            },
        );
    }

    /// Harden the current document and print it on the bound printer.
    pub fn print(&mut self) {
        let Some(binding) = self.state.binding() else {
            self.warn(NOT_BOUND);
            return;
        };
        if let Err(err) = tspl::validate_source(&self.document) {
            self.warn(err.to_string());
            return;
        }

        let hardened = tspl::harden(&self.document);
        for warning in hardened.warnings() {
            self.warn(warning.clone());
        }

        let request = PrintRequest {
            vid: binding.vendor_id.clone(),
            pid: binding.product_id.clone(),
            serial: Some(binding.serial.clone()),
            data_base64: hardened.to_base64(),
        };
        debug!(bytes = hardened.bytes().len(), "sending print job");

        self.orchestrator.run(
            "print",
            || self.agent.print(request),
            |_state: &mut PanelState, response: PrintResponse| Ok(Some(print_outcome(&response))),
        );
    }

    // ── Turns ────────────────────────────────────────────────────

    /// Apply the next finished call, waiting for one if necessary.
    pub async fn turn(&mut self) {
        self.orchestrator.turn(&mut self.state).await;
    }

    /// Apply every finished call without waiting.
    pub fn drain(&mut self) -> usize {
        self.orchestrator.drain(&mut self.state)
    }

    /// Apply finished calls until nothing is in flight.
    pub async fn settle(&mut self) {
        self.orchestrator.settle(&mut self.state).await;
    }

    fn warn(&self, text: impl Into<String>) {
        self.orchestrator.notifier().notify(OutcomeMessage::warn(text));
    }
}

/// Message for a completed print exchange.
fn print_outcome(response: &PrintResponse) -> OutcomeMessage {
    if response.ok {
        let ptr = response
            .result_ptr
            .map_or_else(|| "n/a".to_owned(), |p| p.to_string());
        return OutcomeMessage::ok(format!("Print OK (ptr={ptr})"));
    }

    match response.failure_text() {
        Some(text) => OutcomeMessage::err(text),
        None => OutcomeMessage::err(format!(
            "Print failed (ptr={}, winErr={})",
            response.result_ptr.unwrap_or(0),
            response.last_win32_error.unwrap_or(0)
        )),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use futures_util::FutureExt;
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;
    use crate::agent::AgentCall;
    use crate::notify::{MemoryNotifier, Severity};
    use crate::orchestrator::TIMEOUT_MESSAGE;

    // ── Scripted agent ───────────────────────────────────────────

    #[derive(Default)]
    struct FakeAgent {
        devices: Mutex<DevicesResponse>,
        binding: Mutex<Option<Binding>>,
        print_response: Mutex<PrintResponse>,
        delay: Duration,
        refuse_start: bool,
        calls: AtomicUsize,
        bind_requests: Mutex<Vec<BindRequest>>,
        print_requests: Mutex<Vec<PrintRequest>>,
    }

    impl FakeAgent {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn respond<T: Send + 'static>(&self, value: T) -> Result<AgentCall<T>, CoreError> {
            if self.refuse_start {
                return Err(CoreError::Config {
                    message: "Invalid agent URL: relative URL without a base".into(),
                });
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            Ok(async move {
                sleep(delay).await;
                Ok(value)
            }
            .boxed())
        }
    }

    impl AgentApi for FakeAgent {
        fn list_devices(&self) -> Result<AgentCall<DevicesResponse>, CoreError> {
            self.respond(self.devices.lock().unwrap().clone())
        }

        fn identity(&self) -> Result<AgentCall<IdentityResponse>, CoreError> {
            let binding = self.binding.lock().unwrap().clone();
            self.respond(IdentityResponse {
                ok: true,
                binding,
            })
        }

        fn bind(&self, request: BindRequest) -> Result<AgentCall<BindResponse>, CoreError> {
            let binding = Binding {
                machine_id: "WS-01".into(),
                vendor_id: request.vid.clone(),
                product_id: request.pid.clone(),
                serial: request.serial.clone().unwrap_or_default(),
                friendly_name: request.friendly_name.clone().unwrap_or_default(),
                bound_at: "2026-10-19T08:00:00Z".into(),
            };
            self.bind_requests.lock().unwrap().push(request);
            self.respond(BindResponse { ok: true, binding })
        }

        fn print(&self, request: PrintRequest) -> Result<AgentCall<PrintResponse>, CoreError> {
            self.print_requests.lock().unwrap().push(request);
            self.respond(self.print_response.lock().unwrap().clone())
        }
    }

    fn device(id: &str, vid: Option<&str>, pid: Option<&str>) -> Device {
        Device {
            name: format!("Printer {id}"),
            physical_device_id: id.into(),
            vendor_id: vid.map(Into::into),
            product_id: pid.map(Into::into),
            serial: Some(format!("SN-{id}")),
            status: Some("OK".into()),
        }
    }

    fn bound() -> Binding {
        Binding {
            machine_id: "WS-01".into(),
            vendor_id: "1203".into(),
            product_id: "0230".into(),
            serial: "SN-A".into(),
            friendly_name: "TSC TE200".into(),
            bound_at: "2026-10-19T08:00:00Z".into(),
        }
    }

    fn setup(agent: FakeAgent) -> (Arc<FakeAgent>, Arc<MemoryNotifier>, PanelController) {
        let agent = Arc::new(agent);
        let notifier = Arc::new(MemoryNotifier::new());
        let panel = PanelController::new(agent.clone(), notifier.clone());
        (agent, notifier, panel)
    }

    fn listing() -> DevicesResponse {
        DevicesResponse {
            count: 3,
            devices: vec![
                device("A", Some("1203"), Some("0230")),
                device("B", Some("1203"), None),
                device("C", Some("04B8"), Some("0202")),
            ],
        }
    }

    async fn bound_panel(agent: FakeAgent) -> (Arc<FakeAgent>, Arc<MemoryNotifier>, PanelController) {
        *agent.binding.lock().unwrap() = Some(bound());
        let (agent, notifier, mut panel) = setup(agent);
        panel.load_binding();
        panel.settle().await;
        assert!(panel.state().binding().is_some());
        (agent, notifier, panel)
    }

    // ── Devices ──────────────────────────────────────────────────

    #[tokio::test]
    async fn load_devices_keeps_only_bindable() {
        let agent = FakeAgent::default();
        *agent.devices.lock().unwrap() = listing();
        let (_agent, notifier, mut panel) = setup(agent);

        panel.load_devices();
        assert!(panel.is_loading());
        panel.settle().await;

        let ids: Vec<_> = panel
            .state()
            .devices()
            .iter()
            .map(|d| d.physical_device_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(notifier.messages(), vec![OutcomeMessage::ok("Devices loaded: 3")]);
        assert!(!panel.is_loading());
    }

    #[tokio::test]
    async fn reload_keeps_selection_by_identity() {
        let agent = FakeAgent::default();
        *agent.devices.lock().unwrap() = listing();
        let (agent, _notifier, mut panel) = setup(agent);

        panel.load_devices();
        panel.settle().await;
        assert!(panel.select_by_id("C"));

        let mut refreshed = listing();
        refreshed.devices[2].status = Some("Busy".into());
        *agent.devices.lock().unwrap() = refreshed;
        panel.load_devices();
        panel.settle().await;

        let selected = panel.state().selected().unwrap();
        assert_eq!(selected.physical_device_id, "C");
        assert_eq!(selected.status.as_deref(), Some("Busy"));

        agent.devices.lock().unwrap().devices.pop();
        panel.load_devices();
        panel.settle().await;
        assert!(panel.state().selected().is_none());
    }

    #[tokio::test]
    async fn select_by_unknown_id_leaves_selection() {
        let agent = FakeAgent::default();
        *agent.devices.lock().unwrap() = listing();
        let (_agent, _notifier, mut panel) = setup(agent);
        panel.load_devices();
        panel.settle().await;

        assert!(panel.select_by_id("A"));
        assert!(!panel.select_by_id("B"));
        assert_eq!(panel.state().selected().unwrap().physical_device_id, "A");

        panel.clear_selection();
        assert!(panel.state().selected().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn device_listing_timeout() {
        let agent = FakeAgent {
            delay: Duration::from_secs(30),
            ..FakeAgent::default()
        };
        let (_agent, notifier, mut panel) = setup(agent);

        panel.load_devices();
        panel.settle().await;

        assert_eq!(notifier.messages(), vec![OutcomeMessage::err(TIMEOUT_MESSAGE)]);
        assert_eq!(panel.pending().get(), 0);
        assert!(panel.state().devices().is_empty());
        assert!(matches!(
            panel.take_failures().as_slice(),
            [CoreError::Timeout { .. }]
        ));
    }

    #[tokio::test]
    async fn start_failure_is_reported_immediately() {
        let agent = FakeAgent {
            refuse_start: true,
            ..FakeAgent::default()
        };
        let (agent, notifier, mut panel) = setup(agent);

        panel.refresh_all();

        assert_eq!(panel.pending().get(), 0);
        assert_eq!(agent.calls(), 0);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.severity == Severity::Err));
        assert_eq!(panel.take_failures().len(), 2);
    }

    #[tokio::test]
    async fn refresh_all_counts_both_calls() {
        let agent = FakeAgent::default();
        *agent.devices.lock().unwrap() = listing();
        *agent.binding.lock().unwrap() = Some(bound());
        let (_agent, notifier, mut panel) = setup(agent);
        let loading = panel.subscribe_pending();

        panel.refresh_all();
        assert_eq!(*loading.borrow(), 2);
        panel.settle().await;

        assert_eq!(*loading.borrow(), 0);
        assert_eq!(panel.state().binding(), Some(&bound()));
        assert_eq!(panel.state().devices().len(), 2);
        // Identity loads silently.
        assert_eq!(notifier.messages().len(), 1);
    }

    // ── Bind ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn bind_without_selection_warns() {
        let (agent, notifier, mut panel) = setup(FakeAgent::default());

        panel.bind_selected();

        assert_eq!(notifier.messages(), vec![OutcomeMessage::warn(NO_SELECTION)]);
        assert_eq!(agent.calls(), 0);
        assert_eq!(panel.pending().get(), 0);
    }

    #[tokio::test]
    async fn bind_device_without_product_id_warns() {
        let (agent, notifier, mut panel) = setup(FakeAgent::default());

        panel.select(device("B", Some("1203"), None));
        panel.bind_selected();

        assert_eq!(notifier.messages(), vec![OutcomeMessage::warn(NO_USB_IDS)]);
        assert_eq!(agent.calls(), 0);
        assert_eq!(panel.pending().get(), 0);
    }

    #[tokio::test]
    async fn bind_sends_defaults_and_replaces_binding() {
        let (agent, notifier, mut panel) = setup(FakeAgent::default());
        let mut target = device("A", Some("1203"), Some("0230"));
        target.name = String::new();
        target.serial = None;

        panel.select(target);
        panel.bind_selected();
        panel.settle().await;

        assert_eq!(
            agent.bind_requests.lock().unwrap().as_slice(),
            [BindRequest {
                vid: "1203".into(),
                pid: "0230".into(),
                serial: Some(String::new()),
                friendly_name: Some(DEFAULT_FRIENDLY_NAME.into()),
            }]
        );
        let binding = panel.state().binding().unwrap();
        assert_eq!(binding.friendly_name, DEFAULT_FRIENDLY_NAME);
        assert_eq!(notifier.messages(), vec![OutcomeMessage::ok("Bind successful")]);
    }

    // ── Print ────────────────────────────────────────────────────

    #[tokio::test]
    async fn print_without_binding_warns() {
        let (agent, notifier, mut panel) = setup(FakeAgent::default());

        panel.print();

        assert_eq!(notifier.messages(), vec![OutcomeMessage::warn(NOT_BOUND)]);
        assert_eq!(agent.calls(), 0);
        assert!(panel.take_failures().is_empty());
    }

    #[tokio::test]
    async fn short_document_is_rejected_before_hardening() {
        let (agent, notifier, mut panel) = bound_panel(FakeAgent::default()).await;
        let calls_before = agent.calls();

        panel.set_document("HELLO");
        panel.print();

        assert_eq!(
            notifier.messages(),
            vec![OutcomeMessage::warn("TSPL is empty/invalid")]
        );
        assert_eq!(agent.calls(), calls_before);
        assert!(agent.print_requests.lock().unwrap().is_empty());
        assert_eq!(panel.pending().get(), 0);
    }

    #[tokio::test]
    async fn print_sends_hardened_document() {
        let agent = FakeAgent::default();
        *agent.print_response.lock().unwrap() = PrintResponse {
            ok: true,
            result_ptr: Some(42),
            ..PrintResponse::default()
        };
        let (agent, notifier, mut panel) = bound_panel(agent).await;

        panel.set_document("PRINT 9,9\n");
        panel.print();
        panel.settle().await;

        let requests = agent.print_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].vid, "1203");
        assert_eq!(requests[0].serial.as_deref(), Some("SN-A"));

        let sent = String::from_utf8(STANDARD.decode(&requests[0].data_base64).unwrap()).unwrap();
        assert!(sent.starts_with("SIZE 50 mm,50 mm\r\n"));
        assert_eq!(sent.matches("PRINT 9,9").count(), 1);
        assert!(sent.ends_with("\r\n\r\n") && !sent.ends_with("\r\n\r\n\r\n"));

        assert_eq!(notifier.messages(), vec![OutcomeMessage::ok("Print OK (ptr=42)")]);
    }

    #[tokio::test]
    async fn hardening_warnings_are_notified() {
        let agent = FakeAgent::default();
        *agent.print_response.lock().unwrap() = PrintResponse {
            ok: true,
            ..PrintResponse::default()
        };
        let (_agent, notifier, mut panel) = bound_panel(agent).await;

        panel.set_document("SIZE 40 mm,30 mm\nCLS\nBAR 1,1,10,10");
        panel.print();
        assert_eq!(
            notifier.messages(),
            vec![OutcomeMessage::warn(tspl::PRINT_ADDED_WARNING)]
        );
        panel.settle().await;

        assert_eq!(
            notifier.messages().last(),
            Some(&OutcomeMessage::ok("Print OK (ptr=n/a)"))
        );
    }

    #[tokio::test]
    async fn agent_side_print_failures() {
        let agent = FakeAgent::default();
        *agent.print_response.lock().unwrap() = PrintResponse {
            ok: false,
            error: Some("E_NO_DEVICE".into()),
            detail: Some("printer unplugged".into()),
            ..PrintResponse::default()
        };
        let (agent, notifier, mut panel) = bound_panel(agent).await;

        panel.print();
        panel.settle().await;
        assert_eq!(notifier.take(), vec![OutcomeMessage::err("E_NO_DEVICE")]);

        *agent.print_response.lock().unwrap() = PrintResponse {
            ok: false,
            last_win32_error: Some(31),
            ..PrintResponse::default()
        };
        panel.print();
        panel.settle().await;
        assert_eq!(
            notifier.take(),
            vec![OutcomeMessage::err("Print failed (ptr=0, winErr=31)")]
        );
    }

    #[test]
    fn default_document_is_the_sample() {
        let (_agent, _notifier, panel) = setup(FakeAgent::default());
        assert_eq!(panel.document(), tspl::SAMPLE_DOCUMENT);
    }
}
