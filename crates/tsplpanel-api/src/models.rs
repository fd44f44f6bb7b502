// Agent API request and response types
//
// Wire shapes of the USB printer agent. The agent is written against a
// camelCase JSON contract. Optional text fields may be missing or null
// depending on the agent build; both read as empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Devices ──────────────────────────────────────────────────────────

/// A USB device as enumerated by the agent.
///
/// Identity key is [`physical_device_id`](Self::physical_device_id). Vendor
/// and product ids are hex strings as the agent reports them (e.g. `"1203"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "pnpDeviceId")]
    pub physical_device_id: String,
    #[serde(default, rename = "vid")]
    pub vendor_id: Option<String>,
    #[serde(default, rename = "pid")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Device {
    /// A device can be bound only when both USB ids are present and non-empty.
    pub fn is_bindable(&self) -> bool {
        non_empty(self.vendor_id.as_deref()).is_some()
            && non_empty(self.product_id.as_deref()).is_some()
    }

    /// `VID:PID` label for display, or `-` when either id is missing.
    pub fn usb_ids(&self) -> String {
        match (
            non_empty(self.vendor_id.as_deref()),
            non_empty(self.product_id.as_deref()),
        ) {
            (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
            _ => "-".into(),
        }
    }
}

/// `GET /api/usb/devices`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub devices: Vec<Device>,
}

// ── Binding ──────────────────────────────────────────────────────────

/// The printer the agent currently treats as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub machine_id: String,
    #[serde(rename = "vid")]
    pub vendor_id: String,
    #[serde(rename = "pid")]
    pub product_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serial: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub friendly_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bound_at: String,
}

impl Binding {
    /// Parse `boundAt` as an RFC 3339 timestamp. The agent stores it as
    /// free text, so this is best-effort.
    pub fn bound_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.bound_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// `GET /api/printer/identity`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub binding: Option<Binding>,
}

/// `POST /api/printer/bind` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    pub vid: String,
    pub pid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

/// `POST /api/printer/bind` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindResponse {
    #[serde(default)]
    pub ok: bool,
    pub binding: Binding,
}

// ── Print ────────────────────────────────────────────────────────────

/// `POST /api/printer/print` body. `data_base64` carries the hardened
/// TSPL bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub vid: String,
    pub pid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    pub data_base64: String,
}

/// Driver arguments the agent echoes back for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverArgs {
    #[serde(default)]
    pub data_len: u64,
    #[serde(default)]
    pub vid: String,
    #[serde(default)]
    pub pid: String,
    #[serde(default)]
    pub serial_list: String,
    #[serde(default)]
    pub match_serial: String,
}

/// `POST /api/printer/print` response.
///
/// A 200 response may still report `ok: false`; the failure text then
/// lives in one of `message`, `error` or `detail`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub result_ptr: Option<i64>,
    #[serde(default)]
    pub last_win32_error: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub dll_args: Option<DriverArgs>,
    #[serde(default)]
    pub device: Option<Device>,
}

impl PrintResponse {
    /// First non-empty failure text in `message`, `error`, `detail` order.
    pub fn failure_text(&self) -> Option<&str> {
        [&self.message, &self.error, &self.detail]
            .into_iter()
            .find_map(|field| non_empty(field.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Like `#[serde(default)]`, but an explicit `null` also yields the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
