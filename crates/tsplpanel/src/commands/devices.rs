//! `tsplpanel devices`

use tabled::Tabled;
use tsplpanel_core::Device;

use crate::error::CliError;
use crate::output;

use super::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "VID:PID")]
    usb_ids: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.physical_device_id.clone(),
            name: d.name.clone(),
            usb_ids: d.usb_ids(),
            serial: d.serial.clone().unwrap_or_default(),
            status: d.status.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &mut Session) -> Result<(), CliError> {
    session.panel.load_devices();
    session.settle().await;
    session.check()?;

    let out = output::render_list(
        session.format,
        session.panel.state().devices(),
        |d| DeviceRow::from(d),
        |d| d.physical_device_id.clone(),
    );
    output::print_output(&out, session.quiet);
    Ok(())
}
