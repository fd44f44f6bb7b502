//! `tsplpanel identity`

use tsplpanel_core::Binding;

use crate::error::CliError;
use crate::output;

use super::Session;

/// Multi-line detail view of a binding, shared with `bind`.
pub fn detail(binding: &Binding) -> String {
    let bound_at = binding.bound_at_utc().map_or_else(
        || binding.bound_at.clone(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    [
        format!("Printer:  {}", binding.friendly_name),
        format!("VID:PID:  {}:{}", binding.vendor_id, binding.product_id),
        format!("Serial:   {}", or_dash(&binding.serial)),
        format!("Machine:  {}", or_dash(&binding.machine_id)),
        format!("Bound at: {}", or_dash(&bound_at)),
    ]
    .join("\n")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub async fn handle(session: &mut Session) -> Result<(), CliError> {
    session.panel.load_binding();
    session.settle().await;
    session.check()?;

    let binding = session.panel.state().binding();
    let out = output::render_single(
        session.format,
        &binding,
        |b| b.map_or_else(|| "No printer bound".to_owned(), detail),
        |b| b.map(|b| format!("{}:{}", b.vendor_id, b.product_id)).unwrap_or_default(),
    );
    output::print_output(&out, session.quiet);
    Ok(())
}
