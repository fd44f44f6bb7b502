//! `tsplpanel bind <DEVICE_ID>`

use crate::cli::BindArgs;
use crate::error::CliError;
use crate::output;

use super::{Session, identity};

pub async fn handle(session: &mut Session, args: BindArgs) -> Result<(), CliError> {
    session.panel.load_devices();
    session.settle().await;
    session.check()?;

    if !session.panel.select_by_id(&args.device_id) {
        return Err(CliError::NotFound {
            resource_type: "device".into(),
            identifier: args.device_id,
            list_command: "devices".into(),
        });
    }

    session.panel.bind_selected();
    session.ensure_started("bind")?;
    session.settle().await;
    session.check()?;

    if let Some(binding) = session.panel.state().binding() {
        let out = output::render_single(session.format, binding, identity::detail, |b| {
            format!("{}:{}", b.vendor_id, b.product_id)
        });
        output::print_output(&out, session.quiet);
    }
    Ok(())
}
