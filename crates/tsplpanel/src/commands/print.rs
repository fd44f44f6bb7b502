//! `tsplpanel print [FILE]`

use tsplpanel_core::tspl::SAMPLE_DOCUMENT;

use crate::cli::PrintArgs;
use crate::error::CliError;

use super::{Session, util};

pub async fn handle(session: &mut Session, args: PrintArgs) -> Result<(), CliError> {
    let document = if args.sample {
        SAMPLE_DOCUMENT.to_owned()
    } else {
        util::read_document(args.file.as_deref())?
    };
    session.panel.set_document(document);

    session.panel.load_binding();
    session.settle().await;
    session.check()?;

    session.panel.print();
    session.ensure_started("print")?;
    session.settle().await;
    session.check()
}
