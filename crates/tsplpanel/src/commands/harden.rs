//! `tsplpanel harden [FILE]`: local only, no agent involved.

use std::io::{self, Write};

use serde::Serialize;
use tsplpanel_core::{Notifier, OutcomeMessage, tspl};

use crate::cli::{HardenArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

/// Structured view for json/yaml output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HardenReport<'a> {
    text: &'a str,
    data_base64: String,
    byte_len: usize,
    warnings: &'a [String],
}

pub fn handle(
    args: &HardenArgs,
    format: OutputFormat,
    quiet: bool,
    notifier: &dyn Notifier,
) -> Result<(), CliError> {
    let source = util::read_document(args.file.as_deref())?;
    tspl::validate_source(&source)?;

    let doc = tspl::harden(&source);
    for warning in doc.warnings() {
        notifier.notify(OutcomeMessage::warn(warning.clone()));
    }

    match format {
        OutputFormat::Table | OutputFormat::Plain if args.base64 => {
            output::print_output(&doc.to_base64(), quiet);
        }
        OutputFormat::Table | OutputFormat::Plain => {
            if !quiet {
                // Exactly the bytes the agent would receive.
                io::stdout().lock().write_all(doc.bytes())?;
            }
        }
        structured => {
            let report = HardenReport {
                text: doc.text(),
                data_base64: doc.to_base64(),
                byte_len: doc.bytes().len(),
                warnings: doc.warnings(),
            };
            let out =
                output::render_single(structured, &report, |_| String::new(), |_| String::new());
            output::print_output(&out, quiet);
        }
    }
    Ok(())
}
