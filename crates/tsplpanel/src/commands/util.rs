//! Shared helpers for command handlers.

use std::io::{self, Read};
use std::path::Path;

use crate::error::CliError;

/// Read a TSPL document from `file`, or stdin when absent or `-`.
///
/// Bytes are taken one per character so Latin-1 label files survive
/// unchanged; UTF-8 input is decoded as UTF-8.
pub fn read_document(file: Option<&Path>) -> Result<String, CliError> {
    let bytes = match file {
        Some(path) if path != Path::new("-") => std::fs::read(path)?,
        _ => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_kept() {
        assert_eq!(decode("TEXT \"Größe\"".as_bytes().to_vec()), "TEXT \"Größe\"");
    }

    #[test]
    fn latin1_falls_back_to_one_char_per_byte() {
        assert_eq!(decode(vec![b'G', 0xF6, b'!']), "Gö!");
    }
}
