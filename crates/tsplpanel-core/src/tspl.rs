// ── TSPL document hardening ──
//
// Rewrites user-authored TSPL into a byte stream the agent will accept.
// Each step is an additive patch over the accumulated text and only fires
// when its directive is missing, so hardening is a fixed point on its own
// output.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

/// Minimum accepted source length, in characters.
pub const MIN_SOURCE_CHARS: usize = 10;

/// Page setup prepended to documents without a `SIZE` directive.
pub const PREAMBLE: &str = "SIZE 50 mm,50 mm\n\
GAP 0 mm,0 mm\n\
DIRECTION 1\n\
REFERENCE 0,0\n\
SPEED 2\n\
DENSITY 15\n\
CODEPAGE 850\n";

/// Print directive appended when the document has none.
pub const DEFAULT_PRINT: &str = "PRINT 1,1";

/// Warning emitted when [`DEFAULT_PRINT`] had to be appended.
pub const PRINT_ADDED_WARNING: &str = "PRINT 1,1 auto-added";

const CRLF: &str = "\r\n";

/// Sample label used as the initial panel document.
pub const SAMPLE_DOCUMENT: &str = "SIZE 50 mm,50 mm
GAP 0 mm,0 mm
DIRECTION 1
REFERENCE 0,0
SPEED 2
DENSITY 15
CODEPAGE 850
CLS
BOX 10,10,550,550,4
TEXT 20,20,\"3\",0,3,3,\"HELLO TSC\"
BAR 20,120,500,6
TEXT 20,180,\"3\",0,2,2,\"VID 1203 PID 0230\"
PRINT 1,1
";

// Line-anchored, case-insensitive; CR, LF and CRLF all end a line.
static SIZE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?imR)^\s*SIZE\s+").expect("SIZE pattern is valid"));
static CLS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?imR)^\s*CLS\s*$").expect("CLS pattern is valid"));
static PRINT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?imR)^\s*PRINT\s+\d+\s*,\s*\d+\s*$").expect("PRINT pattern is valid")
});

/// A hardened TSPL document, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardenedDocument {
    text: String,
    bytes: Vec<u8>,
    warnings: Vec<String>,
}

impl HardenedDocument {
    /// Normalized text with CRLF terminators.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// One byte per character of [`text`](Self::text).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Repairs made along the way, in the order they were applied.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Standard padded base64 of [`bytes`](Self::bytes), as the agent expects.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Reject sources too short to be a label. Run this before [`harden`].
pub fn validate_source(raw: &str) -> Result<(), crate::CoreError> {
    if raw.chars().count() < MIN_SOURCE_CHARS {
        return Err(crate::CoreError::validation("TSPL is empty/invalid"));
    }
    Ok(())
}

/// Harden `raw` into an agent-safe document.
pub fn harden(raw: &str) -> HardenedDocument {
    let mut warnings = Vec::new();
    let mut text = raw.to_owned();

    if !SIZE_LINE.is_match(&text) {
        text = format!("{PREAMBLE}\n{text}");
    }

    if !CLS_LINE.is_match(&text) {
        text = format!("{}\nCLS\n", text.trim_end());
    }

    if !PRINT_LINE.is_match(&text) {
        text = format!("{}\n{DEFAULT_PRINT}\n", text.trim_end());
        warnings.push(PRINT_ADDED_WARNING.to_owned());
    }

    let text = normalize_line_endings(&text);
    let (text, bytes) = encode_latin1(&text, &mut warnings);

    HardenedDocument {
        text,
        bytes,
        warnings,
    }
}

/// CRLF everywhere, exactly one terminator at the end, then one blank line.
fn normalize_line_endings(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let body = unified.trim_end();

    let mut out = String::with_capacity(body.len() + body.len() / 16 + 4);
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            out.push_str(CRLF);
        }
        out.push_str(line);
    }
    out.push_str(CRLF);
    out.push_str(CRLF);
    out
}

/// Map each character to a single byte. Characters outside U+0000..=U+00FF
/// have no 8-bit form and become `?`, with one warning per distinct character.
fn encode_latin1(text: &str, warnings: &mut Vec<String>) -> (String, Vec<u8>) {
    let mut replaced: Vec<char> = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut bytes = Vec::with_capacity(text.len());

    for ch in text.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => {
                out.push(ch);
                bytes.push(byte);
            }
            Err(_) => {
                if !replaced.contains(&ch) {
                    replaced.push(ch);
                    warnings.push(format!(
                        "U+{:04X} '{ch}' has no 8-bit encoding, replaced with '?'",
                        u32::from(ch)
                    ));
                }
                out.push('?');
                bytes.push(b'?');
            }
        }
    }

    (out, bytes)
}
