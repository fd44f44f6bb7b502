// ── Failure message extraction ──
//
// Turns an arbitrary failure value into one line of text for the notifier.
// Failures arrive in several shapes (agent problem documents, plain-text
// proxy errors, our own typed errors), so extraction is an ordered table of
// lookups; the first lookup yielding a non-empty string wins.

use serde_json::Value;

/// Returned when no lookup finds anything to show.
pub const FALLBACK_MESSAGE: &str = "Request failed";

type Lookup = fn(&Value) -> Option<&str>;

/// Lookups in priority order. A new failure shape is a new entry here.
const LOOKUPS: &[Lookup] = &[
    nested_string,
    nested_message,
    nested_error,
    nested_detail,
    own_message,
];

/// Extract a human-readable message from `failure`. Never empty.
pub fn extract(failure: &Value) -> String {
    LOOKUPS
        .iter()
        .find_map(|lookup| lookup(failure).filter(|text| !text.trim().is_empty()))
        .unwrap_or(FALLBACK_MESSAGE)
        .to_owned()
}

/// The nested problem value is itself a string (plain-text error body).
fn nested_string(failure: &Value) -> Option<&str> {
    failure.get("error")?.as_str()
}

fn nested_field<'a>(failure: &'a Value, field: &str) -> Option<&'a str> {
    failure.get("error")?.get(field)?.as_str()
}

fn nested_message(failure: &Value) -> Option<&str> {
    nested_field(failure, "message")
}

fn nested_error(failure: &Value) -> Option<&str> {
    nested_field(failure, "error")
}

fn nested_detail(failure: &Value) -> Option<&str> {
    nested_field(failure, "detail")
}

fn own_message(failure: &Value) -> Option<&str> {
    failure.get("message")?.as_str()
}
