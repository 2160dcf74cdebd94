//! Normalization of upload responses into handles.
//!
//! Pinning services and gateways disagree on how they report the identifier
//! of a stored object. Known JSON shapes are probed in a fixed order; a bare
//! single-token text body is accepted as well.

use serde_json::Value;

/// Top-level JSON keys probed for a handle, in priority order.
const HANDLE_KEYS: &[&str] = &["cid", "IpfsHash", "Hash", "hash", "handle", "id"];

/// Nested JSON paths probed after the top-level keys.
const NESTED_HANDLE_PATHS: &[(&str, &str)] = &[("value", "cid"), ("data", "cid"), ("data", "IpfsHash")];

const MAX_HANDLE_LEN: usize = 512;

/// Check that `handle` can be used as a single URL path segment.
///
/// Dot segments are rejected, and so is `%`, since a percent-encoded dot
/// would be normalized away by the URL parser.
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle.len() <= MAX_HANDLE_LEN
        && handle != "."
        && handle != ".."
        && handle.chars().all(|c| {
            c.is_ascii_graphic() && !matches!(c, '/' | '?' | '#' | '%' | '\\' | '"' | '<' | '>')
        })
}

/// Extract the handle from an upload response body.
///
/// Returns `None` when no usable handle is found.
pub fn extract_handle(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => handle_from_json(&value),
        Err(_) => Some(text.to_string()).filter(|t| is_valid_handle(t) && !t.starts_with(['{', '['])),
    }
}

fn handle_from_json(value: &Value) -> Option<String> {
    if let Value::String(s) = value {
        return Some(s.trim().to_string()).filter(|s| is_valid_handle(s));
    }

    let object = value.as_object()?;
    let top_level = HANDLE_KEYS.iter().filter_map(|key| object.get(*key));
    let nested = NESTED_HANDLE_PATHS
        .iter()
        .filter_map(|(outer, inner)| object.get(*outer)?.get(*inner));

    top_level.chain(nested).find_map(handle_from_field)
}

fn handle_from_field(field: &Value) -> Option<String> {
    let handle = match field {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        // IPLD link form: {"/": "bafy..."}
        Value::Object(link) => link.get("/")?.as_str()?.trim().to_string(),
        _ => return None,
    };
    Some(handle).filter(|h| is_valid_handle(h))
}
