//! Line-level grammar of the streamed completion body.
//!
//! The body is a header line carrying `id` and `model`, then delta lines until
//! a line with `choices[0].finish_reason == "stop"`, then the transport's own
//! sentinel line(s). Each content line may carry a `data:` prefix.

use crate::types::{Metadata, ProtocolEvent};
use serde_json::Value;

const DATA_PREFIX: &str = "data:";

/// Strip the `data:` field prefix and its optional following space.
#[inline]
pub fn trim_prefix(line: &str) -> &str {
    match line.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}

/// Keep-alives are blank after prefix removal.
#[inline]
pub fn is_keep_alive(line: &str) -> bool {
    trim_prefix(line).is_empty()
}

/// Classify a raw line that follows the header line.
pub fn classify(raw: &str) -> ProtocolEvent {
    if is_keep_alive(raw) {
        return ProtocolEvent::Skip;
    }

    let value: Value = match serde_json::from_str(trim_prefix(raw)) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable content line");
            return ProtocolEvent::Malformed;
        }
    };

    if is_stop(&value) {
        return ProtocolEvent::Terminal;
    }

    let content = value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    ProtocolEvent::ContentDelta(content.to_string())
}

/// Decode `id` and `model` from the header line.
///
/// Also reports whether the header line is itself a terminal marker. A line
/// that is not JSON yields empty metadata and streaming continues.
pub fn decode_metadata(raw: &str) -> (Metadata, bool) {
    match serde_json::from_str::<Value>(trim_prefix(raw)) {
        Ok(value) => (Metadata::from_header(&value), is_stop(&value)),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable metadata line");
            (Metadata::default(), false)
        }
    }
}

fn is_stop(value: &Value) -> bool {
    value
        .pointer("/choices/0/finish_reason")
        .and_then(Value::as_str)
        == Some("stop")
}

impl Metadata {
    /// Missing or non-string fields decode as empty strings.
    fn from_header(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            id: field("id"),
            model: field("model"),
        }
    }
}
