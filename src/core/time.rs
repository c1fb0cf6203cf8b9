//! Timestamps, event ids and the JSON envelope wrapped around command output.

use crate::core::error::RollcallError;
use serde_json::Value as JsonValue;
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Unix-epoch seconds with a `Z` suffix, e.g. `1771220592Z`.
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Wraps a command payload: `cmd`, `status`, `ts`, `event_id`, then the
/// payload's own keys. Non-object payloads land under `result`.
pub fn command_envelope(cmd: &str, status: &str, payload: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": ENVELOPE_VERSION,
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let Some(base_obj) = base.as_object_mut() {
        match payload {
            JsonValue::Object(extra) => {
                for (k, v) in extra {
                    base_obj.insert(k, v);
                }
            }
            JsonValue::Null => {}
            other => {
                base_obj.insert("result".to_string(), other);
            }
        }
    }
    base
}

pub fn error_envelope(cmd: &str, err: &RollcallError) -> JsonValue {
    command_envelope(
        cmd,
        "error",
        serde_json::json!({ "error": { "kind": err.kind(), "message": err.to_string() } }),
    )
}
