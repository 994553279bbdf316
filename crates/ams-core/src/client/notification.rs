//! Helpers for Moonraker notification payloads

use serde_json::{Map, Value};

/// Method name of printer object status pushes
pub const NOTIFY_STATUS_UPDATE: &str = "notify_status_update";

/// Extract the changed printer objects from a status notification.
///
/// Expected shape: `{"method": "notify_status_update", "params": [{...}, ts]}`.
/// Returns `None` for any other method or a malformed payload.
pub fn status_objects(notification: &Value) -> Option<&Map<String, Value>> {
    if notification.get("method").and_then(Value::as_str) != Some(NOTIFY_STATUS_UPDATE) {
        return None;
    }
    notification
        .get("params")?
        .as_array()?
        .first()?
        .as_object()
}

/// Build a status notification carrying `objects`
pub fn status_update(objects: Value) -> Value {
    serde_json::json!({
        "method": NOTIFY_STATUS_UPDATE,
        "params": [objects, 0.0],
    })
}
