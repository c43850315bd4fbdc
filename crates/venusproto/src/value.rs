//! Helpers for picking values out of loosely-shaped device JSON.

use serde_json::Value;

/// Look up a dotted path (`"result.set_result"`) in a JSON value.
///
/// Returns `None` as soon as any segment is missing or the current value
/// is not an object.
pub fn dig<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = data;
    for part in path.split('.') {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Accept only real truthy values from the API.
///
/// The firmware reports set-command success as a bool, a number, or a
/// string depending on revision. Everything outside this closed set —
/// including a missing field — counts as failure.
pub fn is_trueish(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "ok")
        }
        _ => false,
    }
}
