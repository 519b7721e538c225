//! Diagnostic value dumping
//!
//! Var-dump style diagnostics for nested trees, rendered as pretty JSON
//! through the `log` facade. Diagnostics only, never part of control flow.

use serde_json::Value;

/// Render a value as pretty JSON
pub fn dump_string(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Log a labelled value at debug level
pub fn dump(label: &str, value: &Value) {
    log::debug!("{} = {}", label, dump_string(value));
}
