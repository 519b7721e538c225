//! Layered configuration store
//!
//! The store is a single nested tree: baseline defaults, the application
//! root directory, and caller overrides merged in that order, with later
//! layers winning. Reads go through dot-path lookup and are total; writes
//! merge rather than replace, so nested option groups layer instead of
//! clobbering each other.

use serde_json::{json, Value};

use crate::tree::{deep_merge, lookup, NoKey};

/// Baseline defaults, layered under every application's overrides.
fn baseline_defaults() -> Value {
    json!({
        "thin": {
            "once_run": true,
            "run_and_exit": true,
        },
        "class": {
            "config": "default",
            "request": "default",
            "router": "default",
            "route": "default",
        },
        "url": {
            "base_url": "/",
            "pretty": false,
            "path_query": "do",
            "path_val": "request_uri",
        },
        "path": {},
        "routes": {
            "/": null,
        },
    })
}

/// The layered configuration store
#[derive(Debug, Clone)]
pub struct Config {
    state: Value,
}

impl Config {
    /// Build a store from the baseline defaults, the application root
    /// directory, and caller overrides. Later layers win on conflicts.
    pub fn new(base_dir: &str, overrides: Option<&Value>) -> Self {
        let defaults = deep_merge(&baseline_defaults(), &json!({ "base": base_dir }));
        let state = match overrides {
            Some(overrides) => deep_merge(&defaults, overrides),
            None => defaults,
        };
        log::debug!("configuration initialized (base = {})", base_dir);
        Self { state }
    }

    /// Look up a configuration value by dot-path key.
    ///
    /// The `fallback` argument is accepted but not consulted: a miss always
    /// resolves to `None`.
    pub fn get(&self, key: &str, fallback: Option<&Value>) -> Option<&Value> {
        let _ = fallback;
        lookup(&self.state, Some(key), NoKey::All)
    }

    /// String-typed lookup
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key, None).and_then(Value::as_str)
    }

    /// Boolean-typed lookup; absent or non-boolean keys read as `false`
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key, None).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Merge additional overrides into the current state and return it.
    ///
    /// A `None` overlay is a no-op merge.
    pub fn set_config(&mut self, overrides: Option<&Value>) -> &Value {
        if let Some(overrides) = overrides {
            self.state = deep_merge(&self.state, overrides);
            log::debug!("configuration overrides merged");
        }
        &self.state
    }

    /// The entire merged configuration tree
    pub fn config(&self) -> &Value {
        &self.state
    }
}
