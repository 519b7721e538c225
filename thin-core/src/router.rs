//! Ordered route table and path matching
//!
//! The router reads its table from the configuration store's `routes` entry
//! once, at construction. Entries keep table order and the first match wins,
//! so reordering the table changes behavior. Each key is classified once:
//! plain strings compare by equality, pattern expressions compile to an
//! anchored regex and match against the full path.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

/// The value produced by a successful match: the table key that matched and
/// the per-route configuration stored under it. The configuration is opaque
/// to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The route table key that matched
    pub pattern: String,
    /// The configuration value stored under that key
    pub config: Value,
}

impl Route {
    /// Create a matched-route value
    pub fn new(pattern: impl Into<String>, config: Value) -> Self {
        Self {
            pattern: pattern.into(),
            config,
        }
    }
}

/// Constructor for matched-route values; the `route` role binding selects it
pub type RouteCtor = fn(&str, Value) -> Route;

/// The built-in matched-route constructor
pub fn make_route(pattern: &str, config: Value) -> Route {
    Route::new(pattern, config)
}

/// Characters that mark a table key as a pattern expression
const PATTERN_META: &str = r".*+?()[]{}|^$\";

/// How a route table key matches an incoming path
#[derive(Debug, Clone)]
pub enum RouteKey {
    /// Literal path, compared by string equality
    Exact(String),
    /// Pattern expression, matched against the full path
    Pattern { raw: String, regex: Regex },
}

impl RouteKey {
    /// Classify a table key once, at table load.
    ///
    /// Keys without pattern metacharacters are literals. A key that looks
    /// like a pattern but fails to compile degrades to a literal, so
    /// matching stays total.
    pub fn classify(raw: &str) -> Self {
        if !raw.contains(|c: char| PATTERN_META.contains(c)) {
            return RouteKey::Exact(raw.to_string());
        }
        match Regex::new(&format!("^(?:{})$", raw)) {
            Ok(regex) => RouteKey::Pattern {
                raw: raw.to_string(),
                regex,
            },
            Err(err) => {
                log::warn!(
                    "route key '{}' is not a valid pattern, treating it as a literal: {}",
                    raw,
                    err
                );
                RouteKey::Exact(raw.to_string())
            }
        }
    }

    /// The raw table key
    pub fn raw(&self) -> &str {
        match self {
            RouteKey::Exact(raw) => raw,
            RouteKey::Pattern { raw, .. } => raw,
        }
    }

    /// Whether this key matches `path`
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteKey::Exact(raw) => raw == path,
            RouteKey::Pattern { regex, .. } => regex.is_match(path),
        }
    }
}

/// One ordered entry of the route table
#[derive(Debug, Clone)]
struct RouteEntry {
    key: RouteKey,
    config: Value,
}

/// Pluggable routing seam: resolve a path into a matched route.
///
/// Implement this trait to bind a custom router implementation through the
/// `class.router` configuration entry.
pub trait RouteResolver {
    /// Match `path` against the table, first match wins. `None` means no
    /// route applies, which is not an error.
    fn resolve(&self, path: &str) -> Option<Route>;

    /// Resolver name (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Default resolver: an ordered table read from the `routes` config entry
#[derive(Debug, Clone)]
pub struct TableRouter {
    entries: Vec<RouteEntry>,
    make_route: RouteCtor,
}

impl TableRouter {
    /// Read the route table from the configuration store, preserving entry
    /// order.
    pub fn new(config: &Config, make_route: RouteCtor) -> Self {
        let mut entries = Vec::new();
        if let Some(Value::Object(table)) = config.get("routes", None) {
            for (key, route_config) in table {
                entries.push(RouteEntry {
                    key: RouteKey::classify(key),
                    config: route_config.clone(),
                });
            }
        }
        log::debug!("route table loaded with {} entries", entries.len());
        Self {
            entries,
            make_route,
        }
    }

    /// Append an entry to the table. Later entries only match when nothing
    /// before them does.
    pub fn add_route(&mut self, key: &str, config: Value) {
        self.entries.push(RouteEntry {
            key: RouteKey::classify(key),
            config,
        });
    }

    /// Thin alias for [`RouteResolver::resolve`]
    pub fn load(&self, path: &str) -> Option<Route> {
        self.match_path(path)
    }

    /// Number of table entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn match_path(&self, path: &str) -> Option<Route> {
        for entry in &self.entries {
            if entry.key.matches(path) {
                log::debug!("path '{}' matched route '{}'", path, entry.key.raw());
                return Some((self.make_route)(entry.key.raw(), entry.config.clone()));
            }
        }
        log::debug!("no route matched path '{}'", path);
        None
    }
}

impl RouteResolver for TableRouter {
    fn resolve(&self, path: &str) -> Option<Route> {
        self.match_path(path)
    }

    fn name(&self) -> &'static str {
        "table"
    }
}
