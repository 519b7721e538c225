//! Request context
//!
//! Merges the incoming query and form trees into one view and resolves the
//! request path once, on demand. The raw data sources (query, form,
//! environment, server metadata) are read-only collaborators injected at
//! construction; the context never reads them again afterwards.

use serde_json::{Map, Value};

use crate::config::Config;
use crate::tree::{deep_merge, lookup, NoKey};

/// Read-only data sources injected into a request context
#[derive(Debug, Clone)]
pub struct RequestSources {
    query: Value,
    form: Value,
    env: Value,
    server: Value,
}

impl RequestSources {
    /// All-empty sources
    pub fn new() -> Self {
        Self {
            query: Value::Object(Map::new()),
            form: Value::Object(Map::new()),
            env: Value::Object(Map::new()),
            server: Value::Object(Map::new()),
        }
    }

    /// Empty sources with the process environment captured into the
    /// environment tree
    pub fn from_process_env() -> Self {
        let mut env = Map::new();
        for (key, value) in std::env::vars() {
            env.insert(key, Value::String(value));
        }
        Self {
            env: Value::Object(env),
            ..Self::new()
        }
    }

    /// Set the query-parameter tree
    pub fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Set the form-parameter tree
    pub fn form(mut self, form: Value) -> Self {
        self.form = form;
        self
    }

    /// Set the environment tree
    pub fn env(mut self, env: Value) -> Self {
        self.env = env;
        self
    }

    /// Set the server-metadata tree
    pub fn server(mut self, server: Value) -> Self {
        self.server = server;
        self
    }
}

impl Default for RequestSources {
    fn default() -> Self {
        Self::new()
    }
}

/// The request context component
#[derive(Debug, Clone)]
pub struct Request {
    query_data: Value,
    form_data: Value,
    all_data: Value,
    env_data: Value,
    server_data: Value,
    path: Option<String>,
}

impl Request {
    /// Build a request context from injected sources. Form data overlays
    /// query data in the merged view.
    pub fn new(sources: RequestSources) -> Self {
        let all_data = deep_merge(&sources.query, &sources.form);
        Self {
            query_data: sources.query,
            form_data: sources.form,
            all_data,
            env_data: sources.env,
            server_data: sources.server,
            path: None,
        }
    }

    /// Query parameters; no key returns the whole tree
    pub fn query_data(&self, key: Option<&str>) -> Option<&Value> {
        lookup(&self.query_data, key, NoKey::All)
    }

    /// Form parameters; no key returns the whole tree
    pub fn form_data(&self, key: Option<&str>) -> Option<&Value> {
        lookup(&self.form_data, key, NoKey::All)
    }

    /// Merged query and form parameters, form winning conflicts; no key
    /// returns the whole tree
    pub fn data(&self, key: Option<&str>) -> Option<&Value> {
        lookup(&self.all_data, key, NoKey::All)
    }

    /// Environment variables; no key returns nothing
    pub fn env(&self, key: Option<&str>) -> Option<&Value> {
        lookup(&self.env_data, key, NoKey::Nothing)
    }

    /// Server metadata; the key is uppercased before lookup, and no key
    /// returns nothing
    pub fn server(&self, key: Option<&str>) -> Option<&Value> {
        match key {
            Some(key) => {
                let upper = key.to_uppercase();
                lookup(&self.server_data, Some(upper.as_str()), NoKey::Nothing)
            }
            None => None,
        }
    }

    /// Resolve the request path, computing it once and caching the result.
    ///
    /// In pretty-URL mode the path comes from the server variable named by
    /// `url.path_val`, with the `path.base` prefix stripped; otherwise it is
    /// read from the merged request data at the key named by
    /// `url.path_query`. An absent or non-string value resolves to `"/"`.
    /// The cached value is never recomputed.
    pub fn path(&mut self, config: &Config) -> &str {
        if self.path.is_none() {
            let resolved = self.resolve_path(config);
            log::debug!("request path resolved to '{}'", resolved);
            self.path = Some(resolved);
        }
        self.path.as_deref().unwrap_or("/")
    }

    fn resolve_path(&self, config: &Config) -> String {
        let raw = if config.get_bool("url.pretty") {
            let path_val = config.get_str("url.path_val").unwrap_or("request_uri");
            self.server(Some(path_val))
                .and_then(Value::as_str)
                .map(|path| match config.get_str("path.base") {
                    Some(base) if !base.is_empty() => {
                        path.strip_prefix(base).unwrap_or(path).to_string()
                    }
                    _ => path.to_string(),
                })
        } else {
            let path_query = config.get_str("url.path_query").unwrap_or("do");
            self.data(Some(path_query))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        raw.unwrap_or_else(|| "/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_data_wins_over_query_data() {
        let request = Request::new(
            RequestSources::new()
                .query(json!({ "x": 1, "only_query": "q" }))
                .form(json!({ "x": 2 })),
        );
        assert_eq!(request.data(Some("x")), Some(&json!(2)));
        assert_eq!(request.data(Some("only_query")), Some(&json!("q")));
        assert_eq!(request.query_data(Some("x")), Some(&json!(1)));
        assert_eq!(request.form_data(Some("x")), Some(&json!(2)));
    }

    #[test]
    fn test_data_without_a_key_returns_the_whole_tree() {
        let request = Request::new(RequestSources::new().query(json!({ "a": 1 })));
        assert_eq!(request.data(None), Some(&json!({ "a": 1 })));
    }

    #[test]
    fn test_env_and_server_require_a_key() {
        let request = Request::new(
            RequestSources::new()
                .env(json!({ "HOME": "/root" }))
                .server(json!({ "REQUEST_URI": "/a" })),
        );
        assert_eq!(request.env(None), None);
        assert_eq!(request.server(None), None);
        assert_eq!(request.env(Some("HOME")), Some(&json!("/root")));
    }

    #[test]
    fn test_server_keys_are_uppercased() {
        let request =
            Request::new(RequestSources::new().server(json!({ "REQUEST_URI": "/users" })));
        assert_eq!(request.server(Some("request_uri")), Some(&json!("/users")));
    }

    #[test]
    fn test_path_defaults_to_root() {
        let config = Config::new(".", None);
        let mut request = Request::new(RequestSources::new());
        assert_eq!(request.path(&config), "/");
    }

    #[test]
    fn test_path_reads_the_configured_query_key() {
        let config = Config::new(".", Some(&json!({ "url": { "path_query": "route" } })));
        let mut request = Request::new(RequestSources::new().query(json!({ "route": "/x" })));
        assert_eq!(request.path(&config), "/x");
    }

    #[test]
    fn test_path_is_memoized_across_config_changes() {
        let plain = Config::new(".", None);
        let mut request = Request::new(RequestSources::new().query(json!({ "do": "/first" })));
        assert_eq!(request.path(&plain), "/first");

        // A different strategy on later calls never recomputes the path.
        let pretty = Config::new(".", Some(&json!({ "url": { "pretty": true } })));
        assert_eq!(request.path(&pretty), "/first");
    }

    #[test]
    fn test_pretty_path_strips_the_base_prefix() {
        let config = Config::new(
            ".",
            Some(&json!({
                "url": { "pretty": true },
                "path": { "base": "/app" },
            })),
        );
        let mut request =
            Request::new(RequestSources::new().server(json!({ "REQUEST_URI": "/app/users" })));
        assert_eq!(request.path(&config), "/users");
    }

    #[test]
    fn test_pretty_path_without_server_data_defaults_to_root() {
        let config = Config::new(".", Some(&json!({ "url": { "pretty": true } })));
        let mut request = Request::new(RequestSources::new());
        assert_eq!(request.path(&config), "/");
    }

    #[test]
    fn test_process_env_capture() {
        let sources = RequestSources::from_process_env();
        let request = Request::new(sources);
        // PATH exists in any reasonable test environment.
        assert!(request.env(Some("PATH")).is_some());
    }
}
