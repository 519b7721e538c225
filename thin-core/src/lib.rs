//! # Thin Core - minimal web-application scaffold
//!
//! Thin resolves an incoming request path to a matching route definition.
//! Three pieces do the real work:
//!
//! - a layered **configuration store** with deep-merge semantics and
//!   dot-path lookup,
//! - a per-application **component registry** resolving logical roles
//!   (config, request, router, route) to concrete implementations,
//! - an ordered, first-match-wins **router**.
//!
//! The core never executes application logic: it only decides which route
//! configuration applies. HTTP transport, response rendering, and session
//! handling live elsewhere.
//!
//! ## Example
//!
//! ```rust
//! use thin_core::{App, RequestSources};
//! use serde_json::json;
//!
//! let overrides = json!({
//!     "thin": { "run_and_exit": false },
//!     "routes": {
//!         "/users": { "controller": "users" },
//!         "/.*": { "controller": "catchall" },
//!     },
//! });
//! let sources = RequestSources::new().query(json!({ "do": "/users" }));
//!
//! let mut app = App::with_sources(Some(overrides), sources).unwrap();
//! let route = app.run(None, None).cloned().unwrap();
//! assert_eq!(route.pattern, "/users");
//! assert_eq!(route.config["controller"], "users");
//! ```

pub mod app;
pub mod config;
pub mod dump;
pub mod error;
pub mod registry;
pub mod request;
pub mod router;
pub mod tree;

// Re-export the main types
pub use app::{App, Bindings, ConfigCtor, RequestCtor, RouterCtor, DEFAULT_IMPL};
pub use config::Config;
pub use error::{Result, ThinError};
pub use registry::{Registry, Role};
pub use request::{Request, RequestSources};
pub use router::{make_route, Route, RouteCtor, RouteKey, RouteResolver, TableRouter};
pub use tree::{deep_merge, lookup, NoKey};
