//! Application container
//!
//! Owns the per-application registry, wires the configuration store, the
//! request context, and the router at construction, and resolves the
//! current path into a matched route on [`App::run`]. Which concrete
//! implementation serves each role is decided by the `class.<role>`
//! configuration entries through a constructor table resolved once at
//! startup.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::registry::{Registry, Role};
use crate::request::{Request, RequestSources};
use crate::router::{make_route, Route, RouteCtor, RouteResolver, TableRouter};
use crate::tree::{lookup, NoKey};

/// Name the built-in constructors are registered under
pub const DEFAULT_IMPL: &str = "default";

/// Constructor for the configuration store role
pub type ConfigCtor = fn(&str, Option<&Value>) -> Config;
/// Constructor for the request context role
pub type RequestCtor = fn(RequestSources) -> Request;
/// Constructor for the router role
pub type RouterCtor = fn(&Config, RouteCtor) -> Box<dyn RouteResolver>;

fn default_config(base_dir: &str, overrides: Option<&Value>) -> Config {
    Config::new(base_dir, overrides)
}

fn default_request(sources: RequestSources) -> Request {
    Request::new(sources)
}

fn default_router(config: &Config, route_ctor: RouteCtor) -> Box<dyn RouteResolver> {
    Box::new(TableRouter::new(config, route_ctor))
}

/// Constructor table for the bindable roles.
///
/// Each role maps implementation names to constructor functions; the
/// `class.<role>` configuration entries select by name. Unknown names fall
/// back to the built-in constructor.
#[derive(Debug)]
pub struct Bindings {
    configs: HashMap<String, ConfigCtor>,
    requests: HashMap<String, RequestCtor>,
    routers: HashMap<String, RouterCtor>,
    routes: HashMap<String, RouteCtor>,
}

impl Bindings {
    /// Table holding only the built-in constructors, registered under
    /// [`DEFAULT_IMPL`]
    pub fn new() -> Self {
        let mut bindings = Self {
            configs: HashMap::new(),
            requests: HashMap::new(),
            routers: HashMap::new(),
            routes: HashMap::new(),
        };
        bindings
            .configs
            .insert(DEFAULT_IMPL.to_string(), default_config as ConfigCtor);
        bindings
            .requests
            .insert(DEFAULT_IMPL.to_string(), default_request as RequestCtor);
        bindings
            .routers
            .insert(DEFAULT_IMPL.to_string(), default_router as RouterCtor);
        bindings
            .routes
            .insert(DEFAULT_IMPL.to_string(), make_route as RouteCtor);
        bindings
    }

    /// Register a named configuration-store constructor
    pub fn config_impl(mut self, name: impl Into<String>, ctor: ConfigCtor) -> Self {
        self.configs.insert(name.into(), ctor);
        self
    }

    /// Register a named request-context constructor
    pub fn request_impl(mut self, name: impl Into<String>, ctor: RequestCtor) -> Self {
        self.requests.insert(name.into(), ctor);
        self
    }

    /// Register a named router constructor
    pub fn router_impl(mut self, name: impl Into<String>, ctor: RouterCtor) -> Self {
        self.routers.insert(name.into(), ctor);
        self
    }

    /// Register a named matched-route constructor
    pub fn route_impl(mut self, name: impl Into<String>, ctor: RouteCtor) -> Self {
        self.routes.insert(name.into(), ctor);
        self
    }

    fn config_ctor(&self, name: &str) -> ConfigCtor {
        self.configs.get(name).copied().unwrap_or_else(|| {
            log::warn!("unknown config implementation '{}', using default", name);
            default_config
        })
    }

    fn request_ctor(&self, name: &str) -> RequestCtor {
        self.requests.get(name).copied().unwrap_or_else(|| {
            log::warn!("unknown request implementation '{}', using default", name);
            default_request
        })
    }

    fn router_ctor(&self, name: &str) -> RouterCtor {
        self.routers.get(name).copied().unwrap_or_else(|| {
            log::warn!("unknown router implementation '{}', using default", name);
            default_router
        })
    }

    fn route_ctor(&self, name: &str) -> RouteCtor {
        self.routes.get(name).copied().unwrap_or_else(|| {
            log::warn!("unknown route implementation '{}', using default", name);
            make_route
        })
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

fn binding_name(config: &Config, role: Role) -> String {
    config
        .get(&role.binding_key(), None)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_IMPL)
        .to_string()
}

fn default_base_dir() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.to_str().map(str::to_string))
        .unwrap_or_else(|| ".".to_string())
}

/// The application container
pub struct App {
    registry: Registry,
    config: Rc<RefCell<Config>>,
    request: Rc<RefCell<Request>>,
    router: Rc<Box<dyn RouteResolver>>,
    route: Option<Route>,
    has_run: bool,
}

impl App {
    /// Build an application with default bindings, the current directory as
    /// the base, and sources seeded from the process environment.
    pub fn new(overrides: Option<Value>) -> Result<Self> {
        Self::with_parts(
            overrides,
            RequestSources::from_process_env(),
            &Bindings::new(),
            &default_base_dir(),
        )
    }

    /// Build with explicit request sources
    pub fn with_sources(overrides: Option<Value>, sources: RequestSources) -> Result<Self> {
        Self::with_parts(overrides, sources, &Bindings::new(), &default_base_dir())
    }

    /// Fully explicit construction: overrides, request sources, constructor
    /// bindings, and the application base directory.
    pub fn with_parts(
        overrides: Option<Value>,
        sources: RequestSources,
        bindings: &Bindings,
        base_dir: &str,
    ) -> Result<Self> {
        let mut registry = Registry::new();

        // The config component's own binding is read from the raw override
        // tree: no store exists yet to consult.
        let config_name = overrides
            .as_ref()
            .and_then(|tree| lookup(tree, Some("class.config"), NoKey::All))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_IMPL)
            .to_string();
        let config = (bindings.config_ctor(&config_name))(base_dir, overrides.as_ref());
        let config = registry.register(Role::Config, RefCell::new(config))?;

        let request_name = binding_name(&config.borrow(), Role::Request);
        let request = (bindings.request_ctor(&request_name))(sources);
        let request = registry.register(Role::Request, RefCell::new(request))?;

        let router_name = binding_name(&config.borrow(), Role::Router);
        let route_name = binding_name(&config.borrow(), Role::Route);
        let route_ctor = bindings.route_ctor(&route_name);
        let router = (bindings.router_ctor(&router_name))(&config.borrow(), route_ctor);
        let router = registry.register(Role::Router, router)?;
        log::debug!("application wired (router = '{}')", router.name());

        Ok(Self {
            registry,
            config,
            request,
            router,
            route: None,
            has_run: false,
        })
    }

    /// Resolve a path into a matched route and store it on the application.
    ///
    /// With `thin.once_run` enabled (the default) a second call is a
    /// guaranteed no-op that leaves the stored route untouched, regardless
    /// of new arguments. The explicit `path` argument wins over the request
    /// context's computed path. With `thin.run_and_exit` enabled (the
    /// default) the process terminates with success status immediately
    /// after resolving.
    pub fn run(&mut self, path: Option<&str>, overrides: Option<&Value>) -> Option<&Route> {
        let once_run = self.config.borrow().get_bool("thin.once_run");
        if once_run && self.has_run {
            log::debug!("run() skipped: application has already run");
            return self.route.as_ref();
        }

        self.config.borrow_mut().set_config(overrides);

        let path = match path {
            Some(path) => path.to_string(),
            None => self
                .request
                .borrow_mut()
                .path(&self.config.borrow())
                .to_string(),
        };

        self.route = self.router.resolve(&path);
        self.has_run = true;
        match &self.route {
            Some(route) => log::info!("run() resolved '{}' to route '{}'", path, route.pattern),
            None => log::info!("run() resolved '{}' to no route", path),
        }

        if self.config.borrow().get_bool("thin.run_and_exit") {
            std::process::exit(0);
        }

        self.route.as_ref()
    }

    /// The configuration store
    pub fn config(&self) -> Rc<RefCell<Config>> {
        self.config.clone()
    }

    /// The request context
    pub fn request(&self) -> Rc<RefCell<Request>> {
        self.request.clone()
    }

    /// The matched route from the last [`App::run`], if any
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Whether [`App::run`] has completed at least once
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// The per-application component registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configuration lookup by dot-path key (cloned value)
    pub fn conf(&self, key: &str) -> Option<Value> {
        self.config.borrow().get(key, None).cloned()
    }

    /// Merge configuration overrides into the store
    pub fn set_conf(&mut self, overrides: &Value) {
        self.config.borrow_mut().set_config(Some(overrides));
    }

    /// Merged request data lookup (cloned value)
    pub fn data(&self, key: Option<&str>) -> Option<Value> {
        self.request.borrow().data(key).cloned()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router.name())
            .field("route", &self.route)
            .field("has_run", &self.has_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overrides() -> Value {
        json!({
            "thin": { "run_and_exit": false },
            "routes": {
                "/": { "controller": "home" },
                "/users": { "controller": "users" },
            },
        })
    }

    #[test]
    fn test_construction_registers_the_core_roles() {
        let app = App::with_sources(Some(overrides()), RequestSources::new())
            .expect("application builds");
        assert!(app.registry().contains(Role::Config));
        assert!(app.registry().contains(Role::Request));
        assert!(app.registry().contains(Role::Router));
        // Matched routes are plain values, not registry residents.
        assert!(!app.registry().contains(Role::Route));
        assert!(!app.has_run());
    }

    #[test]
    fn test_registry_hands_back_the_identical_component() {
        let app = App::with_sources(Some(overrides()), RequestSources::new()).expect("builds");
        let first = app
            .registry()
            .get::<RefCell<Config>>(Role::Config)
            .expect("config is registered");
        let second = app
            .registry()
            .get::<RefCell<Config>>(Role::Config)
            .expect("config is registered");
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_run_defaults_to_the_request_path() {
        // No request data at all resolves to "/".
        let mut app =
            App::with_sources(Some(overrides()), RequestSources::new()).expect("builds");
        let route = app.run(None, None).cloned().expect("root route matches");
        assert_eq!(route.pattern, "/");
        assert_eq!(route.config["controller"], "home");
    }

    #[test]
    fn test_run_returns_none_for_an_unrouted_path() {
        let mut app = App::with_sources(
            Some(json!({ "thin": { "run_and_exit": false } })),
            RequestSources::new(),
        )
        .expect("builds");
        assert!(app.run(Some("/nope"), None).is_none());
        assert!(app.has_run());
    }

    #[test]
    fn test_once_run_keeps_the_first_route() {
        let mut app =
            App::with_sources(Some(overrides()), RequestSources::new()).expect("builds");
        app.run(Some("/users"), None);
        let route = app
            .run(Some("/"), None)
            .cloned()
            .expect("first route is kept");
        assert_eq!(route.pattern, "/users");
    }

    #[test]
    fn test_disabling_once_run_allows_a_rerun() {
        let mut app = App::with_sources(
            Some(json!({
                "thin": { "once_run": false, "run_and_exit": false },
                "routes": { "/users": null },
            })),
            RequestSources::new(),
        )
        .expect("builds");
        app.run(Some("/users"), None);
        let route = app.run(Some("/"), None).cloned().expect("rerun resolves");
        assert_eq!(route.pattern, "/");
    }

    #[test]
    fn test_conf_and_data_helpers() {
        let sources = RequestSources::new().query(json!({ "page": "2" }));
        let mut app = App::with_sources(Some(overrides()), sources).expect("builds");

        assert_eq!(app.conf("url.path_query"), Some(json!("do")));
        assert_eq!(app.data(Some("page")), Some(json!("2")));
        assert_eq!(app.conf("no.such.key"), None);

        app.set_conf(&json!({ "url": { "base_url": "/v2" } }));
        assert_eq!(app.conf("url.base_url"), Some(json!("/v2")));
    }

    #[test]
    fn test_custom_router_binding_is_selected_by_config() {
        struct NullRouter;

        impl RouteResolver for NullRouter {
            fn resolve(&self, _path: &str) -> Option<Route> {
                None
            }

            fn name(&self) -> &'static str {
                "null"
            }
        }

        fn null_router(_config: &Config, _route_ctor: RouteCtor) -> Box<dyn RouteResolver> {
            Box::new(NullRouter)
        }

        let bindings = Bindings::new().router_impl("null", null_router);
        let overrides = json!({
            "thin": { "run_and_exit": false },
            "class": { "router": "null" },
        });
        let mut app =
            App::with_parts(Some(overrides), RequestSources::new(), &bindings, ".")
                .expect("builds");
        assert!(app.run(Some("/"), None).is_none());
    }

    #[test]
    fn test_unknown_binding_names_fall_back_to_default() {
        let overrides = json!({
            "thin": { "run_and_exit": false },
            "class": { "router": "no-such-router" },
        });
        let mut app = App::with_sources(Some(overrides), RequestSources::new()).expect("builds");
        // The default table router still serves the baseline route table.
        let route = app.run(Some("/"), None).cloned().expect("matches");
        assert_eq!(route.pattern, "/");
    }
}
