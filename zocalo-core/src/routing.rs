// Routing system for HTTP requests

use crate::error_handler::ErrorHandler;
use crate::logging::{debug, trace};
use crate::middleware::{HandlerFn, Middleware, MiddlewareChain, handler};
use crate::{Error, HttpMethod, HttpRequest, HttpResponse, PathParams};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

static PARAM_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// A compiled route pattern such as `/api/clientes/{id}`.
///
/// Placeholders match exactly one non-empty path segment. Matching is
/// case-insensitive and ignores leading and trailing slashes.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        let source = pattern.trim_matches('/').to_string();

        let mut body = String::new();
        let mut params = Vec::new();
        let mut last = 0;
        for caps in PARAM_PLACEHOLDER.captures_iter(&source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            body.push_str(&regex::escape(&source[last..whole.start()]));
            body.push_str("([^/]+)");
            params.push(name.as_str().to_string());
            last = whole.end();
        }
        body.push_str(&regex::escape(&source[last..]));

        let regex = Regex::new(&format!("(?i)^/?{}/?$", body))
            .map_err(|e| Error::Internal(format!("Invalid route pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            source,
            regex,
            params,
        })
    }

    /// Pattern text without surrounding slashes
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Placeholder names in order of appearance
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// Match a path (already stripped of the base path) and bind parameters
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for (i, name) in self.params.iter().enumerate() {
            let value = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
            params.push(name.clone(), value);
        }
        Some(params)
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.regex.as_str() == other.regex.as_str()
            && self.params == other.params
    }
}

impl Eq for RoutePattern {}

/// Controller/action pair a route dispatches to, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub controller: &'static str,
    pub method: &'static str,
}

impl Action {
    pub const fn new(controller: &'static str, method: &'static str) -> Self {
        Self { controller, method }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.method)
    }
}

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub pattern: RoutePattern,
    pub handler: HandlerFn,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub action: Option<Action>,
}

impl Route {
    pub fn new(method: HttpMethod, pattern: &str, handler: HandlerFn) -> Result<Self, Error> {
        Ok(Self {
            method,
            pattern: RoutePattern::compile(pattern)?,
            handler,
            middleware: Vec::new(),
            action: None,
        })
    }

    /// Route middleware, run in the given order after the global middleware
    pub fn with_middleware(mut self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        self.middleware = middleware;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.source())
            .field("middleware", &self.middleware.len())
            .field("action", &self.action)
            .finish()
    }
}

/// Router for managing routes and dispatching requests.
///
/// Routes are tried in registration order and the first method+pattern
/// match wins, so literal routes must be added before parameterized routes
/// that would otherwise capture them.
pub struct Router {
    routes: Vec<Route>,
    global: Vec<Arc<dyn Middleware>>,
    base_path: String,
    errors: ErrorHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            global: Vec::new(),
            base_path: String::new(),
            errors: ErrorHandler::default(),
        }
    }

    /// Prefix stripped from every request path before matching
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.trim_matches('/').to_string();
        self
    }

    /// Controls how the last-resort error boundary renders failures
    pub fn with_production(mut self, production: bool) -> Self {
        self.errors = ErrorHandler::new(production);
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Register a global middleware; the first one registered runs outermost
    pub fn use_global<M: Middleware + 'static>(&mut self, middleware: M) {
        self.global.push(Arc::new(middleware));
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        debug!(method = %route.method, pattern = route.pattern.source(), "Registering route");
        self.routes.push(route);
    }

    fn add(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        let route = Route::new(method, pattern, handler)?.with_middleware(middleware);
        self.add_route(route);
        Ok(())
    }

    pub fn get(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::GET, pattern, handler, middleware)
    }

    pub fn post(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::POST, pattern, handler, middleware)
    }

    pub fn put(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::PUT, pattern, handler, middleware)
    }

    pub fn patch(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::PATCH, pattern, handler, middleware)
    }

    pub fn delete(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::DELETE, pattern, handler, middleware)
    }

    pub fn options(
        &mut self,
        pattern: &str,
        handler: HandlerFn,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        self.add(HttpMethod::OPTIONS, pattern, handler, middleware)
    }

    /// Request path relative to the base path, without surrounding slashes
    fn relative_path<'a>(&self, path: &'a str) -> &'a str {
        let path = path.trim_matches('/');
        if self.base_path.is_empty() {
            return path;
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some("") => "",
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => path,
        }
    }

    /// First route matching method and path, with its bound parameters
    pub fn find(&self, method: &str, path: &str) -> Option<(&Route, PathParams)> {
        let relative = self.relative_path(path);
        trace!(method, path = relative, "Matching route");

        self.routes
            .iter()
            .filter(|route| route.method.as_str().eq_ignore_ascii_case(method))
            .find_map(|route| route.pattern.matches(relative).map(|params| (route, params)))
    }

    /// Dispatch without the final error boundary: handler and middleware
    /// errors come back as `Err`.
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (handler, route_middleware) = match self.find(&request.method, &request.path) {
            Some((route, params)) => {
                if let Some(action) = route.action {
                    debug!(%action, path = %request.path, "Dispatching");
                }
                request.path_params = params;
                (route.handler.clone(), route.middleware.as_slice())
            }
            None => {
                debug!(method = %request.method, path = %request.path, "No route matched");
                (not_found_handler(), &[][..])
            }
        };

        MiddlewareChain::from_layers(&self.global, route_middleware)
            .apply(request, handler)
            .await
    }

    /// Dispatch a request and always produce a response.
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        match self.route(request).await {
            Ok(response) => response,
            Err(err) => self.errors.render(&err),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found_handler() -> HandlerFn {
    handler(|_req| async { Ok(HttpResponse::json(json!({ "error": "Not Found" }), 404)) })
}
