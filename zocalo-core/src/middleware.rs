// Middleware system for request/response processing

use crate::logging::{debug, trace};
use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by handlers and chain steps
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for the next handler in the middleware chain
pub type Next = Box<dyn FnOnce(HttpRequest) -> BoxFuture + Send>;

/// Type alias for handler functions
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> BoxFuture + Send + Sync>;

/// Wrap an async function as a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Request interceptor composed around a handler.
///
/// An implementation either awaits `next(req)` and returns (or adjusts) its
/// result, or returns its own response without calling `next`, which stops
/// every inner middleware and the handler from running. `next` is consumed
/// by the call, so it cannot run twice.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error>;
}

/// Ordered middleware wrapped around a terminal handler; index 0 runs
/// outermost.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    /// Chain for one request: global middleware (registration order) outside,
    /// route middleware (declaration order) inside, closest to the handler.
    pub fn from_layers(global: &[Arc<dyn Middleware>], route: &[Arc<dyn Middleware>]) -> Self {
        let mut middlewares = Vec::with_capacity(global.len() + route.len());
        middlewares.extend(global.iter().cloned());
        middlewares.extend(route.iter().cloned());
        Self {
            middlewares: Arc::new(middlewares),
        }
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, req: HttpRequest, handler: HandlerFn) -> Result<HttpResponse, Error> {
        debug!(
            middleware_count = self.middlewares.len(),
            path = %req.path,
            method = %req.method,
            "Executing middleware chain"
        );
        self.execute_from(0, req, handler).await
    }

    fn execute_from(&self, index: usize, req: HttpRequest, handler: HandlerFn) -> BoxFuture {
        if index >= self.middlewares.len() {
            trace!("Middleware chain complete, calling handler");
            handler(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();

            trace!(middleware_index = index, "Executing middleware");
            Box::pin(async move {
                middleware
                    .handle(
                        req,
                        Box::new(move |req| chain.execute_from(index + 1, req, handler)),
                    )
                    .await
            })
        }
    }
}

// ========== Built-in Middleware ==========

/// CORS (Cross-Origin Resource Sharing) middleware
pub struct CorsMiddleware {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub allow_credentials: bool,
}

impl CorsMiddleware {
    pub fn new() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, PATCH, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
            allow_credentials: true,
        }
    }

    pub fn allow_origin(mut self, origin: &str) -> Self {
        self.allow_origin = origin.to_string();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    fn apply_headers(&self, response: &mut HttpResponse) {
        response.headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            self.allow_origin.clone(),
        );
        response.headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            self.allow_methods.clone(),
        );
        response.headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            self.allow_headers.clone(),
        );
        if self.allow_credentials {
            response.headers.insert(
                "Access-Control-Allow-Credentials".to_string(),
                "true".to_string(),
            );
        }
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        // Preflight requests are answered here
        if req.method == "OPTIONS" {
            let mut response = HttpResponse::ok();
            self.apply_headers(&mut response);
            return Ok(response);
        }

        let mut response = next(req).await?;
        self.apply_headers(&mut response);
        Ok(response)
    }
}

/// Security headers middleware
pub struct SecurityHeadersMiddleware {
    content_security_policy: String,
    frame_options: String,
}

impl SecurityHeadersMiddleware {
    pub fn new() -> Self {
        Self {
            content_security_policy: "default-src 'self'; script-src 'self'; object-src 'none'"
                .to_string(),
            frame_options: "DENY".to_string(),
        }
    }

    pub fn with_frame_options(mut self, value: &str) -> Self {
        self.frame_options = value.to_string();
        self
    }

    pub fn with_content_security_policy(mut self, value: &str) -> Self {
        self.content_security_policy = value.to_string();
        self
    }
}

impl Default for SecurityHeadersMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for SecurityHeadersMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let https = req.is_https();
        let mut response = next(req).await?;

        let headers = [
            ("X-XSS-Protection", "1; mode=block"),
            ("X-Content-Type-Options", "nosniff"),
            ("X-Frame-Options", self.frame_options.as_str()),
            ("Content-Security-Policy", self.content_security_policy.as_str()),
            ("X-Permitted-Cross-Domain-Policies", "none"),
            ("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"),
            ("Pragma", "no-cache"),
        ];
        for (name, value) in headers {
            response.headers.insert(name.to_string(), value.to_string());
        }

        if https {
            response.headers.insert(
                "Strict-Transport-Security".to_string(),
                "max-age=31536000; includeSubDomains".to_string(),
            );
        }

        Ok(response)
    }
}

static SENSITIVE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)token|api_key|jwt").expect("valid sensitive-url regex"));

/// Request guard for JSON APIs: payload size, content type, and credentials
/// leaking through the URL.
pub struct ApiSecurityMiddleware {
    max_body_size: usize,
}

impl ApiSecurityMiddleware {
    pub fn new() -> Self {
        Self {
            max_body_size: 1024 * 1024,
        }
    }

    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    fn declared_length(req: &HttpRequest) -> usize {
        req.header("Content-Length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(req.body.len())
    }
}

impl Default for ApiSecurityMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for ApiSecurityMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        if Self::declared_length(&req) > self.max_body_size {
            return Ok(HttpResponse::json(json!({ "error": "Payload too large" }), 413));
        }

        if matches!(req.method.as_str(), "POST" | "PUT" | "PATCH") {
            let is_json = req
                .header("Content-Type")
                .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
                .unwrap_or(false);
            if !is_json {
                return Ok(HttpResponse::json(
                    json!({ "error": "Unsupported Media Type" }),
                    415,
                ));
            }
        }

        let url = if req.query_params.is_empty() {
            req.path.clone()
        } else {
            let query: Vec<String> = req
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{}?{}", req.path, query.join("&"))
        };
        if SENSITIVE_URL.is_match(&url) {
            return Ok(HttpResponse::json(
                json!({ "error": "Sensitive data in URL is not allowed" }),
                400,
            ));
        }

        next(req).await
    }
}
