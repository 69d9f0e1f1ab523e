use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use zocalo_core::{
    ApiSecurityMiddleware, CorsMiddleware, Error, ErrorHandlerMiddleware, HttpRequest,
    HttpResponse, Middleware, Next, Router, SecurityHeadersMiddleware, handler,
};

struct Tag {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Middleware for Tag {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        self.log.lock().push(format!("{}>", self.name));
        let response = next(req).await;
        self.log.lock().push(format!("<{}", self.name));
        response
    }
}

/// Router with the standard global stack
fn api_router(production: bool) -> Router {
    let mut router = Router::new().with_production(production);
    router.use_global(CorsMiddleware::new());
    router.use_global(SecurityHeadersMiddleware::new());
    router.use_global(ErrorHandlerMiddleware::new(production));
    router.use_global(ApiSecurityMiddleware::new());
    router
}

#[tokio::test]
async fn test_global_and_route_middleware_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router.use_global(Tag { name: "A", log: log.clone() });
    router.use_global(Tag { name: "B", log: log.clone() });

    let handler_log = log.clone();
    router
        .get(
            "/api/ventas",
            handler(move |_req| {
                let log = handler_log.clone();
                async move {
                    log.lock().push("H".to_string());
                    Ok(HttpResponse::ok())
                }
            }),
            vec![
                Arc::new(Tag { name: "C", log: log.clone() }) as Arc<dyn Middleware>,
                Arc::new(Tag { name: "D", log: log.clone() }),
            ],
        )
        .unwrap();

    let response = router
        .handle(HttpRequest::new("GET".to_string(), "/api/ventas".to_string()))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        *log.lock(),
        vec!["A>", "B>", "C>", "D>", "H", "<D", "<C", "<B", "<A"]
    );
}

#[tokio::test]
async fn test_single_error_response_with_headers() {
    let mut router = api_router(true);
    router
        .get(
            "/api/usuarios/{id}",
            handler(|req: HttpRequest| async move {
                let id = req.param("id").unwrap_or_default().to_string();
                Err(Error::NotFound(format!("Usuario {} no encontrado", id)))
            }),
            vec![],
        )
        .unwrap();

    let response = router
        .handle(HttpRequest::new("GET".to_string(), "/api/usuarios/7".to_string()))
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(
        response.body_json().unwrap(),
        json!({ "status": "error", "message": "Usuario 7 no encontrado" })
    );
    // Outer middleware still decorates the mapped error response
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(response.headers["X-Frame-Options"], "DENY");
}

#[tokio::test]
async fn test_unmatched_route_gets_fallback_through_globals() {
    let router = api_router(true);
    let response = router
        .handle(HttpRequest::new("GET".to_string(), "/nada".to_string()))
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.body_json().unwrap(), json!({ "error": "Not Found" }));
    assert_eq!(response.headers["X-Content-Type-Options"], "nosniff");
}

#[tokio::test]
async fn test_preflight_answered_without_route() {
    let router = api_router(true);
    let response = router
        .handle(HttpRequest::new("OPTIONS".to_string(), "/api/clientes".to_string()))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.headers["Access-Control-Allow-Headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_api_security_short_circuits_before_route() {
    let called = Arc::new(Mutex::new(false));
    let flag = called.clone();

    let mut router = api_router(true);
    router
        .post(
            "/api/clientes",
            handler(move |_req| {
                let flag = flag.clone();
                async move {
                    *flag.lock() = true;
                    Ok(HttpResponse::new(201))
                }
            }),
            vec![],
        )
        .unwrap();

    let request = HttpRequest::from_parts(
        "POST",
        "/api/clientes",
        vec![("content-type".to_string(), "text/plain".to_string())],
        b"hola".to_vec(),
    );
    let response = router.handle(request).await;

    assert_eq!(response.status, 415);
    assert!(!*called.lock());
}

#[tokio::test]
async fn test_validation_error_body() {
    let mut router = api_router(false);
    router
        .post(
            "/api/auth/login",
            handler(|_req| async {
                Err::<HttpResponse, Error>(Error::validation(
                    "email",
                    "El campo email es requerido",
                ))
            }),
            vec![],
        )
        .unwrap();

    let request = HttpRequest::new("POST".to_string(), "/api/auth/login".to_string())
        .with_json(json!({ "password": "x" }));
    let response = router.handle(request).await;

    assert_eq!(response.status, 400);
    let body = response.body_json().unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"]["email"], json!(["El campo email es requerido"]));
}
