// Application bootstrapper and HTTP server

use crate::logging::{debug, error, info, warn};
use crate::{Container, Error, HttpRequest, HttpResponse, Router};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Largest request body buffered before the router sees the request.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// The main application struct
pub struct Application {
    pub container: Container,
    pub router: Arc<Router>,
    max_body_size: usize,
}

impl Application {
    /// Create an application with a container and router
    pub fn new(container: Container, router: Router) -> Self {
        Self {
            container,
            router: Arc::new(router),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Bodies above `bytes` are answered with 413 without being buffered
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Bind `addr` and serve until Ctrl-C
    pub async fn listen(self, addr: SocketAddr) -> Result<(), Error> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Server listening");

        self.serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let router = self.router.clone();
        let limit = self.max_body_size;
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let router = router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router, limit).await }
                });

                let conn: std::pin::Pin<Box<dyn Future<Output = Result<(), hyper::Error>> + Send>> =
                    Box::pin(http1::Builder::new().serve_connection(io, service));
                if let Err(err) = conn.await {
                    debug!(%peer, error = ?err, "Error serving connection");
                }
            });
        }
    }

    /// Get a reference to the DI container
    pub fn container(&self) -> &Container {
        &self.container
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
    limit: usize,
) -> Result<Response<Full<Bytes>>, BoxError> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let Some(body) = read_body(body, limit).await? else {
        warn!(method = %parts.method, path = parts.uri.path(), limit, "Request body too large");
        let response = HttpResponse::json(serde_json::json!({ "error": "Payload too large" }), 413);
        return Ok(response.send().map(Full::new));
    };

    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let headers = parts.headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|v| (name.as_str().to_string(), v.to_string()))
    });

    let request = HttpRequest::from_parts(parts.method.as_str(), &uri, headers, body.to_vec());
    let method = request.method.clone();
    let path = request.path.clone();

    let response = router.handle(request).await;
    let status = response.status;

    if status >= 500 {
        error!(%method, %path, status, elapsed_ms = started.elapsed().as_millis() as u64, "Request failed");
    } else {
        info!(%method, %path, status, elapsed_ms = started.elapsed().as_millis() as u64, "Request handled");
    }

    Ok(response.send().map(Full::new))
}

/// Buffer at most `limit` bytes of `body`; `None` once the body grows past it.
async fn read_body<B>(body: B, limit: usize) -> Result<Option<Bytes>, BoxError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Some(collected.to_bytes())),
        Err(e) if e.is::<LengthLimitError>() => Ok(None),
        Err(e) => Err(e),
    }
}
