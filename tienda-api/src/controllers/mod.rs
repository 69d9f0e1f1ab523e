//! HTTP controllers: read the request, call a service, shape the response.

mod auth;
mod clientes;
mod usuarios;
mod ventas;

pub use auth::AuthController;
pub use clientes::ClientesController;
pub use usuarios::UsuariosController;
pub use ventas::VentasController;

use std::future::Future;
use std::sync::Arc;
use zocalo_core::{Error, HandlerFn, HttpRequest, HttpResponse, handler};

/// Bind a controller method as a route handler.
///
/// ```ignore
/// router.get("/api/clientes", action(&clientes, |c, req| async move { c.read_all(req).await }), mw)?;
/// ```
pub fn action<C, F, Fut>(controller: &Arc<C>, f: F) -> HandlerFn
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    let controller = Arc::clone(controller);
    handler(move |req| f(Arc::clone(&controller), req))
}

/// The `{id}` path parameter, empty when absent.
fn id_param(req: &HttpRequest) -> String {
    req.param("id").unwrap_or_default().to_string()
}
