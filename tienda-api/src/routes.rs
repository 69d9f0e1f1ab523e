//! Route table.

use crate::controllers::{
    AuthController, ClientesController, UsuariosController, VentasController, action,
};
use crate::middleware::JwtMiddleware;
use std::sync::Arc;
use zocalo_core::{
    Action, Container, CorsMiddleware, Error, ErrorHandlerMiddleware, HandlerFn, HttpMethod,
    Middleware, Route, Router,
};
use zocalo_jwt::JwtService;

struct Table<'a> {
    router: &'a mut Router,
}

impl Table<'_> {
    fn add(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handler: HandlerFn,
        middleware: &[Arc<dyn Middleware>],
        action: Action,
    ) -> Result<(), Error> {
        let route = Route::new(method, pattern, handler)?
            .with_middleware(middleware.to_vec())
            .with_action(action);
        self.router.add_route(route);
        Ok(())
    }
}

/// Router with the global middleware stack and every API route.
///
/// Two globals: CORS outermost so responses written by the error handler
/// still carry its headers, then the error handler.
pub fn build_router(
    container: &Container,
    base_path: &str,
    production: bool,
) -> Result<Router, Error> {
    let mut router = Router::new()
        .with_base_path(base_path)
        .with_production(production);

    router.use_global(CorsMiddleware::new());
    router.use_global(ErrorHandlerMiddleware::new(production));

    register(&mut router, container)?;
    Ok(router)
}

/// Register the API routes. `clientes/buscar` is declared before
/// `clientes/{id}` so it is not captured as an id.
pub fn register(router: &mut Router, container: &Container) -> Result<(), Error> {
    let auth = container.resolve::<AuthController>()?;
    let usuarios = container.resolve::<UsuariosController>()?;
    let clientes = container.resolve::<ClientesController>()?;
    let ventas = container.resolve::<VentasController>()?;

    let jwt: Vec<Arc<dyn Middleware>> =
        vec![Arc::new(JwtMiddleware::new(container.resolve::<JwtService>()?))];
    let open: Vec<Arc<dyn Middleware>> = Vec::new();

    use HttpMethod::{DELETE, GET, PATCH, POST, PUT};
    let mut t = Table { router };

    t.add(
        POST,
        "/api/auth/login",
        action(&auth, |c, req| async move { c.login(req).await }),
        &open,
        Action::new("AuthController", "login"),
    )?;
    t.add(
        POST,
        "/api/auth/refresh",
        action(&auth, |c, req| async move { c.refresh(req).await }),
        &open,
        Action::new("AuthController", "refresh"),
    )?;

    t.add(
        GET,
        "/api/usuarios",
        action(&usuarios, |c, req| async move { c.read_all(req).await }),
        &jwt,
        Action::new("UsuariosController", "readAll"),
    )?;
    t.add(
        POST,
        "/api/usuarios",
        action(&usuarios, |c, req| async move { c.create(req).await }),
        &jwt,
        Action::new("UsuariosController", "create"),
    )?;
    t.add(
        GET,
        "/api/usuarios/{id}",
        action(&usuarios, |c, req| async move { c.read(req).await }),
        &jwt,
        Action::new("UsuariosController", "read"),
    )?;
    for method in [PUT, PATCH] {
        t.add(
            method,
            "/api/usuarios/{id}",
            action(&usuarios, |c, req| async move { c.update(req).await }),
            &jwt,
            Action::new("UsuariosController", "update"),
        )?;
    }
    t.add(
        DELETE,
        "/api/usuarios/{id}",
        action(&usuarios, |c, req| async move { c.delete(req).await }),
        &jwt,
        Action::new("UsuariosController", "delete"),
    )?;

    t.add(
        GET,
        "/api/clientes",
        action(&clientes, |c, req| async move { c.read_all(req).await }),
        &jwt,
        Action::new("ClientesController", "readAll"),
    )?;
    t.add(
        POST,
        "/api/clientes",
        action(&clientes, |c, req| async move { c.create(req).await }),
        &jwt,
        Action::new("ClientesController", "create"),
    )?;
    t.add(
        GET,
        "/api/clientes/buscar",
        action(&clientes, |c, req| async move { c.search(req).await }),
        &jwt,
        Action::new("ClientesController", "search"),
    )?;
    t.add(
        GET,
        "/api/clientes/{id}",
        action(&clientes, |c, req| async move { c.read(req).await }),
        &jwt,
        Action::new("ClientesController", "read"),
    )?;
    t.add(
        DELETE,
        "/api/clientes/{id}",
        action(&clientes, |c, req| async move { c.delete(req).await }),
        &jwt,
        Action::new("ClientesController", "delete"),
    )?;
    for method in [PUT, PATCH] {
        t.add(
            method,
            "/api/clientes/{id}",
            action(&clientes, |c, req| async move { c.update(req).await }),
            &jwt,
            Action::new("ClientesController", "update"),
        )?;
    }

    t.add(
        GET,
        "/api/ventas",
        action(&ventas, |c, req| async move { c.read_all(req).await }),
        &jwt,
        Action::new("VentasController", "readAll"),
    )?;
    t.add(
        POST,
        "/api/ventas",
        action(&ventas, |c, req| async move { c.create(req).await }),
        &jwt,
        Action::new("VentasController", "create"),
    )?;
    t.add(
        GET,
        "/api/ventas/{id}",
        action(&ventas, |c, req| async move { c.read(req).await }),
        &jwt,
        Action::new("VentasController", "read"),
    )?;
    for method in [PUT, PATCH] {
        t.add(
            method,
            "/api/ventas/{id}",
            action(&ventas, |c, req| async move { c.update(req).await }),
            &jwt,
            Action::new("VentasController", "update"),
        )?;
    }
    t.add(
        DELETE,
        "/api/ventas/{id}",
        action(&ventas, |c, req| async move { c.delete(req).await }),
        &jwt,
        Action::new("VentasController", "delete"),
    )?;

    Ok(())
}
