use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use zocalo_core::{Application, Container, HttpRequest, HttpResponse, Router, handler};

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}

#[tokio::test]
async fn test_serves_routes_over_tcp() {
    let mut router = Router::new().with_base_path("/tienda");
    router
        .get(
            "/api/clientes/{id}",
            handler(|req: HttpRequest| async move {
                let id = req.param("id").unwrap_or_default().to_string();
                let nombre = req.query_value("campo").unwrap_or_default();
                Ok(HttpResponse::success(json!({ "id": id, "campo": nombre }), 200))
            }),
            vec![],
        )
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let app = Application::new(Container::new(), router);
    let server = tokio::spawn(app.serve(listener, async {
        let _ = stopped.await;
    }));

    let response = raw_request(
        addr,
        "GET /tienda/api/clientes/12?campo=nombre HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#""id":"12""#));
    assert!(response.contains(r#""campo":"nombre""#));

    let response = raw_request(
        addr,
        "GET /otra HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_chunked_body_over_limit_is_refused() {
    let mut router = Router::new();
    router
        .post(
            "/api/ventas",
            handler(|req: HttpRequest| async move {
                Ok(HttpResponse::json(json!({ "bytes": req.body.len() }), 201))
            }),
            vec![],
        )
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let app = Application::new(Container::new(), router).with_max_body_size(16);
    let server = tokio::spawn(app.serve(listener, async {
        let _ = stopped.await;
    }));

    let response = raw_request(
        addr,
        "POST /api/ventas HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Transfer-Encoding: chunked\r\nContent-Type: application/json\r\n\r\n\
         8\r\naaaaaaaa\r\n8\r\nbbbbbbbb\r\n8\r\ncccccccc\r\n0\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413"));
    assert!(response.contains("Payload too large"));

    let response = raw_request(
        addr,
        "POST /api/ventas HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Transfer-Encoding: chunked\r\nContent-Type: application/json\r\n\r\n\
         8\r\n{\"a\":12}\r\n0\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 201"));
    assert!(response.contains(r#""bytes":8"#));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
