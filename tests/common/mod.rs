//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meme_bff::config::{BffConfig, ServiceConfig};
use meme_bff::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A local address nothing is listening on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a fragment upstream answering `GET path` with a fixed status and body.
pub async fn start_fragment(path: &'static str, status: u16, body: &'static str) -> String {
    let status = StatusCode::from_u16(status).unwrap();
    let app = Router::new().route(path, get(move || async move { (status, body) }));
    let addr = serve(app).await;
    format!("http://{}{}", addr, path)
}

/// How the mock meminator answers.
#[derive(Clone)]
pub enum Render {
    /// 200 with the given chunks, streamed.
    Chunks(Vec<Vec<u8>>),
    /// A failure status with a text body.
    Status(u16),
    /// 200, one chunk, then the body fails.
    BrokenStream(Vec<u8>),
}

/// Mock meminator that records every JSON payload it receives.
pub struct Meminator {
    pub url: String,
    pub payloads: Arc<Mutex<Vec<serde_json::Value>>>,
}

pub async fn start_meminator(render: Render) -> Meminator {
    let payloads = Arc::new(Mutex::new(Vec::new()));
    let recorded = payloads.clone();

    let app = Router::new().route(
        "/applyPhraseToPicture",
        post(move |Json(payload): Json<serde_json::Value>| {
            let recorded = recorded.clone();
            let render = render.clone();
            async move {
                recorded.lock().unwrap().push(payload);
                render_response(render)
            }
        }),
    );
    let addr = serve(app).await;

    Meminator {
        url: format!("http://{}/applyPhraseToPicture", addr),
        payloads,
    }
}

fn render_response(render: Render) -> Response {
    match render {
        Render::Chunks(chunks) => {
            let items: Vec<Result<Bytes, std::io::Error>> =
                chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
            (
                [(header::CONTENT_TYPE, "image/png")],
                Body::from_stream(futures::stream::iter(items)),
            )
                .into_response()
        }
        Render::Status(code) => {
            (StatusCode::from_u16(code).unwrap(), "meminator failed").into_response()
        }
        Render::BrokenStream(first) => {
            // Let the headers and first chunk leave before the error is raised.
            let stream = futures::stream::unfold((0u8, first), |(step, first)| async move {
                match step {
                    0 => Some((
                        Ok::<Bytes, std::io::Error>(Bytes::from(first)),
                        (1, Vec::new()),
                    )),
                    1 => {
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Some((Err(std::io::Error::other("renderer crashed")), (2, first)))
                    }
                    _ => None,
                }
            });
            (
                [(header::CONTENT_TYPE, "image/png")],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}

/// Gateway configuration pointing at the given upstream URLs.
pub fn config_for(phrase: &str, image: &str, meminator: &str) -> BffConfig {
    let mut config = BffConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.services.phrase_picker = ServiceConfig::new(phrase);
    config.services.image_picker = ServiceConfig::new(image);
    config.services.meminator = ServiceConfig::new(meminator);
    config
}

/// Start the gateway; returns its address and the shutdown handle.
pub async fn start_gateway(config: BffConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
