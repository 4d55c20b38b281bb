//! Endpoint handlers.

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::Instrument;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::picture::RequestContext;

/// `POST /createPicture`.
///
/// Aggregates the fragments and dispatches the render before any header is
/// sent, so every failure up to that point becomes a plain 500. The request
/// body is ignored.
pub async fn create_picture(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::new(request_id(&headers));
    tracing::info!(parent: ctx.span(), "/createPicture running");

    let prepared = state
        .pictures
        .prepare(&ctx)
        .instrument(ctx.span().clone())
        .await;

    let source = match prepared {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(parent: ctx.span(), error = %e, "Error creating picture");
            metrics::record_request(500, start);
            return e.into_response();
        }
    };

    let body = state.pictures.stream(source, ctx);
    metrics::record_request(200, start);
    ([(header::CONTENT_TYPE, "image/png")], body).into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Seconds since the server was built.
    pub uptime: f64,
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        uptime: state.started.elapsed().as_secs_f64(),
    })
}
