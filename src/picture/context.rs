//! Per-request context.
//!
//! Carries the correlation ID and the request span through the picture
//! flow so the core never looks up ambient tracing state.

use axum::http::StatusCode;
use tracing::field::Empty;
use tracing::Span;

use crate::picture::relay::RelaySummary;

/// Request-scoped handle passed to every stage of the flow.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    span: Span,
}

impl RequestContext {
    /// Open the `create_picture` span for a request.
    pub fn new(request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        let span = tracing::info_span!(
            "create_picture",
            request_id = %request_id,
            app.phrase_response = Empty,
            app.image_response = Empty,
            app.render_status = Empty,
            app.relayed_bytes = Empty,
        );
        Self { request_id, span }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Attach both raw fragment bodies, fallbacks included.
    pub fn record_fragments(&self, phrase: &str, image: &str) {
        self.span.record("app.phrase_response", phrase);
        self.span.record("app.image_response", image);
    }

    pub fn record_render_status(&self, status: StatusCode) {
        self.span.record("app.render_status", status.as_u16());
    }

    /// Close the span after the last chunk was relayed.
    pub fn finish(self, summary: &RelaySummary) {
        self.span.record("app.relayed_bytes", summary.bytes);
        tracing::info!(
            parent: &self.span,
            chunks = summary.chunks,
            bytes = summary.bytes,
            "/createPicture finished"
        );
    }
}
