//! Errors of the picture flow.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::Service;

/// Boxed error used for stream sources and sinks of arbitrary type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while creating a picture.
#[derive(Debug, Error)]
pub enum PictureError {
    /// Transport failure or non-success status from an upstream.
    /// Recovered for phrase-picker and image-picker, fatal for meminator.
    #[error("{service} unavailable: {reason}")]
    UpstreamUnavailable { service: Service, reason: String },

    /// A fragment body was not a JSON object.
    #[error("malformed payload from {service}: {source}")]
    MalformedUpstreamPayload {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    /// Meminator answered with a failure status or without a body.
    #[error("Failed to fetch picture from meminator: {} {reason}", .status.as_u16())]
    RenderUpstreamError { status: StatusCode, reason: String },

    /// The render body failed while being read.
    #[error("failed to read chunk {chunk} of the picture: {source}")]
    StreamReadFailure {
        chunk: usize,
        #[source]
        source: BoxError,
    },

    /// The client connection rejected a chunk.
    #[error("failed to write chunk {chunk} of the picture: {source}")]
    StreamWriteFailure {
        chunk: usize,
        #[source]
        source: BoxError,
    },
}

pub type PictureResult<T> = Result<T, PictureError>;

impl IntoResponse for PictureError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
