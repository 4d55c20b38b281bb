//! Upstream service access.
//!
//! # Data Flow
//! ```text
//! picture flow
//!     → UpstreamClient::call(Service, UpstreamRequest)
//!     → client.rs (resolve logical name → URL, send over hyper-util)
//!     → UpstreamResponse (status + optional streaming body)
//! ```
//!
//! # Design Decisions
//! - Services are addressed by logical name; URLs live in configuration
//! - The response body is never read here; callers choose text or stream
//! - Retries are not performed; a failed call is reported once

pub mod client;

use std::fmt;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, StatusCode};
use thiserror::Error;

pub use client::HttpUpstreamClient;

/// The upstream services this gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    PhrasePicker,
    ImagePicker,
    Meminator,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::PhrasePicker, Service::ImagePicker, Service::Meminator];

    /// Logical service name, as used in logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            Service::PhrasePicker => "phrase-picker",
            Service::ImagePicker => "image-picker",
            Service::Meminator => "meminator",
        }
    }

    /// Key of this service's table in the configuration file.
    pub fn config_key(self) -> &'static str {
        match self {
            Service::PhrasePicker => "phrase_picker",
            Service::ImagePicker => "image_picker",
            Service::Meminator => "meminator",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by an upstream client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The outbound request could not be constructed.
    #[error("failed to build request for {service}: {source}")]
    Build {
        service: Service,
        #[source]
        source: axum::http::Error,
    },

    /// The JSON body could not be serialized.
    #[error("failed to encode body for {service}: {source}")]
    Encode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    /// Connection or protocol failure.
    #[error("request to {service} failed: {source}")]
    Request {
        service: Service,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// No response headers within the configured deadline.
    #[error("request to {service} timed out after {secs} seconds")]
    Timeout { service: Service, secs: u64 },

    /// The response body failed while being read.
    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),
}

/// An outbound call to an upstream service.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<serde_json::Value>,
    /// Correlation ID forwarded as `x-request-id`.
    pub request_id: Option<String>,
}

impl UpstreamRequest {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            request_id: None,
        }
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Response from an upstream service.
///
/// The body is absent for statuses that carry no payload (204, 205, 304).
#[derive(Debug)]
pub struct UpstreamResponse {
    status: StatusCode,
    reason: Option<String>,
    body: Option<Body>,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: Option<Body>) -> Self {
        Self {
            status,
            reason: None,
            body,
        }
    }

    /// Keep the reason phrase the upstream actually sent.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Reason phrase sent by the upstream, else the canonical one, else empty.
    pub fn reason(&self) -> &str {
        self.reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }

    /// Read the whole body as text.
    ///
    /// Invalid UTF-8 is decoded lossily and a leading byte order mark is dropped.
    pub async fn text(self, limit: usize) -> Result<String, UpstreamError> {
        let Some(body) = self.body else {
            return Ok(String::new());
        };
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(UpstreamError::Body)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.strip_prefix('\u{feff}').unwrap_or(&*text).to_owned())
    }

    /// Take the body for streaming.
    pub fn into_body(self) -> Option<Body> {
        self.body
    }
}

/// A client able to reach upstream services by logical name.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn call(
        &self,
        service: Service,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

/// Whether a response with this status carries a payload.
pub(crate) fn status_has_body(status: StatusCode) -> bool {
    !matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    ) && !status.is_informational()
}
