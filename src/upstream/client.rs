//! HTTP implementation of [`UpstreamClient`].
//!
//! # Responsibilities
//! - Resolve logical service names to configured URLs
//! - Send GET / JSON POST requests over a pooled hyper-util client
//! - Forward the correlation ID to every upstream
//! - Enforce the optional per-call deadline

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Uri};
use hyper::ext::ReasonPhrase;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;

use crate::config::{ServicesConfig, TimeoutConfig};
use crate::http::request::X_REQUEST_ID;
use crate::upstream::{
    status_has_body, Service, UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse,
};

const USER_AGENT: &str = concat!("meme-bff/", env!("CARGO_PKG_VERSION"));

/// A configured service URL could not be used as a request target.
#[derive(Debug, Error)]
#[error("invalid endpoint for {service}: {source}")]
pub struct EndpointError {
    pub service: Service,
    #[source]
    pub source: axum::http::uri::InvalidUri,
}

/// Upstream client backed by hyper-util's pooled HTTP client.
#[derive(Clone)]
pub struct HttpUpstreamClient {
    client: Client<HttpConnector, Body>,
    endpoints: HashMap<Service, Uri>,
    timeout: Option<Duration>,
}

impl HttpUpstreamClient {
    /// Build a client for the configured service table.
    pub fn new(services: &ServicesConfig, timeouts: &TimeoutConfig) -> Result<Self, EndpointError> {
        let mut endpoints = HashMap::with_capacity(Service::ALL.len());
        for service in Service::ALL {
            let uri: Uri = services
                .get(service)
                .url
                .parse()
                .map_err(|source| EndpointError { service, source })?;
            endpoints.insert(service, uri);
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            endpoints,
            timeout: timeouts.upstream_secs.map(Duration::from_secs),
        })
    }

    fn build_request(
        &self,
        service: Service,
        request: UpstreamRequest,
    ) -> Result<Request<Body>, UpstreamError> {
        let uri = self.endpoints[&service].clone();

        let mut builder = Request::builder()
            .method(request.method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(id) = request
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            builder = builder.header(X_REQUEST_ID, id);
        }

        let body = match request.body {
            Some(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|source| UpstreamError::Encode { service, source })?;
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        builder
            .body(body)
            .map_err(|source| UpstreamError::Build { service, source })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn call(
        &self,
        service: Service,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let method = request.method.clone();
        let req = self.build_request(service, request)?;

        tracing::debug!(service = %service, method = %method, uri = %req.uri(), "Calling upstream");

        let pending = self.client.request(req);
        let result = match self.timeout {
            Some(deadline) => time::timeout(deadline, pending).await.map_err(|_| {
                UpstreamError::Timeout {
                    service,
                    secs: deadline.as_secs(),
                }
            })?,
            None => pending.await,
        };
        let response = result.map_err(|source| UpstreamError::Request { service, source })?;

        let (parts, incoming) = response.into_parts();
        tracing::debug!(service = %service, status = %parts.status, "Upstream responded");

        let body = status_has_body(parts.status).then(|| Body::new(incoming));
        let mut response = UpstreamResponse::new(parts.status, body);
        // hyper only records the phrase when it differs from the canonical one.
        if let Some(reason) = parts.extensions.get::<ReasonPhrase>() {
            response = response.with_reason(String::from_utf8_lossy(reason.as_bytes()));
        }
        Ok(response)
    }
}
