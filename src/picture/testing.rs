//! In-memory upstream used by the picture flow tests.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::StatusCode;

use crate::upstream::{Service, UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse};

type Responder = Box<dyn Fn() -> Result<UpstreamResponse, UpstreamError> + Send + Sync>;

/// Answers each service with a scripted response and records every call.
#[derive(Default)]
pub(crate) struct ScriptedUpstream {
    responders: HashMap<Service, Responder>,
    calls: Mutex<Vec<(Service, UpstreamRequest)>>,
}

impl ScriptedUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond<F>(mut self, service: Service, f: F) -> Self
    where
        F: Fn() -> Result<UpstreamResponse, UpstreamError> + Send + Sync + 'static,
    {
        self.responders.insert(service, Box::new(f));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Service, UpstreamRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, service: Service) -> Vec<UpstreamRequest> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| *s == service)
            .map(|(_, r)| r)
            .collect()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn call(
        &self,
        service: Service,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.lock().unwrap().push((service, request));
        match self.responders.get(&service) {
            Some(respond) => respond(),
            None => Err(UpstreamError::Timeout { service, secs: 0 }),
        }
    }
}

pub(crate) fn text(status: u16, body: &'static str) -> Result<UpstreamResponse, UpstreamError> {
    Ok(UpstreamResponse::new(
        StatusCode::from_u16(status).unwrap(),
        Some(Body::from(body)),
    ))
}

pub(crate) fn chunked(status: u16, chunks: &[&'static [u8]]) -> Result<UpstreamResponse, UpstreamError> {
    let items: Vec<Result<Bytes, io::Error>> =
        chunks.iter().map(|c| Ok(Bytes::from_static(*c))).collect();
    Ok(UpstreamResponse::new(
        StatusCode::from_u16(status).unwrap(),
        Some(Body::from_stream(futures::stream::iter(items))),
    ))
}

pub(crate) fn transport_failure(service: Service) -> Result<UpstreamResponse, UpstreamError> {
    Err(UpstreamError::Timeout { service, secs: 30 })
}
