//! Picture creation flow.
//!
//! # Data Flow
//! ```text
//! POST /createPicture
//!     → aggregate.rs (phrase-picker ∥ image-picker → merged payload)
//!     → render.rs (POST payload to meminator → picture body)
//!     → relay.rs (chunk by chunk into the client body)
//! ```
//!
//! # Design Decisions
//! - Every stage receives an explicit RequestContext instead of reading
//!   ambient tracing state
//! - Errors before streaming become a 500; errors while streaming abort the
//!   connection
//! - No retries: a failed call is final for the request

pub mod aggregate;
pub mod context;
pub mod error;
pub mod relay;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

use std::io;
use std::sync::Arc;

use axum::body::Body;
use tracing::Instrument;

use crate::observability::metrics;

pub use context::RequestContext;
pub use error::{PictureError, PictureResult};
pub use relay::RelaySummary;

use crate::upstream::UpstreamClient;

/// Runs the picture flow against a set of upstreams.
#[derive(Clone)]
pub struct PictureService {
    client: Arc<dyn UpstreamClient>,
    max_fragment_bytes: usize,
}

impl PictureService {
    pub fn new(client: Arc<dyn UpstreamClient>, max_fragment_bytes: usize) -> Self {
        Self {
            client,
            max_fragment_bytes,
        }
    }

    /// Aggregate the fragments and dispatch the render.
    ///
    /// Returns the unread picture body; nothing has been sent to the client yet.
    pub async fn prepare(&self, ctx: &RequestContext) -> PictureResult<Body> {
        let payload =
            aggregate::aggregate(self.client.as_ref(), ctx, self.max_fragment_bytes).await?;
        render::dispatch_render(self.client.as_ref(), payload, ctx).await
    }

    /// Relay `source` into a new response body on a background task.
    ///
    /// The context is finished once the last chunk has been written.
    pub fn stream(&self, source: Body, ctx: RequestContext) -> Body {
        let (mut sender, body) = relay::body_channel();
        let span = ctx.span().clone();

        tokio::spawn(
            async move {
                match relay::relay(source.into_data_stream(), &mut sender).await {
                    Ok(summary) => {
                        metrics::record_relay(&summary);
                        ctx.finish(&summary);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Picture stream aborted");
                        metrics::record_relay_failure();
                        sender.abort(io::Error::other(e.to_string())).await;
                    }
                }
            }
            .instrument(span),
        );

        body
    }
}
