//! Render dispatch to meminator.

use axum::body::Body;
use serde_json::Value;

use crate::observability::metrics;
use crate::picture::aggregate::Fragment;
use crate::picture::context::RequestContext;
use crate::picture::error::{PictureError, PictureResult};
use crate::upstream::{Service, UpstreamClient, UpstreamRequest};

/// POST the merged payload to meminator and hand back the unread picture body.
///
/// A failure status and a success without a body are both reported as
/// [`PictureError::RenderUpstreamError`]. Transport failures are not
/// recovered here.
pub async fn dispatch_render(
    client: &dyn UpstreamClient,
    payload: Fragment,
    ctx: &RequestContext,
) -> PictureResult<Body> {
    let request =
        UpstreamRequest::post_json(Value::Object(payload)).with_request_id(ctx.request_id());

    let response = client
        .call(Service::Meminator, request)
        .await
        .map_err(|e| {
            metrics::record_upstream_call(Service::Meminator, "unavailable");
            PictureError::UpstreamUnavailable {
                service: Service::Meminator,
                reason: e.to_string(),
            }
        })?;

    let status = response.status();
    let reason = response.reason().to_owned();
    ctx.record_render_status(status);

    let body = if response.is_success() {
        response.into_body()
    } else {
        None
    };

    match body {
        Some(body) => {
            metrics::record_upstream_call(Service::Meminator, "ok");
            Ok(body)
        }
        None => {
            tracing::info!(status = %status, reason = %reason, "Failed to fetch picture");
            metrics::record_upstream_call(Service::Meminator, "error");
            Err(PictureError::RenderUpstreamError { status, reason })
        }
    }
}
