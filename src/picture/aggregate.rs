//! Fragment aggregation.
//!
//! # Responsibilities
//! - Fetch the phrase and image fragments concurrently
//! - Substitute `{}` for any fragment whose call did not succeed
//! - Parse both fragments and merge them into the render payload
//!
//! # Design Decisions
//! - Each call carries its own fallback, so one failure never cancels the other
//! - Unparseable fragments are surfaced, not replaced: they point at a broken
//!   integration rather than a transient outage

use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::picture::context::RequestContext;
use crate::picture::error::{PictureError, PictureResult};
use crate::upstream::{Service, UpstreamClient, UpstreamRequest};

/// Raw body used in place of a fragment that could not be fetched.
pub const EMPTY_FRAGMENT: &str = "{}";

/// A JSON object returned by one fragment upstream.
pub type Fragment = Map<String, Value>;

/// Fetch both fragments concurrently and merge them.
pub async fn aggregate(
    client: &dyn UpstreamClient,
    ctx: &RequestContext,
    max_fragment_bytes: usize,
) -> PictureResult<Fragment> {
    let (phrase_text, image_text) = tokio::join!(
        fetch_fragment_text(client, Service::PhrasePicker, ctx, max_fragment_bytes),
        fetch_fragment_text(client, Service::ImagePicker, ctx, max_fragment_bytes),
    );
    ctx.record_fragments(&phrase_text, &image_text);

    let phrase = parse_fragment(Service::PhrasePicker, &phrase_text)?;
    let image = parse_fragment(Service::ImagePicker, &image_text)?;

    Ok(merge_fragments(phrase, image))
}

/// Fetch one fragment body, falling back to [`EMPTY_FRAGMENT`].
async fn fetch_fragment_text(
    client: &dyn UpstreamClient,
    service: Service,
    ctx: &RequestContext,
    limit: usize,
) -> String {
    let request = UpstreamRequest::get().with_request_id(ctx.request_id());

    let outcome = match client.call(service, request).await {
        Ok(response) if response.is_success() => {
            response.text(limit).await.map_err(|e| e.to_string())
        }
        Ok(response) => Err(format!(
            "status {} {}",
            response.status().as_u16(),
            response.reason()
        )),
        Err(e) => Err(e.to_string()),
    };

    match outcome {
        Ok(text) => {
            metrics::record_upstream_call(service, "ok");
            text
        }
        Err(reason) => {
            let err = PictureError::UpstreamUnavailable { service, reason };
            tracing::warn!(error = %err, "Using empty fragment");
            metrics::record_upstream_call(service, "fallback");
            EMPTY_FRAGMENT.to_string()
        }
    }
}

/// Parse a raw fragment body as a JSON object.
pub fn parse_fragment(service: Service, raw: &str) -> PictureResult<Fragment> {
    serde_json::from_str(raw)
        .map_err(|source| PictureError::MalformedUpstreamPayload { service, source })
}

/// Shallow merge; keys from `image` win over keys from `phrase`.
pub fn merge_fragments(mut phrase: Fragment, image: Fragment) -> Fragment {
    phrase.extend(image);
    phrase
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::testing::{text, transport_failure, ScriptedUpstream};
    use crate::upstream::{UpstreamError, UpstreamResponse};
    use async_trait::async_trait;
    use axum::http::Method;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const LIMIT: usize = 1024;

    fn object(value: Value) -> Fragment {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_merge_disjoint_is_union() {
        let merged = merge_fragments(
            object(json!({"phrase": "hello", "n": 1})),
            object(json!({"image": "cat.png"})),
        );
        assert_eq!(Value::Object(merged), json!({"phrase": "hello", "n": 1, "image": "cat.png"}));
    }

    #[test]
    fn test_merge_image_wins_on_collision() {
        let merged = merge_fragments(
            object(json!({"shared": "phrase", "phrase": "hi"})),
            object(json!({"shared": {"from": "image"}})),
        );
        assert_eq!(merged["shared"], json!({"from": "image"}));
        assert_eq!(merged["phrase"], json!("hi"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_fragment(Service::PhrasePicker, "not json").unwrap_err();
        assert!(matches!(
            err,
            PictureError::MalformedUpstreamPayload { service: Service::PhrasePicker, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_fragment(Service::ImagePicker, "[1, 2]").is_err());
        assert!(parse_fragment(Service::ImagePicker, "\"cat.png\"").is_err());
        assert!(parse_fragment(Service::ImagePicker, EMPTY_FRAGMENT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_merges_both_fragments() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || text(200, r#"{"phrase":"hello"}"#))
            .respond(Service::ImagePicker, || text(200, r#"{"image":"cat.png"}"#));
        let ctx = RequestContext::new("req-1");

        let merged = aggregate(&upstream, &ctx, LIMIT).await.unwrap();
        assert_eq!(Value::Object(merged), json!({"phrase": "hello", "image": "cat.png"}));

        for service in [Service::PhrasePicker, Service::ImagePicker] {
            let calls = upstream.calls_to(service);
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].method, Method::GET);
            assert!(calls[0].body.is_none());
            assert_eq!(calls[0].request_id.as_deref(), Some("req-1"));
        }
    }

    #[tokio::test]
    async fn test_phrase_transport_failure_falls_back() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || transport_failure(Service::PhrasePicker))
            .respond(Service::ImagePicker, || text(200, r#"{"image":"cat.png"}"#));
        let ctx = RequestContext::new("req-2");

        let merged = aggregate(&upstream, &ctx, LIMIT).await.unwrap();
        assert_eq!(Value::Object(merged), json!({"image": "cat.png"}));
    }

    #[tokio::test]
    async fn test_error_status_falls_back_even_with_json_body() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || text(200, r#"{"phrase":"hello"}"#))
            .respond(Service::ImagePicker, || text(503, "<html>down</html>"));
        let ctx = RequestContext::new("req-3");

        let merged = aggregate(&upstream, &ctx, LIMIT).await.unwrap();
        assert_eq!(Value::Object(merged), json!({"phrase": "hello"}));
    }

    #[tokio::test]
    async fn test_fragment_with_byte_order_mark_is_accepted() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || text(200, "\u{feff}{\"phrase\":\"hi\"}"))
            .respond(Service::ImagePicker, || text(200, r#"{"image":"cat.png"}"#));
        let ctx = RequestContext::new("req-7");

        let merged = aggregate(&upstream, &ctx, LIMIT).await.unwrap();
        assert_eq!(Value::Object(merged), json!({"phrase": "hi", "image": "cat.png"}));
    }

    #[tokio::test]
    async fn test_oversized_fragment_falls_back() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || text(200, r#"{"phrase":"a very long phrase"}"#))
            .respond(Service::ImagePicker, || text(200, "{}"));
        let ctx = RequestContext::new("req-4");

        let merged = aggregate(&upstream, &ctx, 8).await.unwrap();
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_fragment_is_surfaced() {
        let upstream = ScriptedUpstream::new()
            .respond(Service::PhrasePicker, || text(200, "not json"))
            .respond(Service::ImagePicker, || text(200, r#"{"image":"cat.png"}"#));
        let ctx = RequestContext::new("req-5");

        let err = aggregate(&upstream, &ctx, LIMIT).await.unwrap_err();
        assert!(matches!(
            err,
            PictureError::MalformedUpstreamPayload { service: Service::PhrasePicker, .. }
        ));
    }

    /// Completes a fragment call only once both calls are in flight.
    struct RendezvousUpstream {
        barrier: Barrier,
    }

    #[async_trait]
    impl UpstreamClient for RendezvousUpstream {
        async fn call(
            &self,
            service: Service,
            _request: UpstreamRequest,
        ) -> Result<UpstreamResponse, UpstreamError> {
            self.barrier.wait().await;
            match service {
                Service::PhrasePicker => text(200, r#"{"phrase":"together"}"#),
                _ => text(200, r#"{"image":"both.png"}"#),
            }
        }
    }

    #[tokio::test]
    async fn test_fragments_are_fetched_concurrently() {
        let upstream = RendezvousUpstream {
            barrier: Barrier::new(2),
        };
        let ctx = RequestContext::new("req-6");

        let merged = tokio::time::timeout(Duration::from_secs(5), aggregate(&upstream, &ctx, LIMIT))
            .await
            .expect("fragment calls were serialized")
            .unwrap();
        assert_eq!(merged.len(), 2);
    }
}
