//! Chunked relay of the rendered picture.
//!
//! # Responsibilities
//! - Pull the render body one chunk at a time
//! - Write each chunk to the client before pulling the next
//! - End the client body exactly once, after the source is exhausted
//!
//! # Design Decisions
//! - The client side is a zero-capacity channel, so at most one chunk is
//!   held between the relay and hyper's writer
//! - Failures after headers were sent abort the body instead of writing a
//!   second status

use std::io;
use std::pin::{pin, Pin};
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use futures::channel::mpsc;
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::picture::error::{BoxError, PictureError, PictureResult};

/// What a completed relay moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    /// Chunks pulled from the source, empty ones included.
    pub chunks: usize,
    /// Zero-length chunks, which are not forwarded.
    pub empty_chunks: usize,
    pub bytes: u64,
}

/// Copy every chunk of `source` into `sink`, in order, then close `sink`.
///
/// Each chunk is sent and flushed before the next one is requested. On
/// error the sink is left open so the caller can abort it.
pub async fn relay<S, E, K>(source: S, sink: &mut K) -> PictureResult<RelaySummary>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    K: Sink<Bytes> + Unpin,
    K::Error: Into<BoxError>,
{
    let mut source = pin!(source);
    let mut summary = RelaySummary::default();

    while let Some(next) = source.next().await {
        let index = summary.chunks;
        let chunk = next.map_err(|e| PictureError::StreamReadFailure {
            chunk: index,
            source: e.into(),
        })?;
        summary.chunks += 1;

        if chunk.is_empty() {
            summary.empty_chunks += 1;
            continue;
        }

        let len = chunk.len() as u64;
        sink.send(chunk)
            .await
            .map_err(|e| PictureError::StreamWriteFailure {
                chunk: index,
                source: e.into(),
            })?;
        summary.bytes += len;
    }

    sink.close()
        .await
        .map_err(|e| PictureError::StreamWriteFailure {
            chunk: summary.chunks,
            source: e.into(),
        })?;

    tracing::debug!(
        chunks = summary.chunks,
        bytes = summary.bytes,
        "Relay complete"
    );
    Ok(summary)
}

/// Writing half of a streamed response body.
pub struct BodySender {
    inner: mpsc::Sender<Result<Bytes, io::Error>>,
}

/// Create a response body fed by a [`BodySender`].
pub fn body_channel() -> (BodySender, Body) {
    let (tx, rx) = mpsc::channel(0);
    (BodySender { inner: tx }, Body::from_stream(rx))
}

impl BodySender {
    /// Fail the body so the connection is aborted instead of ended cleanly.
    pub async fn abort(mut self, error: io::Error) {
        // The client may already be gone.
        let _ = self.inner.send(Err(error)).await;
    }
}

impl Sink<Bytes> for BodySender {
    type Error = mpsc::SendError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        self.get_mut().inner.start_send(Ok(item))
    }

    /// Ready once the receiver has taken the pending chunk.
    ///
    /// A dropped receiver is an error here, unlike the plain channel sink,
    /// so a chunk the client never read is not counted as written.
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().inner.poll_ready(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.get_mut().inner).poll_close(cx)
    }
}
