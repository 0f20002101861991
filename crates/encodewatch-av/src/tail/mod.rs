//! Live progress from a job's diagnostic stream.
//!
//! [`tail`] spawns a task that reads the stream through a [`TokenCodec`],
//! parses each token, and forwards de-duplicated [`ProgressUpdate`]s to a
//! [`ProgressStream`]. The stream ends when the engine's stderr reaches EOF.

mod codec;
mod parse;

pub use codec::{SplitStrategy, TokenCodec, FRAME_MARKER, MAX_TOKEN_LEN};
pub use parse::{parse_token, timestamp_to_secs, ProgressTracker};

use crate::{DiagnosticStream, JobDescriptor};
use encodewatch_common::ProgressUpdate;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::codec::FramedRead;
use tracing::Instrument;

/// Start tailing `diagnostics` for `job`.
///
/// The tokenizer is chosen from the job's media kind and percentages are
/// computed against its probed duration. A detached handle produces an
/// empty stream. Must be called from within a Tokio runtime.
pub fn tail(mut diagnostics: DiagnosticStream, job: &JobDescriptor) -> ProgressStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let reader = diagnostics.take();
    let codec = TokenCodec::for_kind(job.media_kind());
    let mut tracker = ProgressTracker::new(job.duration_secs());
    let span = tracing::info_span!("tail", job = %job.id());

    tokio::spawn(
        async move {
            let Some(reader) = reader else {
                tracing::debug!("No diagnostic stream attached; progress unavailable");
                return;
            };
            tracing::debug!("Tailing diagnostics with {:?}", codec.strategy());

            let mut tokens = FramedRead::new(reader, codec);
            let mut delivered = 0usize;

            while let Some(token) = tokens.next().await {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::debug!("Diagnostic stream abandoned: {}", e);
                        // Keep the pipe drained so the engine can still finish.
                        let mut reader = tokens.into_inner();
                        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                        return;
                    }
                };

                let Some(update) = tracker.observe(&token) else {
                    continue;
                };
                tracing::trace!("Progress {:.2}% at {}", update.progress, update.current_time);
                if tx.send(update).is_ok() {
                    delivered += 1;
                }
            }

            tracing::debug!("Diagnostic stream ended after {} updates", delivered);
        }
        .instrument(span),
    );

    ProgressStream {
        inner: UnboundedReceiverStream::new(rx),
    }
}

/// Ordered, finite sequence of progress updates for one job.
///
/// Never applies back-pressure to the engine: updates queue until read, and
/// dropping the stream simply discards the rest.
#[derive(Debug)]
pub struct ProgressStream {
    inner: UnboundedReceiverStream<ProgressUpdate>,
}

impl Stream for ProgressStream {
    type Item = ProgressUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
