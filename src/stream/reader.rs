use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::sse::FrameBuffer;

/// How a stream read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Body ended normally.
    Completed,
    /// The token fired. Not an error.
    Cancelled,
    /// The body yielded an I/O error.
    Failed(String),
}

/// Reads `body` to the end, handing every `data:` payload to `on_payload` in order.
///
/// The token is checked between chunk reads; on cancellation the partial
/// buffer is discarded and no further payloads are delivered.
pub async fn pump<S, B, E, F>(mut body: S, token: &CancellationToken, mut on_payload: F) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(String),
{
    let mut buffer = FrameBuffer::new();

    loop {
        if token.is_cancelled() {
            buffer.discard();
            return StreamOutcome::Cancelled;
        }

        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(target: "stream::pump", "Cancelled with {} bytes pending", buffer.pending_len());
                buffer.discard();
                return StreamOutcome::Cancelled;
            }
            item = body.next() => item,
        };

        match next {
            Some(Ok(chunk)) => {
                for payload in buffer.push(chunk.as_ref()) {
                    on_payload(payload);
                }
            }
            Some(Err(e)) => return StreamOutcome::Failed(e.to_string()),
            None => {
                if let Some(payload) = buffer.finish() {
                    on_payload(payload);
                }
                return StreamOutcome::Completed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, String>> + Unpin {
        stream::iter(parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_unterminated_last_frame_is_flushed() {
        let mut seen = Vec::new();
        let outcome = pump(chunks(&["data: {\"a\":1}\n", "data: {\"b\""]), &CancellationToken::new(), |p| {
            seen.push(p)
        })
        .await;
        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(seen, vec!["{\"a\":1}".to_string(), "{\"b\"".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_token_delivers_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let mut seen = 0;
        let outcome = pump(chunks(&["data: {}\n"]), &token, |_| seen += 1).await;
        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(seen, 0);
    }

    #[tokio::test]
    async fn test_body_error_fails_after_earlier_frames() {
        let body = stream::iter(vec![Ok(b"data: 1\n".to_vec()), Err("reset".to_string())]);
        let mut seen = Vec::new();
        let outcome = pump(body, &CancellationToken::new(), |p| seen.push(p)).await;
        assert_eq!(outcome, StreamOutcome::Failed("reset".into()));
        assert_eq!(seen, vec!["1".to_string()]);
    }
}
