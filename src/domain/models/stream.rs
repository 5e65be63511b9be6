use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use sha2::{Digest, Sha256};

use crate::domain::value_objects::Checksum;

/// A boxed stream of payload chunks
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

#[derive(Default)]
struct DigestState {
    hasher: Sha256,
    bytes: u64,
}

/// Wraps a [`ByteStream`] and hashes every chunk as it is pulled
///
/// The checksum is taken in the same pass that feeds the object store, so
/// the payload is never buffered whole. Obtain the result through the
/// [`DigestHandle`] returned by [`DigestingStream::new`] once the consumer
/// has drained the stream.
pub struct DigestingStream {
    inner: ByteStream,
    state: Arc<Mutex<DigestState>>,
    limit: Option<u64>,
    exhausted: bool,
}

/// Reads the digest of a [`DigestingStream`] after it has been consumed
#[derive(Clone)]
pub struct DigestHandle {
    state: Arc<Mutex<DigestState>>,
}

impl DigestingStream {
    pub fn new(inner: ByteStream) -> (Self, DigestHandle) {
        let state = Arc::new(Mutex::new(DigestState::default()));
        let handle = DigestHandle {
            state: Arc::clone(&state),
        };
        (
            Self {
                inner,
                state,
                limit: None,
                exhausted: false,
            },
            handle,
        )
    }

    /// Fail the stream with `InvalidData` once more than `limit` bytes pass
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn boxed(self) -> ByteStream {
        Box::pin(self)
    }
}

impl Stream for DigestingStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.exhausted {
            return Poll::Ready(None);
        }

        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            let total = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                state.hasher.update(chunk);
                state.bytes += chunk.len() as u64;
                state.bytes
            };

            if let Some(limit) = self.limit.filter(|limit| total > *limit) {
                self.exhausted = true;
                return Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("payload exceeds {} bytes", limit),
                ))));
            }
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DigestHandle {
    /// Bytes seen so far
    pub fn bytes_read(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).bytes
    }

    /// Whether more than `limit` bytes have been seen
    pub fn exceeded(&self, limit: u64) -> bool {
        self.bytes_read() > limit
    }

    /// Checksum of everything seen so far
    pub fn checksum(&self) -> Checksum {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Checksum::from_hasher(state.hasher.clone())
    }
}

/// Single-chunk stream over an in-memory payload
pub fn byte_stream_from(data: impl Into<Bytes>) -> ByteStream {
    let data: Bytes = data.into();
    futures::stream::once(async move { Ok(data) }).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_digest_matches_concatenated_chunks() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"hello")),
            Ok(Bytes::from_static(b" ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let (stream, digest) = DigestingStream::new(futures::stream::iter(chunks).boxed());

        let collected: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(collected.concat(), b"hello world");
        assert_eq!(digest.bytes_read(), 11);
        assert_eq!(digest.checksum(), Checksum::of(b"hello world"));
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away")),
        ];
        let (stream, digest) = DigestingStream::new(futures::stream::iter(chunks).boxed());

        let result: io::Result<Vec<Bytes>> = stream.try_collect().await;
        assert!(result.is_err());
        assert_eq!(digest.bytes_read(), 3);
    }

    #[tokio::test]
    async fn test_limit_cuts_stream_short() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"1234")),
            Ok(Bytes::from_static(b"5678")),
            Ok(Bytes::from_static(b"never read")),
        ];
        let (stream, digest) = DigestingStream::new(futures::stream::iter(chunks).boxed());
        let mut stream = stream.with_limit(6);

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(stream.next().await.is_none());
        assert!(digest.exceeded(6));
        assert_eq!(digest.bytes_read(), 8);
    }
}
