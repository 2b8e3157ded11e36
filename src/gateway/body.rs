//! # Request Body
//!
//! PUT bodies are received into fixed-size buffers. At most two chained
//! buffers are supported; anything larger is treated as spooled to a
//! temporary file, which the gateway refuses to read.

use axum::body::{Body, Bytes};
use futures_util::StreamExt;

use super::errors::{GatewayError, GatewayResult};

/// Most buffers a readable body may span
pub const MAX_BODY_BUFFERS: usize = 2;

/// A received request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Held in memory, one entry per input buffer
    Buffered(Vec<Bytes>),
    /// Too large for the in-memory buffers
    Spooled { len: usize },
}

impl RequestBody {
    /// Receive `body` into buffers of `buffer_size` bytes.
    ///
    /// Stops reading as soon as the body outgrows two buffers; the rest of
    /// the stream is dropped unread and `len` is the count seen so far.
    pub async fn collect(body: Body, buffer_size: usize) -> GatewayResult<Self> {
        let limit = buffer_size.saturating_mul(MAX_BODY_BUFFERS);
        let mut stream = body.into_data_stream();
        let mut data: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GatewayError::Internal(format!("reading body: {}", e)))?;
            let len = data.len().saturating_add(chunk.len());
            if len > limit {
                return Ok(RequestBody::Spooled { len });
            }
            data.extend_from_slice(&chunk);
        }

        let buffers = data
            .chunks(buffer_size.max(1))
            .map(Bytes::copy_from_slice)
            .collect();
        Ok(RequestBody::Buffered(buffers))
    }

    /// Total received length in bytes
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Buffered(buffers) => buffers.iter().map(Bytes::len).sum(),
            RequestBody::Spooled { len } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contiguous body bytes.
    ///
    /// Fails fast for a spooled body or one spanning more than two buffers.
    pub fn read(&self) -> GatewayResult<Vec<u8>> {
        match self {
            RequestBody::Buffered(buffers) if buffers.len() <= MAX_BODY_BUFFERS => {
                Ok(buffers.concat())
            }
            RequestBody::Buffered(buffers) => Err(GatewayError::UnsupportedBody(format!(
                "{} chained buffers",
                buffers.len()
            ))),
            RequestBody::Spooled { len } => Err(GatewayError::UnsupportedBody(format!(
                "{} byte body spooled to temporary file",
                len
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_single_buffer() {
        let body = RequestBody::collect(Body::from("hello"), 8).await.unwrap();
        assert_eq!(body, RequestBody::Buffered(vec![Bytes::from_static(b"hello")]));
        assert_eq!(body.read().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_collect_two_buffers() {
        let body = RequestBody::collect(Body::from("0123456789"), 8).await.unwrap();
        match &body {
            RequestBody::Buffered(buffers) => assert_eq!(buffers.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(body.read().unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_collect_oversized_is_spooled() {
        let body = RequestBody::collect(Body::from(vec![b'x'; 17]), 8).await.unwrap();
        assert_eq!(body, RequestBody::Spooled { len: 17 });
        assert!(matches!(body.read(), Err(GatewayError::UnsupportedBody(_))));
    }

    /// Stops at the first chunk past the limit without waiting for the end.
    #[tokio::test]
    async fn test_collect_oversized_stalled_stream() {
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; 9])),
            Ok(Bytes::from(vec![b'y'; 8])),
        ];
        let stream = futures_util::stream::iter(chunks).chain(futures_util::stream::pending());
        let body = Body::from_stream(stream);

        let collected = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            RequestBody::collect(body, 8),
        )
        .await
        .expect("collect must return once the limit is passed")
        .unwrap();
        assert_eq!(collected, RequestBody::Spooled { len: 17 });
    }

    /// A body that fits is still read to the end across many chunks.
    #[tokio::test]
    async fn test_collect_chunked_within_limit() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            (0..4).map(|_| Ok(Bytes::from_static(b"abcd"))).collect();
        let body = Body::from_stream(futures_util::stream::iter(chunks));

        let collected = RequestBody::collect(body, 8).await.unwrap();
        assert_eq!(collected.len(), 16);
        assert_eq!(collected.read().unwrap(), b"abcdabcdabcdabcd".to_vec());
    }

    #[tokio::test]
    async fn test_collect_empty() {
        let body = RequestBody::collect(Body::empty(), 8).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(body.read().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_three_buffers_rejected() {
        let body = RequestBody::Buffered(vec![Bytes::from_static(b"a"); 3]);
        assert!(matches!(body.read(), Err(GatewayError::UnsupportedBody(_))));
    }
}
