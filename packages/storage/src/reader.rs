//! Blocking `Read` over an object's byte stream.

use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::runtime::Runtime;

/// Streaming reader returned by [`crate::Storage`].
///
/// Chunks are fetched one at a time as the caller reads. Dropping the reader
/// releases the underlying request.
pub struct BlobReader {
    runtime: Arc<Runtime>,
    stream: BoxStream<'static, object_store::Result<Bytes>>,
    chunk: Bytes,
    done: bool,
}

impl BlobReader {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        stream: BoxStream<'static, object_store::Result<Bytes>>,
    ) -> Self {
        Self {
            runtime,
            stream,
            chunk: Bytes::new(),
            done: false,
        }
    }
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.chunk.has_remaining() {
            if self.done {
                return Ok(0);
            }
            match self.runtime.block_on(self.stream.next()) {
                Some(Ok(bytes)) => self.chunk = bytes,
                Some(Err(e)) => return Err(io::Error::other(e)),
                None => self.done = true,
            }
        }

        let n = buf.len().min(self.chunk.remaining());
        self.chunk.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("buffered", &self.chunk.remaining())
            .field("done", &self.done)
            .finish()
    }
}
