//! Line splitter for chunked response bodies.
//!
//! Handles:
//! - Lines split across TCP chunks
//! - CRLF and LF line endings
//! - A final line without a trailing newline
//! - Buffer compaction to prevent unbounded growth

use crate::error::Error;
use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use memchr::memchr;

/// Incremental line decoder over raw bytes.
pub struct LineDecoder {
    buffer: BytesMut,
    /// Offset of unconsumed data in buffer.
    consumed: usize,
}

impl LineDecoder {
    /// Create a new decoder with default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    /// Create a new decoder with specified initial capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(cap),
            consumed: 0,
        }
    }

    /// Feed bytes into the decoder.
    #[inline]
    pub fn feed(&mut self, data: &[u8]) {
        // Compact buffer if we've consumed more than half
        if self.consumed > self.buffer.len() / 2 && self.consumed > 4096 {
            self.compact();
        }
        self.buffer.extend_from_slice(data);
    }

    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.advance(self.consumed);
            self.consumed = 0;
        }
    }

    /// Take the next complete line, without its terminator.
    /// Returns `None` if more data is needed.
    pub fn next_line(&mut self) -> Option<String> {
        let buf = &self.buffer[self.consumed..];
        let end = memchr(b'\n', buf)?;
        let line = decode(&buf[..end]);
        self.consumed += end + 1;
        Some(line)
    }

    /// Flush whatever remains once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = &self.buffer[self.consumed..];
        if rest.is_empty() {
            return None;
        }
        let line = decode(rest);
        self.consumed = self.buffer.len();
        Some(line)
    }

    /// Bytes buffered but not yet returned.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len() - self.consumed
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Raw lines of a streamed body.
///
/// Owns the byte stream; dropping it releases the underlying connection.
pub struct BodyLines<S> {
    inner: S,
    decoder: LineDecoder,
    eof: bool,
}

impl<S, E> BodyLines<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Error>,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(),
            eof: false,
        }
    }

    /// Read the next raw line. `None` once the body is exhausted.
    ///
    /// After a read failure the body is treated as ended.
    pub async fn next_line(&mut self) -> Option<Result<String, Error>> {
        loop {
            if let Some(line) = self.decoder.next_line() {
                return Some(Ok(line));
            }
            if self.eof {
                return None;
            }

            match self.inner.next().await {
                Some(Ok(bytes)) => self.decoder.feed(&bytes),
                Some(Err(e)) => {
                    self.eof = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.eof = true;
                    return self.decoder.finish().map(Ok);
                }
            }
        }
    }
}
