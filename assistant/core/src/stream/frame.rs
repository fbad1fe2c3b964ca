//! Wire Frame Decoder
//!
//! Turns the raw chunked response body into complete protocol frames. A
//! network chunk may split a frame anywhere - including mid-way through a
//! multi-byte UTF-8 scalar - or carry several frames at once, so the
//! decoder keeps the residual bytes after the last line terminator and
//! prepends them to the next chunk.
//!
//! Splitting happens at the byte level on `\n` (a byte that cannot occur
//! inside a multi-byte scalar), which makes the yielded frame sequence
//! independent of how the transport chunked the bytes.

/// Incremental line-frame decoder with a residual buffer
///
/// Never fails: bytes that do not yet form a complete frame simply wait
/// for more data. A non-empty residual at stream end is not a valid
/// unterminated frame and is discarded by [`FrameDecoder::finish`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    residual: Vec<u8>,
}

impl FrameDecoder {
    /// Create a new decoder with an empty residual
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes, yielding every frame it completes
    ///
    /// Frames are the text of one protocol line, terminator stripped
    /// (trailing `\r` included, so CRLF transports decode identically).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.residual.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.residual.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.residual.drain(..=pos).collect();
            line.pop(); // the '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            frames.push(String::from_utf8_lossy(&line).into_owned());
        }
        frames
    }

    /// Finish the stream, discarding any unterminated residual
    ///
    /// The residual is not a complete frame and must not be parsed.
    pub fn finish(self) {
        if !self.residual.is_empty() {
            tracing::debug!(
                bytes = self.residual.len(),
                "discarding unterminated residual at stream end"
            );
        }
    }

    /// Bytes currently buffered awaiting a line terminator
    #[must_use]
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }
}
