//! Decoder for the chunked transfer coding,
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! Each chunk is a hex size line, optionally followed by `;extensions`, then
//! that many data bytes and a CRLF. A zero-sized chunk ends the body; anything
//! after its size line (trailer fields, the final CRLF) is not consumed.

use crate::ensure;
use crate::protocol::{PayloadItem, ResponseError};
use crate::utils::find_crlf;
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

/// Upper bound on a chunk size line, extensions included.
const MAX_SIZE_LINE: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    /// Starts in the Size state, ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line
    Size,
    /// Read chunk data
    Data,
    /// Read the CRLF after chunk data
    DataCrlf,
    /// The last chunk was read
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ResponseError;

    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` for (part of) a chunk's data
    /// - `Ok(Some(PayloadItem::Eof))` once the zero-sized chunk was read
    /// - `Ok(None)` when more data is needed
    /// - `Err(ResponseError)` if the chunked encoding is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                Size => {
                    let Some(line_end) = find_crlf(src) else {
                        ensure!(src.len() <= MAX_SIZE_LINE, ResponseError::invalid_chunk_size("size line too long"));
                        return Ok(None);
                    };
                    let line = src.split_to(line_end);
                    src.advance(2);

                    self.remaining_size = parse_chunk_size(&line)?;
                    trace!(size = self.remaining_size, "read chunk size");
                    self.state = if self.remaining_size == 0 { End } else { Data };
                }

                Data => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    #[allow(clippy::cast_possible_truncation, reason = "bounded by src.len()")]
                    let read_size = self.remaining_size.min(src.len() as u64) as usize;
                    self.remaining_size -= read_size as u64;
                    if self.remaining_size == 0 {
                        self.state = DataCrlf;
                    }

                    let bytes = src.split_to(read_size).freeze();
                    trace!(len = bytes.len(), "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                DataCrlf => {
                    if src.len() < 2 {
                        // a lone byte that can't start a CRLF is already wrong
                        ensure!(src.first().is_none_or(|&b| b == b'\r'), ResponseError::InvalidChunkDelimiter);
                        return Ok(None);
                    }
                    ensure!(src.starts_with(b"\r\n"), ResponseError::InvalidChunkDelimiter);
                    src.advance(2);
                    self.state = Size;
                }

                End => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }
            }
        }
    }
}

/// Parses `1*HEXDIG [ ";" extensions ]`, with optional whitespace before the
/// extensions.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ResponseError> {
    let size = match line.iter().position(|&b| b == b';') {
        Some(extension_start) => &line[..extension_start],
        None => line,
    };
    let size = size.trim_ascii();

    ensure!(!size.is_empty(), ResponseError::invalid_chunk_size("empty size"));
    ensure!(
        size.iter().all(u8::is_ascii_hexdigit),
        ResponseError::invalid_chunk_size(format!("'{}' is not hex", String::from_utf8_lossy(size)))
    );

    size.iter().try_fold(0_u64, |acc, &b| {
        // is_ascii_hexdigit was checked above
        let digit = u64::from(char::from(b).to_digit(16).unwrap_or_default());
        acc.checked_mul(16)
            .and_then(|acc| acc.checked_add(digit))
            .ok_or_else(|| ResponseError::invalid_chunk_size("size overflows u64"))
    })
}
