//! Response head decoder
//!
//! Turns the bytes up to and including the blank line that ends the header
//! block into a [`ResponseHead`] and the [`Framing`] of the body that follows.
//!
//! # Implementation Details
//!
//! 1. Locate `\r\n\r\n`, resuming the search where the previous call stopped
//! 2. Split the block into lines, joining obsolete folds (`CRLF` followed by
//!    SP or HTAB) into the current line with a single space
//! 3. Parse the status line, then each field line
//! 4. Pick the body framing from the status code and the framing headers
//!
//! Framing headers get special treatment while fields are added: a repeated
//! `Content-Length` must repeat the same value, and `Transfer-Encoding: chunked`
//! evicts `Content-Length` whichever comes first.

use std::mem;

use bytes::BytesMut;
use http::StatusCode;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::StatusLine;
use crate::ensure;
use crate::protocol::header::{CONTENT_LENGTH, TRANSFER_ENCODING, is_whitespace};
use crate::protocol::{Framing, HeaderCollection, ResponseError, ResponseHead};
use crate::utils::decode_text;

/// Default maximum size in bytes of the whole header block
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    max_header_bytes: usize,
    /// answers to HEAD never carry a body, whatever the headers claim
    head_request: bool,
    /// how far the previous calls already searched for the header end
    scanned: usize,
}

impl HeaderDecoder {
    pub fn new(max_header_bytes: usize, head_request: bool) -> Self {
        Self { max_header_bytes, head_request, scanned: 0 }
    }

    fn find_header_end(&mut self, src: &[u8]) -> Option<usize> {
        // the terminator may straddle the previous and the new bytes
        let start = self.scanned.saturating_sub(HEADER_END.len() - 1);
        match src[start..].windows(HEADER_END.len()).position(|window| window == HEADER_END) {
            Some(position) => Some(start + position),
            None => {
                self.scanned = src.len();
                None
            }
        }
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new(MAX_HEADER_BYTES, false)
    }
}

impl Decoder for HeaderDecoder {
    type Item = (ResponseHead, Framing);
    type Error = ResponseError;

    /// # Returns
    ///
    /// - `Ok(Some((head, framing)))` once the whole header block was consumed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ResponseError)` for an oversized or malformed head
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(end) = self.find_header_end(src) else {
            ensure!(src.len() <= self.max_header_bytes, ResponseError::too_large_header(src.len(), self.max_header_bytes));
            return Ok(None);
        };

        let block_len = end + HEADER_END.len();
        ensure!(block_len <= self.max_header_bytes, ResponseError::too_large_header(block_len, self.max_header_bytes));

        let block = src.split_to(block_len);
        self.scanned = 0;
        trace!(header_size = block_len, "read response header block");

        // keep the CRLF of the last field line so every line is terminated
        let mut lines = split_lines(&block[..end + 2]).into_iter();
        let status_line = lines.next().unwrap_or_default();
        let StatusLine { version, status, reason } = StatusLine::parse(&status_line)?;

        let mut headers = HeaderCollection::new();
        for line in lines {
            add_field_line(&mut headers, &line)?;
        }

        let framing = parse_framing(status, &headers, self.head_request)?;
        trace!(status = status.as_u16(), header_count = headers.len(), ?framing, "parsed response head");

        Ok(Some((ResponseHead::new(version, status, reason, headers), framing)))
    }
}

/// Splits CRLF-terminated lines, unfolding obsolete line folding.
fn split_lines(block: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut line = Vec::new();
    let mut rest = block;

    while let Some((&b, tail)) = rest.split_first() {
        if b == b'\r' && tail.first() == Some(&b'\n') {
            match tail.get(1) {
                Some(&next) if is_whitespace(next) => {
                    // obs-fold: CRLF + SP/HTAB continues the current line
                    line.push(b' ');
                    rest = &tail[2..];
                }
                _ => {
                    lines.push(mem::take(&mut line));
                    rest = &tail[1..];
                }
            }
        } else {
            line.push(b);
            rest = tail;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn add_field_line(headers: &mut HeaderCollection, line: &[u8]) -> Result<(), ResponseError> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| ResponseError::invalid_header(format!("missing ':' in '{}'", String::from_utf8_lossy(line))))?;

    let name = decode_text(&line[..colon]);
    let value = decode_text(&line[colon + 1..]);
    let trimmed = value.trim_matches([' ', '\t']);

    if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
        if let Ok(existing) = headers.get(CONTENT_LENGTH) {
            ensure!(existing == trimmed, ResponseError::conflicting_content_length(existing, trimmed));
        }
        if headers.has(TRANSFER_ENCODING) {
            trace!(content_length = trimmed, "content-length ignored next to transfer-encoding");
            return Ok(());
        }
    } else if name.eq_ignore_ascii_case(TRANSFER_ENCODING) && is_chunked(trimmed) && headers.has(CONTENT_LENGTH) {
        trace!("chunked transfer-encoding evicts content-length");
        headers.remove(CONTENT_LENGTH)?;
    }

    headers.add(name, value)?;
    Ok(())
}

/// Picks the body framing, RFC 7230 §3.3.3.
fn parse_framing(status: StatusCode, headers: &HeaderCollection, head_request: bool) -> Result<Framing, ResponseError> {
    if head_request || status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
    {
        return Ok(Framing::Empty);
    }

    if let Ok(encoding) = headers.get(TRANSFER_ENCODING) {
        ensure!(is_chunked(encoding), ResponseError::unsupported_transfer_encoding(encoding));
        return Ok(Framing::Chunked);
    }

    if let Ok(length) = headers.get(CONTENT_LENGTH) {
        ensure!(
            !length.is_empty() && length.bytes().all(|b| b.is_ascii_digit()),
            ResponseError::invalid_content_length(format!("value '{length}' is not a number"))
        );
        let length = length
            .parse::<u64>()
            .map_err(|_overflow| ResponseError::invalid_content_length(format!("value '{length}' is not u64")))?;
        return Ok(Framing::Length(length));
    }

    Ok(Framing::Close)
}

/// Checks whether `chunked` is the final transfer coding.
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}
