//! `HTTP-version SP status-code SP reason-phrase`, RFC 7230 §3.1.2.

use http::{StatusCode, Version};

use crate::ensure;
use crate::protocol::ResponseError;
use crate::protocol::header::is_field_char;
use crate::utils::decode_text;

/// A parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
}

impl StatusLine {
    /// Parses a status line without its trailing CRLF.
    ///
    /// A missing reason phrase is tolerated, with or without the separating
    /// space.
    pub fn parse(line: &[u8]) -> Result<Self, ResponseError> {
        let rest = line
            .strip_prefix(b"HTTP/")
            .ok_or_else(|| ResponseError::malformed_status_line("expected 'HTTP/' prefix"))?;

        let (version, rest) =
            split_once_space(rest).ok_or_else(|| ResponseError::malformed_status_line("missing status code"))?;
        let version = match version {
            b"1.1" => Version::HTTP_11,
            b"1.0" => Version::HTTP_10,
            other => return Err(ResponseError::unsupported_version(String::from_utf8_lossy(other))),
        };

        let (code, reason) = split_once_space(rest).unwrap_or((rest, b""));
        ensure!(
            code.len() == 3 && code.iter().all(u8::is_ascii_digit),
            ResponseError::invalid_status_code(String::from_utf8_lossy(code))
        );
        let status = StatusCode::from_bytes(code)
            .ok()
            .filter(|status| (100..=599).contains(&status.as_u16()))
            .ok_or_else(|| ResponseError::invalid_status_code(String::from_utf8_lossy(code)))?;

        ensure!(reason.iter().copied().all(is_field_char), ResponseError::InvalidReasonPhrase);

        Ok(Self { version, status, reason: decode_text(reason) })
    }
}

fn split_once_space(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let position = bytes.iter().position(|&b| b == b' ')?;
    Some((&bytes[..position], &bytes[position + 1..]))
}
