//! A single decoder over the response body framings.
//!
//! The framing picked from the response head decides the strategy:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Read until the peer closes the connection
//! - No body

use crate::codec::body::{ChunkedDecoder, LengthDecoder};
use crate::protocol::{Framing, PayloadItem, ResponseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Everything until the connection closes; never yields `Eof` on its own
    UntilClose,

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }
}

impl From<Framing> for PayloadDecoder {
    fn from(framing: Framing) -> Self {
        match framing {
            Framing::Empty => Self::empty(),
            Framing::Length(size) => Self::fix_length(size),
            Framing::Chunked => Self::chunked(),
            Framing::Close => Self::until_close(),
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ResponseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::UntilClose if src.is_empty() => Ok(None),
            Kind::UntilClose => Ok(Some(PayloadItem::Chunk(src.split().freeze()))),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_close_takes_everything() {
        let mut decoder = PayloadDecoder::from(Framing::Close);
        let mut buffer = BytesMut::from(&b"some bytes"[..]);

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&chunk.into_bytes().unwrap()[..], b"some bytes");
        assert!(buffer.is_empty());
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn no_body_is_eof_immediately() {
        let mut buffer = BytesMut::from(&b"unexpected"[..]);
        assert!(PayloadDecoder::from(Framing::Empty).decode(&mut buffer).unwrap().unwrap().is_eof());
        assert_eq!(&buffer[..], b"unexpected");
    }

    #[test]
    fn delegates_by_framing() {
        let mut buffer = BytesMut::from(&b"3\r\nabc\r\n0\r\n\r\n"[..]);
        let mut decoder = PayloadDecoder::from(Framing::Chunked);
        assert_eq!(&decoder.decode(&mut buffer).unwrap().unwrap().into_bytes().unwrap()[..], b"abc");
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());

        let mut buffer = BytesMut::from(&b"abcdef"[..]);
        let mut decoder = PayloadDecoder::from(Framing::Length(4));
        assert_eq!(&decoder.decode(&mut buffer).unwrap().unwrap().into_bytes().unwrap()[..], b"abcd");
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
