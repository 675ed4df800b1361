//! Incremental response parser.
//!
//! [`ResponseParser`] accepts the response byte stream in whatever pieces the
//! transport delivers it and assembles a [`Response`]. Splitting the same bytes
//! differently never changes the outcome.
//!
//! ```text
//! ReadingHeaders --head complete--> ReadingBody --body complete--> Done
//!   ^        |
//!   +--1xx---+
//! ```
//!
//! The head is handled by [`HeaderDecoder`], the body by a [`PayloadDecoder`]
//! picked from the head's [`Framing`]. For connection-close framing the parser
//! cannot see the end of the body by itself: the owner calls
//! [`ResponseParser::finish`] once the peer has closed the connection.

use bytes::BytesMut;
use http::{Method, StatusCode};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{HeaderDecoder, MAX_HEADER_BYTES};
use crate::ensure;
use crate::protocol::{Framing, PayloadItem, Response, ResponseError, ResponseHead};

/// Upper bound of the body capacity reserved up front from `Content-Length`.
const MAX_BODY_RESERVE: u64 = 8 * 1024 * 1024;

#[derive(Debug)]
enum State {
    ReadingHeaders(HeaderDecoder),
    ReadingBody(PayloadDecoder),
    Done,
}

#[derive(Debug)]
pub struct ResponseParser {
    /// bytes received but not consumed yet
    buffer: BytesMut,
    state: State,
    head: Option<ResponseHead>,
    framing: Option<Framing>,
    body: BytesMut,
}

impl ResponseParser {
    /// A parser for the answer to a request with `method`.
    ///
    /// Answers to `HEAD` never carry a body.
    pub fn new(method: &Method) -> Self {
        Self::with_max_header_size(method, MAX_HEADER_BYTES)
    }

    pub fn with_max_header_size(method: &Method, max_header_bytes: usize) -> Self {
        let head_request = method == Method::HEAD;
        Self {
            buffer: BytesMut::new(),
            state: State::ReadingHeaders(HeaderDecoder::new(max_header_bytes, head_request)),
            head: None,
            framing: None,
            body: BytesMut::new(),
        }
    }

    /// Consumes the next piece of the response stream.
    ///
    /// Bytes arriving after the response is complete are ignored.
    ///
    /// # Errors
    ///
    /// Any [`ResponseError`] about the status line, the header fields or the
    /// body framing. The parser must not be fed again after an error.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), ResponseError> {
        if self.done() {
            trace!(len = bytes.len(), "ignoring bytes after complete response");
            return Ok(());
        }
        self.buffer.extend_from_slice(bytes);

        loop {
            match &mut self.state {
                State::ReadingHeaders(header_decoder) => {
                    let Some((head, framing)) = header_decoder.decode(&mut self.buffer)? else {
                        return Ok(());
                    };

                    // interim answers precede the final one; 101 ends HTTP on this connection
                    if head.status().is_informational() && head.status() != StatusCode::SWITCHING_PROTOCOLS {
                        trace!(status = head.status().as_u16(), "skipped interim response");
                        continue;
                    }

                    if let Framing::Length(length) = framing {
                        #[allow(clippy::cast_possible_truncation, reason = "capped by MAX_BODY_RESERVE")]
                        self.body.reserve(length.min(MAX_BODY_RESERVE) as usize);
                    }
                    self.head = Some(head);
                    self.framing = Some(framing);
                    self.state = State::ReadingBody(PayloadDecoder::from(framing));
                }

                State::ReadingBody(payload_decoder) => match payload_decoder.decode(&mut self.buffer)? {
                    Some(PayloadItem::Chunk(bytes)) => {
                        trace!(len = bytes.len(), total = self.body.len() + bytes.len(), "appended body bytes");
                        self.body.extend_from_slice(&bytes);
                    }
                    Some(PayloadItem::Eof) => {
                        trace!(body_size = self.body.len(), "response complete");
                        self.state = State::Done;
                        return Ok(());
                    }
                    None => return Ok(()),
                },

                State::Done => return Ok(()),
            }
        }
    }

    /// Records that the peer closed the connection.
    ///
    /// This completes a connection-close framed body. Content-length and
    /// chunked bodies stay incomplete, so [`ResponseParser::response`] keeps
    /// failing for them.
    pub fn finish(&mut self) {
        if self.framing == Some(Framing::Close) && !self.done() {
            trace!(body_size = self.body.len(), "peer closed, response complete");
            self.state = State::Done;
        }
    }

    /// Whether the body was fully read according to its framing.
    pub fn done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// The response head, once it was parsed.
    pub fn head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// The response accumulated so far.
    ///
    /// # Errors
    ///
    /// [`ResponseError::IncompleteTransfer`] if the head is not complete yet,
    /// or if a content-length or chunked body is not complete yet.
    /// Connection-close bodies are returned as they are.
    pub fn response(&self) -> Result<Response, ResponseError> {
        self.check_complete()?;
        let head = self.head.clone().ok_or(ResponseError::IncompleteTransfer)?;
        Ok(Response::new(head, self.body.clone().freeze()))
    }

    /// Like [`ResponseParser::response`], without copying the body.
    ///
    /// # Errors
    ///
    /// See [`ResponseParser::response`].
    pub fn into_response(self) -> Result<Response, ResponseError> {
        self.check_complete()?;
        let head = self.head.ok_or(ResponseError::IncompleteTransfer)?;
        Ok(Response::new(head, self.body.freeze()))
    }

    fn check_complete(&self) -> Result<(), ResponseError> {
        let framing = self.framing.ok_or(ResponseError::IncompleteTransfer)?;
        ensure!(self.done() || !framing.is_delimited(), ResponseError::IncompleteTransfer);
        Ok(())
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(&Method::GET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_whole(raw: &[u8]) -> ResponseParser {
        let mut parser = ResponseParser::default();
        parser.feed(raw).unwrap();
        parser
    }

    const CONTENT_LENGTH_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHello";
    const CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n0\r\n\r\n";

    #[test]
    fn content_length_body() {
        let parser = parse_whole(CONTENT_LENGTH_RESPONSE);
        assert!(parser.done());

        let response = parser.response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.reason(), "OK");
        assert_eq!(&response.body()[..], b"Hello");
    }

    #[test]
    fn chunked_body() {
        let parser = parse_whole(CHUNKED_RESPONSE);
        assert!(parser.done());
        assert_eq!(parser.framing(), Some(Framing::Chunked));
        assert_eq!(&parser.into_response().unwrap().body()[..], b"Hello");
    }

    #[test]
    fn multiple_chunks_with_extensions_and_trailers() {
        let raw = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Transfer-Encoding: chunked\r\n",
            "\r\n",
            "4;name=value\r\n",
            "Wiki\r\n",
            "6\r\n",
            "pedia \r\n",
            "E\r\n",
            "in \r\n",
            "\r\n",
            "chunks.\r\n",
            "0\r\n",
            "Expires: never\r\n",
            "\r\n"
        );
        let parser = parse_whole(raw.as_bytes());
        assert!(parser.done());
        assert_eq!(&parser.response().unwrap().body()[..], b"Wikipedia in \r\n\r\nchunks.");
    }

    #[test]
    fn surplus_bytes_are_cut_off() {
        let parser = parse_whole(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabcdef");
        assert!(parser.done());
        assert_eq!(&parser.response().unwrap().body()[..], b"abc");
    }

    #[test]
    fn fragmentation_does_not_change_the_result() {
        let responses: [&[u8]; 4] = [
            CONTENT_LENGTH_RESPONSE,
            CHUNKED_RESPONSE,
            b"HTTP/1.1 404 Not Found\r\nX-Folded: a\r\n b\r\nContent-Length: 2\r\n\r\nno",
            b"HTTP/1.0 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n1\r\na\r\n10\r\n0123456789abcdef\r\n0\r\n\r\n",
        ];

        for raw in responses {
            let expected = parse_whole(raw).into_response().unwrap();

            // every single split point
            for split in 0..=raw.len() {
                let mut parser = ResponseParser::default();
                parser.feed(&raw[..split]).unwrap();
                parser.feed(&raw[split..]).unwrap();
                assert!(parser.done());
                assert_eq!(parser.into_response().unwrap(), expected);
            }

            // byte by byte
            let mut parser = ResponseParser::default();
            for byte in raw {
                parser.feed(std::slice::from_ref(byte)).unwrap();
            }
            assert!(parser.done());
            assert_eq!(parser.into_response().unwrap(), expected);
        }
    }

    #[test]
    fn incomplete_transfer() {
        let mut parser = ResponseParser::default();
        assert!(matches!(parser.response(), Err(ResponseError::IncompleteTransfer)));

        parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHel").unwrap();
        assert!(!parser.done());
        assert!(parser.head().is_some());
        assert!(matches!(parser.response(), Err(ResponseError::IncompleteTransfer)));

        // the peer going away does not complete a delimited body
        parser.finish();
        assert!(!parser.done());
        assert!(matches!(parser.into_response(), Err(ResponseError::IncompleteTransfer)));

        let mut parser = ResponseParser::default();
        parser.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n").unwrap();
        assert!(matches!(parser.response(), Err(ResponseError::IncompleteTransfer)));
    }

    #[test]
    fn connection_close_body() {
        let mut parser = ResponseParser::default();
        parser.feed(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nfirst ").unwrap();
        parser.feed(b"second").unwrap();
        assert!(!parser.done());

        // returned as-is before the close
        assert_eq!(&parser.response().unwrap().body()[..], b"first second");

        parser.finish();
        assert!(parser.done());
        assert_eq!(&parser.into_response().unwrap().body()[..], b"first second");
    }

    #[test]
    fn empty_connection_close_body() {
        let mut parser = parse_whole(b"HTTP/1.1 200 OK\r\n\r\n");
        let response = parser.response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());

        parser.finish();
        assert!(parser.done());
    }

    #[test]
    fn bodiless_responses_are_done_immediately() {
        for raw in [
            &b"HTTP/1.1 204 No Content\r\n\r\n"[..],
            b"HTTP/1.1 304 Not Modified\r\nContent-Length: 100\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        ] {
            let parser = parse_whole(raw);
            assert!(parser.done(), "{raw:?}");
            assert!(parser.response().unwrap().body().is_empty());
        }

        let mut parser = ResponseParser::new(&Method::HEAD);
        parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n").unwrap();
        assert!(parser.done());
        assert_eq!(parser.response().unwrap().headers().get("content-length").unwrap(), "1024");
    }

    #[test]
    fn interim_responses_are_skipped() {
        let raw: &[u8] = concat!(
            "HTTP/1.1 100 Continue\r\n\r\n",
            "HTTP/1.1 103 Early Hints\r\n",
            "Link: </style.css>; rel=preload\r\n",
            "\r\n",
            "HTTP/1.1 200 OK\r\n",
            "Content-Length: 2\r\n",
            "\r\n",
            "ok"
        )
        .as_bytes();

        for split in 0..=raw.len() {
            let mut parser = ResponseParser::default();
            parser.feed(&raw[..split]).unwrap();
            parser.feed(&raw[split..]).unwrap();
            assert!(parser.done(), "split at {split}");

            let response = parser.into_response().unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(!response.headers().has("Link"));
            assert_eq!(&response.body()[..], b"ok");
        }

        // only the interim head so far
        let mut parser = ResponseParser::default();
        parser.feed(b"HTTP/1.1 103 Early Hints\r\n\r\n").unwrap();
        assert!(!parser.done());
        assert!(parser.head().is_none());
        assert!(parser.response().is_err());
    }

    #[test]
    fn switching_protocols_is_final() {
        let mut parser = ResponseParser::default();
        parser.feed(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n").unwrap();
        assert!(parser.done());
        assert_eq!(parser.response().unwrap().status(), StatusCode::SWITCHING_PROTOCOLS);
    }

    #[test]
    fn bytes_after_completion_are_ignored() {
        let mut parser = parse_whole(CONTENT_LENGTH_RESPONSE);
        parser.feed(b"HTTP/1.1 500 Oops\r\n\r\n").unwrap();
        assert_eq!(parser.response().unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn errors_surface_from_feed() {
        let mut parser = ResponseParser::default();
        let result = parser.feed(b"HTTP/2 200 OK\r\n\r\n");
        assert!(matches!(result, Err(ResponseError::UnsupportedVersion { .. })));

        let mut parser = ResponseParser::default();
        let result = parser.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n");
        assert!(matches!(result, Err(ResponseError::InvalidChunkSize { .. })));

        let mut parser = ResponseParser::default();
        let result = parser.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabXY");
        assert!(matches!(result, Err(ResponseError::InvalidChunkDelimiter)));
    }

    #[test]
    fn header_limit() {
        let mut parser = ResponseParser::with_max_header_size(&Method::GET, 16);
        let result = parser.feed(b"HTTP/1.1 200 OK\r\nServer: far too long\r\n\r\n");
        assert!(matches!(result, Err(ResponseError::TooLargeHeader { .. })));
    }
}
