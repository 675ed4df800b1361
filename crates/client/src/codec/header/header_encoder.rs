//! Request head encoder: the request line followed by the header fields and
//! the blank line that ends the head.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::Method;
use tokio_util::codec::Encoder;

use crate::protocol::{HeaderCollection, RequestError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// What goes before the body: `METHOD target HTTP/1.1` and the fields.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    pub method: &'a Method,
    pub target: &'a str,
    pub headers: &'a HeaderCollection,
}

/// Serializes a [`RequestHead`] in insertion order, as `Name: Value` lines.
#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<RequestHead<'_>> for HeaderEncoder {
    type Error = RequestError;

    fn encode(&mut self, head: RequestHead<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", head.method, head.target)?;

        for field in head.headers {
            dst.put_slice(field.name().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(field.value().as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// `io::Write` straight into a `BytesMut`, so `write!` can format into it.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_request_head() {
        let headers = HeaderCollection::try_from(vec![("Host", "example.com"), ("Accept", "*/*")]).unwrap();
        let mut dst = BytesMut::new();

        HeaderEncoder
            .encode(RequestHead { method: &Method::GET, target: "/index.html?a=1", headers: &headers }, &mut dst)
            .unwrap();

        assert_eq!(&dst[..], b"GET /index.html?a=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n");
    }

    #[test]
    fn encode_without_headers() {
        let mut dst = BytesMut::new();
        let headers = HeaderCollection::new();
        HeaderEncoder.encode(RequestHead { method: &Method::OPTIONS, target: "/", headers: &headers }, &mut dst).unwrap();
        assert_eq!(&dst[..], b"OPTIONS / HTTP/1.1\r\n\r\n");
    }
}
