use bytes::{Buf, Bytes};

/// An item produced by the body decoders.
///
/// A decoder yields zero or more chunks of body bytes, then `Eof` once the
/// framing says the body is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the item and returns the contained bytes if this is a Chunk
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// How the end of a response body is determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Framing {
    /// No body at all: 1xx, 204, 304 or an answer to HEAD
    ///
    /// The parser skips interim 1xx heads, so only 101 reaches a caller.
    Empty,
    /// `Content-Length: n`
    Length(u64),
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// The body runs until the peer closes the connection
    Close,
}

impl Framing {
    /// Whether the end of the body is known from the message itself.
    ///
    /// Only these framings can be detected as incomplete.
    #[inline]
    pub fn is_delimited(&self) -> bool {
        matches!(self, Framing::Length(_) | Framing::Chunked)
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, Framing::Chunked)
    }
}
