//! Decoder for bodies framed by `Content-Length`,
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{PayloadItem, ResponseError};

/// Counts down the declared body length.
///
/// Every call hands out whatever part of the body is buffered, never more
/// than is still owed; once the count reaches zero the next call yields
/// `Eof`. Bytes beyond the declared length stay in the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    owed: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { owed: length }
    }

    fn take(&mut self, src: &mut BytesMut) -> PayloadItem {
        // a u64 count that does not fit usize is larger than any buffer
        let take = usize::try_from(self.owed).map_or(src.len(), |owed| owed.min(src.len()));
        let bytes = src.split_to(take).freeze();
        self.owed -= bytes.len() as u64;
        trace!(len = bytes.len(), owed = self.owed, "read fixed length bytes");
        PayloadItem::Chunk(bytes)
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ResponseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(match (self.owed, src.is_empty()) {
            (0, _) => Some(PayloadItem::Eof),
            (_, true) => None,
            (_, false) => Some(self.take(src)),
        })
    }
}
