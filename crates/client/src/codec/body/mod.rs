//! Response body decoders, one per framing, unified by [`PayloadDecoder`].

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
