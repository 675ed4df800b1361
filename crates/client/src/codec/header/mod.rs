//! Response head decoding and request head encoding.

mod header_decoder;
mod header_encoder;
mod status_line;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::MAX_HEADER_BYTES;
pub use header_encoder::HeaderEncoder;
pub use header_encoder::RequestHead;
pub use status_line::StatusLine;
