//! Wire formats of the client side of HTTP/1.1.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestBuilder`]: turns a [`RequestConfig`](crate::protocol::RequestConfig)
//!     into request bytes, deriving the mandatory headers
//!   - the request line and header fields are written by a header encoder
//!
//! - Response handling:
//!   - [`ResponseParser`]: incremental state machine over the received bytes
//!   - header parsing via the `header` module, with obsolete line folding
//!   - body decoding via the `body` module, one decoder per framing
//!
//! # Example
//!
//! ```
//! use micro_http_client::codec::ResponseParser;
//! use http::{Method, StatusCode};
//!
//! let mut parser = ResponseParser::new(&Method::GET);
//! parser.feed(b"HTTP/1.1 200 OK\r\nContent-Le")?;
//! parser.feed(b"ngth: 5\r\n\r\nHello")?;
//!
//! assert!(parser.done());
//! let response = parser.into_response()?;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(&response.body()[..], b"Hello");
//! # Ok::<(), micro_http_client::protocol::ResponseError>(())
//! ```

mod body;
mod header;
mod request_builder;
mod response_parser;

pub use request_builder::RequestBuilder;
pub use response_parser::ResponseParser;
