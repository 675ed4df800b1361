//! An asynchronous micro HTTP/1.1 client
//!
//! This crate provides a small, single-shot HTTP/1.1 client built on top of
//! tokio. Each request resolves the host, opens a plain or TLS connection,
//! writes one request and incrementally parses the response until its framing
//! says it is complete.
//!
//! # Features
//!
//! - `http` and `https` (rustls, webpki roots) urls
//! - One deadline bounding resolution, connect, handshake, send and receive
//! - Content-length, chunked and connection-close response framing
//! - Incremental parsing: responses may arrive split at any byte
//! - Form and JSON request bodies, Basic authentication
//! - Typed errors telling bad input, network failure and malformed responses apart
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use http::Method;
//! use micro_http_client::Client;
//! use micro_http_client::protocol::{Body, RequestConfig};
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder().timeout(Duration::from_secs(10)).build().unwrap();
//!
//!     let request = RequestConfig::new(Method::POST, "https://httpbin.org/post")
//!         .header("Accept", "application/json")
//!         .unwrap()
//!         .body(Body::form(&[("name", "micro")]).unwrap());
//!
//!     match client.request(&request).await {
//!         Ok(response) => info!(status = %response.status(), body = response.text().unwrap_or_default(), "got response"),
//!         Err(e) if e.is_timeout() => error!(cause = %e, "request timed out"),
//!         Err(e) => error!(cause = %e, "request failed"),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`client`]: request orchestration and client configuration
//! - [`protocol`]: url, headers, request and response types, errors
//! - [`codec`]: request serialization and the response parser
//! - [`net`]: name resolution and the TCP / TLS transports
//! - [`deadline`]: the per-request countdown
//!
//! # Limitations
//!
//! - No connection reuse: every request sends `Connection: close`
//! - No redirects, retries, proxies, cookies or content decoding
//! - Bodies are buffered in memory, not streamed

pub mod client;
pub mod codec;
pub mod deadline;
pub mod net;
pub mod protocol;
mod utils;

pub(crate) use utils::ensure;

pub use client::{Client, ClientBuilder, ClientConfig};
pub use deadline::Deadline;
