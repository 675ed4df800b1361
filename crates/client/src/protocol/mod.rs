//! Protocol value types and the error taxonomy.
//!
//! - [`Url`]: absolute url parsing
//! - [`HeaderCollection`]: ordered, case-insensitive headers
//! - [`RequestConfig`], [`Body`], [`BasicAuth`]: what the caller asks for
//! - [`Response`], [`ResponseHead`]: what the server answered
//! - [`PayloadItem`], [`Framing`]: body decoding primitives
//! - [`HttpError`] and one error enum per failure kind

mod message;
pub use message::Framing;
pub use message::PayloadItem;

mod url;
pub use url::Scheme;
pub use url::Url;
pub use url::UserInfo;

pub(crate) mod header;
pub use header::HeaderCollection;
pub use header::HeaderField;

mod body;
pub use body::Body;

mod request;
pub use request::BasicAuth;
pub use request::RequestConfig;

mod response;
pub use response::Response;
pub use response::ResponseHead;

mod error;
pub use error::HeaderError;
pub use error::HttpError;
pub use error::RequestError;
pub use error::ResolutionError;
pub use error::ResponseError;
pub use error::TlsError;
pub use error::TransportError;
pub use error::UrlError;
