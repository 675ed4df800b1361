use std::io;

use http::Method;
use thiserror::Error;

/// Top-level error of a request attempt.
///
/// Every kind is fatal for the current attempt; nothing in this crate retries.
/// The variants separate bad input (`Url`, `Request`, `Header`), network
/// failure (`Resolution`, `Transport`, `Tls`) and a malformed server
/// response (`Response`).
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("url error: {source}")]
    Url {
        #[from]
        source: UrlError,
    },

    #[error("resolution error: {source}")]
    Resolution {
        #[from]
        source: ResolutionError,
    },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("tls error: {source}")]
    Tls {
        #[from]
        source: TlsError,
    },

    #[error("request error: {source}")]
    Request {
        #[from]
        source: RequestError,
    },

    #[error("header error: {source}")]
    Header {
        #[from]
        source: HeaderError,
    },

    #[error("response error: {source}")]
    Response {
        #[from]
        source: ResponseError,
    },
}

impl HttpError {
    /// Whether the request deadline expired at some wait point.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source: TransportError::TimedOut { .. } })
            || matches!(self, Self::Resolution { source: ResolutionError::TimedOut { .. } })
    }

    /// Whether the failure happened while establishing the TCP connection.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport { source: TransportError::Connect { .. } })
    }

    /// Whether the caller supplied something unusable (url, headers or body).
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Url { .. } | Self::Request { .. } | Self::Header { .. })
    }

    /// Whether the server answered with bytes that are not a valid response.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response { .. })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlError {
    #[error("missing scheme, expected an absolute url like 'http://host/path'")]
    MissingScheme,

    #[error("unsupported scheme '{scheme}', only http and https are supported")]
    UnsupportedScheme { scheme: String },

    #[error("empty host")]
    EmptyHost,

    #[error("invalid port '{port}'")]
    InvalidPort { port: String },

    #[error("malformed authority: {reason}")]
    InvalidAuthority { reason: String },

    #[error("invalid character in url {component}")]
    InvalidCharacter { component: &'static str },
}

impl UrlError {
    pub fn unsupported_scheme<S: ToString>(scheme: S) -> Self {
        Self::UnsupportedScheme { scheme: scheme.to_string() }
    }

    pub fn invalid_port<S: ToString>(port: S) -> Self {
        Self::InvalidPort { port: port.to_string() }
    }

    pub fn invalid_authority<S: ToString>(str: S) -> Self {
        Self::InvalidAuthority { reason: str.to_string() }
    }

    pub fn invalid_character(component: &'static str) -> Self {
        Self::InvalidCharacter { component }
    }
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Lookup {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("no address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("resolving {host} timed out")]
    TimedOut { host: String },
}

impl ResolutionError {
    pub fn lookup<S: ToString>(host: S, port: u16, source: io::Error) -> Self {
        Self::Lookup { host: host.to_string(), port, source }
    }

    pub fn no_address<S: ToString>(host: S, port: u16) -> Self {
        Self::NoAddress { host: host.to_string(), port }
    }

    pub fn timed_out<S: ToString>(host: S) -> Self {
        Self::TimedOut { host: host.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to create socket: {source}")]
    Socket {
        #[source]
        source: io::Error,
    },

    #[error("failed to connect: {source}")]
    Connect {
        #[source]
        source: io::Error,
    },

    #[error("failed to send: {source}")]
    Send {
        #[source]
        source: io::Error,
    },

    #[error("failed to receive: {source}")]
    Recv {
        #[source]
        source: io::Error,
    },

    #[error("{operation} timed out")]
    TimedOut { operation: &'static str },

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport is already connected")]
    AlreadyConnected,

    #[error("peer accepted zero bytes")]
    WriteZero,
}

impl TransportError {
    pub fn socket<E: Into<io::Error>>(e: E) -> Self {
        Self::Socket { source: e.into() }
    }

    pub fn connect<E: Into<io::Error>>(e: E) -> Self {
        Self::Connect { source: e.into() }
    }

    pub fn send<E: Into<io::Error>>(e: E) -> Self {
        Self::Send { source: e.into() }
    }

    pub fn recv<E: Into<io::Error>>(e: E) -> Self {
        Self::Recv { source: e.into() }
    }

    pub fn timed_out(operation: &'static str) -> Self {
        Self::TimedOut { operation }
    }
}

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("'{name}' is not a valid tls server name")]
    InvalidServerName { name: String },

    #[error("tls handshake failed: {source}")]
    Handshake {
        #[source]
        source: rustls::Error,
    },

    #[error("certificate verification failed: {source}")]
    Certificate {
        #[source]
        source: rustls::Error,
    },

    #[error("peer presented no certificate")]
    MissingCertificate,

    #[error("connection closed during tls handshake")]
    HandshakeEof,
}

impl TlsError {
    pub fn invalid_server_name<S: ToString>(name: S) -> Self {
        Self::InvalidServerName { name: name.to_string() }
    }

    /// Classifies a rustls failure: anything about the peer certificate is a
    /// [`TlsError::Certificate`], the rest is a handshake failure.
    pub fn from_rustls(e: rustls::Error) -> Self {
        match e {
            rustls::Error::InvalidCertificate(_) | rustls::Error::NoCertificatesPresented => {
                Self::Certificate { source: e }
            }
            e => Self::Handshake { source: e },
        }
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("method {method} does not allow a request body")]
    BodyNotAllowed { method: Method },

    #[error("content type not set for the request body")]
    MissingContentType,

    #[error("failed to encode request body: {reason}")]
    Encode { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl RequestError {
    pub fn body_not_allowed(method: &Method) -> Self {
        Self::BodyNotAllowed { method: method.clone() }
    }

    pub fn encode<S: ToString>(str: S) -> Self {
        Self::Encode { reason: str.to_string() }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header name '{name}'")]
    InvalidName { name: String },

    #[error("invalid value for header '{name}'")]
    InvalidValue { name: String },

    #[error("header '{name}' not found")]
    NotFound { name: String },
}

impl HeaderError {
    pub fn invalid_name<S: ToString>(name: S) -> Self {
        Self::InvalidName { name: name.to_string() }
    }

    pub fn invalid_value<S: ToString>(name: S) -> Self {
        Self::InvalidValue { name: name.to_string() }
    }

    pub fn not_found<S: ToString>(name: S) -> Self {
        Self::NotFound { name: name.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("malformed status line: {reason}")]
    MalformedStatusLine { reason: String },

    #[error("unsupported http version '{version}'")]
    UnsupportedVersion { version: String },

    #[error("invalid status code '{code}'")]
    InvalidStatusCode { code: String },

    #[error("invalid reason phrase")]
    InvalidReasonPhrase,

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("conflicting content-length values '{first}' and '{second}'")]
    ConflictingContentLength { first: String, second: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported transfer-encoding '{encoding}'")]
    UnsupportedTransferEncoding { encoding: String },

    #[error("invalid chunk size: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("every chunk must end with a CRLF delimiter")]
    InvalidChunkDelimiter,

    #[error("incomplete data transfer")]
    IncompleteTransfer,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ResponseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn malformed_status_line<S: ToString>(str: S) -> Self {
        Self::MalformedStatusLine { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn invalid_status_code<S: ToString>(code: S) -> Self {
        Self::InvalidStatusCode { code: code.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn conflicting_content_length<S: ToString>(first: S, second: S) -> Self {
        Self::ConflictingContentLength { first: first.to_string(), second: second.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(encoding: S) -> Self {
        Self::UnsupportedTransferEncoding { encoding: encoding.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }
}

impl From<HeaderError> for ResponseError {
    fn from(e: HeaderError) -> Self {
        Self::invalid_header(e)
    }
}
