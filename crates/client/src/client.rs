//! The request orchestrator: resolve, connect, send, then feed the parser
//! until the response is complete.

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::CertificateDer;
use tracing::debug;

use crate::codec::{RequestBuilder, ResponseParser};
use crate::deadline::Deadline;
use crate::net::{default_tls_config, tls_config_with_roots, Endpoint, SecureTransport, TcpTransport, Transport};
use crate::protocol::{HttpError, RequestConfig, Response, TlsError, Url};

const DEFAULT_USER_AGENT: &str = concat!("micro-http-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RECV_BUFFER_SIZE: usize = 8 * 1024;
const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;

/// Immutable settings shared by every request of a [`Client`].
#[derive(Debug)]
pub struct ClientConfig {
    user_agent: String,
    timeout: Option<Duration>,
    recv_buffer_size: usize,
    max_header_size: usize,
    tls_config: Arc<rustls::ClientConfig>,
}

impl ClientConfig {
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Used for requests that carry no timeout of their own.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn recv_buffer_size(&self) -> usize {
        self.recv_buffer_size
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn tls_config(&self) -> &Arc<rustls::ClientConfig> {
        &self.tls_config
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: None,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            tls_config: default_tls_config(),
        }
    }
}

#[derive(Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
    root_certificates: Vec<CertificateDer<'static>>,
    custom_tls_config: bool,
}

impl ClientBuilder {
    fn new() -> Self {
        Self { config: ClientConfig::default(), root_certificates: Vec::new(), custom_tls_config: false }
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Size of the buffer each `recv` reads into, at least one byte.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size.max(1);
        self
    }

    #[must_use]
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.config.max_header_size = size;
        self
    }

    /// Trusts `certificate` in addition to the bundled webpki roots.
    ///
    /// Ignored when a full [`ClientBuilder::tls_config`] is supplied.
    #[must_use]
    pub fn add_root_certificate(mut self, certificate: CertificateDer<'static>) -> Self {
        self.root_certificates.push(certificate);
        self
    }

    #[must_use]
    pub fn tls_config(mut self, tls_config: Arc<rustls::ClientConfig>) -> Self {
        self.config.tls_config = tls_config;
        self.custom_tls_config = true;
        self
    }

    /// # Errors
    ///
    /// [`TlsError::Certificate`] if an added root certificate cannot be parsed.
    pub fn build(mut self) -> Result<Client, TlsError> {
        if !self.custom_tls_config && !self.root_certificates.is_empty() {
            self.config.tls_config = tls_config_with_roots(&self.root_certificates)?;
        }
        Ok(Client { config: Arc::new(self.config) })
    }
}

/// An HTTP/1.1 client.
///
/// Every request opens its own connection, sends `Connection: close` and
/// makes exactly one attempt. Clones share the same configuration, and
/// requests on one client may run concurrently.
///
/// ```no_run
/// use http::Method;
/// use micro_http_client::Client;
/// use micro_http_client::protocol::RequestConfig;
///
/// # async fn run() -> Result<(), micro_http_client::protocol::HttpError> {
/// let client = Client::new();
/// let response = client.request(&RequestConfig::new(Method::GET, "http://example.com/")).await?;
/// println!("{} {}", response.status(), response.text().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    pub fn new() -> Self {
        Self { config: Arc::new(ClientConfig::default()) }
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs one request and returns the complete response.
    ///
    /// The request's own timeout, or else the client's, bounds the whole
    /// exchange from name resolution to the last body byte. The request bytes
    /// are built before anything touches the network, so invalid input fails
    /// without a connection attempt.
    ///
    /// # Errors
    ///
    /// Any [`HttpError`]: invalid input, resolution, connection, TLS, timeout,
    /// or a malformed or truncated response.
    pub async fn request(&self, request: &RequestConfig) -> Result<Response, HttpError> {
        let deadline = Deadline::from_timeout(request.timeout_duration().or(self.config.timeout));
        let url = Url::parse(request.url())?;
        let wire = RequestBuilder::new(self.config.user_agent.as_str()).build(request, &url)?;

        let endpoint = Endpoint::resolve(url.host(), url.port(), &deadline).await?;
        let mut transport: Box<dyn Transport> = if url.scheme().is_secure() {
            Box::new(SecureTransport::new(endpoint, Arc::clone(&self.config.tls_config))?)
        } else {
            Box::new(TcpTransport::new(endpoint)?)
        };

        transport.connect(&deadline).await?;
        transport.send_all(&wire, &deadline).await?;
        debug!(method = %request.method(), %url, request_size = wire.len(), "request sent");

        let mut parser = ResponseParser::with_max_header_size(request.method(), self.config.max_header_size);
        let mut buf = vec![0u8; self.config.recv_buffer_size];
        loop {
            let read = transport.recv(&mut buf, &deadline).await?;
            if read == 0 {
                parser.finish();
                break;
            }
            parser.feed(&buf[..read])?;
            if parser.done() {
                break;
            }
        }

        let response = parser.into_response()?;
        debug!(%url, status = %response.status(), body_size = response.body().len(), "response complete");
        Ok(response)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Body, RequestError, UrlError};
    use http::Method;

    #[test]
    fn default_config() {
        let client = Client::default();
        let config = client.config();
        assert_eq!(config.user_agent(), concat!("micro-http-client/", env!("CARGO_PKG_VERSION")));
        assert_eq!(config.timeout(), None);
        assert_eq!(config.recv_buffer_size(), 8 * 1024);
        assert_eq!(config.max_header_size(), 64 * 1024);
        assert!(Arc::ptr_eq(config.tls_config(), &default_tls_config()));
    }

    #[test]
    fn builder_overrides() {
        let client = Client::builder()
            .user_agent("agent/2")
            .timeout(Duration::from_secs(3))
            .recv_buffer_size(0)
            .max_header_size(1024)
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.user_agent(), "agent/2");
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.recv_buffer_size(), 1);
        assert_eq!(config.max_header_size(), 1024);

        // clones share the config
        let clone = client.clone();
        assert!(std::ptr::eq(clone.config(), client.config()));
    }

    #[test]
    fn root_certificates() {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();
        let client = Client::builder().add_root_certificate(cert.cert.der().clone()).build().unwrap();
        assert!(!Arc::ptr_eq(client.config().tls_config(), &default_tls_config()));

        let err = Client::builder().add_root_certificate(CertificateDer::from(vec![1, 2, 3])).build().unwrap_err();
        assert!(matches!(err, TlsError::Certificate { .. }), "{err}");

        // a full override wins over extra roots
        let custom = tls_config_with_roots(&[]).unwrap();
        let client = Client::builder()
            .add_root_certificate(CertificateDer::from(vec![1, 2, 3]))
            .tls_config(Arc::clone(&custom))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(client.config().tls_config(), &custom));
    }

    #[tokio::test]
    async fn invalid_url_fails_fast() {
        let err = Client::new().request(&RequestConfig::new(Method::GET, "example.com/")).await.unwrap_err();
        assert!(matches!(err, HttpError::Url { source: UrlError::MissingScheme }));
        assert!(err.is_input());
    }

    #[tokio::test]
    async fn invalid_request_fails_before_resolution() {
        // the host is unresolvable, so reaching the resolver would be a resolution error
        let config = RequestConfig::new(Method::GET, "http://no-such-host.invalid/").body(Body::json(&1).unwrap());
        let err = Client::new().request(&config).await.unwrap_err();
        assert!(matches!(err, HttpError::Request { source: RequestError::BodyNotAllowed { .. } }), "{err}");
    }

    #[tokio::test]
    async fn unresolvable_host() {
        let config = RequestConfig::new(Method::GET, "http://no-such-host.invalid/").timeout(Duration::from_secs(10));
        let err = Client::new().request(&config).await.unwrap_err();
        assert!(matches!(err, HttpError::Resolution { .. }), "{err}");
        assert!(!err.is_input());
    }
}
