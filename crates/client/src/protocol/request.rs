//! The caller-side description of a single request.

use std::time::Duration;

use base64ct::{Base64, Encoding};
use http::Method;

use crate::protocol::{Body, HeaderCollection, HeaderError};

/// Basic authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// The `Authorization` header value, `Basic base64(user:password)`.
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", Base64::encode_string(credentials.as_bytes()))
    }
}

/// Method, target, headers, body, credentials and timeout of one request.
///
/// ```
/// use micro_http_client::protocol::{BasicAuth, Body, RequestConfig};
/// use http::Method;
/// use std::time::Duration;
///
/// let config = RequestConfig::new(Method::POST, "http://example.com/login")
///     .header("Accept", "application/json")?
///     .body(Body::form(&[("user", "bob")])?)
///     .basic_auth(BasicAuth::new("bob", "secret"))
///     .timeout(Duration::from_secs(5));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestConfig {
    url: String,
    method: Method,
    headers: HeaderCollection,
    body: Body,
    auth: Option<BasicAuth>,
    timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new<U: Into<String>>(method: Method, url: U) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderCollection::new(),
            body: Body::empty(),
            auth: None,
            timeout: None,
        }
    }

    /// Adds a header, see [`HeaderCollection::add`].
    ///
    /// # Errors
    ///
    /// [`HeaderError`] if the name or value is invalid.
    pub fn header<N: Into<String>, V: AsRef<str>>(mut self, name: N, value: V) -> Result<Self, HeaderError> {
        self.headers.add(name, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderCollection) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Credentials that take precedence over any userinfo in the url.
    #[must_use]
    pub fn basic_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Bounds the whole request, from name resolution to the last body byte.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn header_collection(&self) -> &HeaderCollection {
        &self.headers
    }

    pub fn payload(&self) -> &Body {
        &self.body
    }

    pub fn auth(&self) -> Option<&BasicAuth> {
        self.auth.as_ref()
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }
}
