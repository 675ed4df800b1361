//! Serializes a [`RequestConfig`] into the bytes sent on the wire.

use bytes::{Bytes, BytesMut};
use http::Method;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::header::{HeaderEncoder, RequestHead};
use crate::ensure;
use crate::protocol::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use crate::protocol::{BasicAuth, HttpError, RequestConfig, RequestError, Url};

/// Builds the full request: request line, headers and body.
///
/// On top of the caller's headers it sets, in this order:
///
/// 1. `Host`, from the url
/// 2. `User-Agent`, unless the caller set one
/// 3. `Content-Length` for a non-empty body, plus `Content-Type` from the
///    body's hint when the caller did not set one
/// 4. `Authorization: Basic ..`, from the config or else the url userinfo
/// 5. `Connection: close`
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    user_agent: String,
}

impl RequestBuilder {
    pub fn new<S: Into<String>>(user_agent: S) -> Self {
        Self { user_agent: user_agent.into() }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// # Errors
    ///
    /// - [`RequestError::BodyNotAllowed`] for a body on anything but
    ///   `PUT`, `POST`, `PATCH` or `DELETE`
    /// - [`RequestError::MissingContentType`] for a body with neither a
    ///   `Content-Type` header nor a content-type hint
    /// - [`HttpError::Header`] if a derived header value is invalid
    pub fn build(&self, config: &RequestConfig, url: &Url) -> Result<Bytes, HttpError> {
        let method = config.method();
        let body = config.payload();
        let mut headers = config.header_collection().clone();

        headers.add(HOST, url.host_header())?;
        if !headers.has(USER_AGENT) {
            headers.add(USER_AGENT, &self.user_agent)?;
        }

        if !body.is_empty() {
            ensure!(allows_body(method), RequestError::body_not_allowed(method).into());
            headers.add(CONTENT_LENGTH, body.len().to_string())?;
            if !headers.has(CONTENT_TYPE) {
                let content_type = body.content_type().ok_or(RequestError::MissingContentType)?;
                headers.add(CONTENT_TYPE, content_type.as_ref())?;
            }
        }

        let credentials = config.auth().cloned().or_else(|| {
            url.user_info().map(|user_info| BasicAuth::new(user_info.username(), user_info.password().unwrap_or_default()))
        });
        if let Some(credentials) = credentials {
            if headers.has(AUTHORIZATION) {
                headers.remove(AUTHORIZATION)?;
            }
            headers.add(AUTHORIZATION, credentials.header_value())?;
        }

        headers.add(CONNECTION, "close")?;

        let target = url.request_target();
        let mut dst = BytesMut::with_capacity(body.len());
        HeaderEncoder.encode(RequestHead { method, target: &target, headers: &headers }, &mut dst)?;
        dst.extend_from_slice(body.data());

        trace!(%method, request_target = %target, header_count = headers.len(), body_size = body.len(), "built request");
        Ok(dst.freeze())
    }
}

fn allows_body(method: &Method) -> bool {
    [Method::PUT, Method::POST, Method::PATCH, Method::DELETE].contains(method)
}
