use bytes::Bytes;
use http::{StatusCode, Version};
use serde::de::DeserializeOwned;

use crate::protocol::HeaderCollection;

/// The status line and header fields of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    version: Version,
    status: StatusCode,
    reason: String,
    headers: HeaderCollection,
}

impl ResponseHead {
    pub fn new(version: Version, status: StatusCode, reason: String, headers: HeaderCollection) -> Self {
        Self { version, status, reason, headers }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }
}

/// A complete response: head plus the whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    head: ResponseHead,
    body: Bytes,
}

impl Response {
    pub fn new(head: ResponseHead, body: Bytes) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// The reason phrase exactly as the server sent it.
    pub fn reason(&self) -> &str {
        &self.head.reason
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.head.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// If the body is not valid UTF-8.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserializes a JSON body.
    ///
    /// # Errors
    ///
    /// If the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn into_parts(self) -> (ResponseHead, Bytes) {
        (self.head, self.body)
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
