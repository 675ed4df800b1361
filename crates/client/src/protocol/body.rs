//! Request bodies.
//!
//! A body is a fixed byte sequence plus an optional content-type hint. The
//! encoders that produce a body ([`Body::form`], [`Body::json`]) know their
//! media type and record it, so the request does not need an explicit
//! `Content-Type` header; raw bytes carry no hint and do.

use bytes::Bytes;
use mime::Mime;
use serde::Serialize;

use crate::protocol::RequestError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    data: Bytes,
    content_type: Option<Mime>,
}

impl Body {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Encodes `value` as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// [`RequestError::Encode`] if `value` is not a flat sequence of pairs.
    pub fn form<T: Serialize + ?Sized>(value: &T) -> Result<Self, RequestError> {
        let encoded = serde_urlencoded::to_string(value).map_err(RequestError::encode)?;
        Ok(Self { data: Bytes::from(encoded), content_type: Some(mime::APPLICATION_WWW_FORM_URLENCODED) })
    }

    /// Encodes `value` as `application/json`.
    ///
    /// # Errors
    ///
    /// [`RequestError::Encode`] if serialization fails.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, RequestError> {
        let encoded = serde_json::to_vec(value).map_err(RequestError::encode)?;
        Ok(Self { data: Bytes::from(encoded), content_type: Some(mime::APPLICATION_JSON) })
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self { data, content_type: None }
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Bytes::from(data).into()
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Bytes::from(data).into()
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Bytes::from_static(data.as_bytes()).into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Bytes::from_static(data).into()
    }
}
