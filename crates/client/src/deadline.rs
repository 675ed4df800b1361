//! A monotonic countdown shared by every wait point of a single request.
//!
//! A [`Deadline`] is created once per request and handed by reference to name
//! resolution, connect, TLS handshake, send and receive. Each of those wraps
//! its readiness wait in [`Deadline::wait`], so the request as a whole, not
//! each individual step, is bounded by the configured timeout.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::protocol::TransportError;

/// An optional absolute expiry instant.
///
/// `Deadline::none()` never expires. A deadline built from a zero duration is
/// already expired: every wait against it fails with
/// [`TransportError::TimedOut`] without polling the underlying future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expiry: Option<Instant>,
}

impl Deadline {
    /// A deadline that expires `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        // an expiry past the clock range behaves like no deadline
        let expiry = Instant::now().checked_add(timeout);
        Self { expiry }
    }

    /// A deadline that never expires.
    pub const fn none() -> Self {
        Self { expiry: None }
    }

    /// `Some(timeout)` maps to [`Deadline::new`], `None` to [`Deadline::none`].
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::new)
    }

    /// The expiry instant, if any.
    pub fn expiry(&self) -> Option<Instant> {
        self.expiry
    }

    /// Time left before expiry, clamped at zero. `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.expiry.map(|expiry| expiry.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Instant::now() >= expiry)
    }

    /// Drives `future` to completion unless the deadline passes first.
    ///
    /// `operation` names the wait point and ends up in the timeout error.
    ///
    /// # Errors
    ///
    /// [`TransportError::TimedOut`] if the deadline is already expired on
    /// entry or expires while `future` is pending.
    pub async fn wait<F: Future>(&self, operation: &'static str, future: F) -> Result<F::Output, TransportError> {
        let Some(expiry) = self.expiry else {
            return Ok(future.await);
        };

        if Instant::now() >= expiry {
            trace!(operation, "deadline already expired");
            return Err(TransportError::timed_out(operation));
        }

        tokio::time::timeout_at(expiry, future).await.map_err(|_elapsed| {
            trace!(operation, "deadline expired while waiting");
            TransportError::timed_out(operation)
        })
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
