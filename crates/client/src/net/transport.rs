use std::fmt::Debug;

use async_trait::async_trait;
use tracing::trace;

use crate::deadline::Deadline;
use crate::ensure;
use crate::protocol::{HttpError, TransportError};

/// A byte stream to one server, plain or encrypted.
///
/// Every method waits for socket readiness, never longer than `deadline`
/// allows, and then performs the I/O. A transport is used for exactly one
/// request; dropping it closes the connection.
#[async_trait]
pub trait Transport: Debug + Send {
    /// Establishes the connection, including any TLS handshake.
    async fn connect(&mut self, deadline: &Deadline) -> Result<(), HttpError>;

    /// Writes some of `buf`, returning how many bytes were accepted.
    async fn send(&mut self, buf: &[u8], deadline: &Deadline) -> Result<usize, HttpError>;

    /// Reads into `buf`. `Ok(0)` means the peer closed the connection.
    async fn recv(&mut self, buf: &mut [u8], deadline: &Deadline) -> Result<usize, HttpError>;

    /// Writes all of `buf`, retrying partial writes within the same deadline.
    async fn send_all(&mut self, buf: &[u8], deadline: &Deadline) -> Result<(), HttpError> {
        let mut remaining = buf;
        while !remaining.is_empty() {
            let written = self.send(remaining, deadline).await?;
            ensure!(written != 0, TransportError::WriteZero.into());
            remaining = &remaining[written..];
            trace!(written, remaining = remaining.len(), "sent bytes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Accepts at most `max_write` bytes per call.
    #[derive(Debug, Default)]
    struct Trickle {
        max_write: usize,
        written: Vec<u8>,
        sends: usize,
    }

    #[async_trait]
    impl Transport for Trickle {
        async fn connect(&mut self, _deadline: &Deadline) -> Result<(), HttpError> {
            Ok(())
        }

        async fn send(&mut self, buf: &[u8], deadline: &Deadline) -> Result<usize, HttpError> {
            deadline.wait("send", async {}).await?;
            self.sends += 1;
            let len = buf.len().min(self.max_write);
            self.written.extend_from_slice(&buf[..len]);
            Ok(len)
        }

        async fn recv(&mut self, _buf: &mut [u8], _deadline: &Deadline) -> Result<usize, HttpError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn send_all_handles_partial_writes() {
        let mut transport = Trickle { max_write: 3, ..Trickle::default() };
        transport.send_all(b"hello world", &Deadline::none()).await.unwrap();

        assert_eq!(transport.written, b"hello world");
        assert_eq!(transport.sends, 4);
    }

    #[tokio::test]
    async fn send_all_rejects_zero_writes() {
        let mut transport = Trickle { max_write: 0, ..Trickle::default() };
        let err = transport.send_all(b"x", &Deadline::none()).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::WriteZero }));
    }

    #[tokio::test]
    async fn send_all_honors_deadline() {
        let mut transport = Trickle { max_write: 1, ..Trickle::default() };
        let err = transport.send_all(b"xyz", &Deadline::new(Duration::ZERO)).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(transport.written.is_empty());
    }

    #[tokio::test]
    async fn send_all_with_empty_buffer() {
        let mut transport = Trickle { max_write: 1, ..Trickle::default() };
        transport.send_all(b"", &Deadline::none()).await.unwrap();
        assert_eq!(transport.sends, 0);
    }
}
