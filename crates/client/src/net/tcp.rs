//! Plain TCP transport on a non-blocking tokio socket.

use std::io;

use async_trait::async_trait;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{debug, trace};

use crate::deadline::Deadline;
use crate::net::{Endpoint, Transport};
use crate::protocol::{HttpError, TransportError};

/// A TCP connection to the first address of an [`Endpoint`].
///
/// The socket is created up front by [`TcpTransport::new`] and consumed by
/// [`Transport::connect`]. Reads and writes wait for readiness under the
/// request deadline and then try the syscall, so a spurious wakeup just loops.
#[derive(Debug)]
pub struct TcpTransport {
    endpoint: Endpoint,
    socket: Option<TcpSocket>,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// # Errors
    ///
    /// [`TransportError::Socket`] if the OS refuses to create the socket.
    pub fn new(endpoint: Endpoint) -> Result<Self, TransportError> {
        let socket = if endpoint.addr().is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() }
            .map_err(TransportError::socket)?;
        Ok(Self { endpoint, socket: Some(socket), stream: None })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) fn stream(&self) -> Result<&TcpStream, TransportError> {
        self.stream.as_ref().ok_or(TransportError::NotConnected)
    }

    pub(crate) async fn wait_readable(&self, operation: &'static str, deadline: &Deadline) -> Result<(), TransportError> {
        let stream = self.stream()?;
        deadline.wait(operation, stream.readable()).await?.map_err(TransportError::recv)
    }

    pub(crate) async fn wait_writable(&self, operation: &'static str, deadline: &Deadline) -> Result<(), TransportError> {
        let stream = self.stream()?;
        deadline.wait(operation, stream.writable()).await?.map_err(TransportError::send)
    }
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self, deadline: &Deadline) -> Result<(), HttpError> {
        let socket = self.socket.take().ok_or(TransportError::AlreadyConnected)?;
        let addr = self.endpoint.addr();
        debug!(host = self.endpoint.host(), %addr, "connecting");

        let stream = deadline.wait("connect", socket.connect(addr)).await?.map_err(TransportError::connect)?;
        if let Some(e) = stream.take_error().map_err(TransportError::connect)? {
            return Err(TransportError::connect(e).into());
        }
        stream.set_nodelay(true).map_err(TransportError::socket)?;

        debug!(%addr, local_addr = ?stream.local_addr().ok(), "connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, buf: &[u8], deadline: &Deadline) -> Result<usize, HttpError> {
        loop {
            self.wait_writable("send", deadline).await?;
            match self.stream()?.try_write(buf) {
                Ok(written) => {
                    trace!(written, "tcp send");
                    return Ok(written);
                }
                Err(e) if is_retryable(&e) => {}
                Err(e) => return Err(TransportError::send(e).into()),
            }
        }
    }

    async fn recv(&mut self, buf: &mut [u8], deadline: &Deadline) -> Result<usize, HttpError> {
        loop {
            self.wait_readable("recv", deadline).await?;
            match self.stream()?.try_read(buf) {
                Ok(read) => {
                    trace!(read, "tcp recv");
                    return Ok(read);
                }
                Err(e) if is_retryable(&e) => {}
                Err(e) => return Err(TransportError::recv(e).into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    fn transport(addr: SocketAddr) -> TcpTransport {
        TcpTransport::new(Endpoint::from_addr("127.0.0.1", addr)).unwrap()
    }

    #[tokio::test]
    async fn send_and_recv_round_trip() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ping");
            stream.write_all(b"pong").await.unwrap();
        });

        let deadline = Deadline::new(Duration::from_secs(5));
        let mut transport = transport(addr);
        assert!(!transport.is_connected());
        transport.connect(&deadline).await.unwrap();
        assert!(transport.is_connected());

        transport.send_all(b"ping", &deadline).await.unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 2];
        loop {
            let read = transport.recv(&mut buf, &deadline).await.unwrap();
            if read == 0 {
                break;
            }
            received.extend_from_slice(&buf[..read]);
        }
        assert_eq!(received, b"pong");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection() {
        let (listener, addr) = listener().await;
        drop(listener);

        let err = transport(addr).connect(&Deadline::none()).await.unwrap_err();
        assert!(err.is_connect(), "{err}");
    }

    #[tokio::test]
    async fn expired_deadline_fails_connect() {
        let (_listener, addr) = listener().await;
        let err = transport(addr).connect(&Deadline::new(Duration::ZERO)).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::TimedOut { operation: "connect" } }));
    }

    #[tokio::test]
    async fn silent_peer_times_out_recv() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(stream);
        });

        let mut transport = transport(addr);
        transport.connect(&Deadline::none()).await.unwrap();

        let mut buf = [0u8; 16];
        let err = transport.recv(&mut buf, &Deadline::new(Duration::from_millis(50))).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::TimedOut { operation: "recv" } }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn io_before_connect() {
        let (_listener, addr) = listener().await;
        let mut transport = transport(addr);

        let err = transport.send(b"x", &Deadline::none()).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::NotConnected }));

        let err = transport.recv(&mut [0u8; 1], &Deadline::none()).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::NotConnected }));
    }

    #[tokio::test]
    async fn connect_only_once() {
        let (_listener, addr) = listener().await;
        let mut transport = transport(addr);
        transport.connect(&Deadline::none()).await.unwrap();

        let err = transport.connect(&Deadline::none()).await.unwrap_err();
        assert!(matches!(err, HttpError::Transport { source: TransportError::AlreadyConnected }));
    }
}
