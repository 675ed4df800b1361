//! TLS over [`TcpTransport`], driven by a rustls [`ClientConnection`].
//!
//! rustls is sans-io: the session consumes and produces TLS records through
//! `read_tls` / `write_tls`, and the transport moves those records over the
//! non-blocking socket, waiting for readiness under the request deadline
//! whenever the socket would block.

use std::io::{self, Read, Write};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::deadline::Deadline;
use crate::ensure;
use crate::net::{Endpoint, TcpTransport, Transport};
use crate::protocol::{HttpError, TlsError, TransportError};

static DEFAULT_TLS_CONFIG: Lazy<Arc<ClientConfig>> = Lazy::new(|| tls_config(webpki_root_store()));

/// The process-wide config trusting the Mozilla root set.
pub(crate) fn default_tls_config() -> Arc<ClientConfig> {
    Arc::clone(&DEFAULT_TLS_CONFIG)
}

/// The Mozilla root set plus `extra` trust anchors.
///
/// # Errors
///
/// [`TlsError::Certificate`] if one of `extra` cannot be parsed.
pub(crate) fn tls_config_with_roots(extra: &[CertificateDer<'static>]) -> Result<Arc<ClientConfig>, TlsError> {
    let mut roots = webpki_root_store();
    for cert in extra {
        roots.add(cert.clone()).map_err(TlsError::from_rustls)?;
    }
    Ok(tls_config(roots))
}

fn webpki_root_store() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

fn tls_config(roots: RootCertStore) -> Arc<ClientConfig> {
    Arc::new(ClientConfig::builder().with_root_certificates(roots).with_no_client_auth())
}

/// Blocking-style `Read`/`Write` over a non-blocking stream: `WouldBlock`
/// surfaces to rustls, which hands it back to us.
#[derive(Debug)]
struct SocketIo<'a>(&'a TcpStream);

impl Read for SocketIo<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.try_read(buf)
    }
}

impl Write for SocketIo<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes every pending TLS record to the socket.
async fn flush_tls(
    session: &mut ClientConnection,
    transport: &TcpTransport,
    operation: &'static str,
    deadline: &Deadline,
) -> Result<(), HttpError> {
    while session.wants_write() {
        match session.write_tls(&mut SocketIo(transport.stream()?)) {
            Ok(0) => return Err(TransportError::WriteZero.into()),
            Ok(written) => trace!(written, "tls records written"),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => transport.wait_writable(operation, deadline).await?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(TransportError::send(e).into()),
        }
    }
    Ok(())
}

/// Reads TLS records from the socket and processes them.
///
/// Returns the number of record bytes read, `0` once the peer closed the TCP
/// connection.
async fn fill_tls(
    session: &mut ClientConnection,
    transport: &TcpTransport,
    operation: &'static str,
    deadline: &Deadline,
) -> Result<usize, HttpError> {
    loop {
        let stream = transport.stream()?;
        match session.read_tls(&mut SocketIo(stream)) {
            Ok(0) => return Ok(0),
            Ok(read) => {
                trace!(read, "tls records read");
                if let Err(e) = session.process_new_packets() {
                    // push out the alert rustls queued for the peer
                    if let Err(alert_error) = session.write_tls(&mut SocketIo(stream)) {
                        trace!(%alert_error, "failed to send tls alert");
                    }
                    return Err(TlsError::from_rustls(e).into());
                }
                return Ok(read);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => transport.wait_readable(operation, deadline).await?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(TransportError::recv(e).into()),
        }
    }
}

/// An HTTPS connection: TCP connect, then a TLS handshake verified against
/// the endpoint's host name.
#[derive(Debug)]
pub struct SecureTransport {
    transport: TcpTransport,
    tls_config: Arc<ClientConfig>,
    session: Option<ClientConnection>,
}

impl SecureTransport {
    /// # Errors
    ///
    /// [`TransportError::Socket`] if the OS refuses to create the socket.
    pub fn new(endpoint: Endpoint, tls_config: Arc<ClientConfig>) -> Result<Self, TransportError> {
        Ok(Self { transport: TcpTransport::new(endpoint)?, tls_config, session: None })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.transport.endpoint()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl Transport for SecureTransport {
    async fn connect(&mut self, deadline: &Deadline) -> Result<(), HttpError> {
        ensure!(self.session.is_none(), TransportError::AlreadyConnected.into());
        self.transport.connect(deadline).await?;

        let host = self.transport.endpoint().host();
        let server_name = ServerName::try_from(host.to_owned()).map_err(|_invalid| TlsError::invalid_server_name(host))?;
        let mut session =
            ClientConnection::new(Arc::clone(&self.tls_config), server_name).map_err(TlsError::from_rustls)?;

        while session.is_handshaking() {
            if session.wants_write() {
                flush_tls(&mut session, &self.transport, "handshake", deadline).await?;
                continue;
            }
            let read = fill_tls(&mut session, &self.transport, "handshake", deadline).await?;
            ensure!(read != 0, TlsError::HandshakeEof.into());
        }
        flush_tls(&mut session, &self.transport, "handshake", deadline).await?;

        ensure!(session.peer_certificates().is_some_and(|certs| !certs.is_empty()), TlsError::MissingCertificate.into());

        debug!(
            host,
            protocol = ?session.protocol_version(),
            cipher = ?session.negotiated_cipher_suite().map(|suite| suite.suite()),
            "tls handshake complete"
        );
        self.session = Some(session);
        Ok(())
    }

    async fn send(&mut self, buf: &[u8], deadline: &Deadline) -> Result<usize, HttpError> {
        let session = self.session.as_mut().ok_or(TransportError::NotConnected)?;
        let written = session.writer().write(buf).map_err(TransportError::send)?;
        flush_tls(session, &self.transport, "send", deadline).await?;
        Ok(written)
    }

    async fn recv(&mut self, buf: &mut [u8], deadline: &Deadline) -> Result<usize, HttpError> {
        let session = self.session.as_mut().ok_or(TransportError::NotConnected)?;
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match session.reader().read(buf) {
                Ok(read) => return Ok(read),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // a zero read marks eof inside the session, the next
                    // reader().read reports it
                    fill_tls(session, &self.transport, "recv", deadline).await?;
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(host = self.transport.endpoint().host(), "peer closed the connection without close_notify");
                    return Ok(0);
                }
                Err(e) => return Err(TransportError::recv(e).into()),
            }
        }
    }
}
