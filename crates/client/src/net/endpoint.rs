//! Name resolution.

use std::net::SocketAddr;

use tokio::net::lookup_host;
use tracing::debug;

use crate::deadline::Deadline;
use crate::protocol::ResolutionError;

/// A host and port resolved into socket addresses.
///
/// The original host name is kept: TLS needs it for SNI and certificate
/// verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    addrs: Vec<SocketAddr>,
}

impl Endpoint {
    /// Resolves `host:port` with the system resolver, bounded by `deadline`.
    ///
    /// IP literals resolve to themselves without a lookup.
    ///
    /// # Errors
    ///
    /// [`ResolutionError`] if the lookup fails, times out or returns no
    /// address.
    pub async fn resolve(host: &str, port: u16, deadline: &Deadline) -> Result<Self, ResolutionError> {
        let addrs = deadline
            .wait("resolve", lookup_host((host, port)))
            .await
            .map_err(|_timed_out| ResolutionError::timed_out(host))?
            .map_err(|e| ResolutionError::lookup(host, port, e))?
            .collect::<Vec<_>>();

        if addrs.is_empty() {
            return Err(ResolutionError::no_address(host, port));
        }

        debug!(host, port, ?addrs, "resolved endpoint");
        Ok(Self { host: host.to_owned(), port, addrs })
    }

    /// An endpoint for an already known address.
    pub fn from_addr<S: Into<String>>(host: S, addr: SocketAddr) -> Self {
        Self { host: host.into(), port: addr.port(), addrs: vec![addr] }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// All resolved addresses, in resolver order.
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// The address a connection is made to: the first one resolved.
    pub fn addr(&self) -> SocketAddr {
        // resolve and from_addr never build an empty list
        self.addrs[0]
    }
}
