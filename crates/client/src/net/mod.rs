//! Connections: name resolution and the plain and TLS byte transports.

mod endpoint;
mod tcp;
mod tls;
mod transport;

pub use endpoint::Endpoint;
pub use tcp::TcpTransport;
pub use tls::SecureTransport;
pub use transport::Transport;

pub(crate) use tls::{default_tls_config, tls_config_with_roots};
