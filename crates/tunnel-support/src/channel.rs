//! TLS channels as seen by summaries

use std::net::TcpStream;

use rustls::{ClientConnection, ServerConnection, StreamOwned};

use crate::sni::SniServerName;

/// A TLS channel over a TCP socket
pub trait TlsChannel {
    /// The socket carrying the channel, if it is a TCP socket
    fn underlying(&self) -> Option<&TcpStream>;

    /// Server name the client asked for. Only meaningful on the server side.
    fn sni_server_name(&self) -> Option<SniServerName>;

    /// Whether this is the accepting side
    fn is_server(&self) -> bool;
}

impl TlsChannel for StreamOwned<ServerConnection, TcpStream> {
    fn underlying(&self) -> Option<&TcpStream> {
        Some(&self.sock)
    }

    fn sni_server_name(&self) -> Option<SniServerName> {
        let name = self.conn.server_name()?;
        SniServerName::host_name(name)
            .inspect_err(|error| tracing::trace!(name, %error, "unusable SNI host name"))
            .ok()
    }

    fn is_server(&self) -> bool {
        true
    }
}

impl TlsChannel for StreamOwned<ClientConnection, TcpStream> {
    fn underlying(&self) -> Option<&TcpStream> {
        Some(&self.sock)
    }

    fn sni_server_name(&self) -> Option<SniServerName> {
        None
    }

    fn is_server(&self) -> bool {
        false
    }
}
