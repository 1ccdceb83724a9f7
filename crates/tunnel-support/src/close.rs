//! Closing channels without surfacing failures

use std::error::Error;
use std::io;
use std::net::{Shutdown, TcpStream};

use rustls::{ClientConnection, ServerConnection, StreamOwned};

use crate::classify::is_channel_closed_error;

/// A resource that can be closed
pub trait Close {
    /// Close the resource. Closing an already closed resource succeeds.
    fn close(&mut self) -> io::Result<()>;
}

impl Close for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

// Queue close_notify, flush what the socket accepts, then close the socket.
macro_rules! impl_close_for_tls_stream {
    ($($conn:ty),*) => {
        $(
            impl<S: io::Read + io::Write + Close> Close for StreamOwned<$conn, S> {
                fn close(&mut self) -> io::Result<()> {
                    self.conn.send_close_notify();
                    while self.conn.wants_write() {
                        if let Err(error) = self.conn.write_tls(&mut self.sock) {
                            tracing::trace!(%error, "close_notify not delivered");
                            break;
                        }
                    }
                    self.sock.close()
                }
            }
        )*
    };
}

impl_close_for_tls_stream!(ServerConnection, ClientConnection);

/// Close every present entry, ignoring failures.
///
/// Returns whether at least one close succeeded.
pub fn close_quietly(closeables: &mut [Option<&mut dyn Close>]) -> bool {
    let mut closed = false;
    for closeable in closeables.iter_mut().flatten() {
        match closeable.close() {
            Ok(()) => closed = true,
            Err(error) => tracing::trace!(%error, "error during close"),
        }
    }
    closed
}

/// On `error`, close everything quietly and log the error unless it is an
/// expected closing race. Returns whether there was an error.
pub fn close_and_log_on_error(
    message: &str,
    error: Option<&(dyn Error + 'static)>,
    closeables: &mut [Option<&mut dyn Close>],
) -> bool {
    let Some(error) = error else {
        return false;
    };
    close_quietly(closeables);
    if !is_channel_closed_error(error) {
        tracing::error!(%error, "{message}");
    }
    true
}
