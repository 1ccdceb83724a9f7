//! Error classification for channel failures

use std::error::Error;
use std::io;

use rustls::AlertDescription;

const CERTIFICATE_UNKNOWN_ALERT: &str = "received fatal alert: certificate_unknown";

/// A channel was used after it was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelClosed {
    /// Closed before the operation started
    #[error("channel is closed")]
    Closed,
    /// Closed by another thread while the operation was in progress
    #[error("channel closed asynchronously")]
    Asynchronous,
}

/// `error` followed by its causes. An `io::Error` continues with its
/// payload rather than the payload's source.
fn chain<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&error| {
        match error.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            Some(payload) => Some(payload as &(dyn Error + 'static)),
            None => error.source(),
        }
    })
}

/// Whether `error` is an expected consequence of the channel being closed
pub fn is_channel_closed_error(error: &(dyn Error + 'static)) -> bool {
    chain(error).any(|error| {
        error.is::<ChannelClosed>()
            || error.downcast_ref::<io::Error>().is_some_and(|error| {
                matches!(
                    error.kind(),
                    io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionAborted
                )
            })
    })
}

/// Whether the peer rejected our certificate as unknown
pub fn is_certificate_unknown_error(error: &(dyn Error + 'static)) -> bool {
    chain(error).any(|error| {
        matches!(
            error.downcast_ref::<rustls::Error>(),
            Some(rustls::Error::AlertReceived(AlertDescription::CertificateUnknown))
        ) || error.to_string().to_lowercase().contains(CERTIFICATE_UNKNOWN_ALERT)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("tunnel write failed")]
    struct TunnelWrite(#[source] io::Error);

    #[test]
    fn test_channel_closed_variants() {
        assert!(is_channel_closed_error(&ChannelClosed::Closed));
        assert!(is_channel_closed_error(&ChannelClosed::Asynchronous));
    }

    #[test]
    fn test_channel_closed_io_kinds() {
        for kind in [
            io::ErrorKind::NotConnected,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionAborted,
        ] {
            assert!(is_channel_closed_error(&io::Error::from(kind)), "{kind:?}");
        }
        assert!(!is_channel_closed_error(&io::Error::from(io::ErrorKind::TimedOut)));
    }

    #[test]
    fn test_channel_closed_through_causes() {
        let wrapped = TunnelWrite(io::Error::new(io::ErrorKind::Other, ChannelClosed::Closed));
        assert!(is_channel_closed_error(&wrapped));

        let unrelated = TunnelWrite(io::Error::other("no route"));
        assert!(!is_channel_closed_error(&unrelated));
    }

    #[test]
    fn test_certificate_unknown_alert() {
        let alert = rustls::Error::AlertReceived(AlertDescription::CertificateUnknown);
        assert!(is_certificate_unknown_error(&alert));

        let in_io = io::Error::new(io::ErrorKind::InvalidData, alert);
        assert!(is_certificate_unknown_error(&in_io));

        let other = rustls::Error::AlertReceived(AlertDescription::BadCertificate);
        assert!(!is_certificate_unknown_error(&other));
    }

    #[test]
    fn test_certificate_unknown_message() {
        let handshake = io::Error::other("Received fatal alert: certificate_unknown");
        assert!(is_certificate_unknown_error(&handshake));
        assert!(is_certificate_unknown_error(&TunnelWrite(handshake)));

        assert!(!is_certificate_unknown_error(&io::Error::other("handshake_failure")));
    }
}
