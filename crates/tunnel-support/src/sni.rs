//! SNI server names

use std::fmt;

use rustls::pki_types::{DnsName, InvalidDnsNameError};

const VALUE_TOKEN: &str = "value=";
const EMPTY_VALUE: &str = "(empty)";

/// A server name from a TLS client hello
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SniServerName {
    /// DNS host name (name type 0)
    HostName(DnsName<'static>),
    /// Any other name type, kept as its encoded bytes
    Other {
        /// SNI name type
        name_type: u8,
        /// Encoded name
        encoded: Vec<u8>,
    },
}

impl SniServerName {
    /// Host name entry for `name`
    pub fn host_name(name: &str) -> Result<Self, InvalidDnsNameError> {
        Ok(SniServerName::HostName(DnsName::try_from(name)?.to_owned()))
    }

    /// The ASCII host name, for host name entries
    pub fn ascii_name(&self) -> Option<&str> {
        match self {
            SniServerName::HostName(name) => Some(name.as_ref()),
            SniServerName::Other { .. } => None,
        }
    }
}

/// Colon separated upper-case hex bytes, `(empty)` for no bytes
fn hex_bytes(encoded: &[u8]) -> String {
    if encoded.is_empty() {
        return EMPTY_VALUE.to_string();
    }
    encoded
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

impl fmt::Display for SniServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SniServerName::HostName(name) => write!(f, "type=host_name (0), value={}", AsRef::<str>::as_ref(name)),
            SniServerName::Other { name_type, encoded } => {
                write!(f, "type=({name_type}), value={}", hex_bytes(encoded))
            }
        }
    }
}

/// The value carried by a server name: the ASCII name for host names, the
/// text after the last `value=` of the display form otherwise (`CA:FE`, or
/// `(empty)` for a name with no bytes). Absent when there is no name.
pub fn sni_server_name_value(name: Option<&SniServerName>) -> Option<String> {
    let name = name?;
    if let Some(ascii) = name.ascii_name() {
        return Some(ascii.to_string());
    }
    let rendered = name.to_string();
    let value = &rendered[rendered.rfind(VALUE_TOKEN)? + VALUE_TOKEN.len()..];
    (!value.is_empty()).then(|| value.to_string())
}
