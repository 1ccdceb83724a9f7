//! One-line channel summaries for log messages

use indexmap::IndexMap;

use crate::channel::TlsChannel;
use crate::sni::sni_server_name_value;

/// Insertion-ordered summary entries; `None` values are left out when
/// formatting
pub type Summary = IndexMap<String, Option<String>>;

/// Render `summary` as `key:value` pairs joined by spaces, after `prepend`.
///
/// A non-blank `prepend` is followed by a space. Absent values and values
/// that render blank are dropped.
pub fn format_summary(prepend: Option<&str>, summary: Option<&Summary>) -> String {
    let mut result = match prepend {
        None => String::new(),
        Some(prepend) if prepend.trim().is_empty() => prepend.to_string(),
        Some(prepend) => format!("{prepend} "),
    };
    let Some(summary) = summary else {
        return result;
    };

    let pairs: Vec<String> = summary
        .iter()
        .filter_map(|(key, value)| Some((key, value.as_deref()?)))
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}:{value}"))
        .collect();
    result.push_str(&pairs.join(" "));
    result
}

/// Describe a channel: the requested SNI value for server channels, then
/// the remote and local socket addresses
pub fn get_summary(channel: Option<&dyn TlsChannel>) -> Summary {
    let mut summary = Summary::new();
    let Some(channel) = channel else {
        return summary;
    };

    if channel.is_server() {
        let sni = channel.sni_server_name();
        summary.insert("sniServerNameValue".to_string(), sni_server_name_value(sni.as_ref()));
    }

    let socket = channel.underlying();
    summary.insert(
        "remoteAddress".to_string(),
        socket.and_then(|s| s.peer_addr().ok()).map(|addr| addr.to_string()),
    );
    summary.insert(
        "localAddress".to_string(),
        socket.and_then(|s| s.local_addr().ok()).map(|addr| addr.to_string()),
    );
    summary
}
