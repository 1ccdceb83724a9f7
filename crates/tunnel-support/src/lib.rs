//! Tunnel Support
//!
//! Channel-side helpers for tunnel tests: closing channels quietly,
//! classifying channel errors, one-line channel summaries, and SNI server
//! name values.

#![warn(missing_docs)]

pub mod channel;
pub mod classify;
pub mod close;
pub mod sni;
pub mod summary;

pub use channel::TlsChannel;
pub use classify::{is_certificate_unknown_error, is_channel_closed_error, ChannelClosed};
pub use close::{close_and_log_on_error, close_quietly, Close};
pub use sni::{sni_server_name_value, SniServerName};
pub use summary::{format_summary, get_summary, Summary};
