//! Analyzer link protocol
//!
//! The analyzer streams newline-terminated `<channel>,<value>` text records
//! over a plain client-initiated TCP connection. There is no handshake,
//! framing, or acknowledgment beyond TCP itself, so the link layer is a
//! connect/read loop with error classification and jittered reconnect.

mod connection;
mod error;
mod framer;
mod stream;

pub use connection::{ConnectionState, LinkHandle, LinkWorker};
pub use error::LinkError;
pub use framer::LineFramer;
pub use stream::{ByteSource, TcpTransport, Transport};

/// Default analyzer TCP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default connect/read timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
