//! Link errors

use thiserror::Error;

/// Errors that can occur while dialing or reading the analyzer stream
///
/// All of these are transient: the connection manager reports them and
/// reconnects. There is no fatal path in the link layer.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    Refused,

    #[error("connection closed by peer")]
    PeerClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Collapse an I/O error into the transport taxonomy
    pub fn classify(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => LinkError::Timeout,
            ErrorKind::ConnectionRefused => LinkError::Refused,
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof => LinkError::PeerClosed,
            _ => LinkError::Io(err),
        }
    }

    /// Human-readable status line with a retry notice, one per cause
    pub fn status_message(&self, endpoint: &str) -> String {
        match self {
            LinkError::Timeout => {
                format!("Connection to {} timed out. Retrying...", endpoint)
            }
            LinkError::Refused => {
                format!("Connection refused by {}. Retrying...", endpoint)
            }
            LinkError::PeerClosed => {
                format!("Connection closed by {}. Retrying...", endpoint)
            }
            LinkError::Io(err) => {
                format!("Network error: {}. Retrying...", err)
            }
        }
    }
}
