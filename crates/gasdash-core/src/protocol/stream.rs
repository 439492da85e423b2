//! Transport abstraction for the analyzer link
//!
//! The connection manager dials through a [`Transport`] and reads through a
//! [`ByteSource`], so tests can script byte streams without a real socket.

use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::LinkError;

/// Byte source feeding the connection manager's read loop
pub trait ByteSource: Send {
    /// Read into `buf`, blocking up to the transport's read timeout
    ///
    /// Returns the number of bytes read; zero signals peer close. A timeout
    /// surfaces as an error with kind `TimedOut` or `WouldBlock`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Factory dialing a fresh byte source for each connection attempt
pub trait Transport: Send {
    /// Dial the analyzer, yielding a readable source on success
    fn connect(&mut self) -> Result<Box<dyn ByteSource>, LinkError>;

    /// Target endpoint, for status strings (`host:port`)
    fn endpoint(&self) -> String;
}

/// TCP client transport
///
/// Applies the configured timeout both to the connect attempt and to each
/// read on the established stream.
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    /// Create a transport for `host:port` with the given connect/read timeout
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<Box<dyn ByteSource>, LinkError> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(LinkError::classify)?
            .next()
            .ok_or_else(|| {
                LinkError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address for {}", self.host),
                ))
            })?;
        let stream =
            TcpStream::connect_timeout(&addr, self.timeout).map_err(LinkError::classify)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(LinkError::Io)?;
        Ok(Box::new(TcpByteSource { stream }))
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct TcpByteSource {
    stream: TcpStream,
}

impl ByteSource for TcpByteSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let transport = TcpTransport::new("192.168.4.1", 8080, Duration::from_secs(5));
        assert_eq!(transport.endpoint(), "192.168.4.1:8080");
    }
}
