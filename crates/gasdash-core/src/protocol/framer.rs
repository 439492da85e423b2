//! Newline framing for the analyzer text stream

/// Splits an incoming byte stream into newline-delimited records
///
/// Bytes accumulate in an internal buffer; complete lines are handed out as
/// they appear and any unterminated tail is retained for the next chunk.
/// Invalid UTF-8 is decoded with replacement characters rather than
/// aborting the stream.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Append a chunk of raw bytes to the buffer
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Extract the next complete line, consuming its newline
    ///
    /// Lines are trimmed; lines that are empty after trimming are skipped
    /// and never forwarded. Returns `None` once no full line remains.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(idx) = self.buffer.find('\n') {
            let line = self.buffer[..idx].to_string();
            self.buffer.drain(..=idx);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        None
    }

    /// The unterminated tail currently held back
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
