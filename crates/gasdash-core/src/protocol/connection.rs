//! Connection management
//!
//! Owns the analyzer socket lifecycle: dial, read loop, error
//! classification and jittered reconnect. The worker is the sole producer
//! on both queues and runs on its own OS thread until the shutdown token is
//! set; the presentation side never sees the socket.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::framer::LineFramer;
use super::stream::{ByteSource, Transport};
use super::LinkError;
use crate::telemetry::TelemetryRecord;

/// Bytes requested per socket read; the analyzer emits short lines
const READ_CHUNK_SIZE: usize = 128;

/// Granularity of the retry sleep, so shutdown stays responsive
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Dial in progress
    Connecting,
    /// Receiving the line stream
    Connected,
}

impl ConnectionState {
    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Handle to a spawned link worker
///
/// Dropping the handle requests shutdown but does not join; the worker is
/// left to wind down on its own unless [`LinkHandle::join`] is called
/// explicitly.
pub struct LinkHandle {
    shutdown: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    thread: Option<JoinHandle<()>>,
}

impl LinkHandle {
    /// Request worker shutdown; returns without waiting
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Current state of the worker's connection machine
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Request shutdown and wait for the worker thread to finish
    pub fn join(mut self) {
        self.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The background worker driving the analyzer link
///
/// State machine: `Disconnected -> Connecting -> Connected -> Disconnected`
/// in an endless loop. Every disconnect cause publishes its own status
/// string and is followed by an unconditional, jittered reconnect.
pub struct LinkWorker<T: Transport> {
    transport: T,
    data_tx: Sender<TelemetryRecord>,
    status_tx: Sender<String>,
    retry_jitter: (f64, f64),
    shutdown: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    rng: StdRng,
}

impl<T: Transport + 'static> LinkWorker<T> {
    /// Spawn the worker on a dedicated OS thread
    pub fn spawn(
        transport: T,
        data_tx: Sender<TelemetryRecord>,
        status_tx: Sender<String>,
        retry_jitter: (f64, f64),
    ) -> LinkHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let state = Arc::new(AtomicU8::new(ConnectionState::Disconnected.as_u8()));
        let mut worker = LinkWorker {
            transport,
            data_tx,
            status_tx,
            retry_jitter,
            shutdown: shutdown.clone(),
            state: state.clone(),
            rng: StdRng::from_entropy(),
        };
        let thread = std::thread::spawn(move || worker.run());
        LinkHandle {
            shutdown,
            state,
            thread: Some(thread),
        }
    }
}

impl<T: Transport> LinkWorker<T> {
    /// Run the connect/read loop until the shutdown token is set
    fn run(&mut self) {
        while !self.shutdown.load(Ordering::Relaxed) {
            let endpoint = self.transport.endpoint();
            self.set_state(ConnectionState::Connecting);
            self.publish_status(format!("Connecting to {}...", endpoint));

            match self.transport.connect() {
                Ok(source) => {
                    self.set_state(ConnectionState::Connected);
                    info!(endpoint = %endpoint, "link established");
                    self.publish_status(format!("Connected to {}", endpoint));
                    match self.read_loop(source) {
                        Ok(()) => {
                            // Shutdown requested or consumer gone.
                            self.set_state(ConnectionState::Disconnected);
                            break;
                        }
                        Err(err) => {
                            warn!(endpoint = %endpoint, error = %err, "link lost");
                            self.publish_status(err.status_message(&endpoint));
                        }
                    }
                }
                Err(err) => {
                    debug!(endpoint = %endpoint, error = %err, "connect failed");
                    self.publish_status(err.status_message(&endpoint));
                }
            }

            self.set_state(ConnectionState::Disconnected);
            self.jitter_sleep();
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Read until the link drops, framing lines and queueing records
    ///
    /// `Ok(())` means a deliberate stop (shutdown, or the record consumer
    /// went away); any link fault comes back as the classified error.
    fn read_loop(&mut self, mut source: Box<dyn ByteSource>) -> Result<(), LinkError> {
        let mut framer = LineFramer::new();
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }
            match source.read_chunk(&mut buf) {
                Ok(0) => return Err(LinkError::PeerClosed),
                Ok(n) => {
                    framer.extend(&buf[..n]);
                    while let Some(line) = framer.next_line() {
                        match TelemetryRecord::parse(&line) {
                            Ok(record) => {
                                if self.data_tx.send(record).is_err() {
                                    debug!("record consumer dropped, stopping link worker");
                                    self.shutdown.store(true, Ordering::Relaxed);
                                    return Ok(());
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "malformed record dropped");
                            }
                        }
                    }
                }
                Err(err) => return Err(LinkError::classify(err)),
            }
        }
    }

    /// Sleep for a uniformly random delay within the configured jitter range
    ///
    /// Sliced so a shutdown request interrupts the wait promptly.
    fn jitter_sleep(&mut self) {
        let (lo, hi) = self.retry_jitter;
        let wait = if hi > lo { self.rng.gen_range(lo..hi) } else { lo };
        debug!(delay_secs = wait, "scheduling reconnect");
        let deadline = Instant::now() + Duration::from_secs_f64(wait);
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    fn publish_status(&self, message: String) {
        // A departed status consumer is not fatal; data flow decides that.
        let _ = self.status_tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::mpsc;

    /// Scripted transport: each connect attempt pops the next script
    struct ScriptedTransport {
        scripts: VecDeque<Script>,
    }

    enum Script {
        RefuseConnect,
        TimeoutConnect,
        Feed {
            chunks: Vec<Vec<u8>>,
            then: io::ErrorKind,
        },
    }

    struct ScriptedSource {
        chunks: VecDeque<Vec<u8>>,
        then: io::ErrorKind,
    }

    impl ByteSource for ScriptedSource {
        fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => {
                    if self.then == io::ErrorKind::UnexpectedEof {
                        Ok(0)
                    } else {
                        Err(io::Error::new(self.then, "scripted fault"))
                    }
                }
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn connect(&mut self) -> Result<Box<dyn ByteSource>, LinkError> {
            match self.scripts.pop_front() {
                Some(Script::RefuseConnect) => Err(LinkError::Refused),
                Some(Script::TimeoutConnect) => Err(LinkError::Timeout),
                Some(Script::Feed { chunks, then }) => Ok(Box::new(ScriptedSource {
                    chunks: chunks.into(),
                    then,
                })),
                // Script exhausted: hang up immediately on every retry.
                None => Err(LinkError::Refused),
            }
        }

        fn endpoint(&self) -> String {
            "scripted:0".to_string()
        }
    }

    fn recv_all<V>(rx: &mpsc::Receiver<V>, deadline: Duration, done: impl Fn(&[V]) -> bool) -> Vec<V> {
        let start = Instant::now();
        let mut items = Vec::new();
        while start.elapsed() < deadline && !done(&items) {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(item) => items.push(item),
                Err(_) => continue,
            }
        }
        items
    }

    #[test]
    fn test_records_flow_and_peer_close_reported() {
        let transport = ScriptedTransport {
            scripts: VecDeque::from([Script::Feed {
                chunks: vec![b"MQ-3,0.42\nPredic".to_vec(), b"tion,methane\n".to_vec()],
                then: io::ErrorKind::UnexpectedEof,
            }]),
        };
        let (data_tx, data_rx) = mpsc::channel();
        let (status_tx, status_rx) = mpsc::channel();
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, (0.0, 0.0));

        let records = recv_all(&data_rx, Duration::from_secs(5), |items| items.len() >= 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel, "MQ-3");
        assert_eq!(records[0].value, "0.42");
        assert!(records[1].is_prediction());

        let statuses = recv_all(&status_rx, Duration::from_secs(5), |items| {
            items.iter().any(|s: &String| s.contains("closed by"))
        });
        assert!(statuses.iter().any(|s| s.starts_with("Connecting to")));
        assert!(statuses.iter().any(|s| s.starts_with("Connected to")));
        assert!(statuses.iter().any(|s| s.contains("closed by scripted:0")));

        handle.join();
    }

    #[test]
    fn test_refused_connect_publishes_and_retries() {
        let transport = ScriptedTransport {
            scripts: VecDeque::from([
                Script::RefuseConnect,
                Script::Feed {
                    chunks: vec![b"MQ-135,1.1\n".to_vec()],
                    then: io::ErrorKind::UnexpectedEof,
                },
            ]),
        };
        let (data_tx, data_rx) = mpsc::channel();
        let (status_tx, status_rx) = mpsc::channel();
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, (0.0, 0.0));

        // The refused attempt is retried unconditionally and the next
        // attempt delivers data.
        let records = recv_all(&data_rx, Duration::from_secs(5), |items| !items.is_empty());
        assert_eq!(records[0].channel, "MQ-135");

        let statuses = recv_all(&status_rx, Duration::from_secs(5), |items| {
            items.iter().any(|s: &String| s.contains("refused"))
        });
        assert!(statuses.iter().any(|s| s.contains("refused")));

        handle.join();
    }

    #[test]
    fn test_malformed_lines_dropped_not_queued() {
        let transport = ScriptedTransport {
            scripts: VecDeque::from([Script::Feed {
                chunks: vec![b"garbage\nMQ-3,0.42,extra\nMQ-3,0.9\n".to_vec()],
                then: io::ErrorKind::UnexpectedEof,
            }]),
        };
        let (data_tx, data_rx) = mpsc::channel();
        let (status_tx, _status_rx) = mpsc::channel();
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, (0.0, 0.0));

        let records = recv_all(&data_rx, Duration::from_secs(5), |items| !items.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "0.9");

        handle.join();
    }

    #[test]
    fn test_connect_timeout_reported_then_reconnects_within_jitter() {
        let transport = ScriptedTransport {
            scripts: VecDeque::from([
                Script::TimeoutConnect,
                Script::Feed {
                    chunks: vec![b"MQ-137,0.7\n".to_vec()],
                    then: io::ErrorKind::UnexpectedEof,
                },
            ]),
        };
        let (data_tx, data_rx) = mpsc::channel();
        let (status_tx, status_rx) = mpsc::channel();
        let jitter = (0.05, 0.1);
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, jitter);

        let statuses = recv_all(&status_rx, Duration::from_secs(5), |items| {
            items.iter().any(|s: &String| s.contains("timed out"))
        });
        assert!(statuses.iter().any(|s| s.contains("timed out")));
        let reported_at = Instant::now();

        // The reconnect after the timeout lands inside the jitter window
        // (plus scheduling slack) and delivers the queued data.
        let records = recv_all(&data_rx, Duration::from_secs(5), |items| !items.is_empty());
        assert_eq!(records[0].channel, "MQ-137");
        assert!(reported_at.elapsed() < Duration::from_secs(2));

        handle.join();
    }

    #[test]
    fn test_shutdown_interrupts_retry_wait() {
        let transport = ScriptedTransport {
            scripts: VecDeque::new(),
        };
        let (data_tx, _data_rx) = mpsc::channel();
        let (status_tx, _status_rx) = mpsc::channel();
        // Long jitter: shutdown must still come back quickly.
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, (30.0, 60.0));
        std::thread::sleep(Duration::from_millis(100));

        let start = Instant::now();
        handle.join();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_state_reaches_disconnected_after_join() {
        let transport = ScriptedTransport {
            scripts: VecDeque::new(),
        };
        let (data_tx, _data_rx) = mpsc::channel();
        let (status_tx, _status_rx) = mpsc::channel();
        let handle = LinkWorker::spawn(transport, data_tx, status_tx, (0.0, 0.0));
        handle.shutdown();
        assert!(handle.is_shutdown());
        handle.join();
    }
}
