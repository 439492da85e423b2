//! Pipeline assembly
//!
//! Builds the message queue pair and spawns the link worker, handing the
//! consumer ends to the presentation side. The two queues are the only
//! thing crossing the thread boundary: records one way, status strings the
//! other, each with a single writer and a single reader.

use std::sync::mpsc::{self, Receiver};

use tracing::info;

use crate::config::AnalyzerConfig;
use crate::protocol::{ConnectionState, LinkHandle, LinkWorker, TcpTransport, Transport};
use crate::telemetry::TelemetryRecord;

/// A running telemetry pipeline
///
/// Owns the consumer ends of both queues plus the worker handle. Dropping
/// the pipeline requests worker shutdown.
pub struct TelemetryPipeline {
    data_rx: Receiver<TelemetryRecord>,
    status_rx: Receiver<String>,
    link: LinkHandle,
}

impl TelemetryPipeline {
    /// Start the pipeline against the analyzer endpoint in `config`
    pub fn start(config: &AnalyzerConfig) -> Self {
        let transport = TcpTransport::new(&config.host, config.port, config.timeout());
        info!(endpoint = %config.endpoint(), "starting analyzer link");
        Self::with_transport(transport, config.retry_jitter())
    }

    /// Start the pipeline over an injected transport
    ///
    /// Tests use this with scripted byte sources; the monitor's demo mode
    /// uses it with a loopback TCP transport.
    pub fn with_transport<T: Transport + 'static>(transport: T, retry_jitter: (f64, f64)) -> Self {
        let (data_tx, data_rx) = mpsc::channel();
        let (status_tx, status_rx) = mpsc::channel();
        let link = LinkWorker::spawn(transport, data_tx, status_tx, retry_jitter);
        Self {
            data_rx,
            status_rx,
            link,
        }
    }

    /// Consumer end of the record queue
    pub fn data_rx(&self) -> &Receiver<TelemetryRecord> {
        &self.data_rx
    }

    /// Consumer end of the status queue
    pub fn status_rx(&self) -> &Receiver<String> {
        &self.status_rx
    }

    /// Current state of the link worker's connection machine
    pub fn link_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Request worker shutdown; returns without waiting
    pub fn shutdown(&self) {
        self.link.shutdown();
    }
}
