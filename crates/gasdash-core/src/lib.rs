//! # GasDash Core Library
//!
//! Core functionality for the GasDash gas analyzer dashboard.
//!
//! This library provides:
//! - The analyzer link: TCP connection lifecycle with jittered reconnect
//! - Newline framing and telemetry record parsing for the wire stream
//! - Dashboard display state with per-sensor trend windows and alerts
//! - A timer-driven presentation refresh loop
//! - A demo feed for running without analyzer hardware
//!
//! ## Architecture
//!
//! A dedicated background thread owns the socket and pushes parsed records
//! and connection-status strings onto two unbounded FIFO queues. The
//! presentation side drains both queues on a fixed period without ever
//! blocking, so a stalled link can never stall the display.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gasdash_core::{config::AnalyzerConfig, dashboard::DashboardState,
//!                    pipeline::TelemetryPipeline};
//!
//! let config = AnalyzerConfig::default();
//! let pipeline = TelemetryPipeline::start(&config);
//! let mut state = DashboardState::new(&config);
//!
//! // One refresh cycle: drain everything currently queued.
//! let updates = state.drain_once(pipeline.data_rx(), pipeline.status_rx());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dashboard;
pub mod demo;
pub mod pipeline;
pub mod protocol;
pub mod telemetry;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AnalyzerConfig, SensorSpec};
    pub use crate::dashboard::{
        DashboardState, HistoricalWindow, RefreshLoop, RenderSink, RenderUpdate, SensorCard,
    };
    pub use crate::demo::DemoFeed;
    pub use crate::pipeline::TelemetryPipeline;
    pub use crate::protocol::{ConnectionState, LinkError, LineFramer, TcpTransport, Transport};
    pub use crate::telemetry::{TelemetryRecord, PREDICTION_CHANNEL};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
