//! Dashboard state and the presentation refresh loop
//!
//! Everything here runs on the presentation side of the queue pair and
//! never blocks on I/O: a bounded drain turns queued records into render
//! instructions, and a timer re-arms the drain on a fixed period.

mod history;
mod refresh;
mod state;

pub use history::HistoricalWindow;
pub use refresh::{RefreshLoop, RenderSink};
pub use state::{ConnectionStatus, DashboardState, RenderUpdate, SensorCard};

/// Default number of readings retained per sensor
pub const DEFAULT_WINDOW_SIZE: usize = 50;

/// Default refresh period in milliseconds
pub const DEFAULT_REFRESH_MS: u64 = 100;
