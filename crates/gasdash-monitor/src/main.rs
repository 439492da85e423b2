//! Headless dashboard monitor
//!
//! Wires configuration, the telemetry pipeline, and the refresh loop
//! together, reporting display state through structured logging instead of
//! a GUI. With `--demo` a loopback listener plays the analyzer using the
//! simulated feed, so the full network path runs without hardware.
//!
//! Usage: `gasdash-monitor [config.toml] [--demo]`

use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gasdash_core::config::AnalyzerConfig;
use gasdash_core::dashboard::{DashboardState, RefreshLoop, RenderSink, RenderUpdate};
use gasdash_core::demo::DemoFeed;
use gasdash_core::pipeline::TelemetryPipeline;

/// Interval between demo feed batches
const DEMO_BATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Render sink that reports display changes through tracing
struct LogSink;

impl RenderSink for LogSink {
    fn apply(&mut self, update: &RenderUpdate) {
        match update {
            RenderUpdate::Sensor {
                name,
                display: reading,
                alert,
                ..
            } => {
                if *alert {
                    warn!(sensor = %name, value = %reading, "reading below threshold");
                } else {
                    info!(sensor = %name, value = %reading, "reading");
                }
            }
            RenderUpdate::Prediction { label } => {
                info!(prediction = %label, "classifier update");
            }
            RenderUpdate::Status { message, .. } => {
                info!(status = %message, "link status");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config_path: Option<PathBuf> = None;
    let mut demo = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--demo" => demo = true,
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    let mut config = match &config_path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    if demo {
        let addr = spawn_demo_feed(config.clone()).context("starting demo feed")?;
        config.host = addr.ip().to_string();
        config.port = addr.port();
        info!(endpoint = %config.endpoint(), "demo feed listening");
    }

    let pipeline = TelemetryPipeline::start(&config);
    let state = DashboardState::new(&config);
    let refresh = RefreshLoop::new(pipeline, state, config.refresh_interval(), LogSink);

    info!(
        endpoint = %config.endpoint(),
        sensors = config.sensors.len(),
        refresh_ms = config.refresh_ms,
        "monitor running"
    );

    tokio::select! {
        _ = refresh.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}

/// Serve the demo feed on a loopback listener
///
/// Each accepted client gets a fresh feed streamed in fixed-interval
/// batches until it disconnects; the normal connection manager dials this
/// exactly like analyzer hardware.
fn spawn_demo_feed(config: AnalyzerConfig) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").context("binding demo listener")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || loop {
        let (mut stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "demo accept failed");
                continue;
            }
        };
        info!(peer = %peer, "demo client connected");
        let mut feed = DemoFeed::new(&config);
        'client: loop {
            for line in feed.next_lines() {
                if writeln!(stream, "{}", line).is_err() {
                    info!(peer = %peer, "demo client disconnected");
                    break 'client;
                }
            }
            std::thread::sleep(DEMO_BATCH_INTERVAL);
        }
    });
    Ok(addr)
}
