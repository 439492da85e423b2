//! Periodic refresh task driving the dashboard drain

use std::time::Duration;

use tracing::trace;

use super::state::{DashboardState, RenderUpdate};
use crate::pipeline::TelemetryPipeline;

/// Consumer of render instructions produced by each refresh cycle
///
/// The rendering layer itself (canvas drawing, widgets) lives outside this
/// crate; a sink is the boundary it plugs into.
pub trait RenderSink: Send {
    /// Apply one render instruction
    fn apply(&mut self, update: &RenderUpdate);
}

impl<F> RenderSink for F
where
    F: FnMut(&RenderUpdate) + Send,
{
    fn apply(&mut self, update: &RenderUpdate) {
        self(update)
    }
}

/// Timer-driven presentation loop
///
/// Re-armed by a fixed-period interval; each tick performs one bounded
/// drain of both queues and forwards the resulting instructions to the
/// sink. Queue reads never block, so a starved cycle simply re-arms.
pub struct RefreshLoop<S> {
    pipeline: TelemetryPipeline,
    state: DashboardState,
    period: Duration,
    sink: S,
}

impl<S: RenderSink> RefreshLoop<S> {
    /// Assemble a refresh loop over a running pipeline
    pub fn new(
        pipeline: TelemetryPipeline,
        state: DashboardState,
        period: Duration,
        sink: S,
    ) -> Self {
        Self {
            pipeline,
            state,
            period,
            sink,
        }
    }

    /// Run until the surrounding task is cancelled
    ///
    /// The loop itself never exits; abort the task or race it against a
    /// shutdown signal to stop it.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.period);
        loop {
            ticker.tick().await;
            self.tick();
        }
    }

    /// One refresh cycle; returns the number of instructions applied
    pub fn tick(&mut self) -> usize {
        let updates = self
            .state
            .drain_once(self.pipeline.data_rx(), self.pipeline.status_rx());
        for update in &updates {
            self.sink.apply(update);
        }
        trace!(applied = updates.len(), "refresh cycle");
        updates.len()
    }

    /// Current display state
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// The underlying pipeline
    pub fn pipeline(&self) -> &TelemetryPipeline {
        &self.pipeline
    }
}
