//! Demo feed - simulated analyzer output for testing without hardware
//!
//! Generates plausible Rs/R0 drift for each configured sensor plus a
//! periodic gas-class prediction, rendered as wire-format lines. Feed the
//! lines over any transport (the monitor serves them on a loopback TCP
//! listener) and the full pipeline runs as if an analyzer were attached.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AnalyzerConfig;
use crate::telemetry::PREDICTION_CHANNEL;

/// Gas classes the simulated classifier cycles through
const DEMO_CLASSES: &[&str] = &["air", "alcohol", "ammonia", "sulfide"];

/// Emit a prediction every this many batches
const PREDICTION_EVERY: u64 = 5;

/// Random-walk bounds for the simulated Rs/R0 ratio
const LEVEL_MIN: f64 = 0.05;
const LEVEL_MAX: f64 = 2.0;

/// Simulated analyzer producing wire-format telemetry lines
pub struct DemoFeed {
    channels: Vec<DemoChannel>,
    rng: StdRng,
    batches: u64,
}

struct DemoChannel {
    name: String,
    level: f64,
}

impl DemoFeed {
    /// Create a feed covering the sensors in `config`
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a deterministic feed for tests
    pub fn from_seed(config: &AnalyzerConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &AnalyzerConfig, rng: StdRng) -> Self {
        let channels = config
            .sensors
            .iter()
            .map(|spec| DemoChannel {
                name: spec.name.clone(),
                level: 1.0,
            })
            .collect();
        Self {
            channels,
            rng,
            batches: 0,
        }
    }

    /// Produce the next batch of wire lines
    ///
    /// One reading per sensor (random walk, clamped), plus a prediction
    /// line every few batches.
    pub fn next_lines(&mut self) -> Vec<String> {
        self.batches += 1;
        let rng = &mut self.rng;
        let mut lines: Vec<String> = self
            .channels
            .iter_mut()
            .map(|channel| {
                let step = rng.gen_range(-0.08..0.08);
                channel.level = (channel.level + step).clamp(LEVEL_MIN, LEVEL_MAX);
                format!("{},{:.3}", channel.name, channel.level)
            })
            .collect();
        if self.batches % PREDICTION_EVERY == 0 {
            let label = DEMO_CLASSES[rng.gen_range(0..DEMO_CLASSES.len())];
            lines.push(format!("{},{}", PREDICTION_CHANNEL, label));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryRecord;

    #[test]
    fn test_lines_parse_as_valid_records() {
        let config = AnalyzerConfig::default();
        let mut feed = DemoFeed::from_seed(&config, 7);
        for _ in 0..20 {
            for line in feed.next_lines() {
                let record = TelemetryRecord::parse(&line).unwrap();
                if !record.is_prediction() {
                    assert!(config.sensor(&record.channel).is_some());
                    let value: f64 = record.value.parse().unwrap();
                    assert!((LEVEL_MIN..=LEVEL_MAX).contains(&value));
                }
            }
        }
    }

    #[test]
    fn test_prediction_emitted_periodically() {
        let config = AnalyzerConfig::default();
        let mut feed = DemoFeed::from_seed(&config, 7);
        let mut predictions = 0;
        for _ in 0..PREDICTION_EVERY * 4 {
            predictions += feed
                .next_lines()
                .iter()
                .filter(|l| l.starts_with(PREDICTION_CHANNEL))
                .count();
        }
        assert_eq!(predictions, 4);
    }

    #[test]
    fn test_seeded_feed_is_deterministic() {
        let config = AnalyzerConfig::default();
        let mut a = DemoFeed::from_seed(&config, 42);
        let mut b = DemoFeed::from_seed(&config, 42);
        for _ in 0..10 {
            assert_eq!(a.next_lines(), b.next_lines());
        }
    }
}
