//! Dashboard display state and the bounded queue drain

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use super::history::HistoricalWindow;
use crate::config::{AnalyzerConfig, SensorSpec};
use crate::telemetry::TelemetryRecord;

/// Connection status line shown at the foot of the dashboard
///
/// Overwritten whole on every drained status string; never appended.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Human-readable network state
    pub message: String,
    /// Wall-clock time of the refresh cycle that applied the message
    pub updated_at: DateTime<Local>,
}

/// Per-sensor display card
#[derive(Debug, Clone, Serialize)]
pub struct SensorCard {
    /// Channel name (e.g. `MQ-3`)
    pub name: String,
    /// Unit label shown next to readings
    pub unit: String,
    /// Alert threshold: readings strictly below it are alerts
    pub threshold: f64,
    /// Most recent reading, if any arrived yet
    pub last_reading: Option<f64>,
    /// Whether the last reading sits below the threshold
    pub alert: bool,
    /// When the first reading arrived
    pub active_since: Option<DateTime<Local>>,
    /// Trend window for this sensor
    pub window: HistoricalWindow,
}

impl SensorCard {
    fn new(spec: &SensorSpec, window_len: usize) -> Self {
        Self {
            name: spec.name.clone(),
            unit: spec.unit.clone(),
            threshold: spec.threshold,
            last_reading: None,
            alert: false,
            active_since: None,
            window: HistoricalWindow::new(window_len),
        }
    }

    /// Whether the sensor has reported at least once
    pub fn is_active(&self) -> bool {
        self.active_since.is_some()
    }

    /// Formatted reading for display, e.g. `"0.42 Rs/R0"`
    pub fn display_value(&self) -> String {
        match self.last_reading {
            Some(value) => format!("{:.2} {}", value, self.unit),
            None => "---".to_string(),
        }
    }
}

/// One render instruction forwarded to the rendering layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderUpdate {
    /// A sensor card changed
    Sensor {
        /// Channel name
        name: String,
        /// The new reading
        value: f64,
        /// Formatted reading with unit
        display: String,
        /// Whether the reading is below the sensor's threshold
        alert: bool,
        /// Trend window snapshot, oldest-first
        trend: Vec<f64>,
    },
    /// The prediction label changed
    Prediction {
        /// Upper-cased gas-class label
        label: String,
    },
    /// The connection status line changed
    Status {
        /// Human-readable network state
        message: String,
        /// When the status was applied
        updated_at: DateTime<Local>,
    },
}

/// In-memory display state for the whole dashboard
///
/// Touched only from the presentation side; the link worker never sees it.
pub struct DashboardState {
    cards: BTreeMap<String, SensorCard>,
    prediction: Option<String>,
    status: Option<ConnectionStatus>,
}

impl DashboardState {
    /// Build the initial state from the configured sensor set
    pub fn new(config: &AnalyzerConfig) -> Self {
        let cards = config
            .sensors
            .iter()
            .map(|spec| (spec.name.clone(), SensorCard::new(spec, config.window_size)))
            .collect();
        Self {
            cards,
            prediction: None,
            status: None,
        }
    }

    /// One bounded refresh cycle: drain both queues until empty
    ///
    /// Data first, then status. Queue reads never block; an empty queue
    /// just ends the drain for this cycle. Returns the render instructions
    /// in application order.
    pub fn drain_once(
        &mut self,
        data_rx: &Receiver<TelemetryRecord>,
        status_rx: &Receiver<String>,
    ) -> Vec<RenderUpdate> {
        let mut updates = Vec::new();
        while let Ok(record) = data_rx.try_recv() {
            if let Some(update) = self.apply_record(record) {
                updates.push(update);
            }
        }
        while let Ok(message) = status_rx.try_recv() {
            updates.push(self.apply_status(message));
        }
        updates
    }

    /// Apply one telemetry record; `None` means it was dropped or ignored
    fn apply_record(&mut self, record: TelemetryRecord) -> Option<RenderUpdate> {
        if record.is_prediction() {
            let label = record.value.to_uppercase();
            self.prediction = Some(label.clone());
            return Some(RenderUpdate::Prediction { label });
        }

        let card = match self.cards.get_mut(&record.channel) {
            Some(card) => card,
            None => {
                debug!(channel = %record.channel, "record for unknown channel ignored");
                return None;
            }
        };

        let value: f64 = match record.value.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    channel = %record.channel,
                    value = %record.value,
                    "non-numeric sensor reading dropped"
                );
                return None;
            }
        };

        card.last_reading = Some(value);
        card.alert = value < card.threshold;
        if card.active_since.is_none() {
            card.active_since = Some(Local::now());
        }
        card.window.push(value);

        Some(RenderUpdate::Sensor {
            name: card.name.clone(),
            value,
            display: card.display_value(),
            alert: card.alert,
            trend: card.window.to_vec(),
        })
    }

    /// Overwrite the connection status, tagged with the refresh time
    fn apply_status(&mut self, message: String) -> RenderUpdate {
        let status = ConnectionStatus {
            message,
            updated_at: Local::now(),
        };
        self.status = Some(status.clone());
        RenderUpdate::Status {
            message: status.message,
            updated_at: status.updated_at,
        }
    }

    /// Current prediction label, if one arrived
    pub fn prediction(&self) -> Option<&str> {
        self.prediction.as_deref()
    }

    /// Current connection status, if one arrived
    pub fn status(&self) -> Option<&ConnectionStatus> {
        self.status.as_ref()
    }

    /// Look up a sensor card by channel name
    pub fn card(&self, name: &str) -> Option<&SensorCard> {
        self.cards.get(name)
    }

    /// Iterate all sensor cards, ordered by channel name
    pub fn cards(&self) -> impl Iterator<Item = &SensorCard> {
        self.cards.values()
    }

    /// Serializable snapshot of the whole display state
    ///
    /// What a front end polls instead of holding references into the
    /// refresh loop's owned state.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "sensors": self.cards.values().collect::<Vec<_>>(),
            "prediction": self.prediction,
            "status": self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    fn state() -> DashboardState {
        DashboardState::new(&AnalyzerConfig::default())
    }

    fn record(line: &str) -> TelemetryRecord {
        TelemetryRecord::parse(line).unwrap()
    }

    #[test]
    fn test_reading_below_threshold_alerts() {
        let mut state = state();
        let update = state.apply_record(record("MQ-3,0.42")).unwrap();
        match update {
            RenderUpdate::Sensor {
                name,
                value,
                display,
                alert,
                trend,
            } => {
                assert_eq!(name, "MQ-3");
                assert_eq!(value, 0.42);
                assert_eq!(display, "0.42 Rs/R0");
                assert!(alert);
                assert_eq!(trend.len(), 50);
                assert_eq!(*trend.last().unwrap(), 0.42);
            }
            other => panic!("expected sensor update, got {:?}", other),
        }
        let card = state.card("MQ-3").unwrap();
        assert!(card.alert);
        assert!(card.is_active());
    }

    #[test]
    fn test_threshold_boundary_is_not_alert() {
        let mut state = state();
        state.apply_record(record("MQ-3,0.5")).unwrap();
        assert!(!state.card("MQ-3").unwrap().alert);

        state.apply_record(record("MQ-3,0.499")).unwrap();
        assert!(state.card("MQ-3").unwrap().alert);

        state.apply_record(record("MQ-3,0.501")).unwrap();
        assert!(!state.card("MQ-3").unwrap().alert);
    }

    #[test]
    fn test_prediction_upper_cased_without_sensor_changes() {
        let mut state = state();
        let update = state.apply_record(record("Prediction,methane")).unwrap();
        match update {
            RenderUpdate::Prediction { label } => assert_eq!(label, "METHANE"),
            other => panic!("expected prediction update, got {:?}", other),
        }
        assert_eq!(state.prediction(), Some("METHANE"));
        for card in state.cards() {
            assert!(!card.is_active());
            assert_eq!(card.last_reading, None);
        }
    }

    #[test]
    fn test_non_numeric_sensor_value_dropped() {
        let mut state = state();
        assert!(state.apply_record(record("MQ-3,abc")).is_none());
        let card = state.card("MQ-3").unwrap();
        assert_eq!(card.last_reading, None);
        assert!(!card.is_active());
        assert!(card.window.iter().all(|v| v == 0.0));
    }

    #[test]
    fn test_unknown_channel_ignored() {
        let mut state = state();
        assert!(state.apply_record(record("MQ-99,0.1")).is_none());
        assert_eq!(state.prediction(), None);
    }

    #[test]
    fn test_drain_applies_all_pending_data_and_no_status() {
        let mut state = state();
        let (data_tx, data_rx) = mpsc::channel();
        let (_status_tx, status_rx) = mpsc::channel::<String>();

        data_tx.send(record("MQ-3,0.42")).unwrap();
        data_tx.send(record("MQ-135,1.1")).unwrap();
        data_tx.send(record("Prediction,butane")).unwrap();

        let updates = state.drain_once(&data_rx, &status_rx);
        assert_eq!(updates.len(), 3);
        assert!(matches!(updates[2], RenderUpdate::Prediction { .. }));

        // Next cycle: queues empty, drain applies nothing and returns.
        let updates = state.drain_once(&data_rx, &status_rx);
        assert!(updates.is_empty());
    }

    #[test]
    fn test_status_overwritten_last_wins() {
        let mut state = state();
        let (_data_tx, data_rx) = mpsc::channel::<TelemetryRecord>();
        let (status_tx, status_rx) = mpsc::channel();

        status_tx.send("Connecting to 10.0.0.7:8080...".to_string()).unwrap();
        status_tx.send("Connected to 10.0.0.7:8080".to_string()).unwrap();

        let updates = state.drain_once(&data_rx, &status_rx);
        assert_eq!(updates.len(), 2);
        assert_eq!(
            state.status().unwrap().message,
            "Connected to 10.0.0.7:8080"
        );
    }

    #[test]
    fn test_snapshot_serializes_display_state() {
        let mut state = state();
        state.apply_record(record("MQ-3,0.42")).unwrap();
        state.apply_record(record("Prediction,ammonia")).unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot["prediction"], "AMMONIA");
        let sensors = snapshot["sensors"].as_array().unwrap();
        assert_eq!(sensors.len(), 4);
        let mq3 = sensors.iter().find(|s| s["name"] == "MQ-3").unwrap();
        assert_eq!(mq3["alert"], true);
        assert_eq!(mq3["last_reading"], 0.42);
    }

    #[test]
    fn test_window_eviction_through_drain() {
        let mut state = state();
        for i in 0..60 {
            state
                .apply_record(record(&format!("MQ-136,{}.0", i)))
                .unwrap();
        }
        let card = state.card("MQ-136").unwrap();
        assert_eq!(card.window.len(), 50);
        // First ten readings (0..9) evicted along with the zero fill.
        assert_eq!(card.window.iter().next(), Some(10.0));
        assert_eq!(card.window.latest(), Some(59.0));
    }
}
