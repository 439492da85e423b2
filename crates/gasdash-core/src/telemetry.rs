//! Telemetry records decoded from the analyzer wire stream
//!
//! Each wire line is `"<channel>,<value>"`. The channel is either a sensor
//! name or the reserved prediction slot; the value stays a string until the
//! presentation layer decides how to interpret it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved channel name carrying the classifier's gas-class label
pub const PREDICTION_CHANNEL: &str = "Prediction";

/// Errors that can occur while decoding a wire line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 2 comma-separated fields, got {count}: '{line}'")]
    FieldCount {
        /// Number of fields the line actually split into
        count: usize,
        /// The offending line
        line: String,
    },
}

/// One parsed `(channel, value)` pair from the wire stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Left-hand field: a sensor name or [`PREDICTION_CHANNEL`]
    pub channel: String,
    /// Right-hand field, uninterpreted
    pub value: String,
}

impl TelemetryRecord {
    /// Parse one wire line into a record
    ///
    /// The line must split into exactly two comma-separated fields; both
    /// fields are trimmed. Anything else is malformed and gets dropped by
    /// the caller.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(RecordError::FieldCount {
                count: fields.len(),
                line: line.to_string(),
            });
        }
        Ok(Self {
            channel: fields[0].trim().to_string(),
            value: fields[1].trim().to_string(),
        })
    }

    /// Whether this record carries a prediction label rather than a reading
    pub fn is_prediction(&self) -> bool {
        self.channel == PREDICTION_CHANNEL
    }
}
