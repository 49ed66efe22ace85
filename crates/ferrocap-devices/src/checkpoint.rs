//! Serializable snapshots of a device's switching history.

use std::fs;
use std::path::Path;

use ferrocap_core::{Direction, HistoryManager, HistoryStack, ParameterSet, TurningPoint};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Turning-point history plus the last accepted sample.
///
/// ```json
/// {
///   "polarity": "up",
///   "points": [{ "voltage": 0.0, "direction": "up", "polarization": -5e-6 }],
///   "last_voltage": 1.2,
///   "reversals": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryCheckpoint {
    /// Initial major-loop polarity of the device.
    pub polarity: Direction,
    /// Turning points, oldest first.
    pub points: Vec<TurningPoint>,
    /// Last accepted voltage sample, if any.
    pub last_voltage: Option<f64>,
    /// Reversals recorded since the last reset. Absent in older payloads,
    /// in which case the stored turning points are counted.
    #[serde(default)]
    pub reversals: Option<usize>,
}

impl HistoryCheckpoint {
    /// Snapshot a history.
    pub fn capture(history: &HistoryManager) -> Self {
        Self {
            polarity: history.polarity(),
            points: history.stack().points().to_vec(),
            last_voltage: history.last_voltage(),
            reversals: Some(history.reversals()),
        }
    }

    /// Rebuild a history for `params`, rejecting payloads that break the
    /// nesting invariant.
    pub fn into_history(self, params: &ParameterSet) -> Result<HistoryManager> {
        let stack = HistoryStack::from_points(self.points)
            .map_err(|e| Error::Checkpoint(e.to_string()))?;
        HistoryManager::from_parts(
            params,
            self.polarity,
            stack,
            self.last_voltage,
            self.reversals,
        )
        .map_err(|e| Error::Checkpoint(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Checkpoint(format!("malformed payload: {}", e)))
    }

    /// Write the checkpoint as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a checkpoint written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
