//! Device configuration loaded from JSON.

use std::fs;
use std::path::Path;

use ferrocap_core::{Direction, ParameterSet};
use ferrocap_solver::ConvergenceCriteria;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything needed to build a [`FerroCapacitor`](crate::FerroCapacitor).
///
/// Missing fields fall back to their defaults, so a document only needs to
/// name what it changes:
///
/// ```json
/// { "params": { "slope_factor": 4.0, "thickness": 1e-8 }, "initial_polarity": "down" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub params: ParameterSet,
    pub criteria: ConvergenceCriteria,
    /// Direction the major loop is travelled before the first reversal.
    pub initial_polarity: Direction,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            params: ParameterSet::default(),
            criteria: ConvergenceCriteria::default(),
            initial_polarity: Direction::Up,
        }
    }
}

impl DeviceConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.params.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = DeviceConfig::from_json_str(
            r#"{ "params": { "slope_factor": 4.0 }, "criteria": { "max_iterations": 80 } }"#,
        )
        .unwrap();
        assert_eq!(config.params.slope_factor, 4.0);
        assert_eq!(config.params.thickness, 5e-9);
        assert_eq!(config.criteria.max_iterations, 80);
        assert_eq!(config.criteria.damping_fraction, 0.5);
        assert_eq!(config.initial_polarity, Direction::Up);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = DeviceConfig::from_json_str("{}").unwrap();
        assert_eq!(config.params, ParameterSet::default());
    }

    #[test]
    fn test_invalid_parameter_is_rejected() {
        let err = DeviceConfig::from_json_str(r#"{ "params": { "thickness": -1.0 } }"#)
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::Core(ferrocap_core::Error::InvalidParameter {
                    name: "thickness",
                    ..
                })
            ),
            "{}",
            err
        );
    }

    #[test]
    fn test_syntax_error_is_json_error() {
        assert!(matches!(
            DeviceConfig::from_json_str("{ params"),
            Err(Error::Json(_))
        ));
    }
}
