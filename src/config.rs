use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::extract::ExtractionStrategy;

// ---------------------------------------------------------------------------
// ObserveConfig – settings shared by the CLI and the viewer
// ---------------------------------------------------------------------------

/// Settings loaded from a JSON file; missing fields take their defaults.
///
/// ```json
/// {
///   "strategy": { "mode": "weighted-neighborhood", "b": 2.0 },
///   "velocity_range": [-200.0, 50.0],
///   "rest_frequency_mhz": 1420.405751786
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    pub strategy: ExtractionStrategy,
    /// Plotted velocity window in km/s.
    pub velocity_range: [f64; 2],
    /// Overrides the rest frequency found in the cube header.
    pub rest_frequency_mhz: Option<f64>,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::SinglePixel,
            velocity_range: [-200.0, 50.0],
            rest_frequency_mhz: None,
        }
    }
}

impl ObserveConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text).context("parsing config")?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        let [lo, hi] = self.velocity_range;
        ensure!(lo < hi, "velocity range [{lo}, {hi}] is empty");
        if let ExtractionStrategy::WeightedNeighborhood { b } = self.strategy {
            ensure!(b.is_finite() && b > 0.0, "neighbourhood width b must be positive, got {b}");
        }
        if let Some(f) = self.rest_frequency_mhz {
            ensure!(f > 0.0, "rest frequency must be positive, got {f}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config: ObserveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ObserveConfig::default());
        assert_eq!(config.velocity_range, [-200.0, 50.0]);
    }

    #[test]
    fn parses_neighbourhood_strategy() {
        let config: ObserveConfig =
            serde_json::from_str(r#"{"strategy": {"mode": "weighted-neighborhood", "b": 2.0}}"#)
                .unwrap();
        assert_eq!(config.strategy, ExtractionStrategy::WeightedNeighborhood { b: 2.0 });
        assert!(config.check().is_ok());
    }

    #[test]
    fn rejects_inverted_range_and_bad_width() {
        let mut config = ObserveConfig {
            velocity_range: [50.0, -200.0],
            ..Default::default()
        };
        assert!(config.check().is_err());

        config.velocity_range = [-200.0, 50.0];
        config.strategy = ExtractionStrategy::WeightedNeighborhood { b: 0.0 };
        assert!(config.check().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observe.json");
        std::fs::write(&path, r#"{"velocity_range": [-100.0, 100.0], "rest_frequency_mhz": 1665.4018}"#)
            .unwrap();
        let config = ObserveConfig::load(&path).unwrap();
        assert_eq!(config.velocity_range, [-100.0, 100.0]);
        assert_eq!(config.rest_frequency_mhz, Some(1665.4018));
        assert_eq!(config.strategy, ExtractionStrategy::SinglePixel);
    }
}
