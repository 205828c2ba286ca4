//! Navigation tuning.
//!
//! Defaults match the values the app ships with; a JSON document
//! (e.g. passed over JNI) may override any subset of them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::ports::FixOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Zoom used when navigation starts, stops or is recentered.
    pub close_zoom: f64,
    /// How long pan signals are ignored after a programmatic camera move.
    pub suppression_window_ms: u64,
    /// Matcher stops scanning once a step is this many times farther than the best.
    pub prune_factor: f64,
    pub high_accuracy: bool,
    pub initial_fix_timeout_ms: u64,
    pub navigation_fix_timeout_ms: u64,
    pub tracking_fix_timeout_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            close_zoom: 18.0,
            suppression_window_ms: 100,
            prune_factor: 2.0,
            high_accuracy: true,
            initial_fix_timeout_ms: 10_000,
            navigation_fix_timeout_ms: 1_000,
            tracking_fix_timeout_ms: 5_000,
        }
    }
}

impl NavigationConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NavError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NavError> {
        if self.close_zoom.is_nan() || self.close_zoom <= 0.0 {
            return Err(NavError::Config(format!(
                "close_zoom must be positive, got {}",
                self.close_zoom
            )));
        }
        if self.prune_factor.is_nan() || self.prune_factor < 1.0 {
            return Err(NavError::Config(format!(
                "prune_factor must be at least 1, got {}",
                self.prune_factor
            )));
        }
        Ok(())
    }

    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }

    pub fn initial_fix_options(&self) -> FixOptions {
        self.fix_options(self.initial_fix_timeout_ms)
    }

    pub fn navigation_fix_options(&self) -> FixOptions {
        self.fix_options(self.navigation_fix_timeout_ms)
    }

    pub fn tracking_fix_options(&self) -> FixOptions {
        self.fix_options(self.tracking_fix_timeout_ms)
    }

    fn fix_options(&self, timeout_ms: u64) -> FixOptions {
        FixOptions {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(timeout_ms),
            maximum_age: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = NavigationConfig::from_json(r#"{"close_zoom": 17}"#).unwrap();
        assert_eq!(config.close_zoom, 17.0);
        assert_eq!(config.suppression_window(), Duration::from_millis(100));
        assert_eq!(config.prune_factor, 2.0);
    }

    #[test]
    fn rejects_bad_prune_factor() {
        let err = NavigationConfig::from_json(r#"{"prune_factor": 0.5}"#).unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(NavigationConfig::from_json("{").is_err());
    }

    #[test]
    fn fix_options_use_configured_timeouts() {
        let config = NavigationConfig::default();
        assert_eq!(
            config.navigation_fix_options().timeout,
            Duration::from_secs(1)
        );
        assert_eq!(
            config.initial_fix_options().timeout,
            Duration::from_secs(10)
        );
        assert_eq!(config.tracking_fix_options().maximum_age, Duration::ZERO);
    }
}
