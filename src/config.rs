use crate::curve::sampler::DEFAULT_POINT_COUNT;
use crate::errors::ProgressError;
use crate::progress::calculator::{COMPLETE_THRESHOLD, HOT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_REFRESH_DELAY_MS: u64 = 1500;

/// Policy knobs of the progress engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of curve samples drawn per recomputation.
    pub point_count: usize,
    /// Delay before a staleness-triggered metadata refresh fires.
    pub refresh_delay_ms: u64,
    /// Finish rate above which a stage-2 timestamp is expected.
    pub hot_threshold: f64,
    /// Finish rate at or above which a final timestamp is expected.
    pub complete_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            point_count: DEFAULT_POINT_COUNT,
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            hot_threshold: HOT_THRESHOLD,
            complete_threshold: COMPLETE_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Loads the defaults, overridden by any `PROGRESS_*` environment variables.
    pub fn from_env() -> Result<Self, ProgressError> {
        Self::from_env_with_prefix("PROGRESS")
    }

    /// Same as [`Self::from_env`], reading `{prefix}_POINT_COUNT` and friends.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ProgressError> {
        let var = |suffix: &str| format!("{}_{}", prefix, suffix);
        let defaults = Self::default();
        let config = Self {
            point_count: read_env(&var("POINT_COUNT"), defaults.point_count)?,
            refresh_delay_ms: read_env(&var("REFRESH_DELAY_MS"), defaults.refresh_delay_ms)?,
            hot_threshold: read_env(&var("HOT_THRESHOLD"), defaults.hot_threshold)?,
            complete_threshold: read_env(&var("COMPLETE_THRESHOLD"), defaults.complete_threshold)?,
        };
        config.validate()?;
        info!(?config, "Loaded engine configuration");
        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ProgressError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ProgressError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProgressError> {
        if self.point_count < 2 {
            return Err(ProgressError::Config(format!(
                "point_count must be at least 2, got {}",
                self.point_count
            )));
        }
        let in_range = |v: f64| v > 0.0 && v <= 100.0;
        if !in_range(self.hot_threshold) || !in_range(self.complete_threshold) {
            return Err(ProgressError::Config(format!(
                "thresholds must lie in (0, 100], got hot={} complete={}",
                self.hot_threshold, self.complete_threshold
            )));
        }
        if self.hot_threshold >= self.complete_threshold {
            return Err(ProgressError::Config(format!(
                "hot threshold {} must be below complete threshold {}",
                self.hot_threshold, self.complete_threshold
            )));
        }
        Ok(())
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

fn read_env<T>(name: &str, default: T) -> Result<T, ProgressError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => {
            debug!(var = name, value = %raw, "Overriding config from environment");
            raw.trim()
                .parse()
                .map_err(|e| ProgressError::Config(format!("invalid {}: {}", name, e)))
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_overrides_only_given_fields() {
        let config = EngineConfig::from_json(r#"{ "refresh_delay_ms": 250 }"#).unwrap();
        assert_eq!(config.refresh_delay(), Duration::from_millis(250));
        assert_eq!(config.point_count, 40);
        assert_eq!(config.hot_threshold, 66.6);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = EngineConfig::from_json(r#"{ "hot_threshold": 100.0, "complete_threshold": 90.0 }"#)
            .unwrap_err();
        assert!(matches!(err, ProgressError::Config(_)));
    }

    #[test]
    fn env_overrides_and_rejects_garbage() {
        // Each prefix is used by this test alone.
        unsafe {
            env::set_var("LP_CFG_OVERRIDE_REFRESH_DELAY_MS", " 300 ");
            env::set_var("LP_CFG_OVERRIDE_HOT_THRESHOLD", "50");
            env::set_var("LP_CFG_GARBAGE_POINT_COUNT", "forty");
        }

        let config = EngineConfig::from_env_with_prefix("LP_CFG_OVERRIDE").unwrap();
        assert_eq!(config.refresh_delay(), Duration::from_millis(300));
        assert_eq!(config.hot_threshold, 50.0);
        assert_eq!(config.point_count, 40);
        assert_eq!(config.complete_threshold, 100.0);

        let err = EngineConfig::from_env_with_prefix("LP_CFG_GARBAGE").unwrap_err();
        assert!(
            matches!(&err, ProgressError::Config(msg) if msg.contains("LP_CFG_GARBAGE_POINT_COUNT")),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn env_without_overrides_yields_defaults() {
        assert_eq!(
            EngineConfig::from_env_with_prefix("LP_CFG_UNSET").unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn rejects_single_point() {
        assert!(EngineConfig::from_json(r#"{ "point_count": 1 }"#).is_err());
    }
}
