use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{MetricsError, Result};

/// Environment variable naming the config file when none is passed explicitly
pub const CONFIG_PATH_ENV: &str = "OGM_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quality: QualityConfig,
    pub review: ReviewConfig,
}

/// Thresholds used by the per-record and cross-record data-quality checks
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Scores below this are flagged by the confidence check
    pub confidence_threshold: f64,
    /// Allowed difference between reported and calculated BOE, in percent
    pub boe_tolerance_pct: f64,
    /// Thousand cubic feet of gas per barrel of oil equivalent
    pub gas_to_boe_ratio: f64,
    pub min_period_days: i64,
    pub max_period_days: i64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.80,
            boe_tolerance_pct: 10.0,
            gas_to_boe_ratio: 6.0,
            min_period_days: 28,
            max_period_days: 366,
        }
    }
}

/// Confidence bands used when triaging low-confidence rows
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Rows strictly below this score enter the review queue
    pub default_threshold: f64,
    pub critical_below: f64,
    pub high_below: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_threshold: 1.0,
            critical_below: 0.5,
            high_below: 0.7,
        }
    }
}

impl Config {
    /// Load from an explicit path, else from `OGM_CONFIG`, else fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(Path::new(path.trim())),
            _ => {
                debug!("No config file configured, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            MetricsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let q = &self.quality;
        if !(0.0..=1.0).contains(&q.confidence_threshold) {
            return Err(MetricsError::Config(format!(
                "quality.confidence_threshold must be within 0..=1, got {}",
                q.confidence_threshold
            )));
        }
        if q.boe_tolerance_pct < 0.0 {
            return Err(MetricsError::Config("quality.boe_tolerance_pct must not be negative".to_string()));
        }
        if q.gas_to_boe_ratio <= 0.0 {
            return Err(MetricsError::Config("quality.gas_to_boe_ratio must be positive".to_string()));
        }
        if q.min_period_days > q.max_period_days {
            return Err(MetricsError::Config(format!(
                "quality.min_period_days ({}) exceeds quality.max_period_days ({})",
                q.min_period_days, q.max_period_days
            )));
        }

        let r = &self.review;
        if r.critical_below > r.high_below {
            return Err(MetricsError::Config(
                "review.critical_below must not exceed review.high_below".to_string(),
            ));
        }

        Ok(())
    }
}
