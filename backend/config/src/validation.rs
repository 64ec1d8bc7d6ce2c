//! Config validation with field paths.

use thiserror::Error;

use crate::schema::ReelForgeConfig;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.to_string(), message: message.into() });
    }

    fn warn(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.to_string(), message: message.into() });
    }
}

pub fn validate(config: &ReelForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_api(config, &mut report);
    validate_logging(config, &mut report);
    validate_points(config, &mut report);
    report
}

fn validate_api(config: &ReelForgeConfig, report: &mut ValidationReport) {
    let Some(api) = &config.api else { return };
    if let Some(url) = &api.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("api.baseUrl", format!("Expected an http(s) URL, got '{url}'"));
        }
    }
    if api.timeout_secs == Some(0) {
        report.error("api.timeoutSecs", "Timeout must be greater than zero");
    }
}

fn validate_logging(config: &ReelForgeConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else { return };
    if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown level '{level}'; falling back to info"));
    }
}

fn validate_points(config: &ReelForgeConfig, report: &mut ValidationReport) {
    let (low, warning) = config.balance_thresholds();
    if low < 0 {
        report.error("points.lowBalanceThreshold", "Threshold cannot be negative");
    }
    if low > warning {
        report.warn(
            "points.warningBalanceThreshold",
            "Warning threshold is below the low-balance threshold",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ApiConfig, PointsConfig};

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ReelForgeConfig::default()).is_valid());
    }

    #[test]
    fn flags_bad_values() {
        let cfg = ReelForgeConfig {
            api: Some(ApiConfig { base_url: Some("localhost:8080".into()), timeout_secs: Some(0) }),
            points: Some(PointsConfig {
                low_balance_threshold: Some(200),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings.len(), 1);
    }
}
