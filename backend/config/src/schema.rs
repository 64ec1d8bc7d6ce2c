//! ReelForge configuration schema (`config.yaml`).
//!
//! Every field is optional on disk; `defaults::apply_all_defaults` fills the
//! gaps after loading.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelForgeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<PointsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `error` | `warn` | `info` | `debug` | `trace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_balance_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_balance_threshold: Option<i64>,
}

impl ReelForgeConfig {
    pub fn base_url(&self) -> &str {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(crate::defaults::DEV_API_BASE)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(crate::defaults::DEFAULT_TIMEOUT_SECS)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn points_enabled(&self) -> bool {
        self.points.as_ref().and_then(|p| p.enabled).unwrap_or(true)
    }

    /// `(low, warning)` badge thresholds.
    pub fn balance_thresholds(&self) -> (i64, i64) {
        let points = self.points.as_ref();
        (
            points
                .and_then(|p| p.low_balance_threshold)
                .unwrap_or(crate::defaults::LOW_BALANCE_THRESHOLD),
            points
                .and_then(|p| p.warning_balance_threshold)
                .unwrap_or(crate::defaults::WARNING_BALANCE_THRESHOLD),
        )
    }
}
