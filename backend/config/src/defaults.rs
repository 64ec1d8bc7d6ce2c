//! Config defaults.

use crate::schema::{ApiConfig, LoggingConfig, PointsConfig, ReelForgeConfig};

/// Backend used during development.
pub const DEV_API_BASE: &str = "http://localhost:8080";
/// Hosted backend.
pub const PROD_API_BASE: &str = "https://aijobvideobackend.zeabur.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOW_BALANCE_THRESHOLD: i64 = 50;
pub const WARNING_BALANCE_THRESHOLD: i64 = 100;

/// Which backend the defaults point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// `REELFORGE_ENV=production` selects the hosted backend.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("REELFORGE_ENV").ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") || v.eq_ignore_ascii_case("prod") => {
                Environment::Production
            }
            _ => Environment::Development,
        }
    }

    pub fn api_base(&self) -> &'static str {
        match self {
            Environment::Development => DEV_API_BASE,
            Environment::Production => PROD_API_BASE,
        }
    }
}

/// Fill every unset field.
pub fn apply_all_defaults(config: ReelForgeConfig, env: Environment) -> ReelForgeConfig {
    let config = apply_api_defaults(config, env);
    let config = apply_logging_defaults(config);
    apply_points_defaults(config)
}

fn apply_api_defaults(mut config: ReelForgeConfig, env: Environment) -> ReelForgeConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    if api.base_url.is_none() {
        api.base_url = Some(env.api_base().to_string());
    }
    if let Some(url) = api.base_url.as_mut() {
        while url.ends_with('/') {
            url.pop();
        }
    }
    if api.timeout_secs.is_none() {
        api.timeout_secs = Some(DEFAULT_TIMEOUT_SECS);
    }
    config
}

fn apply_logging_defaults(mut config: ReelForgeConfig) -> ReelForgeConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

fn apply_points_defaults(mut config: ReelForgeConfig) -> ReelForgeConfig {
    let points = config.points.get_or_insert_with(PointsConfig::default);
    points.enabled.get_or_insert(true);
    points.low_balance_threshold.get_or_insert(LOW_BALANCE_THRESHOLD);
    points.warning_balance_threshold.get_or_insert(WARNING_BALANCE_THRESHOLD);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_backend_by_environment() {
        let dev = apply_all_defaults(ReelForgeConfig::default(), Environment::Development);
        assert_eq!(dev.base_url(), DEV_API_BASE);
        let prod = apply_all_defaults(ReelForgeConfig::default(), Environment::Production);
        assert_eq!(prod.base_url(), PROD_API_BASE);
        assert_eq!(Environment::parse(Some("PRODUCTION")), Environment::Production);
        assert_eq!(Environment::parse(None), Environment::Development);
    }

    #[test]
    fn keeps_user_values_and_trims_slash() {
        let cfg = ReelForgeConfig {
            api: Some(ApiConfig { base_url: Some("https://my.api/".into()), timeout_secs: Some(3) }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg, Environment::Production);
        assert_eq!(cfg.base_url(), "https://my.api");
        assert_eq!(cfg.timeout_secs(), 3);
        assert_eq!(cfg.balance_thresholds(), (50, 100));
    }
}
