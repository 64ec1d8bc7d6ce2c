//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR}` references inside string values, resolved at load time
//!   (`$${VAR}` stays a literal `${VAR}`);
//! - whole-field overrides from `REELFORGE_*` variables.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::schema::{ApiConfig, LoggingConfig, ReelForgeConfig};

/// `${VAR}` or the escaped `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const API_BASE_VAR: &str = "REELFORGE_API_BASE";
pub const LOG_DIR_VAR: &str = "REELFORGE_LOG_DIR";

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references using `env`.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }
    let mut missing: Option<MissingEnvVarError> = None;
    let out = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });
    if let Some(err) = missing {
        bail!(err);
    }
    Ok(out.into_owned())
}

/// Apply `REELFORGE_*` overrides on top of the file config.
pub fn apply_env_overrides(mut config: ReelForgeConfig, env: &HashMap<String, String>) -> ReelForgeConfig {
    if let Some(base) = env.get(API_BASE_VAR).filter(|v| !v.trim().is_empty()) {
        debug!(var = API_BASE_VAR, "API base overridden from environment");
        config.api.get_or_insert_with(ApiConfig::default).base_url = Some(base.trim().to_string());
    }
    if let Some(dir) = env.get(LOG_DIR_VAR).filter(|v| !v.trim().is_empty()) {
        config.logging.get_or_insert_with(LoggingConfig::default).dir = Some(dir.trim().to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_vars() {
        let v = json!({"api": {"baseUrl": "https://${HOST}/v1"}});
        let out = resolve_env_vars_with(&v, &env(&[("HOST", "api.test")])).unwrap();
        assert_eq!(out["api"]["baseUrl"], "https://api.test/v1");
    }

    #[test]
    fn missing_var_names_path() {
        let v = json!({"logging": {"dir": "${LOG_HOME}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("LOG_HOME"));
        assert!(err.contains("logging.dir"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!("cost $${PRICE}");
        assert_eq!(resolve_env_vars_with(&v, &HashMap::new()).unwrap(), "cost ${PRICE}");
    }

    #[test]
    fn overrides_base_url() {
        let cfg = apply_env_overrides(
            ReelForgeConfig::default(),
            &env(&[(API_BASE_VAR, " https://staging.test ")]),
        );
        assert_eq!(cfg.base_url(), "https://staging.test");
    }
}
