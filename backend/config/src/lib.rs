//! `reelforge-config`: configuration and persisted client state.
//!
//! Provides:
//! - typed `config.yaml` schema with defaults and validation
//! - `${ENV_VAR}` substitution and `REELFORGE_*` overrides
//! - atomic state writes
//! - `state.json` client state (`userId`, `user`, `aiPoints_settings`)

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod state;
pub mod validation;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub use defaults::{apply_all_defaults, Environment, DEV_API_BASE, PROD_API_BASE};
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{ApiConfig, LoggingConfig, PointsConfig, ReelForgeConfig};
pub use state::{generate_user_id, load_state, save_state, state_file_path, ClientState};
pub use validation::{validate, ConfigValidationError, ValidationReport};

/// Load a config file, resolve env references and overrides, apply
/// defaults, and validate.
pub async fn load_and_prepare(path: &Path) -> Result<ReelForgeConfig> {
    let raw = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: ReelForgeConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, &std::env::vars().collect());
    let config = apply_all_defaults(config, Environment::from_env());

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}
