use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use logging::{init_logger, redact_user_id, LogOutput};
use reelforge_client::{AgentClient, ApiClient};
use reelforge_config::{
    config_dir, config_file_path, load_and_prepare, load_state, save_state, state_file_path,
    ClientState, ReelForgeConfig,
};
use reelforge_points::{PointsSettings, Thresholds};

/// Everything a subcommand needs: resolved config, persisted state and an
/// API client.
pub struct CliContext {
    pub config: ReelForgeConfig,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub state: ClientState,
    /// Agent user id (`userId`), generated on first run.
    pub user_id: String,
    pub api: Arc<ApiClient>,
}

impl CliContext {
    pub async fn load(config_path: Option<PathBuf>, log_output: LogOutput) -> Result<Self> {
        let dir = config_dir();
        let config_path = config_path.unwrap_or_else(|| config_file_path(&dir));
        let config = load_and_prepare(&config_path)
            .await
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

        let log_dir = config.log_dir().map(PathBuf::from).unwrap_or_else(|| dir.join("logs"));
        init_logger(&log_dir, config.log_level(), log_output)?;

        let state_path = state_file_path(&dir);
        let mut state = load_state(&state_path).await;
        let (user_id, created) = state.ensure_user_id();
        if created {
            save_state(&state, &state_path).await?;
        }
        info!(
            user = %redact_user_id(&user_id),
            signed_in = state.account_id().is_some(),
            api = %config.base_url(),
            "ReelForge CLI starting"
        );

        let api = ApiClient::new(config.base_url(), Duration::from_secs(config.timeout_secs()))?;
        Ok(Self {
            config,
            config_path,
            state_path,
            state,
            user_id,
            api: Arc::new(api),
        })
    }

    pub fn agents(&self) -> AgentClient {
        AgentClient::new(self.api.clone(), self.user_id.clone())
    }

    pub fn points_settings(&self) -> PointsSettings {
        PointsSettings::from_value(self.state.ai_points_settings.as_ref())
    }

    pub fn thresholds(&self) -> Thresholds {
        let (low, warning) = self.config.balance_thresholds();
        Thresholds { low, warning }
    }

    pub async fn save_state(&self) -> Result<()> {
        save_state(&self.state, &self.state_path).await
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}
