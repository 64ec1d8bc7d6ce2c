//! Persisted client state (`state.json`).
//!
//! Keys:
//! - `userId`: agent user id, generated as `web-xxxxxx` on first run;
//! - `user`: signed-in account object; points calls require its `id`;
//! - `aiPoints_settings`: points UI settings blob, shared with other clients.
//!
//! Writes are last-write-wins.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::io::write_json_atomic;

const STATE_FILE_NAME: &str = "state.json";
const USER_ID_PREFIX: &str = "web-";
const USER_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const USER_ID_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    #[serde(rename = "aiPoints_settings", default, skip_serializing_if = "Option::is_none")]
    pub ai_points_settings: Option<Value>,
}

impl ClientState {
    /// Return the agent user id, generating one if absent.
    /// The second value is true when a new id was generated.
    pub fn ensure_user_id(&mut self) -> (String, bool) {
        match self.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => (id.to_string(), false),
            None => {
                let id = generate_user_id();
                info!("Generated new agent user id");
                self.user_id = Some(id.clone());
                (id, true)
            }
        }
    }

    /// Signed-in account id, if any.
    pub fn account_id(&self) -> Option<String> {
        let id = self.user.as_ref()?.get("id")?;
        match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn sign_in(&mut self, account_id: impl Into<String>) {
        let mut user = match self.user.take() {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        user.insert("id".to_string(), Value::String(account_id.into()));
        self.user = Some(Value::Object(user));
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }
}

/// `web-` followed by six lowercase base-36 characters.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..USER_ID_LEN)
        .map(|_| USER_ID_CHARSET[rng.gen_range(0..USER_ID_CHARSET.len())] as char)
        .collect();
    format!("{USER_ID_PREFIX}{suffix}")
}

pub fn state_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(STATE_FILE_NAME)
}

/// Load state. Missing or unreadable files yield empty state.
pub async fn load_state(path: &Path) -> ClientState {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No client state; starting fresh");
            return ClientState::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Corrupt client state; starting fresh");
        ClientState::default()
    })
}

pub async fn save_state(state: &ClientState, path: &Path) -> Result<()> {
    write_json_atomic(state, path)
        .await
        .with_context(|| format!("Failed to save client state: {}", path.display()))
}
