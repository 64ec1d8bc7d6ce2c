//! Persisted points UI settings (`aiPoints_settings`).
//!
//! The blob may carry keys written by other clients; updates merge into it
//! instead of replacing it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const SETTINGS_KEY: &str = "aiPoints_settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSettings {
    #[serde(default = "default_visible")]
    pub badge_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Default for PointsSettings {
    fn default() -> Self {
        Self { badge_visible: true }
    }
}

impl PointsSettings {
    /// Read settings from a stored blob. Anything unreadable yields defaults.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(v @ Value::Object(_)) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable points settings; using defaults");
                Self::default()
            }),
            Some(Value::Null) | None => Self::default(),
            Some(_) => {
                warn!("Points settings is not an object; using defaults");
                Self::default()
            }
        }
    }

    /// Merge these settings over `existing`, keeping unrelated keys.
    pub fn merge_into(&self, existing: Option<&Value>) -> Value {
        let mut map = match existing {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };
        map.insert("badgeVisible".to_string(), Value::Bool(self.badge_visible));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_to_visible() {
        assert!(PointsSettings::from_value(None).badge_visible);
        assert!(PointsSettings::from_value(Some(&json!({}))).badge_visible);
        assert!(PointsSettings::from_value(Some(&json!("garbage"))).badge_visible);
        assert!(!PointsSettings::from_value(Some(&json!({"badgeVisible": false}))).badge_visible);
    }

    #[test]
    fn merge_keeps_other_keys() {
        let existing = json!({"theme": "dark", "badgeVisible": true});
        let merged = PointsSettings { badge_visible: false }.merge_into(Some(&existing));
        assert_eq!(merged, json!({"theme": "dark", "badgeVisible": false}));
    }
}
