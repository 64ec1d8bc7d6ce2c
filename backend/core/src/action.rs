//! Billable action descriptors.
//!
//! Every billable control carries a descriptor in the wire form
//! `module:mode:count`, e.g. `script:oneclick:2`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;

/// Mode used when a descriptor leaves it empty.
pub const DEFAULT_MODE: &str = "oneclick";

/// The modules the points backend bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillableModule {
    Positioning,
    Ideation,
    Script,
}

impl BillableModule {
    /// Key used in descriptors and page ids.
    pub fn key(&self) -> &'static str {
        match self {
            BillableModule::Positioning => "positioning",
            BillableModule::Ideation => "ideation",
            BillableModule::Script => "script",
        }
    }

    /// Module name the points backend expects.
    pub fn label(&self) -> &'static str {
        match self {
            BillableModule::Positioning => "定位",
            BillableModule::Ideation => "選題",
            BillableModule::Script => "腳本",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [BillableModule::Positioning, BillableModule::Ideation, BillableModule::Script]
            .into_iter()
            .find(|m| m.label() == label)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "positioning" => Some(BillableModule::Positioning),
            "ideation" => Some(BillableModule::Ideation),
            "script" => Some(BillableModule::Script),
            _ => None,
        }
    }
}

/// Map a descriptor module key to its backend label; unknown keys pass through.
pub fn module_label(key: &str) -> String {
    BillableModule::from_key(key)
        .map(|m| m.label().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// What a billable action is: module, mode and unit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Backend module label (`定位`, `選題`, `腳本`, or a passthrough key).
    pub module: String,
    pub mode: String,
    pub count: u32,
}

impl ActionDescriptor {
    pub fn new(module: BillableModule, mode: impl Into<String>, count: u32) -> Self {
        Self { module: module.label().to_string(), mode: mode.into(), count }
    }
}

impl FromStr for ActionDescriptor {
    type Err = ReelError;

    /// Parse `module:mode[:count]`. Fewer than two parts is not a descriptor.
    /// An empty mode becomes `oneclick`; a missing, zero or non-numeric count
    /// becomes 1.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() < 2 {
            return Err(ReelError::Decode(format!("not an action descriptor: {raw}")));
        }
        let mode = if parts[1].is_empty() { DEFAULT_MODE } else { parts[1] };
        let count = parts
            .get(2)
            .and_then(|c| leading_int(c))
            .filter(|c| *c > 0)
            .unwrap_or(1);
        Ok(Self { module: module_label(parts[0]), mode: mode.to_string(), count })
    }
}

/// Leading decimal digits of `s` (after optional whitespace), if any.
fn leading_int(s: &str) -> Option<u32> {
    let digits: String = s.trim_start().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = BillableModule::from_label(&self.module)
            .map(|m| m.key())
            .unwrap_or(self.module.as_str());
        write!(f, "{}:{}:{}", module, self.mode, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_descriptor() {
        let d: ActionDescriptor = "script:oneclick:2".parse().unwrap();
        assert_eq!(d.module, "腳本");
        assert_eq!(d.mode, "oneclick");
        assert_eq!(d.count, 2);
    }

    #[test]
    fn defaults_mode_and_count() {
        let d: ActionDescriptor = "ideation:".parse().unwrap();
        assert_eq!(d.module, "選題");
        assert_eq!(d.mode, "oneclick");
        assert_eq!(d.count, 1);

        let d: ActionDescriptor = "positioning:chat:abc".parse().unwrap();
        assert_eq!(d.count, 1);
        assert_eq!(d.mode, "chat");
    }

    #[test]
    fn unknown_module_passes_through() {
        let d: ActionDescriptor = "avatar:batch:3".parse().unwrap();
        assert_eq!(d.module, "avatar");
    }

    #[test]
    fn displays_wire_form() {
        let d = ActionDescriptor::new(BillableModule::Ideation, DEFAULT_MODE, 3);
        assert_eq!(d.to_string(), "ideation:oneclick:3");
        assert_eq!(d.to_string().parse::<ActionDescriptor>().unwrap(), d);
    }

    #[test]
    fn rejects_single_part() {
        assert!("login".parse::<ActionDescriptor>().is_err());
    }
}
