//! Views the client can show.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::BillableModule;
use crate::error::ReelError;
use crate::types::AgentKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Positioning,
    Topics,
    Script,
    Copy,
    Guide,
}

impl Page {
    pub const ALL: [Page; 6] =
        [Page::Home, Page::Positioning, Page::Topics, Page::Script, Page::Copy, Page::Guide];

    pub fn id(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Positioning => "positioning",
            Page::Topics => "topics",
            Page::Script => "script",
            Page::Copy => "copy",
            Page::Guide => "guide",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "首頁",
            Page::Positioning => "帳號定位",
            Page::Topics => "選題靈感",
            Page::Script => "腳本生成",
            Page::Copy => "文案",
            Page::Guide => "使用指南",
        }
    }

    /// The agent whose chat lives on this page.
    pub fn agent(&self) -> Option<AgentKind> {
        match self {
            Page::Positioning => Some(AgentKind::Positioning),
            Page::Topics => Some(AgentKind::Topics),
            Page::Script => Some(AgentKind::Script),
            _ => None,
        }
    }

    /// Module billed for one-click generation on this page.
    pub fn billable_module(&self) -> Option<BillableModule> {
        match self {
            Page::Positioning => Some(BillableModule::Positioning),
            Page::Topics => Some(BillableModule::Ideation),
            Page::Script => Some(BillableModule::Script),
            _ => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Page {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.id() == s.trim())
            .ok_or_else(|| ReelError::Decode(format!("unknown page: {s}")))
    }
}

/// How the script page takes input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    /// Pick template and duration, then enter a theme.
    #[default]
    Guide,
    /// Free conversation with quick-question chips.
    Free,
}

impl ScriptMode {
    pub fn label(&self) -> &'static str {
        match self {
            ScriptMode::Guide => "引導模式",
            ScriptMode::Free => "自由模式",
        }
    }
}

impl FromStr for ScriptMode {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "guide" => Ok(ScriptMode::Guide),
            "free" => Ok(ScriptMode::Free),
            other => Err(ReelError::Decode(format!("unknown script mode: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_trip_ids() {
        for page in Page::ALL {
            assert_eq!(page.id().parse::<Page>().unwrap(), page);
        }
        assert!("settings".parse::<Page>().is_err());
        assert_eq!(Page::Topics.billable_module(), Some(BillableModule::Ideation));
        assert_eq!(Page::Copy.agent(), None);
    }
}
