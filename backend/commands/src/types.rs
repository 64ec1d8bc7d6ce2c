//! Command types.

use serde::{Deserialize, Serialize};

use reelforge_core::{ActionDescriptor, Page, ScriptMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Navigation,
    Generation,
    Script,
    Segments,
    Points,
    App,
}

impl CommandCategory {
    pub fn title(&self) -> &'static str {
        match self {
            CommandCategory::Navigation => "頁面",
            CommandCategory::Generation => "生成",
            CommandCategory::Script => "腳本設定",
            CommandCategory::Segments => "片段",
            CommandCategory::Points => "點數",
            CommandCategory::App => "其他",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandArg {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub required: bool,
    /// Consumes all remaining text.
    pub capture_remaining: bool,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
}

/// A registered control: what it is called, where it is offered, and what
/// it bills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    /// Trigger id. Unique across the registry.
    pub key: String,
    /// Button label.
    pub label: String,
    pub description: String,
    pub category: CommandCategory,
    /// Slash aliases, each starting with '/'.
    pub text_aliases: Vec<String>,
    pub args: Vec<CommandArg>,
    pub accepts_args: bool,
    /// Pages offering the command; empty means every page.
    pub pages: Vec<Page>,
    /// Required for billable controls.
    pub descriptor: Option<ActionDescriptor>,
}

impl CommandDef {
    pub fn primary_alias(&self) -> &str {
        self.text_aliases.first().map(|s| s.as_str()).unwrap_or(&self.key)
    }

    pub fn available_on(&self, page: Page) -> bool {
        self.pages.is_empty() || self.pages.contains(&page)
    }

    pub fn is_billable(&self) -> bool {
        self.descriptor.is_some()
    }
}

/// A detected and parsed slash-command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub key: String,
    pub raw_alias: String,
    pub args: Vec<String>,
    /// Full text after the alias.
    pub raw_args: String,
}

/// Segment fields a tweak can replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentField {
    Dialog,
    Visual,
    Cta,
}

impl SegmentField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dialog" | "台詞" => Some(SegmentField::Dialog),
            "visual" | "畫面" => Some(SegmentField::Visual),
            "cta" => Some(SegmentField::Cta),
            _ => None,
        }
    }
}

/// What a command asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    Navigate(Page),
    /// One-click generation on the current page.
    Generate { theme: String },
    SaveProfile,
    SetScriptMode(ScriptMode),
    SetTemplate(String),
    SetDuration(u32),
    ApplyScriptSettings,
    /// Prefill the input with a quick question (0-based).
    QuickQuestion(usize),
    /// Prefill the topics input with a preset.
    TopicPreset(String),
    DeleteSegment(usize),
    TweakSegment { index: usize, field: SegmentField, value: String },
    CopySegment(usize),
    CopyAll,
    CopyLastReply,
    ClearChat,
    RefreshNotes,
    RefreshWallet,
    ToggleBadge,
    OpenPacks { pack_id: Option<u32> },
    OpenPlans,
    Quit,
}

/// Handler result: an intent for the app, a notice for the status line, or
/// both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResponse {
    pub intent: Option<CommandIntent>,
    pub notice: Option<String>,
}

impl CommandResponse {
    pub fn intent(intent: CommandIntent) -> Self {
        Self { intent: Some(intent), notice: None }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self { intent: None, notice: Some(text.into()) }
    }
}
