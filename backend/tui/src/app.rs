//! TUI application state.
//!
//! Everything the renderer draws lives here; only the reducer mutates it.

use std::collections::{HashMap, HashSet};

use reelforge_client::ScriptOptions;
use reelforge_commands::{build_default_dispatcher, CommandContext, CommandDispatcher, CommandRegistry};
use reelforge_core::{AgentKind, ChatLog, ChatMessage, Note, Page, ScriptMode, SegmentList, UserProfile};
use reelforge_points::{Badge, PointsSettings, PurchaseModal, Thresholds};

use crate::action::Job;

/// Ticks a toast stays on screen.
pub const TOAST_TICKS: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub ticks_left: u8,
}

/// Startup options taken from config and persisted state.
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub points_enabled: bool,
    pub settings: PointsSettings,
    pub thresholds: Thresholds,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            points_enabled: true,
            settings: PointsSettings::default(),
            thresholds: Thresholds::default(),
        }
    }
}

pub struct AppState {
    pub page: Page,
    pub input: String,
    /// Lines scrolled up from the bottom of the chat pane.
    pub scroll: u16,
    chats: [ChatLog; 3],
    /// Loading line per agent while a request is in flight.
    pub loading: HashMap<AgentKind, &'static str>,
    /// Partial topics reply while the stream is open.
    pub stream_preview: Option<String>,

    pub profile: Option<UserProfile>,
    pub profile_notes: Vec<Note>,
    pub notes: HashMap<AgentKind, Vec<Note>>,

    pub segments: SegmentList,
    pub script_mode: ScriptMode,
    /// Template and duration being edited in guide mode.
    pub script_draft: ScriptOptions,
    /// Template and duration sent with script requests.
    pub script_options: ScriptOptions,

    pub points_enabled: bool,
    pub settings: PointsSettings,
    pub badge: Badge,
    pub modal: PurchaseModal,
    /// Billable triggers currently between authorize and consume.
    pub busy: HashSet<String>,
    /// Work behind each billable trigger, kept for retry after a purchase.
    pub jobs: HashMap<String, Job>,

    pub toast: Option<Toast>,
    pub help: Option<String>,
    pub should_quit: bool,

    pub registry: CommandRegistry,
    pub dispatcher: CommandDispatcher,
}

impl AppState {
    pub fn new(options: AppOptions) -> Self {
        Self {
            page: Page::Home,
            input: String::new(),
            scroll: 0,
            chats: Default::default(),
            loading: HashMap::new(),
            stream_preview: None,
            profile: None,
            profile_notes: Vec::new(),
            notes: HashMap::new(),
            segments: SegmentList::default(),
            script_mode: ScriptMode::Guide,
            script_draft: ScriptOptions::default(),
            script_options: ScriptOptions::default(),
            points_enabled: options.points_enabled,
            settings: options.settings,
            badge: Badge::new(options.settings.badge_visible).with_thresholds(options.thresholds),
            modal: PurchaseModal::new(),
            busy: HashSet::new(),
            jobs: HashMap::new(),
            toast: None,
            help: None,
            should_quit: false,
            registry: CommandRegistry::new(),
            dispatcher: build_default_dispatcher(),
        }
    }

    pub fn chat(&self, agent: AgentKind) -> &ChatLog {
        &self.chats[slot(agent)]
    }

    pub fn chat_mut(&mut self, agent: AgentKind) -> &mut ChatLog {
        &mut self.chats[slot(agent)]
    }

    pub fn push_assistant(&mut self, agent: AgentKind, text: impl Into<String>) {
        self.chat_mut(agent).push(ChatMessage::assistant(text));
    }

    pub fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast { text: text.into(), ticks_left: TOAST_TICKS });
    }

    pub fn toast_text(&self) -> Option<&str> {
        self.toast.as_ref().map(|t| t.text.as_str())
    }

    pub fn command_context(&self) -> CommandContext {
        CommandContext {
            page: self.page,
            script_mode: self.script_mode,
            segment_count: self.segments.len(),
        }
    }

    /// Whether a one-click generation on the current page is waiting on the bus.
    pub fn page_busy(&self) -> bool {
        self.registry
            .for_page(self.page)
            .any(|def| def.is_billable() && self.busy.contains(&def.key))
    }
}

fn slot(agent: AgentKind) -> usize {
    match agent {
        AgentKind::Positioning => 0,
        AgentKind::Topics => 1,
        AgentKind::Script => 2,
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppOptions::default())
    }
}
