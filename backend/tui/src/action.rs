//! Messages into the reducer and side effects out of it.

use reelforge_client::{PositioningReply, ProfileSnapshot, ScriptOptions, ScriptReply};
use reelforge_core::{AgentKind, Note, Page, Plan, PointPack, ReelError, UserProfile, WalletInfo};
use reelforge_points::{ActionInfo, BusEvent, BusOutcome, PointsSettings};

/// Everything that can change `AppState`.
#[derive(Debug)]
pub enum Action {
    // Keyboard
    InputChar(char),
    Paste(String),
    Backspace,
    Submit,
    NextPage,
    PrevPage,
    GoPage(Page),
    ScrollUp,
    ScrollDown,
    /// Esc: close the topmost overlay.
    Dismiss,
    ToggleHelp,
    ModalNextTab,
    ModalMove(isize),
    ModalConfirm,
    Tick,
    Quit,

    // Task results
    ProfileLoaded(Result<ProfileSnapshot, ReelError>),
    NotesLoaded { agent: AgentKind, result: Result<Vec<Note>, ReelError> },
    PositioningReplied { oneclick: bool, user_text: String, result: Result<PositioningReply, ReelError> },
    /// Accumulated topics text so far.
    TopicsDelta(String),
    TopicsFinished { user_text: String, result: Result<String, ReelError> },
    ScriptReplied { oneclick: bool, user_text: String, result: Result<ScriptReply, ReelError> },
    ProfileSaved(Result<(), ReelError>),
    Bus(BusEvent),
    BillableSettled { trigger_id: String, outcome: BusOutcome },
    WalletLoaded(Option<WalletInfo>),
    CatalogLoaded { packs: Vec<PointPack>, plans: Vec<Plan>, errors: Vec<&'static str> },
    PurchaseSettled(Result<(), ReelError>),
    Toast(String),
}

/// Backend work behind a one-click control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Positioning { theme: String },
    Topics { theme: String },
    Script { theme: String, options: ScriptOptions },
}

impl Job {
    pub fn agent(&self) -> AgentKind {
        match self {
            Job::Positioning { .. } => AgentKind::Positioning,
            Job::Topics { .. } => AgentKind::Topics,
            Job::Script { .. } => AgentKind::Script,
        }
    }

    pub fn loading_text(&self) -> &'static str {
        match self {
            Job::Positioning { .. } => "AI正在生成定位檔案...",
            Job::Topics { .. } => AgentKind::Topics.loading_message(),
            Job::Script { .. } => "AI正在生成腳本...",
        }
    }
}

/// Side effects requested by the reducer, run by the effect runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadProfile,
    LoadNotes(AgentKind),
    Analyze { text: String },
    StreamTopics { text: String },
    ScriptChat { text: String, options: Option<ScriptOptions> },
    SaveProfile(UserProfile),
    /// Gate `job` behind the points bus.
    Billable { action: ActionInfo, job: Job },
    /// Run `job` directly (points disabled).
    Run(Job),
    RefreshWallet,
    LoadCatalog,
    Checkout(u32),
    Copy(String),
    PersistSettings(PointsSettings),
}
