use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit JSON `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label shown in the message meta line.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "你",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry in an agent's chat log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// In-memory, append-only message log owned by a single agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Record a completed user → assistant exchange.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(ChatMessage::user(user));
        self.push(ChatMessage::assistant(assistant));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Content of the most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// The three backend agents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Positioning,
    Topics,
    Script,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Positioning, AgentKind::Topics, AgentKind::Script];

    /// `agent_type` query value used by `GET /agent/notes`.
    pub fn notes_agent_type(&self) -> Option<&'static str> {
        match self {
            AgentKind::Positioning => None,
            AgentKind::Topics => Some("topic_selection"),
            AgentKind::Script => Some("script_copy"),
        }
    }

    /// Greeting appended when the agent's page is first opened.
    pub fn welcome_message(&self) -> &'static str {
        match self {
            AgentKind::Positioning => {
                "👋 我是你的AI影音定位顧問！\n\n我可以幫你：\n• 分析你的業務類型與目標受眾\n• 建立品牌定位與內容策略\n• 規劃平台經營方向\n\n請告訴我你的業務、產品或想法，我會逐步引導你建立完整的定位檔案！"
            }
            AgentKind::Topics => {
                "👋 我是你的AI選題小助手！\n\n我可以幫你：\n• 基於你的定位檔案提供個性化選題建議\n• 結合熱門趨勢與季節性話題\n• 提供不同類型的內容靈感\n\n選擇選題類型或直接告訴我你想要什麼樣的選題靈感！"
            }
            AgentKind::Script => {
                "👋 歡迎使用腳本模式！\n— 如果你用【引導模式】：請先輸入你的主題，我會一步步引導你生成屬於你的腳本（先選結構＋時長）。\n— 已有想法 → 切到【自由模式】直接聊，你說想做什麼，我來補齊腳本與畫面建議。"
            }
        }
    }

    /// Loading line shown while a request is in flight.
    pub fn loading_message(&self) -> &'static str {
        match self {
            AgentKind::Positioning => "AI影音定位顧問正在分析中...",
            AgentKind::Topics => "AI選題小助手正在思考中...",
            AgentKind::Script => "AI腳本生成大師正在創作中...",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Positioning => write!(f, "positioning"),
            AgentKind::Topics => write!(f, "topics"),
            AgentKind::Script => write!(f, "script"),
        }
    }
}

/// Backend-owned positioning profile: a sparse bag of named fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl UserProfile {
    /// Fields counted towards profile completion, with their display labels.
    pub const NAMED_FIELDS: [(&'static str, &'static str); 6] = [
        ("business_type", "業務類型"),
        ("target_audience", "目標受眾"),
        ("brand_voice", "品牌語氣"),
        ("primary_platform", "主要平台"),
        ("content_goals", "內容目標"),
        ("posting_frequency", "發文頻率"),
    ];

    /// Raw string value of a field; non-string JSON values are stringified.
    pub fn get(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A backend note (positioning, topic or script history entry).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// The user's points wallet, always refetched wholesale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletInfo {
    pub balance: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expiring_soon: i64,
}

/// A one-time purchasable bundle of points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointPack {
    pub pack_id: u32,
    pub name: String,
    pub points: i64,
    pub price_ntd: i64,
    #[serde(default)]
    pub valid_days: u32,
}

/// A subscription plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub plan_id: u32,
    pub name: String,
    #[serde(default)]
    pub monthly_points: i64,
    #[serde(default)]
    pub batch_limit: u32,
    #[serde(default)]
    pub roles_limit: u32,
}
