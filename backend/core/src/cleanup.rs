//! Text cleanup for profile fields and agent notes.
//!
//! The backend echoes markdown residue and canned greetings into stored notes;
//! these helpers strip them before display.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AgentKind, UserProfile};

/// Shown for profile fields with no usable value.
pub const UNSET: &str = "未設定";

/// Profile completion rate (percent) at which the profile counts as complete.
const COMPLETE_THRESHOLD: u32 = 80;

static LEADING_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*+\s*").unwrap());
static TRAILING_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\*+$").unwrap());
static LEADING_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^【.*?】").unwrap());

static POSITIONING_GREETINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"沒問題!.*?定位顧問.*?建立完整的定位檔案。").unwrap(),
        Regex::new(r"哈囉!.*?影音定位顧問.*?歡迎使用。").unwrap(),
    ]
});
static TOPICS_GREETINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"沒問題!.*?選題顧問.*?影片燒起來。").unwrap(),
        Regex::new(r"哈囉!.*?選題小助手.*?歡迎使用。").unwrap(),
    ]
});
static SCRIPT_GREETINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"沒問題!.*?腳本大師.*?開始創作。").unwrap(),
        Regex::new(r"哈囉!.*?腳本生成大師.*?歡迎使用。").unwrap(),
    ]
});

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"---+").unwrap());
static TOPIC_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(蹭「[^」]+」熱點|選題方向[：:]\s*[^\n]+|爆款\s*Hook[：:]\s*[^\n]+)").unwrap()
});

/// Normalize a profile field for display.
pub fn clean_field(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return UNSET.to_string();
    };
    let s = LEADING_STARS.replace(raw, "");
    let s = TRAILING_STARS.replace(&s, "");
    let s = LEADING_BRACKET.replace(&s, "");
    let s = s.trim();
    if s.is_empty() || s == "—" || s == "-" {
        UNSET.to_string()
    } else {
        s.to_string()
    }
}

/// Percentage of the named profile fields that carry a real value.
pub fn completion_rate(profile: &UserProfile) -> u32 {
    let total = UserProfile::NAMED_FIELDS.len();
    let completed = UserProfile::NAMED_FIELDS
        .iter()
        .filter(|(field, _)| clean_field(profile.get(field).as_deref()) != UNSET)
        .count();
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Headline for the profile panel.
pub fn completion_status(rate: u32) -> String {
    if rate >= COMPLETE_THRESHOLD {
        "✅ 定位檔案完整".to_string()
    } else {
        format!("⏳ 定位檔案 {rate}% 完成")
    }
}

/// Strip canned greetings (and, for script notes, code blocks and markdown
/// residue) from a stored note.
pub fn clean_note(agent: AgentKind, content: &str) -> String {
    let greetings = match agent {
        AgentKind::Positioning => &*POSITIONING_GREETINGS,
        AgentKind::Topics => &*TOPICS_GREETINGS,
        AgentKind::Script => &*SCRIPT_GREETINGS,
    };
    let mut text = content.to_string();
    for re in greetings {
        text = re.replace_all(&text, "").into_owned();
    }
    if agent == AgentKind::Script {
        text = CODE_FENCE.replace_all(&text, "").into_owned();
        text = RULE.replace_all(&text, "").into_owned();
        text = text.replace("**", "");
    }
    text.trim().to_string()
}

/// Title for a topics history entry.
pub fn topic_title(cleaned: &str) -> String {
    TOPIC_TITLE
        .find(cleaned)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "選題建議".to_string())
}
