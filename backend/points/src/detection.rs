//! Billable action detection.
//!
//! A control's structured descriptor (`module:mode:count`) is authoritative.
//! Label keyword matching and page-based module inference remain only as a
//! deprecated fallback for controls registered without a descriptor; it can
//! both miss billable controls and catch unrelated ones.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reelforge_core::action::DEFAULT_MODE;
use reelforge_core::{ActionDescriptor, BillableModule};

/// Labels that mark a control as a one-click generation.
pub const ACTION_KEYWORDS: [&str; 11] = [
    "一鍵生成", "生成腳本", "生成定位", "生成選題", "Generate", "Run", "Create", "產生",
    "開始生成", "立即生成", "快速生成",
];

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)").unwrap());

/// A clickable (or containing) element as the detector sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Control {
    /// Trigger id; the action registry resolves handlers by it.
    pub id: String,
    /// Visible text.
    pub label: String,
    /// Raw `module:mode:count` descriptor, if attached.
    pub descriptor: Option<String>,
    /// Whether this element is itself a button/link.
    pub clickable: bool,
    /// Enclosing element, if any.
    pub parent: Option<Box<Control>>,
}

impl Control {
    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), clickable: true, ..Default::default() }
    }

    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    pub fn with_parent(mut self, parent: Control) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Nearest enclosing clickable ancestor.
    fn clickable_ancestor(&self) -> Option<&Control> {
        let mut current = self.parent.as_deref();
        while let Some(c) = current {
            if c.clickable {
                return Some(c);
            }
            current = c.parent.as_deref();
        }
        None
    }
}

/// A form submission: detection looks at its submit control.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    pub id: String,
    pub submit_control: Option<Control>,
}

/// A detected billable action, held for one authorize → execute → consume trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub module: String,
    pub mode: String,
    pub count: u32,
    /// Trigger id of the control (or form) that raised it.
    pub trigger_id: String,
    /// The descriptor or keyword that matched.
    pub original_action: String,
    /// Points to report on consume; the backend prices when absent.
    #[serde(default)]
    pub cost: Option<i64>,
}

impl ActionInfo {
    pub fn from_descriptor(descriptor: &ActionDescriptor, trigger_id: impl Into<String>) -> Self {
        Self {
            module: descriptor.module.clone(),
            mode: descriptor.mode.clone(),
            count: descriptor.count,
            trigger_id: trigger_id.into(),
            original_action: descriptor.to_string(),
            cost: None,
        }
    }
}

/// Module inferred from the visible page id.
pub fn page_module(page_id: &str) -> Option<BillableModule> {
    if page_id.contains("positioning") {
        Some(BillableModule::Positioning)
    } else if page_id.contains("ideation") || page_id.contains("topics") {
        Some(BillableModule::Ideation)
    } else if page_id.contains("script") {
        Some(BillableModule::Script)
    } else {
        None
    }
}

/// Detect the billable action behind a click on `control`.
pub fn detect(control: &Control, current_page: Option<&str>) -> Option<ActionInfo> {
    if let Some(raw) = &control.descriptor {
        let descriptor: ActionDescriptor = raw.parse().ok()?;
        debug!(trigger = %control.id, %descriptor, "Detected action from descriptor");
        return Some(ActionInfo {
            original_action: raw.clone(),
            ..ActionInfo::from_descriptor(&descriptor, &control.id)
        });
    }

    let label = control.label.trim();
    if let Some(keyword) = ACTION_KEYWORDS.iter().find(|k| label.contains(*k)) {
        debug!(trigger = %control.id, keyword, "Detected action from label (fallback)");
        return Some(from_keyword(keyword, control, current_page));
    }

    if control.clickable {
        return None;
    }
    control.clickable_ancestor().and_then(|a| detect(a, current_page))
}

/// Detect the billable action behind a form submission.
pub fn detect_submit(form: &FormSubmission, current_page: Option<&str>) -> Option<ActionInfo> {
    let submit = form.submit_control.as_ref()?;
    let mut info = detect(submit, current_page)?;
    info.trigger_id = form.id.clone();
    Some(info)
}

fn from_keyword(keyword: &str, control: &Control, current_page: Option<&str>) -> ActionInfo {
    let module = current_page
        .and_then(page_module)
        .unwrap_or(BillableModule::Script);
    let mode = if keyword.contains("聊天") || keyword.contains("對話") {
        "chat"
    } else {
        DEFAULT_MODE
    };
    let count = FIRST_NUMBER
        .captures(&control.label)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(1);
    ActionInfo {
        module: module.label().to_string(),
        mode: mode.to_string(),
        count,
        trigger_id: control.id.clone(),
        original_action: keyword.to_string(),
        cost: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_wins() {
        let control = Control::button("oneclick-script", "一鍵生成 5 支").with_descriptor("script:oneclick:2");
        let info = detect(&control, Some("page-positioning")).unwrap();
        assert_eq!(info.module, "腳本");
        assert_eq!(info.mode, "oneclick");
        assert_eq!(info.count, 2);
        assert_eq!(info.original_action, "script:oneclick:2");
    }

    #[test]
    fn malformed_descriptor_is_not_billable() {
        let control = Control::button("login", "Generate").with_descriptor("login");
        assert!(detect(&control, None).is_none());
    }

    #[test]
    fn keyword_fallback_uses_page_and_digits() {
        let control = Control::button("batch", "快速生成 3 支影片");
        let info = detect(&control, Some("topics")).unwrap();
        assert_eq!(info.module, "選題");
        assert_eq!(info.count, 3);
        assert_eq!(info.original_action, "快速生成");

        let info = detect(&Control::button("x", "Run"), None).unwrap();
        assert_eq!(info.module, "腳本");
        assert_eq!(info.count, 1);
    }

    #[test]
    fn count_skips_fullwidth_digits() {
        let info = detect(&Control::button("batch", "快速生成 ３ 支 5"), Some("script")).unwrap();
        assert_eq!(info.count, 5);
    }

    #[test]
    fn walks_to_clickable_ancestor() {
        let icon = Control { id: "icon".into(), label: "✨".into(), ..Default::default() }
            .with_parent(Control::button("gen", "").with_descriptor("positioning:oneclick"));
        let info = detect(&icon, None).unwrap();
        assert_eq!(info.module, "定位");
        assert_eq!(info.trigger_id, "gen");
    }

    #[test]
    fn plain_button_is_ignored() {
        assert!(detect(&Control::button("copy", "複製"), Some("script")).is_none());
    }

    #[test]
    fn form_uses_submit_control() {
        let form = FormSubmission {
            id: "script-form".into(),
            submit_control: Some(Control::button("submit", "送出").with_descriptor("script:chat:1")),
        };
        let info = detect_submit(&form, None).unwrap();
        assert_eq!(info.trigger_id, "script-form");
        assert_eq!(info.mode, "chat");
        assert!(detect_submit(&FormSubmission::default(), None).is_none());
    }
}
