//! Built-in command handlers.
//!
//! Handlers only validate arguments and translate them into a
//! [`CommandIntent`]; the app carries the intent out.

use std::str::FromStr;

use anyhow::Result;
use tracing::debug;

use reelforge_core::{Page, ScriptMode};

use crate::dispatch::{CommandContext, CommandHandler};
use crate::registry::CommandRegistry;
use crate::types::{CommandCategory, CommandIntent, CommandInvocation, CommandResponse, SegmentField};

pub const THEME_REQUIRED: &str = "請輸入主題";
const TOPIC_TYPES: [&str; 4] = ["trending", "educational", "personal", "product"];
const QUICK_QUESTION_COUNT: usize = 4;
const MAX_DURATION_SECS: u32 = 600;

fn first_arg(inv: &CommandInvocation) -> Option<&str> {
    inv.args.first().map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// 1-based segment number → index, checked against the current list.
fn segment_index(raw: Option<&str>, ctx: &CommandContext) -> Result<usize, CommandResponse> {
    if ctx.segment_count == 0 {
        return Err(CommandResponse::notice("尚無片段"));
    }
    match raw.and_then(|r| r.parse::<usize>().ok()) {
        Some(n) if (1..=ctx.segment_count).contains(&n) => Ok(n - 1),
        Some(n) => Err(CommandResponse::notice(format!("找不到第 {n} 個片段"))),
        None => Err(CommandResponse::notice(format!("請輸入片段編號 1–{}", ctx.segment_count))),
    }
}

// ---------------------------------------------------------------------------
// /help
// ---------------------------------------------------------------------------

pub struct HelpHandler {
    pub registry: CommandRegistry,
}

impl CommandHandler for HelpHandler {
    fn handle(&self, ctx: &CommandContext, _inv: &CommandInvocation) -> Result<CommandResponse> {
        let mut lines = vec![format!("可用指令（{}）：", ctx.page.title())];
        let mut current: Option<CommandCategory> = None;
        for cmd in self.registry.for_page(ctx.page) {
            if current != Some(cmd.category) {
                current = Some(cmd.category);
                lines.push(format!("[{}]", cmd.category.title()));
            }
            let billed = if cmd.is_billable() { " 💎" } else { "" };
            lines.push(format!("  {} — {}{}", cmd.primary_alias(), cmd.description, billed));
        }
        Ok(CommandResponse::notice(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// Argument-free commands
// ---------------------------------------------------------------------------

/// A command that always yields the same intent.
pub struct IntentHandler {
    pub intent: CommandIntent,
}

impl CommandHandler for IntentHandler {
    fn handle(&self, _ctx: &CommandContext, _inv: &CommandInvocation) -> Result<CommandResponse> {
        Ok(CommandResponse::intent(self.intent.clone()))
    }
}

// ---------------------------------------------------------------------------
// /page
// ---------------------------------------------------------------------------

pub struct PageHandler;

impl CommandHandler for PageHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let Some(raw) = first_arg(inv) else {
            return Ok(CommandResponse::notice("請指定頁面"));
        };
        Ok(match Page::from_str(raw) {
            Ok(page) => CommandResponse::intent(CommandIntent::Navigate(page)),
            Err(_) => CommandResponse::notice(format!("未知頁面：{raw}")),
        })
    }
}

// ---------------------------------------------------------------------------
// /gen
// ---------------------------------------------------------------------------

pub struct GenerateHandler;

impl CommandHandler for GenerateHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let theme = inv.raw_args.trim();
        if theme.is_empty() {
            return Ok(CommandResponse::notice(THEME_REQUIRED));
        }
        debug!(command = %inv.key, "One-click generation requested");
        Ok(CommandResponse::intent(CommandIntent::Generate { theme: theme.to_string() }))
    }
}

// ---------------------------------------------------------------------------
// /preset
// ---------------------------------------------------------------------------

pub struct TopicPresetHandler;

impl CommandHandler for TopicPresetHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        match first_arg(inv) {
            Some(kind) if TOPIC_TYPES.contains(&kind) => {
                Ok(CommandResponse::intent(CommandIntent::TopicPreset(kind.to_string())))
            }
            _ => Ok(CommandResponse::notice(format!("選題類型：{}", TOPIC_TYPES.join(", ")))),
        }
    }
}

// ---------------------------------------------------------------------------
// Script settings
// ---------------------------------------------------------------------------

pub struct ScriptModeHandler;

impl CommandHandler for ScriptModeHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        Ok(match first_arg(inv).map(ScriptMode::from_str) {
            Some(Ok(mode)) => CommandResponse::intent(CommandIntent::SetScriptMode(mode)),
            _ => CommandResponse::notice("模式：guide 或 free"),
        })
    }
}

pub struct TemplateHandler;

impl CommandHandler for TemplateHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let letter = first_arg(inv).map(|s| s.to_uppercase());
        Ok(match letter.as_deref() {
            Some(t @ ("A" | "B" | "C" | "D" | "E" | "F")) => {
                CommandResponse::intent(CommandIntent::SetTemplate(t.to_string()))
            }
            _ => CommandResponse::notice("模板：A–F"),
        })
    }
}

pub struct DurationHandler;

impl CommandHandler for DurationHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let secs = first_arg(inv)
            .map(|s| s.trim_end_matches(['s', '秒']))
            .and_then(|s| s.parse::<u32>().ok());
        Ok(match secs {
            Some(n) if (1..=MAX_DURATION_SECS).contains(&n) => {
                CommandResponse::intent(CommandIntent::SetDuration(n))
            }
            _ => CommandResponse::notice(format!("時長請輸入 1–{MAX_DURATION_SECS} 秒")),
        })
    }
}

pub struct QuickQuestionHandler;

impl CommandHandler for QuickQuestionHandler {
    fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        if ctx.script_mode != ScriptMode::Free {
            return Ok(CommandResponse::notice("快速提問僅在自由模式提供"));
        }
        Ok(match first_arg(inv).and_then(|s| s.parse::<usize>().ok()) {
            Some(n) if (1..=QUICK_QUESTION_COUNT).contains(&n) => {
                CommandResponse::intent(CommandIntent::QuickQuestion(n - 1))
            }
            _ => CommandResponse::notice(format!("請輸入 1–{QUICK_QUESTION_COUNT}")),
        })
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOp {
    Delete,
    Copy,
    Tweak,
}

pub struct SegmentHandler {
    pub op: SegmentOp,
}

impl CommandHandler for SegmentHandler {
    fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let index = match segment_index(inv.args.first().map(String::as_str), ctx) {
            Ok(i) => i,
            Err(notice) => return Ok(notice),
        };
        let intent = match self.op {
            SegmentOp::Delete => CommandIntent::DeleteSegment(index),
            SegmentOp::Copy => CommandIntent::CopySegment(index),
            SegmentOp::Tweak => {
                let Some(field) = inv.args.get(1).and_then(|f| SegmentField::parse(f)) else {
                    return Ok(CommandResponse::notice("欄位：dialog, visual, cta"));
                };
                let value = inv.args.get(2).map(|v| v.trim()).unwrap_or_default();
                if value.is_empty() {
                    return Ok(CommandResponse::notice("請輸入新內容"));
                }
                CommandIntent::TweakSegment { index, field, value: value.to_string() }
            }
        };
        Ok(CommandResponse::intent(intent))
    }
}

// ---------------------------------------------------------------------------
// /buy
// ---------------------------------------------------------------------------

pub struct BuyHandler;

impl CommandHandler for BuyHandler {
    fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let pack_id = first_arg(inv).and_then(|s| s.parse::<u32>().ok());
        Ok(CommandResponse::intent(CommandIntent::OpenPacks { pack_id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_dispatcher;
    use crate::detection::detect_command;

    fn run(text: &str, ctx: CommandContext) -> CommandResponse {
        let registry = CommandRegistry::new();
        let dispatcher = build_default_dispatcher();
        let inv = detect_command(text, &registry, ctx.page).expect("command");
        dispatcher.dispatch(&ctx, &inv).unwrap()
    }

    fn script_ctx(segment_count: usize) -> CommandContext {
        CommandContext { page: Page::Script, script_mode: ScriptMode::Guide, segment_count }
    }

    #[test]
    fn every_builtin_has_a_handler() {
        let dispatcher = build_default_dispatcher();
        for cmd in CommandRegistry::new().all() {
            assert!(dispatcher.has_handler(&cmd.key), "missing handler for {}", cmd.key);
        }
    }

    #[test]
    fn generate_requires_theme() {
        let resp = run("/gen", script_ctx(0));
        assert_eq!(resp.notice.as_deref(), Some(THEME_REQUIRED));
        let resp = run("/gen 咖啡店開箱", script_ctx(0));
        assert_eq!(resp.intent, Some(CommandIntent::Generate { theme: "咖啡店開箱".into() }));
    }

    #[test]
    fn segment_numbers_are_one_based_and_checked() {
        assert_eq!(run("/del 2", script_ctx(3)).intent, Some(CommandIntent::DeleteSegment(1)));
        assert_eq!(run("/del 4", script_ctx(3)).notice.as_deref(), Some("找不到第 4 個片段"));
        assert_eq!(run("/copy 1", script_ctx(0)).notice.as_deref(), Some("尚無片段"));
        assert_eq!(
            run("/tweak 1 cta 立即追蹤", script_ctx(2)).intent,
            Some(CommandIntent::TweakSegment {
                index: 0,
                field: SegmentField::Cta,
                value: "立即追蹤".into()
            })
        );
    }

    #[test]
    fn script_settings() {
        assert_eq!(run("/template c", script_ctx(0)).intent, Some(CommandIntent::SetTemplate("C".into())));
        assert_eq!(run("/duration 60s", script_ctx(0)).intent, Some(CommandIntent::SetDuration(60)));
        assert!(run("/duration 0", script_ctx(0)).intent.is_none());
        assert!(run("/q 1", script_ctx(0)).intent.is_none());
        let free = CommandContext { script_mode: ScriptMode::Free, ..script_ctx(0) };
        assert_eq!(run("/q 4", free).intent, Some(CommandIntent::QuickQuestion(3)));
    }

    #[test]
    fn help_lists_page_commands() {
        let ctx = CommandContext { page: Page::Home, script_mode: ScriptMode::Guide, segment_count: 0 };
        let text = run("/help", ctx).notice.unwrap();
        assert!(text.contains("/wallet"));
        assert!(!text.contains("/tweak"));
    }

    #[test]
    fn buy_preselects_pack() {
        let ctx = CommandContext { page: Page::Home, script_mode: ScriptMode::Guide, segment_count: 0 };
        assert_eq!(run("/buy 3", ctx).intent, Some(CommandIntent::OpenPacks { pack_id: Some(3) }));
        assert_eq!(run("/topup", ctx).intent, Some(CommandIntent::OpenPacks { pack_id: None }));
    }
}
