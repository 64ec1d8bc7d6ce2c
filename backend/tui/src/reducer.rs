//! The single state transition function.
//!
//! `reduce` applies one [`Action`] to [`AppState`] and returns the effects to
//! run. It never awaits; network work comes back later as another action.

use tracing::{debug, info, warn};

use reelforge_client::agents::{
    error_line, generation_error_line, topic_preset, validate_input, SCRIPT_QUICK_QUESTIONS,
};
use reelforge_commands::{detect_command, CommandIntent, SegmentField};
use reelforge_core::{AgentKind, ChatMessage, Page, ReelError, ScriptMode};
use reelforge_points::{detect, ActionPhase, BusEvent, BusOutcome, ModalTab, PurchaseOutcome, BUSY_LABEL};

use crate::action::{Action, Effect, Job};
use crate::app::AppState;

pub const APPLIED_SETTINGS: &str = "已套用模板與時長設定";
pub const COPIED: &str = "已複製";
pub const NOTHING_TO_COPY: &str = "無可複製內容";
pub const SCRIPT_DONE: &str = "腳本生成完成！";
pub const POSITIONING_DONE: &str = "定位檔案生成完成！";
pub const PROFILE_SAVED: &str = "定位檔案已儲存";
pub const SAVE_FAILED: &str = "儲存失敗";
pub const NO_PROFILE: &str = "尚無定位檔案可儲存";

pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::InputChar(c) => {
            state.input.push(c);
            vec![]
        }
        Action::Paste(text) => {
            state.input.push_str(&text.replace(['\r', '\n'], " "));
            vec![]
        }
        Action::Backspace => {
            state.input.pop();
            vec![]
        }
        Action::Submit => submit(state),
        Action::NextPage => go_page(state, step_page(state.page, 1)),
        Action::PrevPage => go_page(state, step_page(state.page, -1)),
        Action::GoPage(page) => go_page(state, page),
        Action::ScrollUp => {
            state.scroll = state.scroll.saturating_add(1);
            vec![]
        }
        Action::ScrollDown => {
            state.scroll = state.scroll.saturating_sub(1);
            vec![]
        }
        Action::Dismiss => {
            if state.modal.is_visible() {
                state.modal.hide();
            } else if state.help.is_some() {
                state.help = None;
            } else {
                state.input.clear();
            }
            vec![]
        }
        Action::ToggleHelp => {
            if state.help.is_some() {
                state.help = None;
                vec![]
            } else {
                run_command(state, "/help")
            }
        }
        Action::ModalNextTab => {
            state.modal.next_tab();
            vec![]
        }
        Action::ModalMove(delta) => {
            state.modal.move_selection(delta);
            vec![]
        }
        Action::ModalConfirm => confirm_purchase(state),
        Action::Tick => {
            let expired = match &mut state.toast {
                Some(toast) => {
                    toast.ticks_left = toast.ticks_left.saturating_sub(1);
                    toast.ticks_left == 0
                }
                None => false,
            };
            if expired {
                state.toast = None;
            }
            vec![]
        }
        Action::Quit => {
            state.should_quit = true;
            vec![]
        }

        Action::ProfileLoaded(result) => {
            match result {
                Ok(snapshot) => {
                    if snapshot.profile.is_some() {
                        state.profile = snapshot.profile;
                    }
                    state.profile_notes = snapshot.notes;
                }
                Err(e) => warn!(error = %e, "Loading profile failed"),
            }
            vec![]
        }
        Action::NotesLoaded { agent, result } => {
            match result {
                Ok(notes) => {
                    debug!(%agent, count = notes.len(), "Notes loaded");
                    state.notes.insert(agent, notes);
                }
                Err(e) => warn!(%agent, error = %e, "Loading notes failed"),
            }
            vec![]
        }
        Action::PositioningReplied { oneclick, user_text, result } => {
            let agent = AgentKind::Positioning;
            state.loading.remove(&agent);
            match result {
                Ok(reply) => {
                    if let Some(profile) = reply.profile {
                        state.profile = Some(profile);
                    }
                    match (oneclick, reply.response) {
                        (true, Some(response)) => {
                            state.chat_mut(agent).push_exchange(user_text, response);
                            state.show_toast(POSITIONING_DONE);
                        }
                        (false, Some(response)) => state.push_assistant(agent, response),
                        (_, None) => debug!("Positioning reply without text"),
                    }
                }
                Err(e) => state.push_assistant(agent, failure_line(oneclick, &e)),
            }
            vec![]
        }
        Action::TopicsDelta(text) => {
            state.stream_preview = Some(text);
            vec![]
        }
        Action::TopicsFinished { user_text, result } => {
            let agent = AgentKind::Topics;
            state.loading.remove(&agent);
            state.stream_preview = None;
            match result {
                Ok(full) => {
                    debug!(chars = full.chars().count(), input = %user_text, "Topics reply complete");
                    if !full.is_empty() {
                        state.push_assistant(agent, full);
                    }
                    vec![Effect::LoadNotes(agent)]
                }
                Err(e) => {
                    state.push_assistant(agent, error_line(&e));
                    vec![]
                }
            }
        }
        Action::ScriptReplied { oneclick, user_text, result } => {
            let agent = AgentKind::Script;
            state.loading.remove(&agent);
            match result {
                Ok(reply) => {
                    if let Some(message) = reply.assistant_message {
                        state.push_assistant(agent, message);
                    }
                    if let Some(segments) = reply.segments {
                        state.segments.replace(segments);
                    }
                    if oneclick {
                        info!(theme = %user_text, segments = state.segments.len(), "Script generated");
                        state.show_toast(SCRIPT_DONE);
                    }
                    vec![Effect::LoadNotes(agent)]
                }
                Err(e) => {
                    state.push_assistant(agent, failure_line(oneclick, &e));
                    vec![]
                }
            }
        }
        Action::ProfileSaved(result) => {
            match result {
                Ok(()) => state.show_toast(PROFILE_SAVED),
                Err(ReelError::Http { .. }) => state.show_toast(SAVE_FAILED),
                Err(e) => state.show_toast(format!("{SAVE_FAILED}：{}", e.display_text())),
            }
            vec![]
        }
        Action::Bus(event) => {
            on_bus_event(state, event);
            vec![]
        }
        Action::BillableSettled { trigger_id, outcome } => settle(state, trigger_id, outcome),
        Action::WalletLoaded(wallet) => {
            match wallet {
                Some(w) => state.badge.update(w),
                None => state.badge.load_failed(),
            }
            vec![]
        }
        Action::CatalogLoaded { packs, plans, errors } => {
            state.modal.set_catalog(packs, plans);
            if let Some(last) = errors.last() {
                state.show_toast(*last);
            }
            vec![]
        }
        Action::PurchaseSettled(result) => match state.modal.finish_purchase(result) {
            PurchaseOutcome::Purchased { message, retry } => {
                state.show_toast(message);
                let mut effects = vec![Effect::RefreshWallet];
                if let Some(action) = retry {
                    if let Some(job) = state.jobs.get(&action.trigger_id).cloned() {
                        info!(trigger = %action.trigger_id, "Retrying action after purchase");
                        state.busy.insert(action.trigger_id.clone());
                        effects.push(Effect::Billable { action, job });
                    }
                }
                effects
            }
            PurchaseOutcome::Failed { message } => {
                state.show_toast(message);
                vec![]
            }
            PurchaseOutcome::Closed | PurchaseOutcome::Ignored => vec![],
        },
        Action::Toast(text) => {
            state.show_toast(text);
            vec![]
        }
    }
}

fn failure_line(oneclick: bool, err: &ReelError) -> String {
    if oneclick {
        generation_error_line(err)
    } else {
        error_line(err)
    }
}

fn step_page(current: Page, delta: isize) -> Page {
    let len = Page::ALL.len() as isize;
    let pos = Page::ALL.iter().position(|p| *p == current).unwrap_or(0) as isize;
    Page::ALL[(pos + delta).rem_euclid(len) as usize]
}

/// Switch page; an agent page entered with an empty log gets its welcome
/// line and a data refresh.
fn go_page(state: &mut AppState, page: Page) -> Vec<Effect> {
    state.page = page;
    state.scroll = 0;
    state.help = None;
    debug!(%page, "Page changed");

    let Some(agent) = page.agent() else {
        return vec![];
    };
    if !state.chat(agent).is_empty() {
        return vec![];
    }
    state.push_assistant(agent, agent.welcome_message());
    match agent {
        AgentKind::Positioning => vec![Effect::LoadProfile],
        other => vec![Effect::LoadNotes(other)],
    }
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    let text = std::mem::take(&mut state.input);
    if text.trim_start().starts_with('/') {
        return run_command(state, &text);
    }

    let Some(agent) = state.page.agent() else {
        state.show_toast("請先切換到智能體頁面");
        state.input = text;
        return vec![];
    };
    let empty_prompt = if agent == AgentKind::Script { "請先輸入內容" } else { "請輸入內容" };
    let Some(text) = validate_input(&text).map(str::to_string) else {
        state.show_toast(empty_prompt);
        return vec![];
    };
    if state.loading.contains_key(&agent) {
        state.show_toast(BUSY_LABEL);
        state.input = text;
        return vec![];
    }

    state.chat_mut(agent).push(ChatMessage::user(text.clone()));
    state.loading.insert(agent, agent.loading_message());
    state.scroll = 0;
    match agent {
        AgentKind::Positioning => vec![Effect::Analyze { text }],
        AgentKind::Topics => {
            state.stream_preview = Some(String::new());
            vec![Effect::StreamTopics { text }]
        }
        AgentKind::Script => {
            let options = (state.script_mode == ScriptMode::Guide).then(|| state.script_options.clone());
            vec![Effect::ScriptChat { text, options }]
        }
    }
}

fn run_command(state: &mut AppState, text: &str) -> Vec<Effect> {
    let Some(inv) = detect_command(text, &state.registry, state.page) else {
        let alias = text.split_whitespace().next().unwrap_or(text);
        state.show_toast(format!("❓ 未知指令 {alias}，輸入 /help 查看可用指令"));
        return vec![];
    };

    let ctx = state.command_context();
    let response = match state.dispatcher.dispatch(&ctx, &inv) {
        Ok(r) => r,
        Err(e) => {
            warn!(command = %inv.key, error = %e, "Command failed");
            state.show_toast(format!("指令失敗：{e}"));
            return vec![];
        }
    };

    if let Some(notice) = response.notice {
        if inv.key == "help" {
            state.help = Some(notice);
        } else {
            state.show_toast(notice);
        }
    }
    match response.intent {
        Some(intent) => apply_intent(state, &inv.key, intent),
        None => vec![],
    }
}

fn apply_intent(state: &mut AppState, key: &str, intent: CommandIntent) -> Vec<Effect> {
    match intent {
        CommandIntent::Navigate(page) => go_page(state, page),
        CommandIntent::Generate { theme } => generate(state, key, theme),
        CommandIntent::SaveProfile => match &state.profile {
            Some(profile) => vec![Effect::SaveProfile(profile.clone())],
            None => {
                state.show_toast(NO_PROFILE);
                vec![]
            }
        },
        CommandIntent::SetScriptMode(mode) => {
            state.script_mode = mode;
            state.show_toast(format!("已切換至{}", mode.label()));
            vec![]
        }
        CommandIntent::SetTemplate(template) => {
            state.show_toast(format!("模板 {template}，輸入 /apply 套用"));
            state.script_draft.template_type = template;
            vec![]
        }
        CommandIntent::SetDuration(secs) => {
            state.script_draft.duration = secs;
            state.show_toast(format!("時長 {secs} 秒，輸入 /apply 套用"));
            vec![]
        }
        CommandIntent::ApplyScriptSettings => {
            state.script_options = state.script_draft.clone();
            info!(
                template = %state.script_options.template_type,
                duration = state.script_options.duration,
                "Script settings applied"
            );
            state.show_toast(APPLIED_SETTINGS);
            vec![]
        }
        CommandIntent::QuickQuestion(index) => {
            if let Some(question) = SCRIPT_QUICK_QUESTIONS.get(index) {
                state.input = question.to_string();
            }
            vec![]
        }
        CommandIntent::TopicPreset(kind) => {
            if let Some(text) = topic_preset(&kind) {
                state.input = text.to_string();
            }
            vec![]
        }
        CommandIntent::DeleteSegment(index) => {
            if state.segments.delete(index).is_some() {
                state.show_toast(format!("已刪除第 {} 段", index + 1));
            }
            vec![]
        }
        CommandIntent::TweakSegment { index, field, value } => {
            let value = Some(value.as_str());
            let changed = match field {
                SegmentField::Dialog => state.segments.tweak(index, value, None, None),
                SegmentField::Visual => state.segments.tweak(index, None, value, None),
                SegmentField::Cta => state.segments.tweak(index, None, None, value),
            };
            if changed {
                state.show_toast(format!("已更新第 {} 段", index + 1));
            }
            vec![]
        }
        CommandIntent::CopySegment(index) => {
            let text = state.segments.copy_text(index);
            copy(state, text)
        }
        CommandIntent::CopyAll => {
            let text = state.segments.copy_all();
            copy(state, text)
        }
        CommandIntent::CopyLastReply => {
            let text = state
                .page
                .agent()
                .and_then(|agent| state.chat(agent).last_assistant())
                .map(str::to_string);
            copy(state, text)
        }
        CommandIntent::ClearChat => {
            if let Some(agent) = state.page.agent() {
                state.chat_mut(agent).clear();
                state.push_assistant(agent, agent.welcome_message());
                state.scroll = 0;
            }
            vec![]
        }
        CommandIntent::RefreshNotes => match state.page.agent() {
            Some(AgentKind::Positioning) => vec![Effect::LoadProfile],
            Some(agent) => vec![Effect::LoadNotes(agent)],
            None => vec![],
        },
        CommandIntent::RefreshWallet => vec![Effect::RefreshWallet],
        CommandIntent::ToggleBadge => {
            state.settings.badge_visible = state.badge.toggle();
            vec![Effect::PersistSettings(state.settings)]
        }
        CommandIntent::OpenPacks { pack_id } => {
            let suggested: Vec<u32> = pack_id.into_iter().collect();
            state.modal.show(&suggested, None);
            vec![Effect::LoadCatalog]
        }
        CommandIntent::OpenPlans => {
            state.modal.show_upgrade(None);
            vec![Effect::LoadCatalog]
        }
        CommandIntent::Quit => {
            state.should_quit = true;
            vec![]
        }
    }
}

fn copy(state: &mut AppState, text: Option<String>) -> Vec<Effect> {
    match text {
        Some(text) => {
            state.show_toast(COPIED);
            vec![Effect::Copy(text)]
        }
        None => {
            state.show_toast(NOTHING_TO_COPY);
            vec![]
        }
    }
}

/// One-click generation behind control `key`.
fn generate(state: &mut AppState, key: &str, theme: String) -> Vec<Effect> {
    let job = match state.page {
        Page::Positioning => Job::Positioning { theme },
        Page::Topics => Job::Topics { theme },
        Page::Script => Job::Script { theme, options: state.script_options.clone() },
        _ => return vec![],
    };
    if state.busy.contains(key) || state.loading.contains_key(&job.agent()) {
        state.show_toast(BUSY_LABEL);
        return vec![];
    }

    if !state.points_enabled {
        start_job(state, &job);
        return vec![Effect::Run(job)];
    }

    let action = state.registry.control(key).and_then(|c| detect(&c, Some(state.page.id())));
    let Some(action) = action else {
        warn!(control = key, "Control carries no billable descriptor; running unbilled");
        start_job(state, &job);
        return vec![Effect::Run(job)];
    };
    state.busy.insert(action.trigger_id.clone());
    state.jobs.insert(action.trigger_id.clone(), job.clone());
    vec![Effect::Billable { action, job }]
}

/// Show the loading line for `job` as it starts executing.
fn start_job(state: &mut AppState, job: &Job) {
    let agent = job.agent();
    state.loading.insert(agent, job.loading_text());
    state.scroll = 0;
    if let Job::Topics { theme } = job {
        state.chat_mut(agent).push(ChatMessage::user(theme.clone()));
        state.stream_preview = Some(String::new());
    }
}

fn on_bus_event(state: &mut AppState, event: BusEvent) {
    match event {
        BusEvent::Phase { trigger_id, phase } => {
            debug!(trigger = %trigger_id, ?phase, "Bus phase");
            if phase == ActionPhase::Executing {
                if let Some(job) = state.jobs.get(&trigger_id).cloned() {
                    start_job(state, &job);
                }
            }
        }
        BusEvent::Wallet(wallet) => state.badge.update(wallet),
    }
}

fn settle(state: &mut AppState, trigger_id: String, outcome: BusOutcome) -> Vec<Effect> {
    state.busy.remove(&trigger_id);
    match outcome {
        BusOutcome::NeedsTopup { action, suggest_pack_ids } => {
            state.modal.show(&suggest_pack_ids, Some(action));
            vec![Effect::LoadCatalog]
        }
        BusOutcome::NeedsUpgrade { action } => {
            state.modal.show_upgrade(Some(action));
            vec![Effect::LoadCatalog]
        }
        // the reply handler already wrote the inline error line
        BusOutcome::ActionFailed { .. } | BusOutcome::Done { .. } => {
            state.jobs.remove(&trigger_id);
            vec![]
        }
        other => {
            state.jobs.remove(&trigger_id);
            if let Some(text) = other.toast() {
                state.show_toast(text);
            }
            vec![]
        }
    }
}

fn confirm_purchase(state: &mut AppState) -> Vec<Effect> {
    if state.modal.tab() == ModalTab::Plans {
        let Some(plan_id) = state.modal.selected_plan() else {
            return vec![];
        };
        if let Some(text) = state.modal.open_subscribe(plan_id) {
            state.show_toast(text);
        }
    }
    match state.modal.begin_purchase() {
        Ok(pack_id) => vec![Effect::Checkout(pack_id)],
        Err(_) => vec![],
    }
}

#[cfg(test)]
mod tests {
    use reelforge_client::{PositioningReply, ScriptReply};
    use reelforge_core::{Plan, PointPack, ScriptSegment, UserProfile, WalletInfo};
    use reelforge_points::ActionInfo;

    use super::*;
    use crate::app::AppOptions;

    fn typed(state: &mut AppState, text: &str) -> Vec<Effect> {
        state.input = text.to_string();
        reduce(state, Action::Submit)
    }

    fn on_page(page: Page) -> AppState {
        let mut state = AppState::default();
        reduce(&mut state, Action::GoPage(page));
        state
    }

    fn segment(dialog: &str) -> ScriptSegment {
        ScriptSegment { dialog: Some(dialog.to_string()), ..Default::default() }
    }

    fn billable(effects: &[Effect]) -> (ActionInfo, Job) {
        match effects {
            [Effect::Billable { action, job }] => (action.clone(), job.clone()),
            other => panic!("expected one billable effect, got {other:?}"),
        }
    }

    fn packs() -> Vec<PointPack> {
        [(1, "小額包"), (3, "標準包")]
            .into_iter()
            .map(|(id, name)| PointPack {
                pack_id: id,
                name: name.to_string(),
                points: 100,
                price_ntd: 99,
                valid_days: 30,
            })
            .collect()
    }

    #[test]
    fn first_entry_bootstraps_once() {
        let mut state = AppState::default();
        assert_eq!(reduce(&mut state, Action::GoPage(Page::Topics)), vec![Effect::LoadNotes(AgentKind::Topics)]);
        assert_eq!(state.chat(AgentKind::Topics).len(), 1);

        reduce(&mut state, Action::GoPage(Page::Home));
        assert!(reduce(&mut state, Action::GoPage(Page::Topics)).is_empty());
        assert_eq!(state.chat(AgentKind::Topics).len(), 1);

        assert_eq!(reduce(&mut state, Action::GoPage(Page::Positioning)), vec![Effect::LoadProfile]);
        assert!(reduce(&mut state, Action::GoPage(Page::Guide)).is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut state = on_page(Page::Positioning);
        assert!(typed(&mut state, "   ").is_empty());
        assert_eq!(state.toast_text(), Some("請輸入內容"));

        let mut state = on_page(Page::Script);
        assert!(typed(&mut state, "").is_empty());
        assert_eq!(state.toast_text(), Some("請先輸入內容"));
    }

    #[test]
    fn chat_send_per_agent() {
        let mut state = on_page(Page::Positioning);
        assert_eq!(typed(&mut state, " 我開咖啡店 "), vec![Effect::Analyze { text: "我開咖啡店".into() }]);
        assert_eq!(state.chat(AgentKind::Positioning).len(), 2);
        assert!(state.loading.contains_key(&AgentKind::Positioning));

        let mut state = on_page(Page::Topics);
        assert_eq!(typed(&mut state, "給我選題"), vec![Effect::StreamTopics { text: "給我選題".into() }]);
        assert_eq!(state.stream_preview.as_deref(), Some(""));

        let mut state = on_page(Page::Script);
        let effects = typed(&mut state, "寫個腳本");
        assert_eq!(
            effects,
            vec![Effect::ScriptChat { text: "寫個腳本".into(), options: Some(state.script_options.clone()) }]
        );

        let mut state = on_page(Page::Script);
        typed(&mut state, "/mode free");
        assert_eq!(typed(&mut state, "寫個腳本"), vec![Effect::ScriptChat { text: "寫個腳本".into(), options: None }]);
    }

    #[test]
    fn topics_stream_lifecycle() {
        let mut state = on_page(Page::Topics);
        typed(&mut state, "選題");
        reduce(&mut state, Action::TopicsDelta("第一".into()));
        assert_eq!(state.stream_preview.as_deref(), Some("第一"));

        let effects = reduce(
            &mut state,
            Action::TopicsFinished { user_text: "選題".into(), result: Ok("第一個選題".into()) },
        );
        assert_eq!(effects, vec![Effect::LoadNotes(AgentKind::Topics)]);
        assert!(state.stream_preview.is_none());
        assert!(state.loading.is_empty());
        assert_eq!(state.chat(AgentKind::Topics).last_assistant(), Some("第一個選題"));
    }

    #[test]
    fn chat_failure_becomes_inline_line() {
        let mut state = on_page(Page::Positioning);
        typed(&mut state, "hi");
        reduce(
            &mut state,
            Action::PositioningReplied {
                oneclick: false,
                user_text: "hi".into(),
                result: Err(ReelError::Network("offline".into())),
            },
        );
        assert_eq!(
            state.chat(AgentKind::Positioning).last_assistant(),
            Some("❌ 錯誤：network error: offline")
        );
    }

    #[test]
    fn apply_script_settings() {
        let mut state = on_page(Page::Script);
        typed(&mut state, "/template c");
        typed(&mut state, "/duration 60");
        assert_eq!(state.script_options.template_type, "A");

        typed(&mut state, "/apply");
        assert_eq!(state.toast_text(), Some(APPLIED_SETTINGS));
        assert_eq!(state.script_options.template_type, "C");
        assert_eq!(state.script_options.duration, 60);
    }

    #[test]
    fn copy_all_reports_empty_list() {
        let mut state = on_page(Page::Script);
        assert!(typed(&mut state, "/copyall").is_empty());
        assert_eq!(state.toast_text(), Some(NOTHING_TO_COPY));

        state.segments.replace(vec![segment("嗨")]);
        let effects = typed(&mut state, "/copyall");
        assert!(matches!(effects.as_slice(), [Effect::Copy(text)] if text.contains("台詞:嗨")));
        assert_eq!(state.toast_text(), Some(COPIED));
    }

    #[test]
    fn delete_and_tweak_segments() {
        let mut state = on_page(Page::Script);
        state.segments.replace(vec![segment("a"), segment("b"), segment("c")]);

        typed(&mut state, "/del 2");
        let dialogs: Vec<_> = state.segments.iter().map(|s| s.dialog.clone().unwrap_or_default()).collect();
        assert_eq!(dialogs, ["a", "c"]);

        typed(&mut state, "/tweak 1 cta 追蹤我");
        assert_eq!(state.segments.get(0).and_then(|s| s.cta.as_deref()), Some("追蹤我"));
        assert_eq!(state.segments.get(0).and_then(|s| s.dialog.as_deref()), Some("a"));
    }

    #[test]
    fn save_profile_toasts() {
        let mut state = on_page(Page::Positioning);
        assert!(typed(&mut state, "/save").is_empty());
        assert_eq!(state.toast_text(), Some(NO_PROFILE));

        state.profile = Some(UserProfile::default());
        assert_eq!(typed(&mut state, "/save"), vec![Effect::SaveProfile(UserProfile::default())]);

        reduce(&mut state, Action::ProfileSaved(Ok(())));
        assert_eq!(state.toast_text(), Some(PROFILE_SAVED));
        reduce(&mut state, Action::ProfileSaved(Err(ReelError::Http { status: 500 })));
        assert_eq!(state.toast_text(), Some(SAVE_FAILED));
        reduce(&mut state, Action::ProfileSaved(Err(ReelError::Network("reset".into()))));
        assert_eq!(state.toast_text(), Some("儲存失敗：network error: reset"));
    }

    #[test]
    fn oneclick_script_goes_through_bus() {
        let mut state = on_page(Page::Script);
        let (action, job) = billable(&typed(&mut state, "/gen 咖啡店開幕"));
        assert_eq!(action.module, "腳本");
        assert_eq!(action.trigger_id, "oneclick-script");
        assert!(state.page_busy());
        assert!(matches!(&job, Job::Script { theme, .. } if theme == "咖啡店開幕"));

        // nothing is shown until the bus starts executing
        assert!(state.loading.is_empty());
        reduce(
            &mut state,
            Action::Bus(BusEvent::Phase { trigger_id: action.trigger_id.clone(), phase: ActionPhase::Executing }),
        );
        assert_eq!(state.loading.get(&AgentKind::Script), Some(&"AI正在生成腳本..."));

        let effects = reduce(
            &mut state,
            Action::ScriptReplied {
                oneclick: true,
                user_text: "咖啡店開幕".into(),
                result: Ok(ScriptReply {
                    assistant_message: Some("好的".into()),
                    segments: Some(vec![segment("開場"), segment("結尾")]),
                }),
            },
        );
        assert_eq!(effects, vec![Effect::LoadNotes(AgentKind::Script)]);
        assert_eq!(state.toast_text(), Some(SCRIPT_DONE));
        assert_eq!(state.segments.len(), 2);

        reduce(
            &mut state,
            Action::BillableSettled {
                trigger_id: action.trigger_id,
                outcome: BusOutcome::Done { usage_id: "action_1".into(), consumed: true },
            },
        );
        assert!(!state.page_busy());
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn second_click_while_busy_is_ignored() {
        let mut state = on_page(Page::Script);
        billable(&typed(&mut state, "/gen a"));
        assert!(typed(&mut state, "/gen b").is_empty());
        assert_eq!(state.toast_text(), Some(BUSY_LABEL));
    }

    #[test]
    fn oneclick_positioning_reply() {
        let mut state = on_page(Page::Positioning);
        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({"business_type": "咖啡店"})).unwrap();
        reduce(
            &mut state,
            Action::PositioningReplied {
                oneclick: true,
                user_text: "咖啡".into(),
                result: Ok(PositioningReply { response: Some("定位如下".into()), profile: Some(profile.clone()) }),
            },
        );
        assert_eq!(state.toast_text(), Some(POSITIONING_DONE));
        assert_eq!(state.profile, Some(profile));
        let log = state.chat(AgentKind::Positioning);
        assert_eq!(log.messages()[log.len() - 2], ChatMessage::user("咖啡"));
        assert_eq!(log.last_assistant(), Some("定位如下"));
    }

    #[test]
    fn topup_opens_packs_and_retries_after_purchase() {
        let mut state = on_page(Page::Script);
        let (action, job) = billable(&typed(&mut state, "/gen 甜點"));

        let effects = reduce(
            &mut state,
            Action::BillableSettled {
                trigger_id: action.trigger_id.clone(),
                outcome: BusOutcome::NeedsTopup { action: action.clone(), suggest_pack_ids: vec![3] },
            },
        );
        assert_eq!(effects, vec![Effect::LoadCatalog]);
        assert!(state.modal.is_visible());
        assert_eq!(state.modal.tab(), ModalTab::Packs);
        assert_eq!(state.modal.selected_pack(), Some(3));

        reduce(&mut state, Action::CatalogLoaded { packs: packs(), plans: vec![], errors: vec![] });
        assert_eq!(state.modal.selected_pack(), Some(3));
        assert_eq!(reduce(&mut state, Action::ModalConfirm), vec![Effect::Checkout(3)]);

        let effects = reduce(&mut state, Action::PurchaseSettled(Ok(())));
        assert_eq!(state.toast_text(), Some("購買成功！點數已到帳"));
        assert!(!state.modal.is_visible());
        assert_eq!(effects, vec![Effect::RefreshWallet, Effect::Billable { action, job }]);
        assert!(state.page_busy());
    }

    #[test]
    fn failed_purchase_keeps_modal_open() {
        let mut state = AppState::default();
        typed(&mut state, "/buy 1");
        reduce(&mut state, Action::CatalogLoaded { packs: packs(), plans: vec![], errors: vec![] });
        assert_eq!(reduce(&mut state, Action::ModalConfirm), vec![Effect::Checkout(1)]);

        reduce(&mut state, Action::PurchaseSettled(Err(ReelError::Backend("庫存不足".into()))));
        assert_eq!(state.toast_text(), Some("購買失敗：庫存不足"));
        assert!(state.modal.is_visible());
    }

    #[test]
    fn upgrade_opens_plans_tab() {
        let mut state = on_page(Page::Positioning);
        let (action, _) = billable(&typed(&mut state, "/gen 咖啡"));
        reduce(
            &mut state,
            Action::BillableSettled { trigger_id: action.trigger_id.clone(), outcome: BusOutcome::NeedsUpgrade { action } },
        );
        assert_eq!(state.modal.tab(), ModalTab::Plans);

        let plan = Plan { plan_id: 7, name: "專業方案".into(), monthly_points: 1000, batch_limit: 5, roles_limit: 3 };
        reduce(&mut state, Action::CatalogLoaded { packs: vec![], plans: vec![plan], errors: vec!["載入點數包失敗"] });
        assert_eq!(state.toast_text(), Some("載入點數包失敗"));

        reduce(&mut state, Action::ModalMove(1));
        assert!(reduce(&mut state, Action::ModalConfirm).is_empty());
        assert_eq!(state.toast_text(), Some("訂閱功能暫未開放，請聯繫客服"));
        assert!(!state.modal.is_visible());
    }

    #[test]
    fn denial_and_login_toasts() {
        let mut state = on_page(Page::Topics);
        let (action, _) = billable(&typed(&mut state, "/gen 旅遊"));
        reduce(
            &mut state,
            Action::BillableSettled {
                trigger_id: action.trigger_id.clone(),
                outcome: BusOutcome::Denied { message: "授權失敗：quota".into() },
            },
        );
        assert_eq!(state.toast_text(), Some("授權失敗：quota"));
        assert!(state.jobs.is_empty());

        billable(&typed(&mut state, "/gen 旅遊"));
        reduce(&mut state, Action::BillableSettled { trigger_id: action.trigger_id, outcome: BusOutcome::LoginRequired });
        assert_eq!(state.toast_text(), Some("請先登入"));
    }

    #[test]
    fn points_disabled_runs_directly() {
        let mut state = AppState::new(AppOptions { points_enabled: false, ..Default::default() });
        reduce(&mut state, Action::GoPage(Page::Topics));
        let effects = typed(&mut state, "/gen 露營");
        assert_eq!(effects, vec![Effect::Run(Job::Topics { theme: "露營".into() })]);
        assert_eq!(state.chat(AgentKind::Topics).messages().last(), Some(&ChatMessage::user("露營")));
    }

    #[test]
    fn badge_toggle_persists_and_wallet_updates() {
        let mut state = AppState::default();
        reduce(&mut state, Action::WalletLoaded(Some(WalletInfo { balance: 40, expiring_soon: 0 })));
        assert!(state.badge.view().is_some());

        let effects = typed(&mut state, "/badge");
        assert!(!state.settings.badge_visible);
        assert_eq!(effects, vec![Effect::PersistSettings(state.settings)]);
        assert!(state.badge.view().is_none());

        reduce(&mut state, Action::WalletLoaded(None));
        typed(&mut state, "/badge");
        assert!(state.badge.view().is_none());
    }

    #[test]
    fn quick_question_and_preset_prefill_input() {
        let mut state = on_page(Page::Script);
        typed(&mut state, "/mode free");
        typed(&mut state, "/q 2");
        assert_eq!(state.input, SCRIPT_QUICK_QUESTIONS[1]);

        let mut state = on_page(Page::Topics);
        typed(&mut state, "/preset trending");
        assert_eq!(state.input, "我想要熱門趨勢類型的選題建議");
    }

    #[test]
    fn toast_expires_after_ticks() {
        let mut state = AppState::default();
        state.show_toast("hi");
        for _ in 0..crate::app::TOAST_TICKS {
            reduce(&mut state, Action::Tick);
        }
        assert!(state.toast.is_none());
    }

    #[test]
    fn unknown_command_toasts() {
        let mut state = AppState::default();
        typed(&mut state, "/nope 1");
        assert_eq!(state.toast_text(), Some("❓ 未知指令 /nope，輸入 /help 查看可用指令"));

        reduce(&mut state, Action::ToggleHelp);
        assert!(state.help.as_deref().is_some_and(|h| h.contains("/wallet")));
        reduce(&mut state, Action::Dismiss);
        assert!(state.help.is_none());
    }
}
