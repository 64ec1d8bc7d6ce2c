//! `reelforge chat` and `reelforge generate`.

use std::io;

use anyhow::{Context, Result};
use tracing::info;

use logging::{ClientEvent, EventLogger};
use reelforge_client::agents::{error_line, generation_error_line, validate_input};
use reelforge_client::{AgentClient, PositioningReply, ScriptOptions, ScriptReply};
use reelforge_commands::handlers::THEME_REQUIRED;
use reelforge_commands::CommandRegistry;
use reelforge_core::{AgentKind, Page, ReelError, SegmentList};
use reelforge_points::{detect, log_outcome, ActionCompletion, Badge, BusOutcome, PointsBus};

use crate::config::CliContext;
use crate::terminal_output::{
    format_badge, format_profile, format_segments, note_error, note_info, note_success,
    note_warn, stream_write, StreamEcho,
};

/// One conversational turn with `agent`. Not billed.
pub async fn chat(
    ctx: &CliContext,
    agent: AgentKind,
    text: &str,
    template: Option<String>,
    duration: Option<u32>,
) -> Result<()> {
    let Some(text) = validate_input(text) else {
        note_error(if agent == AgentKind::Script { "請先輸入內容" } else { "請輸入內容" });
        return Ok(());
    };
    let client = ctx.agents();
    note_info(agent.loading_message());

    match agent {
        AgentKind::Positioning => print_positioning(client.analyze(text).await),
        AgentKind::Topics => {
            if let Err(e) = stream_to_stdout(&client, text).await {
                println!("{}", error_line(&e));
            }
        }
        AgentKind::Script => {
            let options = guide_options(template, duration);
            let reply = client.generate_script_content(text, options.as_ref()).await;
            print_script(reply, false);
        }
    }
    Ok(())
}

/// One-click generation from `theme`, gated by the points bus when enabled.
pub async fn generate(
    ctx: &CliContext,
    agent: AgentKind,
    page: Page,
    theme: &str,
    template: String,
    duration: u32,
) -> Result<()> {
    let Some(theme) = validate_input(theme) else {
        note_error(THEME_REQUIRED);
        return Ok(());
    };
    let client = ctx.agents();
    let options = ScriptOptions { template_type: template, duration };

    if !ctx.config.points_enabled() {
        run_generation(&client, agent, theme, &options).await;
        return Ok(());
    }

    let key = format!("oneclick-{agent}");
    let action = CommandRegistry::new()
        .control(&key)
        .and_then(|control| detect(&control, Some(page.id())))
        .with_context(|| format!("No billable action registered for {key}"))?;

    let bus = PointsBus::new(ctx.api.clone(), ctx.state.account_id());
    let outcome = bus
        .process(action.clone(), || run_generation(&client, agent, theme, &options))
        .await;
    log_outcome(&ctx.user_id, &action, &outcome);

    report_outcome(&outcome);
    // The bus refetched the wallet after a successful consume.
    if matches!(outcome, BusOutcome::Done { consumed: true, .. }) {
        if let Some(wallet) = bus.wallet().await {
            let mut badge = Badge::new(true).with_thresholds(ctx.thresholds());
            badge.update(wallet);
            if let Some(view) = badge.view() {
                println!("目前點數：{}", format_badge(&view));
            }
        }
    }
    Ok(())
}

async fn run_generation(
    client: &AgentClient,
    agent: AgentKind,
    theme: &str,
    options: &ScriptOptions,
) -> ActionCompletion {
    let failure = match agent {
        AgentKind::Positioning => {
            note_info("AI正在生成定位檔案...");
            match client.generate_positioning(theme).await {
                Ok(reply) => {
                    print_positioning(Ok(reply));
                    note_success("定位檔案生成完成");
                    None
                }
                Err(e) => {
                    println!("{}", generation_error_line(&e));
                    Some(e.display_text())
                }
            }
        }
        AgentKind::Topics => {
            note_info(AgentKind::Topics.loading_message());
            match stream_to_stdout(client, theme).await {
                Ok(_) => None,
                Err(e) => {
                    println!("{}", generation_error_line(&e));
                    Some(e.display_text())
                }
            }
        }
        AgentKind::Script => {
            note_info("AI正在生成腳本...");
            let reply = client.generate_script(theme, options).await;
            let failure = reply.as_ref().err().map(ReelError::display_text);
            print_script(reply, true);
            failure
        }
    };
    match failure {
        None => ActionCompletion::Completed,
        Some(message) => ActionCompletion::Failed(message),
    }
}

async fn stream_to_stdout(client: &AgentClient, text: &str) -> Result<String, ReelError> {
    let mut echo = StreamEcho::default();
    let mut on_delta = |accumulated: &str| {
        let _ = stream_write(&mut io::stdout(), echo.fresh(accumulated));
    };
    let full = client.stream_topics(text, &mut on_delta).await?;
    println!();
    EventLogger::log_event(
        client.user_id(),
        ClientEvent::StreamCompleted { agent: AgentKind::Topics.to_string(), chars: full.chars().count() },
    );
    Ok(full)
}

fn print_positioning(reply: Result<PositioningReply, ReelError>) {
    match reply {
        Ok(reply) => {
            if let Some(text) = reply.response {
                println!("{text}");
            }
            if let Some(profile) = reply.profile {
                println!();
                print!("{}", format_profile(&profile));
            }
        }
        Err(e) => println!("{}", error_line(&e)),
    }
}

fn print_script(reply: Result<ScriptReply, ReelError>, oneclick: bool) {
    match reply {
        Ok(reply) => {
            if let Some(message) = reply.assistant_message {
                println!("{message}");
            }
            if let Some(segments) = reply.segments {
                println!();
                print!("{}", format_segments(&SegmentList::new(segments)));
            }
            if oneclick {
                note_success("腳本生成完成");
            }
        }
        Err(e) if oneclick => println!("{}", generation_error_line(&e)),
        Err(e) => println!("{}", error_line(&e)),
    }
}

/// Guide-mode options when either flag is given; free mode otherwise.
fn guide_options(template: Option<String>, duration: Option<u32>) -> Option<ScriptOptions> {
    if template.is_none() && duration.is_none() {
        return None;
    }
    let defaults = ScriptOptions::default();
    Some(ScriptOptions {
        template_type: template.map(|t| t.to_uppercase()).unwrap_or(defaults.template_type),
        duration: duration.unwrap_or(defaults.duration),
    })
}

fn report_outcome(outcome: &BusOutcome) {
    match outcome {
        BusOutcome::Done { usage_id, consumed } => {
            info!(usage_id = %usage_id, consumed, "Generation billed");
            if !consumed {
                note_warn("扣點回報失敗，本次用量可能未記錄");
            }
        }
        // The inline error line already went out.
        BusOutcome::ActionFailed { .. } | BusOutcome::AlreadyInFlight => {}
        BusOutcome::NeedsTopup { suggest_pack_ids, .. } => {
            note_warn("點數不足，請先購買點數包");
            if !suggest_pack_ids.is_empty() {
                let ids: Vec<String> = suggest_pack_ids.iter().map(u32::to_string).collect();
                note_info(&format!("建議點數包：{}", ids.join(", ")));
            }
            note_info("使用 `reelforge packs` 查看方案，`reelforge buy <pack_id>` 購買");
        }
        BusOutcome::NeedsUpgrade { .. } => {
            note_warn("目前方案不支援此功能，請升級方案");
            note_info("使用 `reelforge plans` 查看訂閱方案");
        }
        other => {
            if let Some(text) = other.toast() {
                note_error(&text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_mode_without_flags() {
        assert_eq!(guide_options(None, None), None);
    }

    #[test]
    fn guide_mode_fills_missing_option() {
        let options = guide_options(Some("c".to_string()), None).unwrap();
        assert_eq!(options.template_type, "C");
        assert_eq!(options.duration, 30);

        let options = guide_options(None, Some(60)).unwrap();
        assert_eq!(options.template_type, "A");
        assert_eq!(options.duration, 60);
    }
}
