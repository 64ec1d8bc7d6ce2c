//! TUI rendering
//!
//! Pure function of `&AppState`; nothing here mutates state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use reelforge_core::cleanup::{clean_field, clean_note, completion_rate, completion_status, topic_title};
use reelforge_core::segment::EMPTY_SEGMENTS_TEXT;
use reelforge_core::{AgentKind, ChatLog, Page, Role, ScriptMode, UserProfile};
use reelforge_points::{BadgeBand, ModalTab, BUSY_LABEL};

use crate::app::AppState;

const HOME_TEXT: &str = "歡迎使用 ReelForge 短影音創作助手\n\n\
    • 帳號定位：分析業務與受眾，建立定位檔案\n\
    • 選題靈感：依定位產生選題建議\n\
    • 腳本生成：引導或自由模式產出分段腳本\n\n\
    Tab / Shift+Tab 切換頁面，F2–F7 直接跳頁，F1 顯示指令，Ctrl+C 離開";

const COPY_TEXT: &str = "文案\n\n\
    在腳本頁產生分段後，使用 /copy <n> 複製單段、/copyall 複製全部，\n\
    或在任一智能體頁以 /yank 複製最後一則回覆。";

const GUIDE_TEXT: &str = "使用指南\n\n\
    1. 先到「帳號定位」描述你的業務，或以 /gen <主題> 一鍵生成定位檔案，再用 /save 儲存。\n\
    2. 到「選題靈感」用 /preset <類型> 或直接提問取得選題。\n\
    3. 到「腳本生成」以 /template、/duration、/apply 設定結構與時長，\n   \
    再以 /gen <主題> 一鍵生成；/mode free 可自由對話並使用 /q <1-4> 快速提問。\n\
    4. 一鍵生成會扣除點數，/wallet 查看餘額，/buy 購買點數包，/plans 查看方案。";

pub fn draw_ui(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // page tabs + badge
            Constraint::Min(5),    // page body
            Constraint::Length(3), // input
            Constraint::Length(1), // status
        ])
        .split(f.size());

    draw_header(f, chunks[0], state);
    match state.page {
        Page::Home => draw_static(f, chunks[1], Page::Home, HOME_TEXT),
        Page::Copy => draw_static(f, chunks[1], Page::Copy, COPY_TEXT),
        Page::Guide => draw_static(f, chunks[1], Page::Guide, GUIDE_TEXT),
        Page::Positioning => draw_agent_page(f, chunks[1], state, AgentKind::Positioning),
        Page::Topics => draw_agent_page(f, chunks[1], state, AgentKind::Topics),
        Page::Script => draw_agent_page(f, chunks[1], state, AgentKind::Script),
    }
    draw_input(f, chunks[2], state);
    draw_status(f, chunks[3], state);

    if let Some(help) = &state.help {
        draw_help(f, help);
    }
    if state.modal.is_visible() {
        draw_modal(f, state);
    }
}

fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(28)])
        .split(area);

    let titles: Vec<Line> = Page::ALL.iter().map(|p| Line::from(p.title())).collect();
    let selected = Page::ALL.iter().position(|p| *p == state.page).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("ReelForge"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, cols[0]);

    let badge = match state.badge.view() {
        Some(view) => {
            let color = match view.band {
                BadgeBand::Low => Color::Red,
                BadgeBand::Warning => Color::Yellow,
                BadgeBand::Normal => Color::Green,
            };
            let mut spans = vec![Span::styled(
                view.balance_text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if let Some(expiring) = view.expiring_text {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(expiring, Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        }
        None => Line::from(""),
    };
    let widget = Paragraph::new(badge)
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::ALL).title("點數"));
    f.render_widget(widget, cols[1]);
}

fn draw_static(f: &mut Frame, area: Rect, page: Page, text: &'static str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(page.title()));
    f.render_widget(widget, area);
}

fn draw_agent_page(f: &mut Frame, area: Rect, state: &AppState, agent: AgentKind) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let preview = match agent {
        AgentKind::Topics => state.stream_preview.as_deref(),
        _ => None,
    };
    draw_chat(f, cols[0], state, agent, state.chat(agent), preview);

    match agent {
        AgentKind::Positioning => draw_profile(f, cols[1], state),
        AgentKind::Topics => draw_notes(f, cols[1], state, agent, "選題筆記"),
        AgentKind::Script => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Min(3)])
                .split(cols[1]);
            draw_script_settings(f, rows[0], state);
            draw_segments(f, rows[1], state);
        }
    }
}

fn draw_chat(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    agent: AgentKind,
    log: &ChatLog,
    preview: Option<&str>,
) {
    let mut lines: Vec<Line> = Vec::new();
    for message in log.messages() {
        let style = match message.role {
            Role::User => Style::default().fg(Color::Cyan),
            Role::Assistant => Style::default(),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", message.role.label()),
            style.add_modifier(Modifier::BOLD),
        )));
        for raw in message.content.split('\n') {
            lines.push(Line::from(Span::styled(raw.to_string(), style)));
        }
        lines.push(Line::from(""));
    }
    match (preview, state.loading.get(&agent)) {
        (Some(text), _) if !text.is_empty() => {
            lines.extend(text.split('\n').map(|l| Line::from(l.to_string())));
        }
        (_, Some(loading)) => {
            lines.push(Line::from(Span::styled(*loading, Style::default().fg(Color::DarkGray))));
        }
        _ => {}
    }

    // rows hidden above the viewport, keeping the tail visible
    let height = area.height.saturating_sub(2) as usize;
    let overflow = lines.len().saturating_sub(height);
    let offset = overflow.saturating_sub(state.scroll as usize);

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0))
        .block(Block::default().borders(Borders::ALL).title(state.page.title()));
    f.render_widget(widget, area);
}

fn draw_profile(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = Vec::new();
    match &state.profile {
        Some(profile) => lines.extend(profile_lines(profile)),
        None => lines.push(Line::from("尚無定位檔案")),
    }
    if !state.profile_notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("定位筆記", Style::default().add_modifier(Modifier::BOLD))));
        for note in &state.profile_notes {
            lines.push(Line::from(format!("• {}", clean_note(AgentKind::Positioning, &note.content))));
        }
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("定位檔案"));
    f.render_widget(widget, area);
}

fn profile_lines(profile: &UserProfile) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        completion_status(completion_rate(profile)),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (field, label) in UserProfile::NAMED_FIELDS {
        lines.push(Line::from(vec![
            Span::styled(format!("{label}："), Style::default().fg(Color::DarkGray)),
            Span::raw(clean_field(profile.get(field).as_deref())),
        ]));
    }
    lines
}

fn draw_notes(f: &mut Frame, area: Rect, state: &AppState, agent: AgentKind, title: &str) {
    let notes = state.notes.get(&agent).map(Vec::as_slice).unwrap_or_default();
    let lines: Vec<Line> = if notes.is_empty() {
        vec![Line::from(Span::styled("尚無筆記", Style::default().fg(Color::DarkGray)))]
    } else {
        notes
            .iter()
            .flat_map(|note| {
                let cleaned = clean_note(agent, &note.content);
                let heading = match agent {
                    AgentKind::Topics => topic_title(&cleaned),
                    _ => note.created_at.clone().unwrap_or_default(),
                };
                [
                    Line::from(Span::styled(heading, Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(cleaned),
                    Line::from(""),
                ]
            })
            .collect()
    };
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(widget, area);
}

fn draw_script_settings(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![Line::from(format!("模式：{}", state.script_mode.label()))];
    match state.script_mode {
        ScriptMode::Guide => {
            lines.push(Line::from(format!(
                "結構 {} · {} 秒",
                state.script_options.template_type, state.script_options.duration
            )));
            if state.script_draft != state.script_options {
                lines.push(Line::from(Span::styled(
                    format!(
                        "待套用：結構 {} · {} 秒（/apply）",
                        state.script_draft.template_type, state.script_draft.duration
                    ),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
        ScriptMode::Free => lines.push(Line::from("快速提問：/q 1–4")),
    }
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("腳本設定"));
    f.render_widget(widget, area);
}

fn draw_segments(f: &mut Frame, area: Rect, state: &AppState) {
    let cards = state.segments.render();
    let lines: Vec<Line> = if cards.is_empty() {
        vec![Line::from(Span::styled(EMPTY_SEGMENTS_TEXT, Style::default().fg(Color::DarkGray)))]
    } else {
        cards
            .into_iter()
            .flat_map(|card| {
                [
                    Line::from(vec![
                        Span::styled(card.label, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                        Span::raw(format!(" {} ", card.title)),
                        Span::styled(card.meta, Style::default().fg(Color::DarkGray)),
                    ]),
                    Line::from(format!("台詞：{}", card.dialog)),
                    Line::from(format!("畫面：{}", card.visual)),
                    Line::from(format!("CTA：{}", card.cta)),
                    Line::from(""),
                ]
            })
            .collect()
    };
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("腳本分段 / 時間軸"));
    f.render_widget(widget, area);
}

fn draw_input(f: &mut Frame, area: Rect, state: &AppState) {
    let title = if state.page_busy() {
        BUSY_LABEL.to_string()
    } else {
        match state.page.agent() {
            Some(_) => "輸入訊息（/ 開頭為指令）".to_string(),
            None => "輸入指令（/help）".to_string(),
        }
    };
    let widget = Paragraph::new(state.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, state: &AppState) {
    let line = match state.toast_text() {
        Some(text) => Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "Tab 切換頁面 · F1 指令 · Esc 關閉 · Ctrl+C 離開",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_help(f: &mut Frame, text: &str) {
    let area = centered_rect(60, 70, f.size());
    f.render_widget(Clear, area);
    let widget = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("指令（Esc 關閉）"));
    f.render_widget(widget, area);
}

fn draw_modal(f: &mut Frame, state: &AppState) {
    let modal = &state.modal;
    let area = centered_rect(70, 70, f.size());
    f.render_widget(Clear, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let selected = match modal.tab() {
        ModalTab::Packs => 0,
        ModalTab::Plans => 1,
    };
    let tabs = Tabs::new(vec![Line::from(ModalTab::Packs.title()), Line::from(ModalTab::Plans.title())])
        .block(Block::default().borders(Borders::ALL).title("購買點數"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, rows[0]);

    let marker = |selected: bool| if selected { "▶ " } else { "  " };
    let lines: Vec<Line> = match modal.tab() {
        ModalTab::Packs => modal
            .pack_cards()
            .into_iter()
            .flat_map(|card| {
                let mut head = vec![
                    Span::raw(marker(card.selected)),
                    Span::styled(card.name, Style::default().add_modifier(Modifier::BOLD)),
                ];
                if card.recommended {
                    head.push(Span::styled(" 推薦", Style::default().fg(Color::Magenta)));
                }
                [
                    Line::from(head),
                    Line::from(format!(
                        "    {} · {} · {}",
                        card.points_text, card.price_text, card.validity_text
                    )),
                    Line::from(format!("    {}", card.description)),
                ]
            })
            .collect(),
        ModalTab::Plans => modal
            .plan_cards()
            .into_iter()
            .flat_map(|card| {
                let mut lines = vec![
                    Line::from(vec![
                        Span::raw(marker(card.selected)),
                        Span::styled(card.name, Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(format!("  {}/月", card.price_text)),
                    ]),
                    Line::from(format!("    {}", card.description)),
                ];
                lines.extend(card.features.into_iter().map(|feature| Line::from(format!("    ✓ {feature}"))));
                lines
            })
            .collect(),
    };
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::LEFT | Borders::RIGHT));
    f.render_widget(body, rows[1]);

    let button = modal.button();
    let style = if button.enabled {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let footer = Paragraph::new(Line::from(Span::styled(format!("[ {} ]", button.label), style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("↑↓ 選擇 · Tab 切換 · Enter 確認 · Esc 關閉"));
    f.render_widget(footer, rows[2]);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup[1])[1]
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use reelforge_core::{ScriptSegment, WalletInfo};

    use super::*;
    use crate::action::Action;
    use crate::reducer::reduce;

    fn screen(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw_ui(f, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn draws_badge_and_segments() {
        let mut state = AppState::default();
        reduce(&mut state, Action::WalletLoaded(Some(WalletInfo { balance: 42, expiring_soon: 0 })));
        reduce(&mut state, Action::GoPage(Page::Script));
        state.segments.replace(vec![
            ScriptSegment { dialog: Some("first".into()), ..Default::default() },
            ScriptSegment { dialog: Some("second".into()), ..Default::default() },
        ]);

        let text = screen(&state);
        assert!(text.contains("42"));
        assert!(text.contains("#1"));
        assert!(text.contains("#2"));
        assert!(text.contains("second"));
    }

    #[test]
    fn draws_modal_over_page() {
        let mut state = AppState::default();
        state.modal.show_upgrade(None);
        let text = screen(&state);
        assert!(text.contains("Esc"));
    }
}
