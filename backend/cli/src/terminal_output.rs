//! Terminal output utilities: ANSI formatting, table rendering, stream
//! writing, and printers for profiles, notes, segments and the wallet.

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use reelforge_core::cleanup::{clean_field, clean_note, completion_rate, completion_status, topic_title};
use reelforge_core::segment::EMPTY_SEGMENTS_TEXT;
use reelforge_core::{AgentKind, Note, SegmentList, UserProfile};
use reelforge_points::{BadgeBand, BadgeView};

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

/// Wrap `text` in `style` when color is on.
pub fn paint(style: &str, text: &str) -> String {
    if supports_color() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Terminal columns taken by `s`, ignoring ANSI escapes.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

/// Print a formatted INFO note to stdout.
pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

/// Print a formatted WARNING note.
pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Column alignment.
pub enum Align {
    Left,
    Right,
}

/// A table column definition.
pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left }
    }
    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right }
    }
}

/// Render a table with given columns and rows.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns.iter().map(|c| display_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    out.push_str(&paint(BOLD, &format!("  {}  ", header_cells.join("  "))));
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(cell, widths[i], &columns[i].align)
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(display_width(s));
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

// ---------------------------------------------------------------------------
// Streaming writer
// ---------------------------------------------------------------------------

/// Write chunks to a buffered writer, flushing after each.
pub fn stream_write(writer: &mut impl Write, chunk: &str) -> std::io::Result<()> {
    writer.write_all(chunk.as_bytes())?;
    writer.flush()
}

/// Tracks how much of an accumulated stream has been printed.
#[derive(Default)]
pub struct StreamEcho {
    printed: usize,
}

impl StreamEcho {
    /// The part of `accumulated` not yet printed.
    pub fn fresh<'a>(&mut self, accumulated: &'a str) -> &'a str {
        let fresh = accumulated.get(self.printed..).unwrap_or("");
        self.printed = accumulated.len();
        fresh
    }
}

// ---------------------------------------------------------------------------
// Domain printers
// ---------------------------------------------------------------------------

pub fn format_badge(view: &BadgeView) -> String {
    let color = match view.band {
        BadgeBand::Low => RED,
        BadgeBand::Warning => YELLOW,
        BadgeBand::Normal => GREEN,
    };
    let mut out = paint(&format!("{color}{BOLD}"), &view.balance_text);
    if let Some(expiring) = &view.expiring_text {
        out.push_str(&format!("  {}", paint(DIM, expiring)));
    }
    out
}

pub fn format_profile(profile: &UserProfile) -> String {
    let mut out = paint(BOLD, &completion_status(completion_rate(profile)));
    out.push('\n');
    let rows: Vec<Vec<String>> = UserProfile::NAMED_FIELDS
        .iter()
        .map(|(field, label)| vec![label.to_string(), clean_field(profile.get(field).as_deref())])
        .collect();
    out.push_str(&render_table(&[Column::left("欄位"), Column::left("內容")], &rows));
    out
}

pub fn format_notes(agent: AgentKind, notes: &[Note]) -> String {
    if notes.is_empty() {
        return paint(DIM, "尚無筆記");
    }
    let mut out = String::new();
    for note in notes {
        let cleaned = clean_note(agent, &note.content);
        let heading = match agent {
            AgentKind::Topics => topic_title(&cleaned),
            _ => note.created_at.clone().unwrap_or_else(|| "筆記".to_string()),
        };
        out.push_str(&paint(&format!("{MAGENTA}{BOLD}"), &heading));
        out.push('\n');
        out.push_str(&cleaned);
        out.push_str("\n\n");
    }
    out
}

pub fn format_segments(segments: &SegmentList) -> String {
    let cards = segments.render();
    if cards.is_empty() {
        return paint(DIM, EMPTY_SEGMENTS_TEXT);
    }
    let mut out = String::new();
    for card in cards {
        out.push_str(&format!(
            "{} {} {}\n  台詞：{}\n  畫面：{}\n  CTA：{}\n\n",
            paint(&format!("{CYAN}{BOLD}"), &card.label),
            card.title,
            paint(DIM, &card.meta),
            card.dialog,
            card.visual,
            card.cta
        ));
    }
    out
}
