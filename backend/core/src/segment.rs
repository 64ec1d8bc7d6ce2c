//! Script segments and the ordered segment list.
//!
//! A segment's index in the list is its only identity. Cards are always
//! rebuilt from the whole list so that card `#n` and index `n - 1` never drift.

use serde::{Deserialize, Serialize};

/// Seconds assigned per segment when the backend omits timings.
const DEFAULT_SEGMENT_SECS: u32 = 6;

/// One timed unit of a generated video script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptSegment {
    #[serde(default)]
    pub start_sec: Option<u32>,
    #[serde(default)]
    pub end_sec: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub dialog: Option<String>,
    #[serde(default)]
    pub visual: Option<String>,
    #[serde(default)]
    pub cta: Option<String>,
}

impl ScriptSegment {
    /// Start/end seconds, falling back to a fixed-width slot at `index`.
    pub fn timing(&self, index: usize) -> (u32, u32) {
        match (self.start_sec, self.end_sec) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let start = index as u32 * DEFAULT_SEGMENT_SECS;
                (start, start + DEFAULT_SEGMENT_SECS)
            }
        }
    }

    /// Plain-text form used by copy actions.
    pub fn to_copy_text(&self, index: usize) -> String {
        let (start, end) = self.timing(index);
        format!(
            "({start}s–{end}s) [{}] camera:{}\n台詞:{}\n畫面:{}\nCTA:{}",
            non_empty_or(&self.kind, "-"),
            non_empty_or(&self.camera, "-"),
            self.dialog.as_deref().unwrap_or(""),
            self.visual.as_deref().unwrap_or(""),
            self.cta.as_deref().unwrap_or(""),
        )
    }
}

fn non_empty_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => fallback,
    }
}

/// A rendered segment card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCard {
    /// Current list index; actions on the card resolve through this.
    pub index: usize,
    /// `#1`, `#2`, ...
    pub label: String,
    pub title: String,
    pub meta: String,
    pub dialog: String,
    pub visual: String,
    pub cta: String,
}

/// Text shown in place of cards when there are no segments.
pub const EMPTY_SEGMENTS_TEXT: &str = "尚無片段。請輸入更具體的秒數/場景/目標。";

/// Ordered script segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentList {
    segments: Vec<ScriptSegment>,
}

impl SegmentList {
    pub fn new(segments: Vec<ScriptSegment>) -> Self {
        let mut list = Self { segments };
        list.pin_slots();
        list
    }

    pub fn replace(&mut self, segments: Vec<ScriptSegment>) {
        self.segments = segments;
        self.pin_slots();
    }

    /// Fix untimed segments to the slot of their arrival index, so later
    /// deletes do not shift them.
    fn pin_slots(&mut self) {
        for (i, segment) in self.segments.iter_mut().enumerate() {
            if segment.start_sec.is_none() || segment.end_sec.is_none() {
                let (start, end) = segment.timing(i);
                segment.start_sec = Some(start);
                segment.end_sec = Some(end);
            }
        }
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScriptSegment> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptSegment> {
        self.segments.iter()
    }

    /// Remove the segment at `index`. Returns the removed segment.
    pub fn delete(&mut self, index: usize) -> Option<ScriptSegment> {
        if index < self.segments.len() {
            Some(self.segments.remove(index))
        } else {
            None
        }
    }

    /// Replace dialog/visual/CTA; `None` or empty inputs leave a field untouched.
    pub fn tweak(
        &mut self,
        index: usize,
        dialog: Option<&str>,
        visual: Option<&str>,
        cta: Option<&str>,
    ) -> bool {
        let Some(segment) = self.segments.get_mut(index) else {
            return false;
        };
        for (slot, value) in [
            (&mut segment.dialog, dialog),
            (&mut segment.visual, visual),
            (&mut segment.cta, cta),
        ] {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *slot = Some(v.to_string());
            }
        }
        true
    }

    /// Copy text for one segment.
    pub fn copy_text(&self, index: usize) -> Option<String> {
        self.segments.get(index).map(|s| s.to_copy_text(index))
    }

    /// Copy text for every segment, separated by blank lines.
    pub fn copy_all(&self) -> Option<String> {
        if self.segments.is_empty() {
            return None;
        }
        Some(
            self.segments
                .iter()
                .enumerate()
                .map(|(i, s)| s.to_copy_text(i))
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }

    /// Rebuild every card from the current list.
    pub fn render(&self) -> Vec<SegmentCard> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let (start, end) = s.timing(i);
                SegmentCard {
                    index: i,
                    label: format!("#{}", i + 1),
                    title: non_empty_or(&s.kind, "segment").to_string(),
                    meta: format!("{start}s–{end}s · 鏡位 {}", non_empty_or(&s.camera, "-")),
                    dialog: s.dialog.clone().unwrap_or_default(),
                    visual: s.visual.clone().unwrap_or_default(),
                    cta: s.cta.clone().unwrap_or_default(),
                }
            })
            .collect()
    }
}
