//! Keyboard input
//!
//! Maps crossterm events to reducer actions. While the purchase modal is
//! open it takes every key.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use reelforge_core::Page;

use crate::action::Action;
use crate::app::AppState;

pub fn map_event(event: &Event, state: &AppState) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => map_key(*key, state),
        Event::Paste(text) if !state.modal.is_visible() => Some(Action::Paste(text.clone())),
        _ => None,
    }
}

pub fn map_key(key: KeyEvent, state: &AppState) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    if state.modal.is_visible() {
        return match key.code {
            KeyCode::Esc => Some(Action::Dismiss),
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => Some(Action::ModalNextTab),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ModalMove(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ModalMove(1)),
            KeyCode::Enter => Some(Action::ModalConfirm),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(Action::Dismiss),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab => Some(Action::NextPage),
        KeyCode::BackTab => Some(Action::PrevPage),
        KeyCode::F(1) => Some(Action::ToggleHelp),
        // F2..F7 jump straight to a page
        KeyCode::F(n @ 2..=7) => Page::ALL.get(usize::from(n - 2)).map(|p| Action::GoPage(*p)),
        KeyCode::Up | KeyCode::PageUp => Some(Action::ScrollUp),
        KeyCode::Down | KeyCode::PageDown => Some(Action::ScrollDown),
        KeyCode::Char(c) => Some(Action::InputChar(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_navigation() {
        let state = AppState::default();
        assert!(matches!(map_key(key(KeyCode::Char('a')), &state), Some(Action::InputChar('a'))));
        assert!(matches!(map_key(key(KeyCode::Enter), &state), Some(Action::Submit)));
        assert!(matches!(map_key(key(KeyCode::F(5)), &state), Some(Action::GoPage(Page::Script))));
        assert!(map_key(key(KeyCode::F(9)), &state).is_none());
        assert!(matches!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &state),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn modal_captures_keys() {
        let mut state = AppState::default();
        state.modal.show(&[1], None);
        assert!(matches!(map_key(key(KeyCode::Enter), &state), Some(Action::ModalConfirm)));
        assert!(matches!(map_key(key(KeyCode::Char('j')), &state), Some(Action::ModalMove(1))));
        assert!(map_key(key(KeyCode::Char('x')), &state).is_none());
        assert!(map_event(&Event::Paste("hi".into()), &state).is_none());
    }
}
