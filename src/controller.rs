use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TableConfig, TableError};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TableConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Wait for the next terminal event and map it to a message. With
    /// `raw_keys` every key press is forwarded untouched, for prompts.
    pub fn handle_event(&self, raw_keys: bool) -> Result<Option<Message>, TableError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            // crossterm also emits key release and repeat events on Windows
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if raw_keys {
                    Some(Message::RawKey(key))
                } else {
                    Self::handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    pub fn handle_key(key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left | KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right | KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageDown | KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::PageUp | KeyCode::Char('p'), _) => Some(Message::PreviousPage),
            (KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('+'), _) => Some(Message::GrowPageSize),
            (KeyCode::Char('-'), _) => Some(Message::ShrinkPageSize),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Char(' '), _) => Some(Message::ToggleSelect),
            (KeyCode::Char('a'), _) => Some(Message::ToggleSelectAll),
            (KeyCode::Enter, _) => Some(Message::ToggleExpand),
            (KeyCode::Char('>'), _) => Some(Message::WidenColumn),
            (KeyCode::Char('<'), _) => Some(Message::NarrowColumn),
            (KeyCode::Char('y'), _) => Some(Message::CopySelection),
            (KeyCode::Char('g'), _) => Some(Message::GotoPage),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Option<Message> {
        Controller::handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn maps_table_keys() {
        assert_eq!(press(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(press(KeyCode::Char('s')), Some(Message::Sort));
        assert_eq!(press(KeyCode::Char(' ')), Some(Message::ToggleSelect));
        assert_eq!(press(KeyCode::PageDown), Some(Message::NextPage));
        assert_eq!(press(KeyCode::Char('p')), Some(Message::PreviousPage));
        assert_eq!(press(KeyCode::Enter), Some(Message::ToggleExpand));
        assert_eq!(press(KeyCode::Char('>')), Some(Message::WidenColumn));
        assert_eq!(press(KeyCode::Char('z')), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Controller::handle_key(key), Some(Message::Quit));
    }
}
