use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single-line numeric prompt, used to jump to a page.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    max_len: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl InputResult {
    /// The entered number, if the prompt was confirmed with a valid one.
    pub fn number(&self) -> Option<usize> {
        if !self.finished || self.canceled {
            return None;
        }
        self.input.parse().ok()
    }
}

impl Inputter {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            ..Default::default()
        }
    }

    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Char(c), KeyModifiers::NONE) if c.is_ascii_digit() => self.digit(c),
            (kc, _) => {
                trace!("Ignoring {kc:?} in numeric input");
                self.get()
            }
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.current_input.remove(self.curser_pos);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.len() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn digit(&mut self, chr: char) -> InputResult {
        if self.max_len == 0 || self.current_input.len() < self.max_len {
            // Digits are ASCII, so the cursor position is a byte position
            self.current_input.insert(self.curser_pos, chr);
            self.curser_pos += 1;
        }
        self.get()
    }
}
