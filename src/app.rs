use arboard::Clipboard;
use derive_setters::Setters;
use tracing::{debug, info, trace, warn};

use crate::domain::{CMDMode, Message};
use crate::inputter::{InputResult, Inputter};
use crate::model::{
    AdaptiveTable, DEFAULT_PAGE_SIZE_OPTIONS, ExpansionMode, SortDirection, TableProps,
};
use crate::table::{DataSet, Record};
use crate::viewport::ResizeEvents;

/// Widest a column gets when fitted to its content.
pub const FIT_COLUMN_MAX_WIDTH: usize = 40;
/// Cells a column grows or shrinks per key press.
pub const COLUMN_RESIZE_STEP: isize = 2;
const GOTO_INPUT_MAX_LEN: usize = 9;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// How the viewer mounts its table.
#[derive(Debug, Clone, Default, Setters)]
pub struct ViewOptions {
    pub has_checkbox: bool,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub expansion_mode: ExpansionMode,
    pub fit_columns: bool,
}

pub struct App {
    pub status: Status,
    modus: Modus,
    name: String,
    table: AdaptiveTable<Record>,
    resize_events: ResizeEvents,
    inputter: Inputter,
    last_input: InputResult,
    cmd_mode: Option<CMDMode>,
    clipboard: Option<Clipboard>,
    status_message: String,
}

impl App {
    /// Mount `dataset` into a table that is `width` cells wide.
    pub fn new(dataset: DataSet, options: ViewOptions, width: usize) -> Self {
        let name = dataset.name.clone();
        let columns = dataset.columns(options.fit_columns.then_some(FIT_COLUMN_MAX_WIDTH));
        let detail = dataset.record_view();
        let page_size_options = if options.page_size_options.is_empty() {
            DEFAULT_PAGE_SIZE_OPTIONS.to_vec()
        } else {
            options.page_size_options
        };

        let props = TableProps::new(dataset.into_rows(), columns)
            .has_checkbox(options.has_checkbox)
            .page_size(options.page_size)
            .page_size_options(page_size_options)
            .expansion_mode(options.expansion_mode)
            .row_detail(detail)
            .on_sort_change(|sort| debug!("Sort changed: {sort:?}"))
            .on_page_change(|page| debug!("Page changed: {page:?}"))
            .on_selection_change(|rows| debug!("Selection changed: {} rows", rows.len()))
            .on_resize_change(|widths| trace!("Column widths changed: {widths:?}"));

        let resize_events = ResizeEvents::new(width);
        let table = AdaptiveTable::mount(props, &resize_events);
        info!(
            "Showing {} with {} rows",
            name,
            table.pagination().total_items
        );

        Self {
            status: Status::READY,
            modus: Modus::TABLE,
            name,
            table,
            resize_events,
            inputter: Inputter::new(GOTO_INPUT_MAX_LEN),
            last_input: InputResult::default(),
            cmd_mode: None,
            clipboard: None,
            status_message: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &AdaptiveTable<Record> {
        &self.table
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn show_help(&self) -> bool {
        self.modus == Modus::POPUP
    }

    /// Current prompt content while the go-to-page prompt is open.
    pub fn cmd_input(&self) -> Option<&InputResult> {
        match self.modus {
            Modus::CMDINPUT => Some(&self.last_input),
            _ => None,
        }
    }

    /// Whether key presses should reach the prompt untranslated.
    pub fn raw_keys(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn update(&mut self, message: Message) {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::Exit => self.collapse(),
                Message::Help => self.modus = Modus::POPUP,
                Message::MoveUp => self.table.move_cursor_up(),
                Message::MoveDown => self.table.move_cursor_down(),
                Message::MoveLeft => self.table.move_cursor_left(),
                Message::MoveRight => self.table.move_cursor_right(),
                Message::NextPage => {
                    self.table.next_page();
                }
                Message::PreviousPage => {
                    self.table.previous_page();
                }
                Message::FirstPage => {
                    self.table.first_page();
                }
                Message::LastPage => {
                    self.table.last_page();
                }
                Message::GrowPageSize => {
                    self.table.next_page_size();
                }
                Message::ShrinkPageSize => {
                    self.table.previous_page_size();
                }
                Message::Sort => self.sort_focused_column(),
                Message::ToggleSelect => self.toggle_select(),
                Message::ToggleSelectAll => self.toggle_select_all(),
                Message::ToggleExpand => self.toggle_expand(),
                Message::WidenColumn => self.resize_focused_column(COLUMN_RESIZE_STEP),
                Message::NarrowColumn => self.resize_focused_column(-COLUMN_RESIZE_STEP),
                Message::CopySelection => self.copy_selection(),
                Message::GotoPage => self.enter_cmd_mode(CMDMode::GotoPage),
                Message::Resize(width, _) => self.resize(width),
                Message::RawKey(_) => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.modus = Modus::TABLE,
                Message::Resize(width, _) => self.resize(width),
                _ => (),
            },
            Modus::CMDINPUT => match message {
                Message::RawKey(key) => {
                    self.last_input = self.inputter.read(key);
                    if self.last_input.finished {
                        self.exit_cmd_mode();
                    }
                }
                Message::Resize(width, _) => self.resize(width),
                _ => (),
            },
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn quit(&mut self) {
        info!("Quitting ...");
        self.status = Status::QUITTING;
    }

    fn resize(&mut self, width: usize) {
        self.resize_events.publish(width);
        self.table.observe_resize();
    }

    fn collapse(&mut self) {
        let row = self.table.cursor().row;
        if self.table.expansion().is_expanded(row) {
            self.table.toggle_expanded(row);
        }
    }

    fn sort_focused_column(&mut self) {
        let Some(key) = self.table.focused_column().map(|c| c.key().to_string()) else {
            return;
        };
        if !self.table.sort_by(&key) {
            self.set_status_message(format!("Column {key} can not be sorted"));
            return;
        }
        let message = match self.table.sort_state().direction {
            SortDirection::Ascending => format!("Sorted by {key} ascending"),
            SortDirection::Descending => format!("Sorted by {key} descending"),
            SortDirection::None => "Original order".to_string(),
        };
        self.set_status_message(message);
    }

    fn toggle_select(&mut self) {
        if !self.table.has_checkbox() {
            self.set_status_message("Start with --checkbox to select rows");
            return;
        }
        let row = self.table.cursor().row;
        self.table.toggle_row_selection(row);
        self.report_selection();
    }

    fn toggle_select_all(&mut self) {
        if !self.table.has_checkbox() {
            self.set_status_message("Start with --checkbox to select rows");
            return;
        }
        self.table.toggle_select_all();
        self.report_selection();
    }

    fn report_selection(&mut self) {
        let selected = self.table.selection().len();
        self.set_status_message(format!("{selected} rows selected"));
    }

    fn toggle_expand(&mut self) {
        let row = self.table.cursor().row;
        self.table.toggle_expanded(row);
    }

    fn resize_focused_column(&mut self, delta: isize) {
        let Some(key) = self.table.focused_column().map(|c| c.key().to_string()) else {
            return;
        };
        if self.table.resize_column_by(&key, delta)
            && let Some(width) = self.table.column_widths().get(&key)
        {
            self.set_status_message(format!("Column {key} is {width} wide"));
        }
    }

    fn copy_selection(&mut self) {
        let rows = self.table.selected_rows();
        if rows.is_empty() {
            self.set_status_message("Nothing selected");
            return;
        }
        let content = rows
            .iter()
            .map(|r| r.as_csv_line())
            .collect::<Vec<String>>()
            .join("\n");
        let count = rows.len();

        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .map_err(|e| warn!("Clipboard not available: {e:?}"))
                .ok();
        }
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(content).map_err(|e| e.to_string()),
            None => Err("no clipboard".to_string()),
        };
        match result {
            Ok(_) => {
                trace!("Copied {count} rows to clipboard.");
                self.set_status_message(format!("Copied {count} rows"));
            }
            Err(e) => {
                warn!("Error copying to clipboard: {e}");
                self.set_status_message(format!("Copy failed: {e}"));
            }
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        self.inputter.clear();
        self.last_input = self.inputter.get();
        self.cmd_mode = Some(mode);
        self.modus = Modus::CMDINPUT;
    }

    fn exit_cmd_mode(&mut self) {
        let input = std::mem::take(&mut self.last_input);
        let mode = self.cmd_mode.take();
        self.inputter.clear();
        self.modus = Modus::TABLE;

        match (mode, input.number()) {
            (Some(CMDMode::GotoPage), Some(page)) if page > 0 => {
                self.table.set_page(page - 1);
                let state = self.table.pagination();
                self.set_status_message(format!(
                    "Page {}/{}",
                    state.page + 1,
                    state.page_count
                ));
            }
            (Some(CMDMode::GotoPage), _) if !input.canceled => {
                self.set_status_message(format!("Invalid page '{}'", input.input));
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn dataset(rows: i64) -> DataSet {
        DataSet::new(
            "inline",
            vec!["id".into(), "name".into()],
            (0..rows)
                .map(|i| Record::new(vec![i.into(), format!("name {}", rows - i).into()]))
                .collect(),
        )
    }

    fn key(c: char) -> Message {
        Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn enter() -> Message {
        Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[test]
    fn quit_and_help() {
        let mut app = App::new(dataset(5), ViewOptions::default(), 80);
        app.update(Message::Help);
        assert!(app.show_help());
        app.update(Message::NextPage);
        assert!(app.show_help());
        app.update(Message::Exit);
        assert!(!app.show_help());
        app.update(Message::Quit);
        assert_eq!(app.status, Status::QUITTING);
    }

    #[test]
    fn goto_page_prompt() {
        let mut app = App::new(dataset(95), ViewOptions::default(), 80);
        app.update(Message::GotoPage);
        assert!(app.raw_keys());
        app.update(key('4'));
        assert_eq!(app.cmd_input().map(|i| i.input.as_str()), Some("4"));
        app.update(enter());
        assert!(!app.raw_keys());
        assert_eq!(app.table().pagination().page, 3);
        assert_eq!(app.status_message(), "Page 4/10");

        app.update(Message::GotoPage);
        app.update(key('0'));
        app.update(enter());
        assert_eq!(app.table().pagination().page, 3);
        assert_eq!(app.status_message(), "Invalid page '0'");
    }

    #[test]
    fn sort_cycles_on_focused_column() {
        let mut app = App::new(dataset(5), ViewOptions::default(), 80);
        app.update(Message::MoveRight);
        app.update(Message::Sort);
        assert_eq!(app.status_message(), "Sorted by name ascending");
        assert_eq!(app.table().page_rows()[0].get(0), &CellValue::Integer(4));
        app.update(Message::Sort);
        app.update(Message::Sort);
        assert_eq!(app.status_message(), "Original order");
    }

    #[test]
    fn selection_needs_checkbox() {
        let mut app = App::new(dataset(5), ViewOptions::default(), 80);
        app.update(Message::ToggleSelect);
        assert!(app.table().selection().is_empty());
        assert!(app.status_message().contains("--checkbox"));

        let mut app = App::new(dataset(5), ViewOptions::default().has_checkbox(true), 80);
        app.update(Message::MoveDown);
        app.update(Message::ToggleSelect);
        assert_eq!(app.table().selected_rows()[0].get(0), &CellValue::Integer(1));
        app.update(Message::ToggleSelectAll);
        assert_eq!(app.status_message(), "5 rows selected");
    }

    #[test]
    fn terminal_resize_reaches_table() {
        let mut app = App::new(dataset(5), ViewOptions::default(), 80);
        assert_eq!(app.table().column_widths().total(), 80);
        app.update(Message::Resize(120, 40));
        assert_eq!(app.table().container_width(), 120);
        assert_eq!(app.table().column_widths().get("id"), Some(60));

        app.update(Message::WidenColumn);
        assert_eq!(app.table().column_widths().get("id"), Some(62));
        assert_eq!(app.status_message(), "Column id is 62 wide");
    }

    #[test]
    fn expand_and_collapse_cursor_row() {
        let mut app = App::new(dataset(5), ViewOptions::default(), 80);
        app.update(Message::ToggleExpand);
        assert!(app.table().expansion().is_expanded(0));
        app.update(Message::Exit);
        assert!(!app.table().expansion().is_expanded(0));
    }

    #[test]
    fn page_size_keys_use_options() {
        let options = ViewOptions::default().page_size_options(vec![5, 20]);
        let mut app = App::new(dataset(50), options, 80);
        assert_eq!(app.table().pagination().page_size, 5);
        app.update(Message::GrowPageSize);
        assert_eq!(app.table().pagination().page_size, 20);
        app.update(Message::GrowPageSize);
        assert_eq!(app.table().pagination().page_size, 20);
        app.update(Message::ShrinkPageSize);
        assert_eq!(app.table().pagination().page_size, 5);
    }
}
