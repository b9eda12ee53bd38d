use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use tracing_error::SpanTrace;

#[derive(Debug)]
pub enum TableError {
    IoError(Error),
    PolarsError(PolarsError, SpanTrace),
    LoadingFailed(String),
    LoggingSetup(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::IoError(e) => write!(f, "I/O error: {e}"),
            TableError::PolarsError(e, trace) => write!(f, "Failed to read data: {e}\n{trace}"),
            TableError::LoadingFailed(reason) => write!(f, "Loading failed: {reason}"),
            TableError::LoggingSetup(reason) => write!(f, "Could not set up logging: {reason}"),
            TableError::FileNotFound => f.write_str("File not found"),
            TableError::PermissionDenied => f.write_str("Permission denied"),
            TableError::UnknownFileType => f.write_str("Unknown file type"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::IoError(e) => Some(e),
            TableError::PolarsError(e, _) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for TableError {
    fn from(err: Error) -> Self {
        TableError::IoError(err)
    }
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::PolarsError(err, SpanTrace::capture())
    }
}

/// Runtime knobs of the viewer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub event_poll_time: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    GotoPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    GrowPageSize,
    ShrinkPageSize,
    Sort,
    ToggleSelect,
    ToggleSelectAll,
    ToggleExpand,
    WidenColumn,
    NarrowColumn,
    CopySelection,
    GotoPage,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Navigation
  ↑/k ↓/j ←/h →/l   move cursor
  n / PgDn          next page
  p / PgUp          previous page
  Home / End        first / last page
  g                 go to page
  + / -             bigger / smaller pages

Table
  s                 cycle sort on column
  < / >             narrow / widen column
  Enter             expand row details
  Space             select row
  a                 select page
  y                 copy selected rows

  ?                 this help
  Esc               close
  q                 quit";
