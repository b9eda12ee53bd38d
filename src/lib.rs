//! A paginated, sortable and resizable data table for ratatui, plus the
//! pieces of a small file viewer built on it.

pub mod app;
pub mod controller;
pub mod domain;
pub mod inputter;
pub mod model;
pub mod table;
pub mod ui;
pub mod viewport;

pub use model::{
    AdaptiveTable, CellValue, ColumnDef, ColumnWidths, ExpansionMode, PaginationState,
    SortDirection, SortState, TableContext, TableProps, TableSnapshot,
};
pub use ui::TableWidget;
pub use viewport::{ResizeEvents, ResizeSubscription};
