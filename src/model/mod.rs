pub mod column;
pub mod column_widths;
pub mod expansion;
pub mod pagination;
pub mod selection;
pub mod sorting;

use derive_setters::Setters;
use ratatui::text::Text;
use tracing::{debug, trace};

use crate::viewport::{ResizeEvents, ResizeSubscription};

pub use column::{CellValue, ColumnDef};
pub use column_widths::{ColumnWidthAllocator, ColumnWidths, WidthPolicy};
pub use expansion::{ExpansionMode, RowExpansion};
pub use pagination::{Page, PaginationState};
pub use selection::RowSelection;
pub use sorting::{SortDirection, SortState};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Renders the detail panel of an expanded row.
pub type RowDetail<R> = dyn Fn(&R) -> Text<'static>;

type SortCallback = Box<dyn FnMut(&SortState)>;
type PageCallback = Box<dyn FnMut(&PaginationState)>;
type SelectionCallback<R> = Box<dyn FnMut(&[&R])>;
type ResizeCallback = Box<dyn FnMut(&ColumnWidths)>;

struct Callbacks<R> {
    on_sort_change: Option<SortCallback>,
    on_page_change: Option<PageCallback>,
    on_selection_change: Option<SelectionCallback<R>>,
    on_resize_change: Option<ResizeCallback>,
}

/// Everything needed to mount an [`AdaptiveTable`].
#[derive(Setters)]
pub struct TableProps<R> {
    #[setters(skip)]
    data: Vec<R>,
    #[setters(skip)]
    columns: Vec<ColumnDef<R>>,
    /// Show a selection checkbox column.
    has_checkbox: bool,
    /// Initial page size. Zero falls back to the first option.
    page_size: usize,
    page_size_options: Vec<usize>,
    expansion_mode: ExpansionMode,
    width_policy: WidthPolicy,
    #[setters(skip)]
    row_detail: Option<Box<RowDetail<R>>>,
    #[setters(skip)]
    callbacks: Callbacks<R>,
}

impl<R> TableProps<R> {
    pub fn new(data: Vec<R>, columns: Vec<ColumnDef<R>>) -> Self {
        Self {
            data,
            columns,
            has_checkbox: false,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            expansion_mode: ExpansionMode::default(),
            width_policy: WidthPolicy::default(),
            row_detail: None,
            callbacks: Callbacks {
                on_sort_change: None,
                on_page_change: None,
                on_selection_change: None,
                on_resize_change: None,
            },
        }
    }

    /// Enables row expansion.
    pub fn row_detail(mut self, render: impl Fn(&R) -> Text<'static> + 'static) -> Self {
        self.row_detail = Some(Box::new(render));
        self
    }

    pub fn on_sort_change(mut self, callback: impl FnMut(&SortState) + 'static) -> Self {
        self.callbacks.on_sort_change = Some(Box::new(callback));
        self
    }

    pub fn on_page_change(mut self, callback: impl FnMut(&PaginationState) + 'static) -> Self {
        self.callbacks.on_page_change = Some(Box::new(callback));
        self
    }

    pub fn on_selection_change(mut self, callback: impl FnMut(&[&R]) + 'static) -> Self {
        self.callbacks.on_selection_change = Some(Box::new(callback));
        self
    }

    pub fn on_resize_change(mut self, callback: impl FnMut(&ColumnWidths) + 'static) -> Self {
        self.callbacks.on_resize_change = Some(Box::new(callback));
        self
    }
}

/// Keyboard focus inside the displayed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub column: usize,
}

/// One displayed row: its page-relative index, its index in the dataset and
/// its page-scoped state.
#[derive(Debug)]
pub struct PageRow<'a, R> {
    pub index: usize,
    pub id: usize,
    pub row: &'a R,
    pub selected: bool,
    pub expanded: bool,
}

/// Immutable view of the table state for one render pass.
pub struct TableContext<'a, R> {
    pub rows: Vec<PageRow<'a, R>>,
    pub columns: &'a [ColumnDef<R>],
    pub widths: &'a ColumnWidths,
    pub sort: &'a SortState,
    pub pagination: PaginationState,
    pub has_checkbox: bool,
    pub checkbox_width: usize,
    pub all_selected: bool,
    pub indeterminate: bool,
    pub page_size_options: &'a [usize],
    pub row_detail: Option<&'a RowDetail<R>>,
    pub cursor: Cursor,
}

pub enum TableSnapshot<'a, R> {
    /// The dataset has no rows.
    Empty,
    Table(TableContext<'a, R>),
}

/// Composition root of the widget. Owns all table state for one mount;
/// dropping it releases the resize subscription.
pub struct AdaptiveTable<R> {
    data: Vec<R>,
    columns: Vec<ColumnDef<R>>,
    has_checkbox: bool,
    page_size_options: Vec<usize>,
    row_detail: Option<Box<RowDetail<R>>>,
    callbacks: Callbacks<R>,
    order: Vec<usize>, // Mapping of sorted position to data index
    sort: SortState,
    pagination: PaginationState,
    widths: ColumnWidthAllocator,
    selection: RowSelection,
    expansion: RowExpansion,
    cursor: Cursor,
    resize: ResizeSubscription,
}

fn resolve_page_size(page_size: usize, options: &[usize]) -> usize {
    if page_size > 0 {
        page_size
    } else {
        options.first().copied().unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

fn selected_rows_of<'a, R>(data: &'a [R], page: &[usize], selection: &RowSelection) -> Vec<&'a R> {
    selection
        .indices()
        .filter_map(|idx| page.get(idx))
        .map(|&id| &data[id])
        .collect()
}

impl<R> AdaptiveTable<R> {
    /// Mount a table: subscribe to resize events, sample the current width
    /// and lay out the first page. No callbacks fire while mounting.
    pub fn mount(props: TableProps<R>, events: &ResizeEvents) -> Self {
        let resize = events.subscribe();
        let page_size = resolve_page_size(props.page_size, &props.page_size_options);
        let total_items = props.data.len();

        let mut widths = ColumnWidthAllocator::new(props.width_policy);
        widths.recompute(&props.columns, resize.initial_width(), props.has_checkbox);

        let table = Self {
            order: (0..total_items).collect(),
            data: props.data,
            columns: props.columns,
            has_checkbox: props.has_checkbox,
            page_size_options: props.page_size_options,
            row_detail: props.row_detail,
            callbacks: props.callbacks,
            sort: SortState::default(),
            pagination: PaginationState {
                page: 0,
                page_size,
                page_count: pagination::page_count(total_items, page_size),
                total_items,
            },
            widths,
            selection: RowSelection::default(),
            expansion: RowExpansion::new(props.expansion_mode),
            cursor: Cursor::default(),
            resize,
        };
        debug!(
            "Mounted table with {} rows, {} columns, page size {}",
            total_items,
            table.columns.len(),
            page_size
        );
        table
    }

    // -------------------- Accessors ---------------------- //

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_checkbox(&self) -> bool {
        self.has_checkbox
    }

    pub fn can_expand(&self) -> bool {
        self.row_detail.is_some()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn column_widths(&self) -> &ColumnWidths {
        self.widths.widths()
    }

    pub fn container_width(&self) -> usize {
        self.widths.container_width()
    }

    pub fn selection(&self) -> &RowSelection {
        &self.selection
    }

    pub fn expansion(&self) -> &RowExpansion {
        &self.expansion
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Dataset indices of the displayed rows, in display order.
    pub fn page_ids(&self) -> &[usize] {
        &self.order[self.pagination.first_item()..self.pagination.last_item()]
    }

    /// Displayed rows, in display order.
    pub fn page_rows(&self) -> Vec<&R> {
        self.page_ids().iter().map(|&id| &self.data[id]).collect()
    }

    pub fn selected_rows(&self) -> Vec<&R> {
        selected_rows_of(&self.data, self.page_ids(), &self.selection)
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(self.page_ids().len())
    }

    pub fn is_indeterminate(&self) -> bool {
        self.selection.is_indeterminate(self.page_ids().len())
    }

    pub fn focused_column(&self) -> Option<&ColumnDef<R>> {
        self.columns.get(self.cursor.column)
    }

    /// Snapshot consumed by the views, or `Empty` for an empty dataset.
    pub fn context(&self) -> TableSnapshot<'_, R> {
        if self.data.is_empty() {
            return TableSnapshot::Empty;
        }
        let page_ids = self.page_ids();
        let rows = page_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| PageRow {
                index,
                id,
                row: &self.data[id],
                selected: self.selection.is_selected(index),
                expanded: self.expansion.is_expanded(index),
            })
            .collect();

        TableSnapshot::Table(TableContext {
            rows,
            columns: &self.columns,
            widths: self.widths.widths(),
            sort: &self.sort,
            pagination: self.pagination,
            has_checkbox: self.has_checkbox,
            checkbox_width: self.widths.policy().checkbox_width,
            all_selected: self.selection.is_all_selected(page_ids.len()),
            indeterminate: self.selection.is_indeterminate(page_ids.len()),
            page_size_options: &self.page_size_options,
            row_detail: self.row_detail.as_deref(),
            cursor: self.cursor,
        })
    }

    // -------------------- Container width ---------------------- //

    /// Apply the latest width published to the resize hub, if any.
    pub fn observe_resize(&mut self) -> bool {
        match self.resize.take() {
            Some(width) if width != self.widths.container_width() => {
                trace!(
                    "Container resized {} -> {}",
                    self.widths.container_width(),
                    width
                );
                let changed = self
                    .widths
                    .recompute(&self.columns, width, self.has_checkbox);
                if changed {
                    self.notify_resize();
                }
                changed
            }
            _ => false,
        }
    }

    pub fn resize_column(&mut self, key: &str, width: usize) -> bool {
        if !self.widths.resize(&self.columns, key, width) {
            return false;
        }
        debug!("Column {key} resized to {width}");
        self.notify_resize();
        true
    }

    pub fn resize_column_by(&mut self, key: &str, delta: isize) -> bool {
        if !self.widths.resize_by(&self.columns, key, delta) {
            return false;
        }
        self.notify_resize();
        true
    }

    // -------------------- Sorting ---------------------- //

    /// Header click on `key`: cycle its sort direction.
    pub fn sort_by(&mut self, key: &str) -> bool {
        let next = self.sort.cycle(key);
        self.set_sort(next)
    }

    /// Replace the sort state. Unknown or non-sortable columns are ignored;
    /// a key without a direction, or a direction without a key, clears the
    /// sort.
    pub fn set_sort(&mut self, state: SortState) -> bool {
        let state = state.normalized();
        if self.data.is_empty() || state == self.sort {
            return false;
        }
        if let Some(key) = &state.key
            && !self.columns.iter().any(|c| c.key() == key && c.is_sortable())
        {
            trace!("Ignoring sort on column {key}");
            return false;
        }

        self.sort = state;
        self.refresh_order();
        self.reset_page_scope();
        debug!("Sort changed to {:?}", self.sort);
        if let Some(callback) = self.callbacks.on_sort_change.as_mut() {
            callback(&self.sort);
        }
        true
    }

    fn refresh_order(&mut self) {
        let column = self
            .sort
            .key
            .as_deref()
            .and_then(|key| self.columns.iter().find(|c| c.key() == key));
        self.order = sorting::sorted_indices(&self.data, column, self.sort.direction);
    }

    // -------------------- Pagination ---------------------- //

    pub fn set_page(&mut self, page: usize) -> bool {
        self.commit_page(page, self.pagination.page_size)
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.pagination.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.pagination.page {
            0 => false,
            page => self.set_page(page - 1),
        }
    }

    pub fn first_page(&mut self) -> bool {
        self.set_page(0)
    }

    pub fn last_page(&mut self) -> bool {
        self.set_page(self.pagination.page_count.saturating_sub(1))
    }

    /// Change the page size, keeping the first visible row on screen.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page = pagination::page_after_resize(
            self.pagination.page,
            self.pagination.page_size,
            page_size,
            self.data.len(),
        );
        self.commit_page(page, page_size)
    }

    /// Switch to the next larger page size option.
    pub fn next_page_size(&mut self) -> bool {
        let current = self.pagination.page_size;
        match self.page_size_options.iter().copied().find(|&s| s > current) {
            Some(size) => self.set_page_size(size),
            None => false,
        }
    }

    /// Switch to the next smaller page size option.
    pub fn previous_page_size(&mut self) -> bool {
        let current = self.pagination.page_size;
        match self
            .page_size_options
            .iter()
            .copied()
            .filter(|&s| s > 0 && s < current)
            .max()
        {
            Some(size) => self.set_page_size(size),
            None => false,
        }
    }

    fn commit_page(&mut self, page: usize, page_size: usize) -> bool {
        if self.data.is_empty() {
            return false;
        }
        let total_items = self.data.len();
        let next = PaginationState {
            page: pagination::clamp_page(page, total_items, page_size),
            page_size,
            page_count: pagination::page_count(total_items, page_size),
            total_items,
        };
        if next == self.pagination {
            return false;
        }

        trace!(
            "Page {}/{} size {} -> {}/{} size {}",
            self.pagination.page,
            self.pagination.page_count,
            self.pagination.page_size,
            next.page,
            next.page_count,
            next.page_size
        );
        let moved = next.page != self.pagination.page || next.page_size != self.pagination.page_size;
        self.pagination = next;
        self.reset_page_scope();
        if moved && let Some(callback) = self.callbacks.on_page_change.as_mut() {
            callback(&self.pagination);
        }
        moved
    }

    // -------------------- Selection ---------------------- //

    pub fn select_row(&mut self, index: usize, checked: bool) -> bool {
        if !self.has_checkbox || self.data.is_empty() {
            return false;
        }
        let page_len = self.page_ids().len();
        let changed = self.selection.select_row(index, checked, page_len);
        if changed {
            self.notify_selection();
        }
        changed
    }

    pub fn toggle_row_selection(&mut self, index: usize) -> bool {
        let checked = !self.selection.is_selected(index);
        self.select_row(index, checked)
    }

    pub fn select_all(&mut self, checked: bool) -> bool {
        if !self.has_checkbox || self.data.is_empty() {
            return false;
        }
        let page_len = self.page_ids().len();
        let changed = self.selection.select_all(checked, page_len);
        if changed {
            self.notify_selection();
        }
        changed
    }

    /// Header checkbox: select the page unless it is already fully selected.
    pub fn toggle_select_all(&mut self) -> bool {
        let checked = !self.is_all_selected();
        self.select_all(checked)
    }

    fn notify_selection(&mut self) {
        let page = &self.order[self.pagination.first_item()..self.pagination.last_item()];
        if let Some(callback) = self.callbacks.on_selection_change.as_mut() {
            let rows = selected_rows_of(&self.data, page, &self.selection);
            trace!("Selection changed, {} rows selected", rows.len());
            callback(&rows);
        }
    }

    // -------------------- Expansion ---------------------- //

    /// Open or close the detail panel of a displayed row. Without a detail
    /// renderer this does nothing. Returns whether the row is open.
    pub fn toggle_expanded(&mut self, index: usize) -> bool {
        if self.row_detail.is_none() || index >= self.page_ids().len() {
            return false;
        }
        self.expansion.toggle(index)
    }

    // -------------------- Data and columns ---------------------- //

    /// Replace the dataset. The current sort is re-applied and the page is
    /// clamped to the new length.
    pub fn set_data(&mut self, data: Vec<R>) {
        let old_page = self.pagination.page;
        self.data = data;
        self.refresh_order();

        let total_items = self.data.len();
        let page_size = self.pagination.page_size;
        self.pagination = PaginationState {
            page: pagination::clamp_page(old_page, total_items, page_size),
            page_size,
            page_count: pagination::page_count(total_items, page_size),
            total_items,
        };
        self.reset_page_scope();
        debug!("Data replaced, {} rows", total_items);

        if self.pagination.page != old_page
            && let Some(callback) = self.callbacks.on_page_change.as_mut()
        {
            callback(&self.pagination);
        }
    }

    /// Replace the column set. Manual widths of columns that still exist are
    /// kept; a sort on a removed column is dropped.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef<R>>) {
        self.columns = columns;
        if let Some(key) = &self.sort.key
            && !self.columns.iter().any(|c| c.key() == key)
        {
            self.sort = SortState::default();
            self.refresh_order();
            self.reset_page_scope();
        }
        self.cursor.column = std::cmp::min(self.cursor.column, self.columns.len().saturating_sub(1));
        self.recompute_widths();
    }

    pub fn set_has_checkbox(&mut self, has_checkbox: bool) {
        if self.has_checkbox == has_checkbox {
            return;
        }
        self.has_checkbox = has_checkbox;
        if !has_checkbox && self.selection.clear() {
            self.notify_selection();
        }
        self.recompute_widths();
    }

    fn recompute_widths(&mut self) {
        let container_width = self.widths.container_width();
        if self
            .widths
            .recompute(&self.columns, container_width, self.has_checkbox)
        {
            self.notify_resize();
        }
    }

    fn notify_resize(&mut self) {
        if self.data.is_empty() {
            return;
        }
        if let Some(callback) = self.callbacks.on_resize_change.as_mut() {
            callback(self.widths.widths());
        }
    }

    /// Selection and expansion refer to the displayed page; whenever the
    /// page content changes both are cleared.
    fn reset_page_scope(&mut self) {
        self.expansion.clear();
        self.cursor.row = 0;
        if self.selection.clear() {
            self.notify_selection();
        }
    }

    // -------------------- Cursor ---------------------- //

    pub fn move_cursor_up(&mut self) {
        self.cursor.row = self.cursor.row.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        let last = self.page_ids().len().saturating_sub(1);
        self.cursor.row = std::cmp::min(self.cursor.row + 1, last);
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor.column = self.cursor.column.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let last = self.columns.len().saturating_sub(1);
        self.cursor.column = std::cmp::min(self.cursor.column + 1, last);
    }
}
