use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::domain::HELP_TEXT;
use crate::model::{SortDirection, TableContext, TableSnapshot};

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const PAGINATION_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;

const EMPTY_STATE_TEXT: &str = "No data available";

/// Shorten `text` to `width` characters, marking cut text with "...".
fn get_visible_text(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    if width < 3 {
        return text.chars().take(width).collect();
    }
    let mut reduced = text.chars().take(width - 3).collect::<String>();
    reduced.push_str("...");
    reduced
}

fn checkbox(checked: bool, indeterminate: bool) -> &'static str {
    match (checked, indeterminate) {
        (true, _) => "[x]",
        (false, true) => "[-]",
        (false, false) => "[ ]",
    }
}

/// Horizontal slots of the data columns: (x offset, width) per column.
fn column_slots<R>(ctx: &TableContext<'_, R>) -> Vec<(usize, usize)> {
    let mut x = if ctx.has_checkbox { ctx.checkbox_width } else { 0 };
    ctx.columns
        .iter()
        .map(|column| {
            let width = ctx.widths.get(column.key()).unwrap_or(0);
            let slot = (x, width);
            x += width;
            slot
        })
        .collect()
}

/// Write `text` into one slot of a row, keeping one spacer cell.
fn put_cell(buf: &mut Buffer, area: Rect, y: u16, x: usize, width: usize, text: &str, style: Style) {
    let left = area.x as usize + x;
    if width == 0 || left >= area.right() as usize {
        return;
    }
    let visible = std::cmp::min(width, area.right() as usize - left);
    let content = get_visible_text(text, width.saturating_sub(1));
    buf.set_stringn(left as u16, y, content, visible, style);
}

pub struct HeaderView<'a, R> {
    ctx: &'a TableContext<'a, R>,
}

impl<R> Widget for HeaderView<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ctx = self.ctx;
        let base = Style::default().add_modifier(Modifier::BOLD);
        buf.set_style(Rect { height: 1, ..area }, base.add_modifier(Modifier::UNDERLINED));

        if ctx.has_checkbox {
            let mark = checkbox(ctx.all_selected, ctx.indeterminate);
            put_cell(buf, area, area.y, 0, ctx.checkbox_width, mark, base);
        }

        for (idx, (column, (x, width))) in ctx.columns.iter().zip(column_slots(ctx)).enumerate() {
            let arrow = match ctx.sort.direction_for(column.key()) {
                SortDirection::Ascending => " ▲",
                SortDirection::Descending => " ▼",
                SortDirection::None => "",
            };
            let label = get_visible_text(column.label(), width.saturating_sub(1 + arrow.chars().count()));
            let mut style = base;
            if idx == ctx.cursor.column {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if !column.is_sortable() {
                style = style.add_modifier(Modifier::DIM);
            }
            put_cell(buf, area, area.y, x, width, &format!("{label}{arrow}"), style);
        }
    }
}

enum BodyLine<'t> {
    Row(usize),
    Detail(&'t Line<'static>),
}

pub struct BodyView<'a, R> {
    ctx: &'a TableContext<'a, R>,
}

impl<R> Widget for BodyView<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ctx = self.ctx;
        let slots = column_slots(ctx);

        // Detail panels of expanded rows, rendered once per pass
        let details = ctx
            .rows
            .iter()
            .map(|r| match (r.expanded, ctx.row_detail) {
                (true, Some(render)) => Some(render(r.row)),
                _ => None,
            })
            .collect::<Vec<Option<Text<'static>>>>();

        let mut lines = Vec::new();
        let mut cursor_span = (0, 0);
        for (idx, detail) in details.iter().enumerate() {
            let start = lines.len();
            lines.push(BodyLine::Row(idx));
            if let Some(text) = detail {
                lines.extend(text.lines.iter().map(BodyLine::Detail));
            }
            if idx == ctx.cursor.row {
                cursor_span = (start, lines.len());
            }
        }

        // Scroll so the cursor row and its detail panel are visible
        let height = area.height as usize;
        let offset = std::cmp::min(cursor_span.1.saturating_sub(height), cursor_span.0);

        for (line_no, line) in lines.iter().skip(offset).take(height).enumerate() {
            let y = area.y + line_no as u16;
            match line {
                BodyLine::Row(idx) => {
                    let row = &ctx.rows[*idx];
                    let mut style = Style::default();
                    if row.selected {
                        style = style.yellow();
                    }
                    if *idx == ctx.cursor.row {
                        style = style.add_modifier(Modifier::REVERSED);
                        buf.set_style(Rect { y, height: 1, ..area }, style);
                    }
                    if ctx.has_checkbox {
                        put_cell(buf, area, y, 0, ctx.checkbox_width, checkbox(row.selected, false), style);
                    }
                    for (column, (x, width)) in ctx.columns.iter().zip(slots.iter()) {
                        let value = column.value(row.row).to_string();
                        put_cell(buf, area, y, *x, *width, &value, style);
                    }
                }
                BodyLine::Detail(detail) => {
                    let indent = if ctx.has_checkbox { ctx.checkbox_width as u16 } else { 2 };
                    let x = std::cmp::min(area.x + indent, area.right());
                    buf.set_line(x, y, detail, area.right() - x);
                }
            }
        }
    }
}

pub struct PaginationBar<'a, R> {
    ctx: &'a TableContext<'a, R>,
}

impl<R> Widget for PaginationBar<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.ctx.pagination;
        let arrow = |enabled: bool, symbol: &'static str| {
            if enabled {
                Span::from(symbol).bold()
            } else {
                Span::from(symbol).dim()
            }
        };
        let sizes = self
            .ctx
            .page_size_options
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<String>>()
            .join("/");

        let line = Line::from(vec![
            " Rows per page: ".into(),
            p.page_size.to_string().blue().bold(),
            format!(" ({sizes})  ").dim(),
            format!("{}-{} of {}  ", p.first_item() + 1, p.last_item(), p.total_items).into(),
            arrow(p.has_previous(), "◀"),
            format!(" Page {}/{} ", p.page + 1, std::cmp::max(p.page_count, 1)).into(),
            arrow(p.has_next(), "▶"),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

pub struct EmptyState;

impl Widget for EmptyState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(EMPTY_STATE_TEXT.italic())
            .centered()
            .block(Block::bordered().border_set(border::ROUNDED))
            .render(area, buf);
    }
}

/// Header, body and pagination bar of a table, or the empty-state.
pub struct TableWidget<'a, R> {
    snapshot: TableSnapshot<'a, R>,
}

impl<'a, R> TableWidget<'a, R> {
    pub fn new(snapshot: TableSnapshot<'a, R>) -> Self {
        Self { snapshot }
    }
}

impl<R> Widget for TableWidget<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ctx = match &self.snapshot {
            TableSnapshot::Empty => return EmptyState.render(area, buf),
            TableSnapshot::Table(ctx) => ctx,
        };
        let [header, body, pagination] = Layout::vertical([
            Constraint::Length(TABLE_HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(PAGINATION_HEIGHT),
        ])
        .areas(area);

        HeaderView { ctx }.render(header, buf);
        BodyView { ctx }.render(body, buf);
        PaginationBar { ctx }.render(pagination, buf);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

#[derive(Debug, Default)]
pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, app: &App, frame: &mut Frame) {
        let [table_area, status_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(CMDLINE_HEIGH)])
                .areas(frame.area());

        frame.render_widget(TableWidget::new(app.table().context()), table_area);
        self.draw_statusline(app, frame, status_area);

        if app.show_help() {
            let area = centered_rect(60, 70, frame.area());
            frame.render_widget(Clear, area);
            let popup = Paragraph::new(HELP_TEXT)
                .wrap(Wrap { trim: false })
                .block(
                    Block::bordered()
                        .title(Line::from(" Help ".bold()).centered())
                        .title_bottom(Line::from(" <Esc> close ".blue()).centered())
                        .border_set(border::THICK),
                );
            frame.render_widget(popup, area);
        }
    }

    fn draw_statusline(&self, app: &App, frame: &mut Frame, area: Rect) {
        if let Some(input) = app.cmd_input() {
            let prompt = "Go to page: ";
            let line = Line::from(vec![prompt.bold(), input.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.len() + input.curser_pos) as u16;
            frame.set_cursor_position((std::cmp::min(x, area.right().saturating_sub(1)), area.y));
            return;
        }

        let line = Line::from(vec![
            format!(" {} ", app.name()).black().on_blue().bold(),
            format!(" {}", app.status_message()).into(),
        ]);
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(10)]).areas(area);
        frame.render_widget(Paragraph::new(line), left);
        frame.render_widget(Paragraph::new(" ? help ".dim()).right_aligned(), right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdaptiveTable, CellValue, ColumnDef, TableProps};
    use crate::viewport::ResizeEvents;

    fn buffer_lines(buf: &Buffer) -> Vec<String> {
        (buf.area.y..buf.area.bottom())
            .map(|y| {
                (buf.area.x..buf.area.right())
                    .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
                    .collect::<String>()
            })
            .collect()
    }

    fn table(rows: usize, checkbox: bool) -> AdaptiveTable<(usize, String)> {
        let data = (0..rows).map(|i| (i, format!("row{i}"))).collect();
        let columns = vec![
            ColumnDef::new("n", "Num", |r: &(usize, String)| CellValue::Number(r.0 as f64)),
            ColumnDef::new("s", "Name", |r: &(usize, String)| CellValue::from(r.1.as_str())),
        ];
        let props = TableProps::new(data, columns)
            .has_checkbox(checkbox)
            .page_size(3)
            .page_size_options(vec![3, 6])
            .row_detail(|r: &(usize, String)| Text::from(format!("detail of {}", r.1)));
        AdaptiveTable::mount(props, &ResizeEvents::new(60))
    }

    fn render(table: &AdaptiveTable<(usize, String)>, height: u16) -> Vec<String> {
        let mut buf = Buffer::empty(Rect::new(0, 0, 60, height));
        TableWidget::new(table.context()).render(buf.area, &mut buf);
        buffer_lines(&buf)
    }

    #[test]
    fn visible_text_is_shortened() {
        assert_eq!(get_visible_text("abc", 5), "abc");
        assert_eq!(get_visible_text("abcdefgh", 6), "abc...");
        assert_eq!(get_visible_text("abcdefgh", 2), "ab");
    }

    #[test]
    fn renders_header_rows_and_pagination() {
        let table = table(7, false);
        let lines = render(&table, 6);
        assert!(lines[0].starts_with("Num"));
        assert!(lines[0].contains("Name"));
        assert!(lines[1].starts_with("0"));
        assert!(lines[1].contains("row0"));
        assert!(lines[3].contains("row2"));
        assert!(lines[5].contains("1-3 of 7"));
        assert!(lines[5].contains("Page 1/3"));
    }

    #[test]
    fn renders_checkboxes_and_sort_arrow() {
        let mut table = table(7, true);
        table.sort_by("n");
        table.select_row(1, true);
        let lines = render(&table, 6);
        assert!(lines[0].starts_with("[-]"));
        assert!(lines[0].contains("▲"));
        assert!(lines[1].starts_with("[ ]"));
        assert!(lines[2].starts_with("[x]"));

        table.select_all(true);
        let lines = render(&table, 6);
        assert!(lines[0].starts_with("[x]"));
    }

    #[test]
    fn expanded_row_shows_detail() {
        let mut table = table(7, false);
        table.toggle_expanded(0);
        let lines = render(&table, 7);
        assert!(lines[1].contains("row0"));
        assert!(lines[2].contains("detail of row0"));
        assert!(lines[3].contains("row1"));
    }

    #[test]
    fn empty_dataset_shows_placeholder() {
        let events = ResizeEvents::new(30);
        let props = TableProps::new(
            Vec::<(usize, String)>::new(),
            vec![ColumnDef::new("n", "Num", |r: &(usize, String)| {
                CellValue::Number(r.0 as f64)
            })],
        );
        let table = AdaptiveTable::mount(props, &events);
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 3));
        TableWidget::new(table.context()).render(buf.area, &mut buf);
        assert!(buffer_lines(&buf)[1].contains(EMPTY_STATE_TEXT));
    }
}
