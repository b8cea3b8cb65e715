//! Generic sortable, paginated table shared by the standings, roster, and
//! raw-table views. Sorting never mutates the caller's data: every resolve
//! re-derives a fresh row order from the source.

use std::cmp::Ordering;
use tui::Frame;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::widgets::{Block, Cell, Paragraph, Row, Table};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> char {
        match self {
            SortDirection::Ascending => '▲',
            SortDirection::Descending => '▼',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

/// Per-view table UI state: which column is sorted, which page is shown, and
/// the row the cursor sits on (an index into the resolved page).
#[derive(Debug, Default, Clone)]
pub struct TableState {
    pub sort: Option<SortState>,
    pub page: usize,
    pub cursor: usize,
}

impl TableState {
    /// Walk column 0 ascending, column 0 descending, column 1 ascending,
    /// ... and back to unsorted after the last column.
    pub fn cycle_sort(&mut self, column_count: usize) {
        if column_count == 0 {
            return;
        }
        self.sort = match self.sort {
            None => Some(SortState { column: 0, direction: SortDirection::Ascending }),
            Some(SortState { column, direction: SortDirection::Ascending }) => {
                Some(SortState { column, direction: SortDirection::Descending })
            }
            Some(SortState { column, direction: SortDirection::Descending }) => {
                let next = column + 1;
                (next < column_count)
                    .then_some(SortState { column: next, direction: SortDirection::Ascending })
            }
        };
        self.cursor = 0;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
        self.cursor = 0;
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
        self.cursor = 0;
    }

    pub fn reset(&mut self) {
        self.page = 0;
        self.cursor = 0;
    }
}

/// A typed column: how to print a cell and, optionally, how to order rows by
/// it. Columns without a comparator are not sortable and leave the rows in
/// source order.
pub struct ColumnSpec<T> {
    pub header: &'static str,
    pub accessor: fn(&T) -> String,
    pub sort_by: Option<fn(&T, &T) -> Ordering>,
    pub width: u16,
}

/// The page of cells actually drawn, after sorting, clamping, and slicing.
pub struct ResolvedTable {
    pub headers: Vec<String>,
    pub widths: Vec<u16>,
    pub rows: Vec<Vec<String>>,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub cursor: usize,
}

/// Resolve typed items against column specs. Clamps the state's page and
/// cursor in place so a shrunken data set never leaves the view stranded.
pub fn resolve<T>(
    items: &[T],
    columns: &[ColumnSpec<T>],
    state: &mut TableState,
    page_size: usize,
) -> ResolvedTable {
    let mut order: Vec<usize> = (0..items.len()).collect();

    if let Some(SortState { column, direction }) = state.sort
        && let Some(cmp) = columns.get(column).and_then(|spec| spec.sort_by)
    {
        order.sort_by(|&a, &b| cmp(&items[a], &items[b]));
        if direction == SortDirection::Descending {
            order.reverse();
        }
    }

    let headers = columns
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            if c.sort_by.is_some() {
                decorate_header(c.header, idx, state)
            } else {
                c.header.to_string()
            }
        })
        .collect();
    let widths = columns.iter().map(|c| c.width).collect();

    paginate(
        state,
        page_size,
        order,
        |row| columns.iter().map(|c| (c.accessor)(&items[row])).collect(),
        headers,
        widths,
    )
}

/// Resolve pre-rendered string rows (the raw table browser). Sorting is
/// lexical on the selected column.
pub fn resolve_rows(
    headers: &[String],
    rows: &[Vec<String>],
    state: &mut TableState,
    page_size: usize,
) -> ResolvedTable {
    let mut order: Vec<usize> = (0..rows.len()).collect();

    if let Some(SortState { column, direction }) = state.sort {
        order.sort_by(|&a, &b| {
            let left = rows[a].get(column).map(String::as_str).unwrap_or("");
            let right = rows[b].get(column).map(String::as_str).unwrap_or("");
            left.cmp(right)
        });
        if direction == SortDirection::Descending {
            order.reverse();
        }
    }

    let widths: Vec<u16> = headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            rows.iter()
                .filter_map(|r| r.get(idx))
                .map(|cell| cell.chars().count())
                .chain([h.chars().count()])
                .max()
                .unwrap_or(4)
                .clamp(4, 24) as u16
        })
        .collect();
    let decorated: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(idx, h)| decorate_header(h, idx, state))
        .collect();

    paginate(state, page_size, order, |row| rows[row].clone(), decorated, widths)
}

fn paginate(
    state: &mut TableState,
    page_size: usize,
    order: Vec<usize>,
    cells_for: impl Fn(usize) -> Vec<String>,
    headers: Vec<String>,
    widths: Vec<u16>,
) -> ResolvedTable {
    let page_size = page_size.max(1);
    let total_rows = order.len();
    let page_count = total_rows.div_ceil(page_size).max(1);
    // Clamp to the last page rather than showing an empty one.
    state.page = state.page.min(page_count - 1);

    let start = state.page * page_size;
    let visible: Vec<usize> = order.into_iter().skip(start).take(page_size).collect();
    state.cursor = state.cursor.min(visible.len().saturating_sub(1));

    let rows = visible.into_iter().map(cells_for).collect();

    ResolvedTable {
        headers,
        widths,
        rows,
        page: state.page,
        page_count,
        total_rows,
        cursor: state.cursor,
    }
}

fn decorate_header(header: &str, idx: usize, state: &TableState) -> String {
    match state.sort {
        Some(SortState { column, direction }) if column == idx => {
            format!("{header} {}", direction.arrow())
        }
        _ => header.to_string(),
    }
}

/// Draw a resolved table into `area` with a one-line pager footer.
pub fn render(f: &mut Frame, area: Rect, resolved: &ResolvedTable, highlight_cursor: bool) {
    if area.height < 3 {
        return;
    }
    let [table_area, footer_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

    let header = Row::new(
        resolved
            .headers
            .iter()
            .map(|h| Cell::from(h.as_str()).style(Style::default().add_modifier(Modifier::BOLD))),
    );
    let rows = resolved.rows.iter().enumerate().map(|(idx, cells)| {
        let style = if highlight_cursor && idx == resolved.cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Row::new(cells.iter().map(|c| Cell::from(c.as_str()))).style(style)
    });
    let widths: Vec<Constraint> = resolved
        .widths
        .iter()
        .map(|&w| Constraint::Length(w))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default())
        .column_spacing(2);
    f.render_widget(table, table_area);

    let footer = format!(
        "page {}/{} · {} rows · s=sort [/]=page",
        resolved.page + 1,
        resolved.page_count,
        resolved.total_rows
    );
    f.render_widget(
        Paragraph::new(footer)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Right),
        footer_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Standing {
        name: &'static str,
        points: i64,
    }

    fn columns() -> Vec<ColumnSpec<Standing>> {
        vec![
            ColumnSpec {
                header: "Team",
                accessor: |s| s.name.to_string(),
                sort_by: None,
                width: 12,
            },
            ColumnSpec {
                header: "Pts",
                accessor: |s| s.points.to_string(),
                sort_by: Some(|a, b| a.points.cmp(&b.points)),
                width: 4,
            },
        ]
    }

    fn items() -> Vec<Standing> {
        vec![
            Standing { name: "Cedar", points: 5 },
            Standing { name: "Alpine", points: 7 },
            Standing { name: "Harborview", points: 9 },
            Standing { name: "Milltown", points: 2 },
        ]
    }

    fn sorted(column: usize, direction: SortDirection) -> TableState {
        TableState { sort: Some(SortState { column, direction }), ..Default::default() }
    }

    #[test]
    fn descending_exactly_reverses_ascending_for_distinct_keys() {
        let items = items();
        let columns = columns();

        let mut state = sorted(1, SortDirection::Ascending);
        let asc = resolve(&items, &columns, &mut state, 10);
        let asc_names: Vec<_> = asc.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(asc_names, vec!["Milltown", "Cedar", "Alpine", "Harborview"]);

        state.sort = Some(SortState { column: 1, direction: SortDirection::Descending });
        let desc = resolve(&items, &columns, &mut state, 10);
        let desc_names: Vec<_> = desc.rows.iter().map(|r| r[0].clone()).collect();
        let mut reversed = asc_names.clone();
        reversed.reverse();
        assert_eq!(desc_names, reversed);
    }

    #[test]
    fn sorting_does_not_reorder_the_source() {
        let items = items();
        let columns = columns();
        let mut state = sorted(1, SortDirection::Ascending);
        let _ = resolve(&items, &columns, &mut state, 10);
        assert_eq!(items[0].name, "Cedar");
    }

    #[test]
    fn page_is_clamped_when_the_data_shrinks() {
        let items = items();
        let columns = columns();
        let mut state = TableState { sort: None, page: 7, cursor: 3 };

        let resolved = resolve(&items, &columns, &mut state, 3);
        // 4 rows at 3 per page → last page is index 1 with a single row.
        assert_eq!(state.page, 1);
        assert_eq!(resolved.rows.len(), 1);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn string_rows_sort_lexically() {
        let headers = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec!["3".to_string(), "charlie".to_string()],
            vec!["1".to_string(), "alpha".to_string()],
            vec!["2".to_string(), "bravo".to_string()],
        ];
        let mut state = sorted(1, SortDirection::Ascending);
        let resolved = resolve_rows(&headers, &rows, &mut state, 10);
        assert_eq!(resolved.rows[0][1], "alpha");
        assert_eq!(resolved.rows[2][1], "charlie");
        assert!(resolved.headers[1].contains('▲'));
    }

    #[test]
    fn a_column_without_a_comparator_is_not_sortable() {
        let items = items();
        let columns = columns();
        // Cycling lands on column 0 first, which carries no comparator.
        let mut state = TableState::default();
        state.cycle_sort(2);
        let resolved = resolve(&items, &columns, &mut state, 10);
        let names: Vec<_> = resolved.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(names, vec!["Cedar", "Alpine", "Harborview", "Milltown"]);
        assert_eq!(resolved.headers[0], "Team", "no sort arrow on an unsortable column");
    }

    #[test]
    fn empty_data_resolves_to_one_empty_page() {
        let items: Vec<Standing> = Vec::new();
        let columns = columns();
        let mut state = TableState::default();
        let resolved = resolve(&items, &columns, &mut state, 10);
        assert_eq!(resolved.page_count, 1);
        assert!(resolved.rows.is_empty());
    }

    #[test]
    fn sort_cycling_walks_every_column_and_wraps_to_unsorted() {
        let mut state = TableState::default();
        state.cycle_sort(2);
        assert_eq!(state.sort, Some(SortState { column: 0, direction: SortDirection::Ascending }));
        state.cycle_sort(2);
        assert_eq!(state.sort, Some(SortState { column: 0, direction: SortDirection::Descending }));
        state.cycle_sort(2);
        assert_eq!(state.sort, Some(SortState { column: 1, direction: SortDirection::Ascending }));
        state.cycle_sort(2);
        state.cycle_sort(2);
        assert_eq!(state.sort, None, "past the last column the sort clears");
    }
}
