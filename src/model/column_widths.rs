use std::collections::HashMap;

use tracing::trace;

use super::column::ColumnDef;

/// Width of the selection checkbox column, in cells.
pub const CHECKBOX_COLUMN_WIDTH: usize = 4;
/// Narrowest width a manual resize may produce.
pub const MIN_COLUMN_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthPolicy {
    pub checkbox_width: usize,
    pub min_column_width: usize,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        Self {
            checkbox_width: CHECKBOX_COLUMN_WIDTH,
            min_column_width: MIN_COLUMN_WIDTH,
        }
    }
}

/// Column key to width in cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnWidths(HashMap<String, usize>);

impl ColumnWidths {
    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }
}

/// Allocate widths for `columns` inside `container_width`.
///
/// A checkbox column, when present, is reserved first. Manual overrides,
/// then width hints, are handed out in column order, each clamped to what is
/// left. Columns without either share the remainder equally; leftover cells
/// from the integer division go to the first of them.
pub fn compute_widths<R>(
    columns: &[ColumnDef<R>],
    container_width: usize,
    has_checkbox: bool,
    policy: &WidthPolicy,
    overrides: &HashMap<String, usize>,
) -> ColumnWidths {
    let mut widths = HashMap::with_capacity(columns.len());
    if columns.is_empty() {
        return ColumnWidths(widths);
    }

    let mut remaining = if has_checkbox {
        container_width.saturating_sub(policy.checkbox_width)
    } else {
        container_width
    };

    // Every manual override is placed before any width hint
    for column in columns.iter() {
        if let Some(&width) = overrides.get(column.key()) {
            let width = std::cmp::min(width, remaining);
            remaining -= width;
            widths.insert(column.key().to_string(), width);
        }
    }

    let mut flexible = Vec::new();
    for column in columns.iter().filter(|c| !overrides.contains_key(c.key())) {
        match column.width_hint() {
            Some(width) => {
                let width = std::cmp::min(width, remaining);
                remaining -= width;
                widths.insert(column.key().to_string(), width);
            }
            None => flexible.push(column.key()),
        }
    }

    if !flexible.is_empty() {
        let share = remaining / flexible.len();
        let extra = remaining % flexible.len();
        for (idx, key) in flexible.into_iter().enumerate() {
            let width = if idx < extra { share + 1 } else { share };
            widths.insert(key.to_string(), width);
        }
    }

    ColumnWidths(widths)
}

/// Keeps the inputs of the last width computation and the user's manual
/// resizes, so container changes never overwrite a manually set column.
#[derive(Debug, Default)]
pub struct ColumnWidthAllocator {
    policy: WidthPolicy,
    container_width: usize,
    has_checkbox: bool,
    overrides: HashMap<String, usize>,
    widths: ColumnWidths,
}

impl ColumnWidthAllocator {
    pub fn new(policy: WidthPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn widths(&self) -> &ColumnWidths {
        &self.widths
    }

    pub fn container_width(&self) -> usize {
        self.container_width
    }

    pub fn policy(&self) -> &WidthPolicy {
        &self.policy
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Recompute for a new container width, column set or checkbox flag.
    /// Returns true when the resulting mapping changed.
    pub fn recompute<R>(
        &mut self,
        columns: &[ColumnDef<R>],
        container_width: usize,
        has_checkbox: bool,
    ) -> bool {
        self.container_width = container_width;
        self.has_checkbox = has_checkbox;
        // Overrides for columns that no longer exist are dropped
        self.overrides
            .retain(|key, _| columns.iter().any(|c| c.key() == key));

        let widths = compute_widths(
            columns,
            container_width,
            has_checkbox,
            &self.policy,
            &self.overrides,
        );
        trace!(
            "Column widths for container {container_width} (checkbox: {has_checkbox}): {:?}",
            widths
        );
        let changed = widths != self.widths;
        self.widths = widths;
        changed
    }

    /// Manually set the width of one column. Unknown and non-resizable
    /// columns are ignored. Returns true when the stored override or the
    /// mapping changed.
    pub fn resize<R>(&mut self, columns: &[ColumnDef<R>], key: &str, width: usize) -> bool {
        let Some(column) = columns.iter().find(|c| c.key() == key) else {
            return false;
        };
        if !column.is_resizable() {
            trace!("Column {key} is not resizable");
            return false;
        }
        let width = std::cmp::max(width, self.policy.min_column_width);
        let pinned = self.overrides.insert(key.to_string(), width) != Some(width);
        let changed = self.recompute(columns, self.container_width, self.has_checkbox);
        pinned || changed
    }

    /// Grow or shrink one column relative to its current width.
    pub fn resize_by<R>(&mut self, columns: &[ColumnDef<R>], key: &str, delta: isize) -> bool {
        let current = self.widths.get(key).unwrap_or(0);
        let width = current.saturating_add_signed(delta);
        self.resize(columns, key, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(hints: &[Option<usize>]) -> Vec<ColumnDef<()>> {
        hints
            .iter()
            .enumerate()
            .map(|(idx, hint)| {
                let column = ColumnDef::new(format!("c{idx}"), format!("C{idx}"), |_: &()| {
                    crate::model::CellValue::Empty
                });
                match hint {
                    Some(w) => column.width(*w),
                    None => column,
                }
            })
            .collect()
    }

    fn pixel_policy() -> WidthPolicy {
        WidthPolicy {
            checkbox_width: 40,
            min_column_width: 20,
        }
    }

    #[test]
    fn equal_division() {
        let cols = columns(&[None, None, None]);
        let widths = compute_widths(&cols, 600, false, &pixel_policy(), &HashMap::new());
        assert_eq!(widths.get("c0"), Some(200));
        assert_eq!(widths.get("c1"), Some(200));
        assert_eq!(widths.get("c2"), Some(200));
        assert_eq!(widths.total(), 600);
    }

    #[test]
    fn checkbox_is_reserved() {
        let cols = columns(&[None, None, None]);
        let widths = compute_widths(&cols, 600, true, &pixel_policy(), &HashMap::new());
        assert_eq!(widths.total(), 560);
    }

    #[test]
    fn remainder_goes_to_first_flexible_columns() {
        let cols = columns(&[None, None, None]);
        let widths = compute_widths(&cols, 100, false, &pixel_policy(), &HashMap::new());
        assert_eq!(widths.get("c0"), Some(34));
        assert_eq!(widths.get("c1"), Some(33));
        assert_eq!(widths.get("c2"), Some(33));
    }

    #[test]
    fn hints_are_kept_and_clamped() {
        let cols = columns(&[Some(150), None, Some(500)]);
        let widths = compute_widths(&cols, 600, false, &pixel_policy(), &HashMap::new());
        assert_eq!(widths.get("c0"), Some(150));
        // Only 450 left for the second hint
        assert_eq!(widths.get("c2"), Some(450));
        assert_eq!(widths.get("c1"), Some(0));
        assert_eq!(widths.total(), 600);
    }

    #[test]
    fn degenerate_inputs() {
        let none: Vec<ColumnDef<()>> = Vec::new();
        assert!(compute_widths(&none, 600, true, &pixel_policy(), &HashMap::new()).is_empty());

        let cols = columns(&[None, None]);
        let widths = compute_widths(&cols, 10, true, &pixel_policy(), &HashMap::new());
        assert_eq!(widths.total(), 0);
    }

    #[test]
    fn manual_resize_survives_container_change() {
        let cols = columns(&[None, None, None]);
        let mut allocator = ColumnWidthAllocator::new(pixel_policy());
        allocator.recompute(&cols, 600, false);
        assert!(allocator.resize(&cols, "c1", 300));
        assert_eq!(allocator.widths().get("c1"), Some(300));
        assert_eq!(allocator.widths().get("c0"), Some(150));

        allocator.recompute(&cols, 900, false);
        assert_eq!(allocator.widths().get("c1"), Some(300));
        assert_eq!(allocator.widths().get("c0"), Some(300));
        assert_eq!(allocator.widths().get("c2"), Some(300));
    }

    #[test]
    fn overrides_are_placed_before_hints() {
        let cols = columns(&[Some(400), None, None]);
        let overrides = HashMap::from([("c1".to_string(), 150)]);
        let widths = compute_widths(&cols, 500, false, &pixel_policy(), &overrides);
        assert_eq!(widths.get("c1"), Some(150));
        assert_eq!(widths.get("c0"), Some(350));
        assert_eq!(widths.get("c2"), Some(0));
    }

    #[test]
    fn resize_reports_new_override_at_same_width() {
        let cols = columns(&[None, None, None]);
        let mut allocator = ColumnWidthAllocator::new(pixel_policy());
        allocator.recompute(&cols, 90, false);
        assert_eq!(allocator.widths().get("c0"), Some(30));

        assert!(allocator.resize(&cols, "c0", 30));
        assert!(allocator.is_overridden("c0"));
        assert!(!allocator.resize(&cols, "c0", 30));
        // Clamped to the same minimum as before
        assert!(allocator.resize(&cols, "c1", 1));
        assert!(!allocator.resize(&cols, "c1", 5));
    }

    #[test]
    fn resize_respects_flags_and_minimum() {
        let mut cols = columns(&[None, None]);
        cols[1] = ColumnDef::new("c1", "C1", |_: &()| crate::model::CellValue::Empty)
            .resizable(false);
        let mut allocator = ColumnWidthAllocator::new(pixel_policy());
        allocator.recompute(&cols, 600, false);

        assert!(!allocator.resize(&cols, "c1", 100));
        assert!(!allocator.resize(&cols, "missing", 100));
        assert!(!allocator.is_overridden("c1"));

        allocator.resize(&cols, "c0", 1);
        assert_eq!(allocator.widths().get("c0"), Some(20));
        assert!(allocator.is_overridden("c0"));
    }

    #[test]
    fn resize_by_delta() {
        let cols = columns(&[None, None]);
        let mut allocator = ColumnWidthAllocator::new(WidthPolicy::default());
        allocator.recompute(&cols, 80, false);
        assert!(allocator.resize_by(&cols, "c0", 5));
        assert_eq!(allocator.widths().get("c0"), Some(45));
        assert_eq!(allocator.widths().get("c1"), Some(35));
        assert!(allocator.resize_by(&cols, "c0", -100));
        assert_eq!(allocator.widths().get("c0"), Some(MIN_COLUMN_WIDTH));
    }
}
