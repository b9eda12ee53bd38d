use std::collections::BTreeSet;

/// Selected rows of the displayed page, by page-relative index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RowSelection {
    selected: BTreeSet<usize>,
}

impl RowSelection {
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Add or remove one row. Indices outside the page are ignored.
    /// Returns true when the selection changed.
    pub fn select_row(&mut self, index: usize, checked: bool, page_len: usize) -> bool {
        if index >= page_len {
            return false;
        }
        if checked {
            self.selected.insert(index)
        } else {
            self.selected.remove(&index)
        }
    }

    /// Flip one row. Returns true when the selection changed.
    pub fn toggle_row(&mut self, index: usize, page_len: usize) -> bool {
        let checked = !self.is_selected(index);
        self.select_row(index, checked, page_len)
    }

    /// Select every displayed row, or clear the selection.
    pub fn select_all(&mut self, checked: bool, page_len: usize) -> bool {
        let next = if checked {
            (0..page_len).collect::<BTreeSet<usize>>()
        } else {
            BTreeSet::new()
        };
        let changed = next != self.selected;
        self.selected = next;
        changed
    }

    pub fn clear(&mut self) -> bool {
        self.select_all(false, 0)
    }

    pub fn is_all_selected(&self, page_len: usize) -> bool {
        page_len > 0 && self.selected.len() == page_len && self.selected.iter().all(|&i| i < page_len)
    }

    pub fn is_indeterminate(&self, page_len: usize) -> bool {
        !self.selected.is_empty() && !self.is_all_selected(page_len)
    }
}
