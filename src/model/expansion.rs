use std::collections::BTreeSet;

/// Whether opening one row's detail panel closes the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionMode {
    #[default]
    Single,
    Multi,
}

/// Rows of the displayed page whose detail panel is open.
#[derive(Debug, Default, Clone)]
pub struct RowExpansion {
    mode: ExpansionMode,
    expanded: BTreeSet<usize>,
}

impl RowExpansion {
    pub fn new(mode: ExpansionMode) -> Self {
        Self {
            mode,
            expanded: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> ExpansionMode {
        self.mode
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn expanded(&self) -> impl Iterator<Item = usize> + '_ {
        self.expanded.iter().copied()
    }

    /// Open `index` if it is closed, close it otherwise. Returns whether the
    /// row is open afterwards.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.expanded.remove(&index) {
            return false;
        }
        if self.mode == ExpansionMode::Single {
            self.expanded.clear();
        }
        self.expanded.insert(index);
        true
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}
