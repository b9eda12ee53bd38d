use std::cmp::Ordering;
use std::fmt;

/// A single value read out of a row by a column accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Whole numbers keep their full 64-bit precision.
    Integer(i64),
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Integer(_) | CellValue::Number(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Empty => 2,
        }
    }

    /// Numbers compare numerically, text lexicographically.
    /// Across kinds numbers come first and empty cells last.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Integer(a), CellValue::Number(b)) => (*a as f64).total_cmp(b),
            (CellValue::Number(a), CellValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(n) => write!(f, "{n}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => f.write_str("∅"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

type Accessor<R> = Box<dyn Fn(&R) -> CellValue>;

/// Column descriptor. The key identifies the column; no two columns of one
/// table may share a key.
pub struct ColumnDef<R> {
    key: String,
    label: String,
    sortable: bool,
    resizable: bool,
    width: Option<usize>,
    accessor: Accessor<R>,
}

impl<R> ColumnDef<R> {
    /// Create a sortable, resizable column without a width hint.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        accessor: impl Fn(&R) -> CellValue + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            resizable: true,
            width: None,
            accessor: Box::new(accessor),
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Fixed width hint in cells.
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn width_hint(&self) -> Option<usize> {
        self.width
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }
}

impl<R> fmt::Debug for ColumnDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("resizable", &self.resizable)
            .field("width", &self.width)
            .finish()
    }
}
