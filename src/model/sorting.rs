use super::column::ColumnDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    None,
    Ascending,
    Descending,
}

/// Single-column sort state. `direction` is `None` exactly when no column
/// is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        match direction {
            SortDirection::None => Self::default(),
            _ => Self {
                key: Some(key.into()),
                direction,
            },
        }
    }

    /// The same state with a key and a direction, or no sort at all.
    pub fn normalized(self) -> SortState {
        match self.key {
            Some(key) => SortState::new(key, self.direction),
            None => SortState::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some() && self.direction != SortDirection::None
    }

    /// Direction shown for `key`, `None` for every inactive column.
    pub fn direction_for(&self, key: &str) -> SortDirection {
        match &self.key {
            Some(k) if k == key => self.direction,
            _ => SortDirection::None,
        }
    }

    /// State after clicking the header of `key`: the active column cycles
    /// none -> ascending -> descending -> none, any other column starts
    /// ascending.
    pub fn cycle(&self, key: &str) -> SortState {
        let next = match self.direction_for(key) {
            SortDirection::None => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
        };
        SortState::new(key, next)
    }
}

/// Stable index permutation of `data` ordered by `column` in `direction`.
/// Without a column or direction the original order is returned.
pub fn sorted_indices<R>(
    data: &[R],
    column: Option<&ColumnDef<R>>,
    direction: SortDirection,
) -> Vec<usize> {
    let identity = (0..data.len()).collect::<Vec<usize>>();
    let column = match (column, direction) {
        (Some(column), SortDirection::Ascending | SortDirection::Descending) => column,
        _ => return identity,
    };

    // Read every cell once, then sort the (index, value) pairs
    let mut indexed_rows = identity
        .into_iter()
        .map(|idx| (idx, column.value(&data[idx])))
        .collect::<Vec<_>>();

    // slice::sort_by is stable, ties keep their original order
    indexed_rows.sort_by(|(_, a), (_, b)| {
        let ord = a.compare(b);
        match direction {
            SortDirection::Descending => ord.reverse(),
            _ => ord,
        }
    });

    indexed_rows.into_iter().map(|(idx, _)| idx).collect()
}

/// Sorted copy of `data`, referencing the original rows.
pub fn sort<'a, R>(
    data: &'a [R],
    column: Option<&ColumnDef<R>>,
    direction: SortDirection,
) -> Vec<&'a R> {
    sorted_indices(data, column, direction)
        .into_iter()
        .map(|idx| &data[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::CellValue;

    #[derive(Debug, PartialEq)]
    struct Person {
        name: &'static str,
        age: i64,
    }

    fn people() -> Vec<Person> {
        vec![
            Person { name: "carol", age: 35 },
            Person { name: "alice", age: 30 },
            Person { name: "bob", age: 35 },
            Person { name: "dave", age: 9 },
        ]
    }

    fn age() -> ColumnDef<Person> {
        ColumnDef::new("age", "Age", |p: &Person| p.age.into())
    }

    fn name() -> ColumnDef<Person> {
        ColumnDef::new("name", "Name", |p: &Person| CellValue::from(p.name))
    }

    #[test]
    fn no_direction_is_identity() {
        let data = people();
        assert_eq!(sorted_indices(&data, Some(&age()), SortDirection::None), vec![0, 1, 2, 3]);
        assert_eq!(sorted_indices(&data, None, SortDirection::Ascending), vec![0, 1, 2, 3]);
    }

    #[test]
    fn numeric_ascending_is_stable() {
        let data = people();
        let sorted = sort(&data, Some(&age()), SortDirection::Ascending);
        let names = sorted.iter().map(|p| p.name).collect::<Vec<_>>();
        // carol and bob tie on 35 and keep their input order
        assert_eq!(names, vec!["dave", "alice", "carol", "bob"]);
    }

    #[test]
    fn descending_keeps_ties_in_input_order() {
        let data = people();
        let sorted = sort(&data, Some(&age()), SortDirection::Descending);
        let names = sorted.iter().map(|p| p.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["carol", "bob", "alice", "dave"]);
    }

    #[test]
    fn text_sorts_lexicographically() {
        let data = people();
        let sorted = sort(&data, Some(&name()), SortDirection::Ascending);
        let names = sorted.iter().map(|p| p.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn sorting_is_idempotent_and_preserves_length() {
        let data = people();
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let once = sort(&data, Some(&age()), direction);
            assert_eq!(once.len(), data.len());
            let owned = once
                .iter()
                .map(|p| Person { name: p.name, age: p.age })
                .collect::<Vec<_>>();
            let twice = sort(&owned, Some(&age()), direction);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn three_clicks_return_to_none() {
        let state = SortState::default();
        let s1 = state.cycle("age");
        assert_eq!(s1.direction, SortDirection::Ascending);
        let s2 = s1.cycle("age");
        assert_eq!(s2.direction, SortDirection::Descending);
        let s3 = s2.cycle("age");
        assert_eq!(s3, SortState::default());
        assert!(!s3.is_active());
    }

    #[test]
    fn other_column_starts_ascending() {
        let state = SortState::new("age", SortDirection::Descending);
        let next = state.cycle("name");
        assert_eq!(next, SortState::new("name", SortDirection::Ascending));
        assert_eq!(next.direction_for("age"), SortDirection::None);
    }
}
