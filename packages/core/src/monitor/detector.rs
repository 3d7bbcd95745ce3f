//! New-row detection between consecutive snapshots.

use std::collections::HashSet;

use crate::table::{Row, Table};

/// Return the data rows of `current` that do not appear among the data rows
/// of `previous`, in `current`'s order.
///
/// Rows are compared field by field. Without a usable baseline (`previous`
/// absent or holding no data rows) nothing counts as new.
pub fn detect_new_rows(previous: Option<&Table>, current: &Table) -> Vec<Row> {
    let Some(previous) = previous.filter(|p| p.has_data_rows()) else {
        return Vec::new();
    };

    let known: HashSet<&[String]> = previous
        .data_rows()
        .iter()
        .map(|row| row.as_slice())
        .collect();

    current
        .data_rows()
        .iter()
        .filter(|row| !known.contains(row.as_slice()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(rows.iter().map(|r| r.iter().copied()))
    }

    #[test]
    fn no_baseline_means_no_new_rows() {
        let current = table(&[&["id"], &["1"], &["2"], &["3"]]);

        assert!(detect_new_rows(None, &current).is_empty());
    }

    #[test]
    fn header_only_baseline_means_no_new_rows() {
        let previous = table(&[&["id"]]);
        let current = table(&[&["id"], &["1"]]);

        assert!(detect_new_rows(Some(&previous), &current).is_empty());
    }

    #[test]
    fn returns_rows_missing_from_previous_in_current_order() {
        let previous = table(&[&["id", "v"], &["2", "b"], &["1", "a"]]);
        let current = table(&[&["id", "v"], &["3", "c"], &["1", "a"], &["0", "z"], &["2", "b"]]);

        let new_rows = detect_new_rows(Some(&previous), &current);

        assert_eq!(new_rows, vec![vec!["3", "c"], vec!["0", "z"]]);
    }

    #[test]
    fn any_field_change_makes_a_row_new() {
        let previous = table(&[&["id", "v"], &["1", "a"]]);
        let current = table(&[&["id", "v"], &["1", "a "]]);

        assert_eq!(detect_new_rows(Some(&previous), &current).len(), 1);
    }

    #[test]
    fn header_change_alone_is_not_a_new_row() {
        let previous = table(&[&["id", "v"], &["1", "a"]]);
        let current = table(&[&["ID", "V"], &["1", "a"]]);

        assert!(detect_new_rows(Some(&previous), &current).is_empty());
    }

    #[test]
    fn duplicated_new_rows_are_all_reported() {
        let previous = table(&[&["id"], &["1"]]);
        let current = table(&[&["id"], &["2"], &["2"]]);

        assert_eq!(detect_new_rows(Some(&previous), &current).len(), 2);
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        prop::collection::vec(prop::collection::vec("[a-c]{0,2}", 1..4), 0..12)
            .prop_map(Table::new)
    }

    proptest! {
        #[test]
        fn detecting_against_itself_is_empty(t in arb_table()) {
            prop_assert!(detect_new_rows(Some(&t), &t).is_empty());
        }

        #[test]
        fn baseline_is_always_suppressed(t in arb_table()) {
            prop_assert!(detect_new_rows(None, &t).is_empty());
        }

        #[test]
        fn result_is_exactly_the_unknown_rows_in_current_order(
            p in arb_table(),
            c in arb_table(),
        ) {
            let result = detect_new_rows(Some(&p), &c);
            let expected: Vec<Row> = if p.has_data_rows() {
                c.data_rows()
                    .iter()
                    .filter(|r| !p.data_rows().contains(r))
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };
            prop_assert_eq!(result, expected);
        }

        #[test]
        fn previous_row_order_does_not_matter(p in arb_table(), c in arb_table()) {
            let mut rows = p.rows().to_vec();
            if rows.len() > 1 {
                rows[1..].reverse();
            }
            let reordered = Table::new(rows);
            prop_assert_eq!(
                detect_new_rows(Some(&p), &c),
                detect_new_rows(Some(&reordered), &c)
            );
        }
    }
}
