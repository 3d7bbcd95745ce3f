//! Tabular data exchanged between the portal, the change detector and the
//! sink.
//!
//! A [`Table`] is an ordered list of [`Row`]s. By convention the first row is
//! the header (column names) and the rest are data rows. Rows have no key of
//! their own: two rows are the same row iff every field matches.

use serde::Serialize;

/// One record: ordered string fields.
pub type Row = Vec<String>;

/// Ordered rows, header first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build a table from string slices. Mostly useful in tests.
    pub fn from_rows<R, F>(rows: R) -> Self
    where
        R: IntoIterator<Item = F>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// The header row, if the table has any rows at all.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Every row after the header.
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// `true` when at least one data row follows the header.
    pub fn has_data_rows(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Total row count, header included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_data_rows_are_split() {
        let table = Table::from_rows([["id", "name"], ["1", "a"], ["2", "b"]]);

        assert_eq!(table.header().unwrap(), &vec!["id", "name"]);
        assert_eq!(table.data_rows().len(), 2);
        assert!(table.has_data_rows());
    }

    #[test]
    fn header_only_table_has_no_data_rows() {
        let table = Table::from_rows([["id", "name"]]);

        assert!(table.data_rows().is_empty());
        assert!(!table.has_data_rows());
        assert!(!table.is_empty());
    }

    #[test]
    fn empty_table_has_no_header() {
        let table = Table::default();

        assert!(table.header().is_none());
        assert!(table.data_rows().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let table = Table::from_rows([["id"], ["1"]]);
        let json = serde_json::to_string(&table).unwrap();

        assert_eq!(json, r#"[["id"],["1"]]"#);
    }
}
