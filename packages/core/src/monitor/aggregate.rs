//! Merge per-account tables into one snapshot.

use crate::table::Table;

/// Combine per-account results into one table.
///
/// Failed accounts (`None`) and empty tables are skipped. The first
/// non-empty table contributes its header; every later table has its header
/// row dropped and only its data rows appended, in encounter order. Headers
/// are not compared across accounts.
///
/// Returns an empty table when nothing usable came back.
pub fn aggregate<I>(tables: I) -> Table
where
    I: IntoIterator<Item = Option<Table>>,
{
    let mut rows = Vec::new();

    for table in tables.into_iter().flatten().filter(|t| !t.is_empty()) {
        let mut incoming = table.into_rows().into_iter();
        if !rows.is_empty() {
            incoming.next();
        }
        rows.extend(incoming);
    }

    Table::new(rows)
}
