//! Plain-text rendering of new-row notifications.

use std::fmt::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::table::Row;

/// Number of new rows rendered in full in the body.
pub const MAX_SAMPLES: usize = 3;
/// Columns shown per sample row.
pub const MAX_SAMPLE_COLUMNS: usize = 10;

const RULE_WIDTH: usize = 60;
const SAMPLE_RULE_WIDTH: usize = 40;

/// Subject + body handed to every configured notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Render the notification for `new_rows`.
///
/// At most [`MAX_SAMPLES`] rows are shown, each as `column: value` lines for
/// the first [`MAX_SAMPLE_COLUMNS`] columns, skipping empty values. The
/// number of omitted rows and the mirror location close the body.
pub fn format_new_rows(
    timestamp: NaiveDateTime,
    header: &[String],
    new_rows: &[Row],
    destination: &str,
) -> Notification {
    let count = new_rows.len();
    let subject = format!("[listing-monitor] {} new listing(s)", count);

    let mut body = String::new();
    let _ = writeln!(body, "[{}]", timestamp.format("%Y-%m-%d %H:%M:%S"));
    body.push('\n');
    let _ = writeln!(body, "{} new listing(s) were added.", count);
    body.push_str("Please follow up promptly.\n\n");
    body.push_str(&"=".repeat(RULE_WIDTH));
    body.push_str("\n\n");

    for (index, row) in new_rows.iter().take(MAX_SAMPLES).enumerate() {
        let _ = writeln!(body, "[Listing {}]", index + 1);
        for (column, value) in header
            .iter()
            .zip(row)
            .take(MAX_SAMPLE_COLUMNS)
            .filter(|(_, value)| !value.is_empty())
        {
            let _ = writeln!(body, "  {}: {}", column, value);
        }
        body.push('\n');
        body.push_str(&"-".repeat(SAMPLE_RULE_WIDTH));
        body.push_str("\n\n");
    }

    if count > MAX_SAMPLES {
        let _ = writeln!(
            body,
            "... and {} more new listing(s) not shown.",
            count - MAX_SAMPLES
        );
        body.push('\n');
    }

    body.push_str(&"=".repeat(RULE_WIDTH));
    body.push('\n');
    body.push_str("Full table:\n");
    let _ = writeln!(body, "{}", destination);

    Notification { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn header(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("col{}", i)).collect()
    }

    fn row(id: usize, width: usize) -> Row {
        (0..width).map(|c| format!("r{}c{}", id, c)).collect()
    }

    #[test]
    fn subject_states_the_count() {
        let rows = vec![row(1, 2), row(2, 2)];
        let n = format_new_rows(ts(), &header(2), &rows, "https://mirror");

        assert!(n.subject.contains("2 new listing"));
    }

    #[test]
    fn body_has_timestamp_count_and_destination() {
        let rows = vec![row(1, 2)];
        let n = format_new_rows(ts(), &header(2), &rows, "https://mirror/sheet");

        assert!(n.body.starts_with("[2024-05-01 09:30:00]"));
        assert!(n.body.contains("1 new listing(s) were added."));
        assert!(n.body.contains("https://mirror/sheet"));
        assert!(n.body.contains("  col0: r1c0"));
        assert!(!n.body.contains("more new listing"));
    }

    #[test]
    fn fifty_rows_render_three_samples_and_remaining_count() {
        let rows: Vec<Row> = (0..50).map(|i| row(i, 3)).collect();
        let n = format_new_rows(ts(), &header(3), &rows, "dest");

        assert_eq!(n.body.matches("[Listing ").count(), 3);
        assert!(n.body.contains("[Listing 3]"));
        assert!(!n.body.contains("[Listing 4]"));
        assert!(n.body.contains("and 47 more new listing(s)"));
    }

    #[test]
    fn samples_show_at_most_ten_columns() {
        let rows = vec![row(1, 15)];
        let n = format_new_rows(ts(), &header(15), &rows, "dest");

        assert!(n.body.contains("col9: r1c9"));
        assert!(!n.body.contains("col10"));
    }

    #[test]
    fn empty_and_missing_values_are_skipped() {
        let rows = vec![vec!["1".to_string(), String::new()]];
        let n = format_new_rows(ts(), &header(3), &rows, "dest");

        assert!(n.body.contains("col0: 1"));
        assert!(!n.body.contains("col1:"));
        assert!(!n.body.contains("col2:"));
    }
}
