//! Plain-text table rendering for command output.

use chrono::{TimeZone, Utc};
use std::io::{self, Write};

const COLUMN_GAP: &str = "  ";

/// Write `rows` under `headers` with left-aligned, padded columns.
///
/// An empty `rows` still prints the header so the user sees an empty listing.
pub fn render_table<W: Write>(
    writer: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> io::Result<()> {
    let columns = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    let mut widths = vec![0usize; columns];
    for (i, h) in header_cells.iter().enumerate() {
        widths[i] = widths[i].max(h.chars().count());
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    write_row(writer, &header_cells, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(writer, &rule, &widths)?;
    for row in rows {
        write_row(writer, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        let pad = width - cell.chars().count();
        line.extend(std::iter::repeat(' ').take(pad));
    }
    writeln!(writer, "{}", line.trim_end())
}

/// Render epoch milliseconds as a UTC timestamp; zero means "never".
pub fn epoch_millis_to_date_str(millis: i64) -> String {
    if millis == 0 {
        return "-".to_string();
    }
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%a %b %e %H:%M:%S UTC %Y").to_string(),
        None => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut buf = Vec::new();
        render_table(&mut buf, headers, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_columns_are_aligned() {
        let out = render(
            &["GUID", "Stack"],
            &[row(&["e4184c271bb9", "inventory"]), row(&["1a69", "cass"])],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "GUID          STACK");
        assert_eq!(lines[1], "------------  ---------");
        assert_eq!(lines[2], "e4184c271bb9  inventory");
        assert_eq!(lines[3], "1a69          cass");
    }

    #[test]
    fn test_empty_rows_print_header_only() {
        let out = render(&["Status", "Message"], &[]);
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("STATUS  MESSAGE"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let out = render(&["A", "B", "C"], &[row(&["x"])]);
        assert_eq!(out.lines().nth(2).unwrap(), "x");
    }

    #[test]
    fn test_epoch_formatting() {
        assert_eq!(epoch_millis_to_date_str(0), "-");
        assert_eq!(
            epoch_millis_to_date_str(1_468_535_384_221),
            "Thu Jul 14 22:29:44 UTC 2016"
        );
        assert_eq!(epoch_millis_to_date_str(i64::MAX), i64::MAX.to_string());
    }
}
