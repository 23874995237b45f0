//! Helpers for the service's A1-style addressing scheme.
//!
//! Rows are 1-based, columns are letter-based ("A".."Z", "AA"..). Ranges
//! that omit the trailing row number ("A1:A") cover the column down to its
//! last populated row.

/// Convert a zero-based column index to its letter form.
///
/// 0 -> "A", 25 -> "Z", 26 -> "AA".
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a sheet title for use inside a range reference.
///
/// Titles are always quoted; embedded single quotes are doubled.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Single-column range covering header through last populated row.
pub fn full_column(title: &str, index: usize) -> String {
    let letters = column_letters(index);
    format!("{}!{letters}1:{letters}", quote_title(title))
}

/// Range addressing every populated cell of a sheet.
pub fn all_cells(title: &str) -> String {
    quote_title(title)
}

/// The top-left origin cell of a sheet, where writes start.
pub fn origin(title: &str) -> String {
    format!("{}!A1", quote_title(title))
}

/// Unbounded band covering the first `width` columns of a sheet.
pub fn column_band(title: &str, width: usize) -> String {
    let last = column_letters(width.saturating_sub(1));
    format!("{}!A:{last}", quote_title(title))
}
