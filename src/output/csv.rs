//! CSV writing with RFC 4180 quoting

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Quote a cell when it contains the delimiter, a quote or a line break
pub fn csv_escape(value: &str) -> String {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) {
        format!("{}{}{}", QUOTE, value.replace(QUOTE, "\"\""), QUOTE)
    } else {
        value.to_string()
    }
}

fn csv_line<'a, I: Iterator<Item = &'a str>>(cells: I) -> String {
    cells
        .map(csv_escape)
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Render a header and rows as CSV text, one record per line
pub fn to_csv<H: AsRef<str>>(header: &[H], rows: &[Vec<String>]) -> String {
    let header: Vec<&str> = header.iter().map(|h| h.as_ref()).collect();
    let mut content = csv_line(header.iter().copied());
    content.push('\n');
    for row in rows {
        content.push_str(&csv_line(row.iter().map(String::as_str)));
        content.push('\n');
    }
    content
}

/// Write a CSV file, creating parent directories as needed
pub fn write_csv<P: AsRef<Path>, H: AsRef<str>>(
    path: P,
    header: &[H],
    rows: &[Vec<String>],
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, to_csv(header, rows))
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
