//! Newline separated text files

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::utils::error::{DatasetError, Result, ResultExt};

/// Split on `\n`, dropping the empty entry a final newline leaves behind
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Parse a file holding one number per line.
///
/// NUL bytes around each line are stripped. With `drop_zero_values` lines that
/// parse to zero are skipped, which older curve files relied on.
pub fn read_scalars(path: &Path, drop_zero_values: bool) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path).at_path(path)?;
    let mut values = Vec::new();
    for (line_no, line) in split_lines(&content).into_iter().enumerate() {
        let cleaned = line.trim_matches('\0').trim();
        let value: f64 = cleaned.parse().map_err(|_| {
            DatasetError::InvalidInput(format!(
                "{}:{}: '{}' is not a number",
                path.display(),
                line_no + 1,
                cleaned
            ))
        })?;
        if drop_zero_values && value == 0.0 {
            continue;
        }
        values.push(value);
    }
    Ok(values)
}

/// Append each item verbatim to a text file, creating it if needed
pub fn append_text<S: AsRef<str>>(items: &[S], to: &Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(to)
        .at_path(to)?;
    for item in items {
        file.write_all(item.as_ref().as_bytes()).at_path(to)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_read_scalars_strips_nul_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loss.txt");
        fs::write(&path, "0.5\n\0\00.25\n0\n1e-3\n").unwrap();

        assert_eq!(read_scalars(&path, false).unwrap(), vec![0.5, 0.25, 0.0, 1e-3]);
        assert_eq!(read_scalars(&path, true).unwrap(), vec![0.5, 0.25, 1e-3]);
    }

    #[test]
    fn test_read_scalars_reports_bad_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("acc.txt");
        fs::write(&path, "0.9\nabc\n").unwrap();

        let err = read_scalars(&path, false).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_append_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");

        append_text(&["0.1\n", "0.2\n"], &path).unwrap();
        append_text(&["0.3\n"], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.1\n0.2\n0.3\n");
    }
}
