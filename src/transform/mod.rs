//! Streaming transforms over a detected input file.

pub mod line_numbers;
pub mod preview;
pub mod uniques;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use indicatif::ProgressBar;
use thiserror::Error;

pub use line_numbers::{strip_line_numbers, LineNumberPattern};
pub use preview::write_preview;
pub use uniques::{collect_uniques, count_newlines, write_uniques};

/// Written ahead of every CSV output so spreadsheet tools pick UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no columns detected in {path} (empty header)")]
    NoColumns { path: PathBuf },

    #[error("invalid line-number pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where transforms report progress. Purely observational.
pub trait ProgressSink {
    fn set_length(&self, len: u64);
    fn set_position(&self, pos: u64);
    fn set_message(&self, message: String);
}

impl ProgressSink for ProgressBar {
    fn set_length(&self, len: u64) {
        ProgressBar::set_length(self, len);
    }

    fn set_position(&self, pos: u64) {
        ProgressBar::set_position(self, pos);
    }

    fn set_message(&self, message: String) {
        ProgressBar::set_message(self, message);
    }
}

/// Creates the directory `path` will be written into.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// `rows=.. bytes=a/b MB pct=..%` style progress postfix.
pub fn format_byte_progress(rows: usize, bytes_read: u64, file_size: u64) -> String {
    let pct = if file_size > 0 {
        format!("{:.1}%", bytes_read as f64 / file_size as f64 * 100.0)
    } else {
        "NA".to_string()
    };

    format!(
        "rows={} bytes={:.1}/{:.1} MB pct={}",
        rows,
        bytes_read as f64 / 1e6,
        file_size.max(1) as f64 / 1e6,
        pct
    )
}


// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn should_format_byte_progress() {
        assert_eq!(
            format_byte_progress(200, 500_000, 2_000_000),
            "rows=200 bytes=0.5/2.0 MB pct=25.0%"
        );
        assert_eq!(
            format_byte_progress(3, 10, 0),
            "rows=3 bytes=0.0/0.0 MB pct=NA"
        );
    }

    #[test]
    fn should_create_missing_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/out.csv");

        ensure_parent_dir(&path).unwrap();

        assert!(dir.path().join("nested/deeper").is_dir());
        assert!(ensure_parent_dir(Path::new("bare.csv")).is_ok());
    }
}
