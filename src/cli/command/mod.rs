pub mod dedupe_pdfs;
pub mod preview;
pub mod sniff;
pub mod strip_line_numbers;
pub mod uniques;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::detect::{Detection, Dialect};

pub use dedupe_pdfs::dedupe_pdfs;
pub use preview::preview;
pub use sniff::sniff;
pub use strip_line_numbers::strip_line_numbers;
pub use uniques::uniques;

/// Cleans up a path as typed or pasted by the user: surrounding quotes are
/// dropped and a leading `~` becomes the home directory. Fails when the
/// result is not an existing file.
pub fn resolve_input(raw: &Path) -> Result<PathBuf> {
    let path = expand_home(strip_quotes(&raw.to_string_lossy()));

    if !path.is_file() {
        bail!("input file not found: `{}`", path.display());
    }

    Ok(path)
}

fn strip_quotes(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    raw
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(raw),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(|c: char| c == '/' || c == '\\')),
        None => PathBuf::from(raw),
    }
}

/// `<dir>/<stem>_<tag><ext>`, next to `input`. Inputs without an extension
/// get `default_ext`.
pub fn make_output_file_name(input: &Path, tag: &str, default_ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| default_ext.to_string());

    input.with_file_name(format!("{}_{}.{}", stem, tag, ext))
}

pub fn output_path(explicit: Option<&PathBuf>, input: &Path, tag: &str) -> PathBuf {
    match explicit {
        Some(path) => expand_home(&path.to_string_lossy()),
        None => make_output_file_name(input, tag, "csv"),
    }
}

/// Printable form of a delimiter byte.
pub fn show_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        b' ' => "space".to_string(),
        d => char::from(d).to_string(),
    }
}

pub fn describe_dialect(dialect: &Detection<Dialect>) -> String {
    format!(
        "delimiter `{}`, quote `{}`, {:?} line endings ({})",
        show_delimiter(dialect.value.delimiter),
        char::from(dialect.value.quote),
        dialect.value.terminator,
        dialect.outcome
    )
}

// -- Tests -------------------------------------------------------------------
