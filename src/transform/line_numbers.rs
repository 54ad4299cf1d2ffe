//! Strips leading line numbers (`12  text`) from a text file.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use regex::Regex;

use crate::{decode::open_decoded, detect::TextEncoding};

use super::{ensure_parent_dir, TransformError};

pub const DEFAULT_SPACES: usize = 2;

/// Matches a run of digits followed by exactly `spaces` whitespace
/// characters at the start of a line.
#[derive(Debug, Clone)]
pub struct LineNumberPattern(Regex);

impl LineNumberPattern {
    pub fn new(spaces: usize) -> Result<Self, TransformError> {
        let regex = Regex::new(&format!(r"^\d+\s{{{}}}", spaces))?;
        Ok(LineNumberPattern(regex))
    }

    pub fn strip<'a>(&self, line: &'a str) -> &'a str {
        match self.0.find(line) {
            Some(m) => &line[m.end()..],
            None => line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripSummary {
    pub lines: usize,
    pub changed: usize,
}

/// Streams `input` through `pattern`, writing UTF-8 to `output`. Line
/// terminators are kept as they were and never matched by the pattern.
pub fn strip_line_numbers(
    input: &Path,
    output: &Path,
    encoding: TextEncoding,
    pattern: &LineNumberPattern,
) -> Result<StripSummary, TransformError> {
    let mut reader = BufReader::new(open_decoded(input, encoding)?);
    ensure_parent_dir(output)?;
    let mut writer = BufWriter::new(File::create(output)?);

    let mut summary = StripSummary {
        lines: 0,
        changed: 0,
    };
    let mut line = String::new();

    while reader.read_line(&mut line)? > 0 {
        let body = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let ending = &line[body.len()..];
        let stripped = pattern.strip(body);

        if stripped.len() != body.len() {
            summary.changed += 1;
        }
        summary.lines += 1;

        writer.write_all(stripped.as_bytes())?;
        writer.write_all(ending.as_bytes())?;
        line.clear();
    }
    writer.flush()?;

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------
