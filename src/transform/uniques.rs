//! Folds every column of a file into its ordered set of distinct values.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use csv::{ErrorKind, StringRecord};
use tracing::debug;

use crate::{
    decode::open_decoded,
    detect::{Dialect, LineTerminator, TextEncoding},
};

use super::{ensure_parent_dir, ProgressSink, TransformError, UTF8_BOM};

pub const DEFAULT_CHUNK_ROWS: usize = 200_000;
pub const COUNT_BLOCK_BYTES: usize = 64 * 1024 * 1024;

/// Missing cells and surrounding whitespace collapse to `""`.
pub fn normalize(raw: Option<&str>) -> String {
    raw.map(|s| s.trim().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnValues {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

/// Distinct normalized values per column, in order of first appearance.
/// Columns are addressed by position so repeated header names stay apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUniverse {
    columns: Vec<ColumnValues>,
}

impl ColumnUniverse {
    pub fn new(width: usize) -> Self {
        ColumnUniverse {
            columns: vec![ColumnValues::default(); width],
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Records a cell, returning whether its normalized value was new.
    pub fn insert(&mut self, column: usize, raw: Option<&str>) -> bool {
        let values = &mut self.columns[column];
        let value = normalize(raw);
        if values.seen.contains(&value) {
            return false;
        }
        values.seen.insert(value.clone());
        values.ordered.push(value);
        true
    }

    pub fn values(&self, column: usize) -> &[String] {
        &self.columns[column].ordered
    }

    pub fn max_len(&self) -> usize {
        self.columns.iter().map(|c| c.ordered.len()).max().unwrap_or(0)
    }

    /// Rows of the rectangular output, short columns padded with `""`.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.max_len()).map(move |i| {
            self.columns
                .iter()
                .map(|c| c.ordered.get(i).map(String::as_str).unwrap_or(""))
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueValues {
    pub headers: Vec<String>,
    pub universe: ColumnUniverse,
    pub rows_processed: u64,
    pub rows_skipped: u64,
}

impl UniqueValues {
    /// `(column name, distinct value count)` for the summary.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), self.universe.values(i).len()))
    }
}

/// Streams `input` in batches of `chunk_rows` records, treating the first
/// row as column names.
///
/// Rows wider than the header are skipped; narrower rows have their missing
/// cells read as empty. `total_rows`, when known, is only used for progress.
pub fn collect_uniques(
    input: &Path,
    encoding: TextEncoding,
    delimiter: u8,
    chunk_rows: usize,
    total_rows: Option<u64>,
    progress: &dyn ProgressSink,
) -> Result<UniqueValues, TransformError> {
    let source = open_decoded(input, encoding)?;
    let mut reader = Dialect::with_delimiter(delimiter)
        .reader_builder()
        .from_reader(source);

    let mut header = StringRecord::new();
    if !reader.read_record(&mut header)? || header.iter().all(str::is_empty) {
        return Err(TransformError::NoColumns {
            path: input.to_path_buf(),
        });
    }
    let headers: Vec<String> = header.iter().map(str::to_string).collect();
    let width = headers.len();

    if let Some(total) = total_rows {
        progress.set_length(total);
    }

    let mut universe = ColumnUniverse::new(width);
    let mut rows_processed = 0u64;
    let mut rows_skipped = 0u64;
    let chunk_rows = chunk_rows.max(1);
    let mut batch = Vec::with_capacity(chunk_rows.min(8192));

    loop {
        batch.clear();
        let exhausted = fill_batch(&mut reader, &mut batch, chunk_rows, width, &mut rows_skipped)?;

        for column in 0..width {
            for record in &batch {
                universe.insert(column, record.get(column));
            }
        }

        rows_processed += batch.len() as u64;
        progress.set_position(rows_processed);

        if exhausted {
            break;
        }
    }

    if total_rows.is_none() {
        progress.set_length(rows_processed);
    }

    Ok(UniqueValues {
        headers,
        universe,
        rows_processed,
        rows_skipped,
    })
}

/// Reads up to `chunk_rows` well-formed records, returning whether the
/// input ran out.
fn fill_batch<R: Read>(
    reader: &mut csv::Reader<R>,
    batch: &mut Vec<StringRecord>,
    chunk_rows: usize,
    width: usize,
    skipped: &mut u64,
) -> Result<bool, TransformError> {
    while batch.len() < chunk_rows {
        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(false) => return Ok(true),
            Ok(true) if record.len() > width => {
                *skipped += 1;
                debug!(
                    line = record.position().map(|p| p.line()),
                    fields = record.len(),
                    width,
                    "skipping row wider than header"
                );
            }
            Ok(true) => batch.push(record),
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                *skipped += 1;
                debug!(error = %e, "skipping malformed row");
            }
        }
    }

    Ok(false)
}

/// Writes the header and the padded unique-value rows, UTF-8 with a
/// byte-order-mark.
pub fn write_uniques(
    output: &Path,
    values: &UniqueValues,
    delimiter: u8,
) -> Result<(), TransformError> {
    ensure_parent_dir(output)?;
    let mut out = BufWriter::new(File::create(output)?);
    out.write_all(UTF8_BOM)?;

    let dialect = Dialect {
        terminator: LineTerminator::Lf,
        ..Dialect::with_delimiter(delimiter)
    };
    let mut writer = dialect.writer_builder().from_writer(out);

    writer.write_record(&values.headers)?;
    for row in values.universe.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Counts line feeds in `path`, reading `block_bytes` at a time. Quoted
/// fields with embedded newlines make this an overestimate of the rows.
pub fn count_newlines(
    path: &Path,
    block_bytes: usize,
    progress: &dyn ProgressSink,
) -> std::io::Result<u64> {
    let mut file = File::open(path)?;
    progress.set_length(file.metadata()?.len());

    let mut buf = vec![0u8; block_bytes.max(1)];
    let mut newlines = 0u64;
    let mut consumed = 0u64;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        newlines += memchr::memchr_iter(b'\n', &buf[..n]).count() as u64;
        consumed += n as u64;
        progress.set_position(consumed);
    }

    Ok(newlines)
}

// -- Tests -------------------------------------------------------------------
