//! Copies the header and the first N data rows of a file.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use csv::ByteRecord;

use crate::{decode::open_decoded, detect::Plan};

use super::{ensure_parent_dir, format_byte_progress, ProgressSink, TransformError, UTF8_BOM};

pub const DEFAULT_PREVIEW_ROWS: usize = 1000;

/// Rows between byte-offset updates of the progress message.
const PROGRESS_EVERY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSummary {
    /// Data rows written; the header is never counted.
    pub rows_written: usize,
    pub header_written: bool,
    pub bytes_read: u64,
}

/// Writes at most `rows` data rows of `input`, preceded by its header when
/// one was detected, to `output` as UTF-8 with a byte-order-mark.
///
/// Without a header the first row is data and counts toward `rows`. An
/// empty input, or `rows == 0` without a header, leaves `output` empty.
pub fn write_preview(
    input: &Path,
    output: &Path,
    plan: &Plan,
    rows: usize,
    progress: &dyn ProgressSink,
) -> Result<PreviewSummary, TransformError> {
    let file_size = fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let dialect = plan.dialect.value;
    let has_header = plan.has_header.value;

    let source = open_decoded(input, plan.encoding.value)?;
    let mut reader = dialect.reader_builder().from_reader(source);

    ensure_parent_dir(output)?;
    let file = File::create(output)?;

    let mut summary = PreviewSummary {
        rows_written: 0,
        header_written: false,
        bytes_read: 0,
    };
    progress.set_length(rows as u64);

    let mut record = ByteRecord::new();
    if !reader.read_byte_record(&mut record)? || (!has_header && rows == 0) {
        summary.bytes_read = reader.get_ref().get_ref().bytes_read();
        progress.set_length(0);
        return Ok(summary);
    }

    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;
    let mut writer = dialect.writer_builder().from_writer(out);

    writer.write_byte_record(&record)?;
    if has_header {
        summary.header_written = true;
    } else {
        summary.rows_written = 1;
        progress.set_position(1);
    }

    while summary.rows_written < rows && reader.read_byte_record(&mut record)? {
        writer.write_byte_record(&record)?;
        summary.rows_written += 1;
        progress.set_position(summary.rows_written as u64);

        if summary.rows_written % PROGRESS_EVERY == 0 || summary.rows_written == rows {
            let bytes_read = reader.get_ref().get_ref().bytes_read();
            progress.set_message(format_byte_progress(summary.rows_written, bytes_read, file_size));
        }
    }

    if summary.rows_written < rows {
        progress.set_length(summary.rows_written as u64);
    }

    writer.flush()?;
    summary.bytes_read = reader.get_ref().get_ref().bytes_read();

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------
