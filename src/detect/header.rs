//! Guesses whether the first row of a sample holds column names.
//!
//! Each column of the rows after the first is classified as integer, float
//! or fixed-length text. Columns that change class are ignored; the rest
//! vote on whether the first row's cell looks out of place.

use super::{Dialect, SniffError};

const MAX_PROBE_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CellClass {
    Integer,
    Float,
    Text(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Unseen,
    Consistent(CellClass),
    Mixed,
}

fn classify(cell: &str) -> CellClass {
    let trimmed = cell.trim();
    if trimmed.parse::<i64>().is_ok() {
        CellClass::Integer
    } else if trimmed.parse::<f64>().is_ok() {
        CellClass::Float
    } else {
        CellClass::Text(cell.chars().count())
    }
}

/// Votes for one column: positive when `cell` does not fit the class the
/// data rows agreed on.
fn vote(column: Column, cell: &str) -> i32 {
    let fits = match column {
        Column::Mixed => return 0,
        // no data to compare against
        Column::Unseen => false,
        Column::Consistent(CellClass::Integer) => cell.trim().parse::<i64>().is_ok(),
        Column::Consistent(CellClass::Float) => cell.trim().parse::<f64>().is_ok(),
        Column::Consistent(CellClass::Text(len)) => cell.chars().count() == len,
    };

    if fits {
        -1
    } else {
        1
    }
}

pub fn has_header(text: &str, dialect: &Dialect) -> Result<bool, SniffError> {
    let mut reader = dialect.reader_builder().from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(Ok(record)) => record,
        _ => return Err(SniffError::TooFewRows),
    };
    let mut columns = vec![Column::Unseen; header.len()];
    let mut probed = 0;

    for record in records.take(MAX_PROBE_ROWS) {
        let Ok(record) = record else {
            break;
        };
        probed += 1;
        if record.len() != columns.len() {
            continue;
        }

        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            let class = classify(cell);
            *column = match *column {
                Column::Unseen => Column::Consistent(class),
                Column::Consistent(seen) if seen == class => Column::Consistent(seen),
                _ => Column::Mixed,
            };
        }
    }

    if probed == 0 {
        return Err(SniffError::TooFewRows);
    }

    let votes: i32 = columns
        .iter()
        .zip(header.iter())
        .map(|(column, cell)| vote(*column, cell))
        .sum();

    Ok(votes > 0)
}

// -- Tests -------------------------------------------------------------------
