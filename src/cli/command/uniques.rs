//! Write the distinct values found in each column of a delimited file.

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cli::{create_byte_progress_bar, create_progress_bar, create_spinner, UniquesArgs},
    detect::{detect_encoding, read_sample, Sniffer},
    transform::{collect_uniques, count_newlines, uniques::COUNT_BLOCK_BYTES, write_uniques},
};

use super::{output_path, resolve_input, show_delimiter};

pub fn uniques(args: &UniquesArgs) -> Result<String> {
    let input = resolve_input(&args.input)?;
    let settings = args.sample.settings()?;
    let chunk_rows = args.chunk_rows()?;
    let output = output_path(args.output.as_ref(), &input, "unique_values");

    let sample = read_sample(&input, settings.encoding_bytes.max(settings.sniff_bytes))
        .with_context(|| format!("failed to sample `{}`", input.display()))?;
    let encoding = detect_encoding(sample.head(settings.encoding_bytes));
    let text = sample.text(encoding.value, settings.sniff_bytes);
    let delimiter = Sniffer::new(settings.candidates.clone()).sniff_delimiter_only(&text);
    info!(delimiter = ?char::from(delimiter.value), outcome = %delimiter.outcome, "delimiter");

    println!("Input:     {}", input.display());
    println!("Encoding:  {} ({})", encoding.value, encoding.outcome);
    println!("Delimiter: `{}` ({})", show_delimiter(delimiter.value), delimiter.outcome);
    println!("Output:    {}", output.display());

    let total_rows = if args.no_count {
        None
    } else {
        let bar = create_byte_progress_bar(0, "Counting rows".to_string());
        let newlines = count_newlines(&input, COUNT_BLOCK_BYTES, &bar)
            .with_context(|| format!("failed to count rows of `{}`", input.display()))?;
        bar.finish_and_clear();

        let rows = newlines.saturating_sub(1);
        println!("Rows:      ~{}", rows);
        Some(rows)
    };

    let bar = match total_rows {
        Some(total) => create_progress_bar(total, "Collecting unique values".to_string()),
        None => create_spinner("Collecting unique values".to_string()),
    };
    let values = collect_uniques(
        &input,
        encoding.value,
        delimiter.value,
        chunk_rows,
        total_rows,
        &bar,
    )
    .with_context(|| format!("failed to read `{}`", input.display()))?;
    bar.finish();

    write_uniques(&output, &values, delimiter.value)
        .with_context(|| format!("failed to write `{}`", output.display()))?;

    println!(
        "Processed {} rows across {} columns",
        values.rows_processed,
        values.universe.width()
    );
    if values.rows_skipped > 0 {
        println!("Skipped {} malformed rows", values.rows_skipped);
    }
    for (column, count) in values.counts() {
        println!("  {:<30} {:>10} unique", column, count);
    }

    Ok(output.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
