//! Remove leading line numbers from a text file.

use anyhow::{Context, Result};

use crate::{
    cli::StripArgs,
    config::require_positive,
    detect::{detect_encoding, read_sample},
    transform::{self, LineNumberPattern},
};

use super::{make_output_file_name, resolve_input};

pub fn strip_line_numbers(args: &StripArgs) -> Result<String> {
    let input = resolve_input(&args.input)?;
    let sample_bytes = require_positive("encoding sample size", args.encoding_sample_bytes)?;
    let output = match &args.output {
        Some(path) => path.clone(),
        None => make_output_file_name(&input, "no_line_number", "txt"),
    };

    let sample = read_sample(&input, sample_bytes)
        .with_context(|| format!("failed to sample `{}`", input.display()))?;
    let encoding = detect_encoding(sample.head(sample_bytes));
    let pattern = LineNumberPattern::new(args.spaces)?;

    println!("Input:    {}", input.display());
    println!("Encoding: {} ({})", encoding.value, encoding.outcome);
    println!("Output:   {}", output.display());

    let summary = transform::strip_line_numbers(&input, &output, encoding.value, &pattern)
        .with_context(|| format!("failed to strip line numbers from `{}`", input.display()))?;

    println!("Changed {} of {} lines", summary.changed, summary.lines);

    Ok(output.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
