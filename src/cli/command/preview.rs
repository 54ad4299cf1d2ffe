//! Write the header and the first rows of a delimited file.

use anyhow::{Context, Result};

use crate::{
    cli::{create_progress_bar, PreviewArgs},
    detect::Plan,
    transform::write_preview,
};

use super::{describe_dialect, output_path, resolve_input};

pub fn preview(args: &PreviewArgs) -> Result<String> {
    let input = resolve_input(&args.input)?;
    let settings = args.sample.settings()?;
    let output = output_path(args.output.as_ref(), &input, "preview");

    let plan = Plan::detect(&input, &settings)
        .with_context(|| format!("failed to sample `{}`", input.display()))?;

    println!("Input:    {}", input.display());
    println!("Encoding: {} ({})", plan.encoding.value, plan.encoding.outcome);
    println!("Dialect:  {}", describe_dialect(&plan.dialect));
    println!("Header:   {} ({})", plan.has_header.value, plan.has_header.outcome);
    println!("Rows:     {}", args.rows);
    println!("Output:   {}", output.display());

    let bar = create_progress_bar(args.rows as u64, "Writing preview".to_string());
    let summary = write_preview(&input, &output, &plan, args.rows, &bar)
        .with_context(|| format!("failed to write preview of `{}`", input.display()))?;
    bar.finish();

    println!(
        "Wrote {} data rows{} from the first {:.1} MB of the input",
        summary.rows_written,
        if summary.header_written { " and the header" } else { "" },
        summary.bytes_read as f64 / 1e6
    );

    Ok(output.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
