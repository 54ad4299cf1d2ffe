//! Report what the detectors make of a file without writing anything.

use anyhow::{Context, Result};

use crate::{
    cli::SniffArgs,
    detect::{read_sample, Plan, Sniffer},
};

use super::{describe_dialect, resolve_input, show_delimiter};

pub fn sniff(args: &SniffArgs) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let settings = args.sample.settings()?;

    let plan = Plan::detect(&input, &settings)
        .with_context(|| format!("failed to sample `{}`", input.display()))?;

    println!("Input:    {}", input.display());
    println!("Encoding: {} ({})", plan.encoding.value, plan.encoding.outcome);
    println!("BOM:      {}", !plan.encoding.value.bom().is_empty());
    println!("Dialect:  {}", describe_dialect(&plan.dialect));
    println!("Header:   {} ({})", plan.has_header.value, plan.has_header.outcome);

    let sample = read_sample(&input, settings.sniff_bytes)
        .with_context(|| format!("failed to sample `{}`", input.display()))?;
    let text = sample.text(plan.encoding.value, settings.sniff_bytes);
    let scores = Sniffer::new(settings.candidates).delimiter_scores(&text, plan.dialect.value.quote);

    println!();
    println!("{:<10} {:>8} {:>12} {:>8}", "delimiter", "per row", "consistency", "rows");
    for score in scores {
        println!(
            "{:<10} {:>8} {:>11.1}% {:>8}",
            show_delimiter(score.delimiter),
            score.modal_count,
            score.consistency * 100.0,
            score.rows
        );
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------
