mod cli;
mod config;
mod decode;
mod dedupe;
mod detect;
mod logging;
mod transform;

use std::process::ExitCode;

use clap::Parser;
use cli::{command, Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        Commands::Preview(args) => command::preview(args).map(|filename| {
            println!("File saved to `{}`", filename);
        }),
        Commands::Uniques(args) => command::uniques(args).map(|filename| {
            println!("File saved to `{}`", filename);
        }),
        Commands::Sniff(args) => command::sniff(args),
        Commands::StripLineNumbers(args) => command::strip_line_numbers(args).map(|filename| {
            println!("File saved to `{}`", filename);
        }),
        Commands::DedupePdfs(args) => command::dedupe_pdfs(args).map(|report| {
            let verb = if args.dry_run { "Would delete" } else { "Deleted" };
            println!(
                "{} {} files from {} duplicate groups ({} groups scanned)",
                verb,
                report.removed.len(),
                report.duplicate_groups,
                report.groups
            );
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
