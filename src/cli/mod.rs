//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::{parse_candidates, require_positive, ConfigError, SampleSettings},
    dedupe::DEFAULT_TRIM_CHARS,
    detect::encoding::DEFAULT_SAMPLE_BYTES,
    transform::{line_numbers::DEFAULT_SPACES, preview::DEFAULT_PREVIEW_ROWS, uniques::DEFAULT_CHUNK_ROWS},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the header and first rows of a delimited file
    Preview(PreviewArgs),
    /// Write the distinct values of every column of a delimited file
    Uniques(UniquesArgs),
    /// Report the detected encoding, delimiter and header
    Sniff(SniffArgs),
    /// Remove leading line numbers from a text file
    StripLineNumbers(StripArgs),
    /// Delete files whose names only differ in a trailing suffix
    DedupePdfs(DedupeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// Bytes read from the start of the file to guess its encoding
    #[arg(long, default_value_t = DEFAULT_SAMPLE_BYTES)]
    pub encoding_sample_bytes: usize,

    /// Bytes read from the start of the file to sniff its dialect
    #[arg(long, default_value_t = DEFAULT_SAMPLE_BYTES)]
    pub sniff_sample_bytes: usize,

    /// Candidate delimiters, `\t` for tab
    #[arg(long, default_value = ",\\t;|^~")]
    pub delimiters: String,
}

impl SampleArgs {
    pub fn settings(&self) -> Result<SampleSettings, ConfigError> {
        let settings = SampleSettings {
            encoding_bytes: self.encoding_sample_bytes,
            sniff_bytes: self.sniff_sample_bytes,
            candidates: parse_candidates(&self.delimiters)?,
        };
        settings.validate()?;

        Ok(settings)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Delimited text file
    pub input: PathBuf,

    /// Output file [default: <stem>_preview<ext> next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Data rows to keep; the header is not counted
    #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub rows: usize,

    #[command(flatten)]
    pub sample: SampleArgs,
}

#[derive(Args, Debug, Clone)]
pub struct UniquesArgs {
    /// Delimited text file with a header row
    pub input: PathBuf,

    /// Output file [default: <stem>_unique_values<ext> next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rows per processing batch
    #[arg(long, default_value_t = DEFAULT_CHUNK_ROWS)]
    pub chunk_rows: usize,

    /// Skip the newline-counting pass that sizes the progress bar
    #[arg(long)]
    pub no_count: bool,

    #[command(flatten)]
    pub sample: SampleArgs,
}

impl UniquesArgs {
    pub fn chunk_rows(&self) -> Result<usize, ConfigError> {
        require_positive("chunk rows", self.chunk_rows)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SniffArgs {
    /// Delimited text file
    pub input: PathBuf,

    #[command(flatten)]
    pub sample: SampleArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StripArgs {
    /// Text file with numbered lines
    pub input: PathBuf,

    /// Output file [default: <stem>_no_line_number<ext> next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Whitespace characters following each line number
    #[arg(long, default_value_t = DEFAULT_SPACES)]
    pub spaces: usize,

    /// Bytes read from the start of the file to guess its encoding
    #[arg(long, default_value_t = DEFAULT_SAMPLE_BYTES)]
    pub encoding_sample_bytes: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DedupeArgs {
    /// Directory holding the files
    pub directory: PathBuf,

    /// File extension to consider
    #[arg(long, default_value = "pdf")]
    pub extension: String,

    /// Trailing characters of the file stem ignored when comparing names
    #[arg(long, default_value_t = DEFAULT_TRIM_CHARS)]
    pub trim: usize,

    /// Report what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message).with_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} rows {msg}").unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos:>10}/{len:10} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

/// Creates a progress bar measured in bytes.
pub fn create_byte_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}")
            .unwrap()
            .progress_chars("=> "),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn should_have_valid_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_parse_preview_with_defaults() {
        let cli = Cli::parse_from(["csvscout", "preview", "obs.csv"]);
        let Commands::Preview(args) = cli.command else {
            panic!("expected preview");
        };

        assert_eq!(args.rows, 1000);
        assert!(args.output.is_none());
        assert_eq!(args.sample.settings().unwrap(), SampleSettings::default());
    }

    #[test]
    fn should_parse_global_verbosity_after_subcommand() {
        let cli = Cli::parse_from(["csvscout", "uniques", "obs.csv", "-vv", "--no-count"]);

        assert_eq!(cli.verbose, 2);
        let Commands::Uniques(args) = cli.command else {
            panic!("expected uniques");
        };
        assert!(args.no_count);
        assert_eq!(args.chunk_rows().unwrap(), 200_000);
    }

    #[test]
    fn should_reject_zero_chunk_rows() {
        let cli = Cli::parse_from(["csvscout", "uniques", "obs.csv", "--chunk-rows", "0"]);
        let Commands::Uniques(args) = cli.command else {
            panic!("expected uniques");
        };
        assert!(args.chunk_rows().is_err());
    }

    #[test]
    fn should_create_progress_bar() {
        let pb = create_progress_bar(10, "Writing preview".to_string());
        pb.set_position(4);
        pb.set_length(3);

        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 4);
    }
}
