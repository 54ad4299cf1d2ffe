//! Sample-based detection of text encoding, CSV dialect and header presence.
//!
//! Every detector works on a bounded prefix of the file. The guess is made
//! once per run and never revisited, so a file whose structure changes after
//! the sample window can be misread.

pub mod dialect;
pub mod encoding;
pub mod header;

use std::{fmt, io, path::Path};

use tracing::{debug, info, warn};

use crate::config::SampleSettings;

pub use dialect::{Dialect, LineTerminator, SniffError, Sniffer};
pub use encoding::{detect_encoding, read_sample, TextEncoding};

/// How a value was arrived at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Detected,
    Defaulted { reason: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Detected => write!(f, "detected"),
            Outcome::Defaulted { reason } => write!(f, "defaulted ({})", reason),
        }
    }
}

/// A guessed value together with whether it was detected or fell back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Detection<T> {
    pub fn detected(value: T) -> Self {
        Detection {
            value,
            outcome: Outcome::Detected,
        }
    }

    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Detection {
            value,
            outcome: Outcome::Defaulted {
                reason: reason.into(),
            },
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.outcome, Outcome::Defaulted { .. })
    }
}

/// Everything the row processors need to know about an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub encoding: Detection<TextEncoding>,
    pub dialect: Detection<Dialect>,
    pub has_header: Detection<bool>,
}

impl Plan {
    /// Samples the head of `path` once and runs the encoding detector and
    /// the dialect sniffer over it.
    pub fn detect(path: &Path, settings: &SampleSettings) -> io::Result<Self> {
        let sample = read_sample(path, settings.encoding_bytes.max(settings.sniff_bytes))?;
        let encoding = detect_encoding(sample.head(settings.encoding_bytes));
        info!(encoding = encoding.value.label(), outcome = %encoding.outcome, "encoding");

        let text = sample.text(encoding.value, settings.sniff_bytes);
        let sniff = Sniffer::new(settings.candidates.clone()).sniff(&text);
        debug!(
            delimiter = ?char::from(sniff.dialect.value.delimiter),
            dialect = %sniff.dialect.outcome,
            has_header = sniff.has_header.value,
            header = %sniff.has_header.outcome,
            "dialect"
        );
        if sniff.dialect.is_defaulted() {
            warn!(outcome = %sniff.dialect.outcome, "falling back to comma-separated dialect");
        }

        Ok(Plan {
            encoding,
            dialect: sniff.dialect,
            has_header: sniff.has_header,
        })
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn should_report_defaulted_outcome() {
        let d = Detection::defaulted(b',', "no clear winner");

        assert!(d.is_defaulted());
        assert_eq!(d.outcome.to_string(), "defaulted (no clear winner)");
        assert!(!Detection::detected(1).is_defaulted());
    }

    #[test]
    fn should_plan_semicolon_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "name;count\nalpha;1\nbeta;2\ngamma;3\n").unwrap();

        let plan = Plan::detect(&path, &SampleSettings::default()).unwrap();

        assert_eq!(plan.encoding.value, TextEncoding::Utf8);
        assert_eq!(plan.dialect.value.delimiter, b';');
        assert_eq!(plan.dialect.outcome, Outcome::Detected);
        assert!(plan.has_header.value);
    }

    #[test]
    fn should_plan_empty_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let plan = Plan::detect(&path, &SampleSettings::default()).unwrap();

        assert_eq!(plan.encoding.value, TextEncoding::Utf8);
        assert!(plan.dialect.is_defaulted());
        assert_eq!(plan.dialect.value, Dialect::default());
        assert!(plan.has_header.value);
        assert!(plan.has_header.is_defaulted());
    }
}
