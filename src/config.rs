//! Validated settings shared by the commands.

use thiserror::Error;

use crate::detect::{dialect::DEFAULT_DELIMITERS, encoding::DEFAULT_SAMPLE_BYTES};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("at least one candidate delimiter is required")]
    NoDelimiters,

    #[error("invalid candidate delimiter {0:?}: expected a single ASCII punctuation or whitespace character")]
    InvalidDelimiter(char),
}

/// How much of a file is sampled, and which delimiters the sniffer may pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSettings {
    pub encoding_bytes: usize,
    pub sniff_bytes: usize,
    pub candidates: Vec<u8>,
}

impl Default for SampleSettings {
    fn default() -> Self {
        SampleSettings {
            encoding_bytes: DEFAULT_SAMPLE_BYTES,
            sniff_bytes: DEFAULT_SAMPLE_BYTES,
            candidates: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

impl SampleSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("encoding sample size", self.encoding_bytes)?;
        require_positive("sniff sample size", self.sniff_bytes)?;

        if self.candidates.is_empty() {
            return Err(ConfigError::NoDelimiters);
        }
        for &c in &self.candidates {
            check_delimiter(char::from(c))?;
        }

        Ok(())
    }
}

/// Parses a candidate list such as `,\t;|`. The two-character escape `\t`
/// stands for a tab; duplicates are dropped, order is kept.
pub fn parse_candidates(spec: &str) -> Result<Vec<u8>, ConfigError> {
    let mut candidates = Vec::new();
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        let c = if c == '\\' && chars.peek() == Some(&'t') {
            chars.next();
            '\t'
        } else {
            c
        };
        let byte = check_delimiter(c)?;
        if !candidates.contains(&byte) {
            candidates.push(byte);
        }
    }

    if candidates.is_empty() {
        return Err(ConfigError::NoDelimiters);
    }

    Ok(candidates)
}

pub fn require_positive(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { name })
    } else {
        Ok(value)
    }
}

fn check_delimiter(c: char) -> Result<u8, ConfigError> {
    let valid = c.is_ascii()
        && !c.is_ascii_alphanumeric()
        && !matches!(c, '"' | '\'' | '\n' | '\r');

    if valid {
        Ok(c as u8)
    } else {
        Err(ConfigError::InvalidDelimiter(c))
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_default_candidates() {
        let candidates = parse_candidates(",\\t;|^~").unwrap();
        assert_eq!(candidates, DEFAULT_DELIMITERS.to_vec());
    }

    #[test]
    fn should_accept_literal_tab_and_drop_duplicates() {
        assert_eq!(parse_candidates("\t,,").unwrap(), vec![b'\t', b',']);
    }

    #[test]
    fn should_reject_bad_candidates() {
        assert_eq!(parse_candidates(""), Err(ConfigError::NoDelimiters));
        assert_eq!(parse_candidates(",a"), Err(ConfigError::InvalidDelimiter('a')));
        assert_eq!(parse_candidates("\""), Err(ConfigError::InvalidDelimiter('"')));
        assert_eq!(parse_candidates("§"), Err(ConfigError::InvalidDelimiter('§')));
    }

    #[test]
    fn should_validate_settings() {
        assert!(SampleSettings::default().validate().is_ok());

        let zero = SampleSettings {
            sniff_bytes: 0,
            ..SampleSettings::default()
        };
        assert_eq!(
            zero.validate(),
            Err(ConfigError::Zero {
                name: "sniff sample size"
            })
        );

        let empty = SampleSettings {
            candidates: vec![],
            ..SampleSettings::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::NoDelimiters));
    }

    #[test]
    fn should_require_positive() {
        assert_eq!(require_positive("chunk size", 5), Ok(5));
        assert!(require_positive("chunk size", 0).is_err());
    }
}
