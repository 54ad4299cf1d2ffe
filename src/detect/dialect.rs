//! Delimiter, quote and line-terminator sniffing over a decoded sample.
//!
//! Candidates are scored by how consistently they split the sample's rows
//! into the same number of fields. Quoted fields found at field boundaries
//! decide the quote character and give extra weight to the delimiters they
//! sit next to.

use std::{cmp::Ordering, collections::HashMap};

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use thiserror::Error;

use super::{header, Detection};

pub const DEFAULT_DELIMITERS: &[u8] = b",\t;|^~";

const CONSISTENCY_THRESHOLD: f64 = 0.9;
const MAX_SNIFF_ROWS: usize = 1000;
const QUOTE_CANDIDATES: [u8; 2] = [b'"', b'\''];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SniffError {
    #[error("sample is empty")]
    EmptySample,

    #[error("no candidate delimiter splits the sample consistently")]
    NoConsistentDelimiter,

    #[error("sample has no rows after the first")]
    TooFewRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    Lf,
    CrLf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub terminator: LineTerminator,
}

impl Default for Dialect {
    /// Comma separated, double-quoted, CRLF terminated.
    fn default() -> Self {
        Dialect {
            delimiter: b',',
            quote: b'"',
            terminator: LineTerminator::CrLf,
        }
    }
}

impl Dialect {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Dialect {
            delimiter,
            ..Dialect::default()
        }
    }

    /// A header-less, length-tolerant reader. Any of `\r`, `\n` and `\r\n`
    /// ends a record regardless of the sniffed terminator.
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .has_headers(false)
            .flexible(true);
        builder
    }

    /// A writer that quotes only where needed and accepts ragged rows.
    pub fn writer_builder(&self) -> WriterBuilder {
        let terminator = match self.terminator {
            LineTerminator::Lf => Terminator::Any(b'\n'),
            LineTerminator::CrLf => Terminator::CRLF,
        };

        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quote_style(QuoteStyle::Necessary)
            .terminator(terminator)
            .flexible(true);
        builder
    }
}

/// The outcome of sniffing a sample; never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniff {
    pub dialect: Detection<Dialect>,
    pub has_header: Detection<bool>,
}

/// How consistently one candidate splits the sampled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimiterScore {
    pub delimiter: u8,
    /// The most common number of occurrences per row.
    pub modal_count: usize,
    /// Share of rows with exactly `modal_count` occurrences, 0 when the
    /// modal count is 0.
    pub consistency: f64,
    pub rows: usize,
}

#[derive(Debug, Default)]
struct QuoteGuess {
    quote: Option<u8>,
    /// Per candidate, how many quoted fields it bordered.
    votes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Sniffer {
    candidates: Vec<u8>,
}

impl Default for Sniffer {
    fn default() -> Self {
        Sniffer::new(DEFAULT_DELIMITERS.to_vec())
    }
}

impl Sniffer {
    pub fn new(candidates: Vec<u8>) -> Self {
        Sniffer { candidates }
    }

    /// Sniffs the dialect and header, falling back to the default dialect
    /// and an assumed header when the sample gives no clear answer.
    pub fn sniff(&self, text: &str) -> Sniff {
        match self.sniff_dialect(text) {
            Ok(dialect) => {
                let has_header = match header::has_header(text, &dialect) {
                    Ok(found) => Detection::detected(found),
                    Err(e) => Detection::defaulted(true, e.to_string()),
                };
                Sniff {
                    dialect: Detection::detected(dialect),
                    has_header,
                }
            }
            Err(e) => Sniff {
                dialect: Detection::defaulted(Dialect::default(), e.to_string()),
                has_header: Detection::defaulted(true, "dialect could not be sniffed"),
            },
        }
    }

    /// Sniffs only the delimiter. On failure, the candidate occurring most
    /// often in the sample is used, or a comma when none occurs at all.
    pub fn sniff_delimiter_only(&self, text: &str) -> Detection<u8> {
        let e = match self.sniff_dialect(text) {
            Ok(dialect) => return Detection::detected(dialect.delimiter),
            Err(e) => e,
        };

        let mut best: Option<(u8, usize)> = None;
        for &c in &self.candidates {
            let count = memchr::memchr_iter(c, text.as_bytes()).count();
            if count > 0 && best.map_or(true, |(_, n)| count > n) {
                best = Some((c, count));
            }
        }

        match best {
            Some((c, _)) => Detection::defaulted(c, format!("{}; using most frequent candidate", e)),
            None => Detection::defaulted(b',', e.to_string()),
        }
    }

    pub fn sniff_dialect(&self, text: &str) -> Result<Dialect, SniffError> {
        if text.trim().is_empty() {
            return Err(SniffError::EmptySample);
        }

        let bytes = text.as_bytes();
        let guess = self.guess_quote(bytes);
        let quote = guess.quote.unwrap_or(b'"');
        let scores = self.delimiter_scores(text, quote);

        let best = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.consistency >= CONSISTENCY_THRESHOLD)
            .max_by(|(i, a), (j, b)| {
                guess.votes[*i]
                    .cmp(&guess.votes[*j])
                    .then(
                        a.consistency
                            .partial_cmp(&b.consistency)
                            .unwrap_or(Ordering::Equal),
                    )
                    // earlier candidates win ties
                    .then(j.cmp(i))
            })
            .map(|(_, s)| s.delimiter)
            .ok_or(SniffError::NoConsistentDelimiter)?;

        let terminator = if text.contains("\r\n") {
            LineTerminator::CrLf
        } else {
            LineTerminator::Lf
        };

        Ok(Dialect {
            delimiter: best,
            quote,
            terminator,
        })
    }

    /// Scores every candidate against the rows of the sample. Delimiters
    /// inside quoted regions are not counted.
    pub fn delimiter_scores(&self, text: &str, quote: u8) -> Vec<DelimiterScore> {
        let mut per_row: Vec<Vec<usize>> = vec![Vec::new(); self.candidates.len()];

        for row in self.split_rows(text.as_bytes(), quote).into_iter().take(MAX_SNIFF_ROWS) {
            let mut counts = vec![0usize; self.candidates.len()];
            self.for_each_unquoted(row, quote, |i| {
                if let Some(idx) = self.position(row[i]) {
                    counts[idx] += 1;
                }
            });
            for (idx, count) in counts.into_iter().enumerate() {
                per_row[idx].push(count);
            }
        }

        self.candidates
            .iter()
            .zip(per_row)
            .map(|(&delimiter, counts)| score(delimiter, &counts))
            .collect()
    }

    fn position(&self, b: u8) -> Option<usize> {
        self.candidates.iter().position(|&c| c == b)
    }

    /// Where a quote at `at` opens a field: `Some(None)` at the start of a
    /// line, `Some(Some(idx))` after candidate `idx` (an optional single
    /// space allowed), `None` mid-field.
    fn field_start(&self, bytes: &[u8], at: usize) -> Option<Option<usize>> {
        if at == 0 {
            return Some(None);
        }
        match bytes[at - 1] {
            b'\n' | b'\r' => Some(None),
            b' ' if at >= 2 => self.position(bytes[at - 2]).map(Some),
            b => self.position(b).map(Some),
        }
    }

    /// Visits the index of every byte outside quoted fields. A quote opens a
    /// field only where [`Self::field_start`] allows it; anywhere else it is
    /// an ordinary character. An unclosed field runs to the end of `bytes`.
    fn for_each_unquoted(&self, bytes: &[u8], quote: u8, mut visit: impl FnMut(usize)) {
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == quote && self.field_start(bytes, i).is_some() {
                match closing_quote(bytes, i + 1, quote) {
                    Some(end) => {
                        i = end + 1;
                        continue;
                    }
                    None => return,
                }
            }
            visit(i);
            i += 1;
        }
    }

    /// Splits on line feeds outside quoted fields, dropping blank rows and
    /// trailing carriage returns.
    fn split_rows<'a>(&self, bytes: &'a [u8], quote: u8) -> Vec<&'a [u8]> {
        let mut rows = Vec::new();
        let mut start = 0;

        self.for_each_unquoted(bytes, quote, |i| {
            if bytes[i] == b'\n' {
                rows.push(&bytes[start..i]);
                start = i + 1;
            }
        });
        if start < bytes.len() {
            rows.push(&bytes[start..]);
        }

        rows.into_iter()
            .map(|row| row.strip_suffix(b"\r").unwrap_or(row))
            .filter(|row| !row.is_empty())
            .collect()
    }

    fn guess_quote(&self, bytes: &[u8]) -> QuoteGuess {
        let mut best = QuoteGuess {
            quote: None,
            votes: vec![0; self.candidates.len()],
        };
        let mut best_hits = 0;

        for quote in QUOTE_CANDIDATES {
            let (hits, votes) = self.quoted_fields(bytes, quote);
            if hits > best_hits {
                best_hits = hits;
                best = QuoteGuess {
                    quote: Some(quote),
                    votes,
                };
            }
        }

        best
    }

    /// Counts fields wrapped in `quote` that open and close on field
    /// boundaries, tallying the delimiters on either side.
    fn quoted_fields(&self, bytes: &[u8], quote: u8) -> (usize, Vec<usize>) {
        let mut hits = 0;
        let mut votes = vec![0; self.candidates.len()];
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != quote {
                i += 1;
                continue;
            }
            let Some(opener) = self.field_start(bytes, i) else {
                i += 1;
                continue;
            };

            let Some(end) = closing_quote(bytes, i + 1, quote) else {
                break;
            };

            let closer = match bytes.get(end + 1) {
                None | Some(b'\n') | Some(b'\r') => Some(None),
                Some(&b) => self.position(b).map(Some),
            };
            if let Some(closer) = closer {
                hits += 1;
                for idx in [opener, closer].into_iter().flatten() {
                    votes[idx] += 1;
                }
            }

            i = end + 1;
        }

        (hits, votes)
    }
}

/// Index of the quote closing a field opened just before `from`. Doubled
/// quotes are escapes.
fn closing_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return Some(j);
        }
        j += 1;
    }
    None
}

fn score(delimiter: u8, counts: &[usize]) -> DelimiterScore {
    let mut frequencies: HashMap<usize, usize> = HashMap::new();
    for &count in counts {
        *frequencies.entry(count).or_default() += 1;
    }

    let (modal_count, hits) = frequencies
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .unwrap_or((0, 0));

    let consistency = if modal_count == 0 || counts.is_empty() {
        0.0
    } else {
        hits as f64 / counts.len() as f64
    };

    DelimiterScore {
        delimiter,
        modal_count,
        consistency,
        rows: counts.len(),
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_sniff_comma() {
        let d = Sniffer::default()
            .sniff_dialect("id,name,score\n1,ann,3.5\n2,bob,4.0\n")
            .unwrap();

        assert_eq!(d.delimiter, b',');
        assert_eq!(d.quote, b'"');
        assert_eq!(d.terminator, LineTerminator::Lf);
    }

    #[test]
    fn should_sniff_tab_with_crlf() {
        let d = Sniffer::default()
            .sniff_dialect("a\tb\tc\r\n1\t2\t3\r\n4\t5\t6\r\n")
            .unwrap();

        assert_eq!(d.delimiter, b'\t');
        assert_eq!(d.terminator, LineTerminator::CrLf);
    }

    #[test]
    fn should_ignore_delimiters_inside_quotes() {
        let text = "name;note\n\"Smith, J\";x\n\"Doe, A, B\";y\n\"Roe\";z\n";
        let d = Sniffer::default().sniff_dialect(text).unwrap();

        assert_eq!(d.delimiter, b';');
    }

    #[test]
    fn should_detect_single_quote() {
        let text = "'a'|'b'\n'1'|'2'\n'3'|'4'\n";
        let d = Sniffer::default().sniff_dialect(text).unwrap();

        assert_eq!(d.quote, b'\'');
        assert_eq!(d.delimiter, b'|');
    }

    #[test]
    fn should_prefer_candidate_order_on_ties() {
        let d = Sniffer::default().sniff_dialect("a,b;c\n1,2;3\n").unwrap();
        assert_eq!(d.delimiter, b',');
    }

    #[test]
    fn should_restrict_to_candidates() {
        let sniffer = Sniffer::new(vec![b';']);
        let e = sniffer.sniff_dialect("a,b\n1,2\n").unwrap_err();
        assert_eq!(e, SniffError::NoConsistentDelimiter);
    }

    #[test]
    fn should_fail_on_empty_sample() {
        assert_eq!(
            Sniffer::default().sniff_dialect(" \n"),
            Err(SniffError::EmptySample)
        );
    }

    #[test]
    fn should_fall_back_to_excel_dialect() {
        let sniff = Sniffer::default().sniff("just one column\nand another\n");

        assert!(sniff.dialect.is_defaulted());
        assert_eq!(sniff.dialect.value, Dialect::default());
        assert!(sniff.has_header.value);
        assert!(sniff.has_header.is_defaulted());
    }

    #[test]
    fn should_keep_dialect_when_header_guess_fails() {
        let sniff = Sniffer::default().sniff("a;b\n");

        assert!(!sniff.dialect.is_defaulted());
        assert_eq!(sniff.dialect.value.delimiter, b';');
        assert!(sniff.has_header.value);
        assert!(sniff.has_header.is_defaulted());
    }

    #[test]
    fn should_score_inconsistent_rows_low() {
        let scores = Sniffer::new(vec![b',', b';'])
            .delimiter_scores("a,b\n1,2\n3;4,5,6\nx,y\n", b'"');

        assert_eq!(scores[0].modal_count, 1);
        assert!((scores[0].consistency - 0.75).abs() < 1e-9);
        assert_eq!(scores[1].modal_count, 0);
        assert_eq!(scores[1].consistency, 0.0);
        assert_eq!(scores[1].rows, 4);
    }

    #[test]
    fn should_treat_quoted_newlines_as_one_row() {
        let rows = Sniffer::default().split_rows(b"a,\"x\ny\"\r\n\n1,2", b'"');
        assert_eq!(rows, vec![&b"a,\"x\ny\""[..], &b"1,2"[..]]);
    }

    #[test]
    fn should_treat_mid_field_quote_as_text() {
        let text = "name;size;note\nA;12\" pipe;x\nB;3;y\nC;4;z\nD;5;w\nE;6;v\n";
        let sniffer = Sniffer::default();

        assert_eq!(sniffer.sniff_dialect(text).unwrap().delimiter, b';');

        let semicolon = &sniffer.delimiter_scores(text, b'"')[2];
        assert_eq!(semicolon.delimiter, b';');
        assert_eq!(semicolon.modal_count, 2);
        assert_eq!(semicolon.rows, 6);
        assert_eq!(semicolon.consistency, 1.0);

        let sniff = sniffer.sniff(text);
        assert!(!sniff.dialect.is_defaulted());
        assert_eq!(sniff.dialect.value.delimiter, b';');
    }

    #[test]
    fn should_fall_back_to_most_frequent_delimiter() {
        let d = Sniffer::default().sniff_delimiter_only("a|b|c\nd\n");
        assert_eq!(d.value, b'|');
        assert!(d.is_defaulted());

        let none = Sniffer::default().sniff_delimiter_only("abc\n");
        assert_eq!(none.value, b',');
        assert!(none.is_defaulted());

        let found = Sniffer::default().sniff_delimiter_only("a^b\n1^2\n");
        assert_eq!(found, Detection::detected(b'^'));
    }

    #[test]
    fn should_build_matching_writer() {
        let dialect = Dialect {
            delimiter: b';',
            quote: b'"',
            terminator: LineTerminator::Lf,
        };
        let mut writer = dialect.writer_builder().from_writer(vec![]);
        writer.write_record(["a;b", "c"]).unwrap();
        writer.write_record(["d"]).unwrap();

        writer.flush().unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"\"a;b\";c\nd\n");
    }
}
