//! Byte-order-mark and trial-decode encoding detection.

use std::{
    fmt,
    fs::File,
    io::{self, Read},
    path::Path,
};

use crate::decode::TextDecoder;

use super::Detection;

pub const DEFAULT_SAMPLE_BYTES: usize = 2_000_000;

/// Signatures in the order they are tested. UTF-32LE must come before
/// UTF-16LE because it shares its first two bytes.
const SIGNATURES: [(&[u8], TextEncoding); 5] = [
    (&[0xEF, 0xBB, 0xBF], TextEncoding::Utf8Sig),
    (&[0xFF, 0xFE, 0x00, 0x00], TextEncoding::Utf32Le),
    (&[0x00, 0x00, 0xFE, 0xFF], TextEncoding::Utf32Be),
    (&[0xFF, 0xFE], TextEncoding::Utf16Le),
    (&[0xFE, 0xFF], TextEncoding::Utf16Be),
];

/// Bytes the Windows-1252 code page leaves undefined.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Utf8Sig,
    Utf32Le,
    Utf32Be,
    Utf16Le,
    Utf16Be,
    Utf8,
    Windows1252,
    Latin1,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf32Le => "utf-32-le",
            TextEncoding::Utf32Be => "utf-32-be",
            TextEncoding::Utf16Le => "utf-16-le",
            TextEncoding::Utf16Be => "utf-16-be",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "cp1252",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// The signature this encoding was recognised by, empty when it has none.
    pub fn bom(self) -> &'static [u8] {
        SIGNATURES
            .iter()
            .find(|(_, encoding)| *encoding == self)
            .map(|(bom, _)| *bom)
            .unwrap_or(&[])
    }

    /// Decodes a complete buffer, replacing anything undecodable.
    pub fn decode_lossy(self, bytes: &[u8]) -> String {
        let mut text = String::with_capacity(bytes.len());
        TextDecoder::new(self).decode_to(bytes, &mut text, true);
        text
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A bounded prefix of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub bytes: Vec<u8>,
    /// The file continues past the end of `bytes`.
    pub truncated: bool,
}

impl Sample {
    pub fn head(&self, max_bytes: usize) -> &[u8] {
        &self.bytes[..self.bytes.len().min(max_bytes)]
    }

    /// Decodes the first `max_bytes` and, when that cuts the file short,
    /// drops the trailing partial line.
    pub fn text(&self, encoding: TextEncoding, max_bytes: usize) -> String {
        let head = self.head(max_bytes);
        let cut = self.truncated || head.len() < self.bytes.len();
        let mut text = encoding.decode_lossy(head);

        if cut {
            if let Some(end) = text.rfind('\n') {
                text.truncate(end + 1);
            }
        }

        text
    }
}

/// Reads at most `max_bytes` from the start of `path`.
pub fn read_sample(path: &Path, max_bytes: usize) -> io::Result<Sample> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();
    file.take((max_bytes as u64).saturating_add(1)).read_to_end(&mut bytes)?;

    let truncated = bytes.len() > max_bytes;
    bytes.truncate(max_bytes);

    Ok(Sample { bytes, truncated })
}

/// Guesses the encoding of a byte sample.
///
/// Signatures win outright. Otherwise the sample is strictly decoded as
/// UTF-8, then as Windows-1252, and finally Latin-1 is assumed since it
/// accepts any byte sequence.
pub fn detect_encoding(sample: &[u8]) -> Detection<TextEncoding> {
    for (bom, encoding) in SIGNATURES {
        if sample.starts_with(bom) {
            return Detection::detected(encoding);
        }
    }

    if std::str::from_utf8(sample).is_ok() {
        return Detection::detected(TextEncoding::Utf8);
    }

    if !sample.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
        return Detection::detected(TextEncoding::Windows1252);
    }

    Detection::defaulted(
        TextEncoding::Latin1,
        "sample is neither valid UTF-8 nor Windows-1252",
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn should_detect_every_signature() {
        let cases: [(&[u8], TextEncoding); 5] = [
            (b"\xEF\xBB\xBFa,b\n", TextEncoding::Utf8Sig),
            (b"\xFF\xFE\x00\x00a\x00\x00\x00", TextEncoding::Utf32Le),
            (b"\x00\x00\xFE\xFF\x00\x00\x00a", TextEncoding::Utf32Be),
            (b"\xFF\xFEa\x00,\x00", TextEncoding::Utf16Le),
            (b"\xFE\xFF\x00a\x00,", TextEncoding::Utf16Be),
        ];

        for (sample, expected) in cases {
            let d = detect_encoding(sample);
            assert_eq!(d.value, expected, "sample {:?}", sample);
            assert!(!d.is_defaulted());
            assert!(sample.starts_with(expected.bom()));
        }
    }

    #[test]
    fn should_detect_utf8_for_empty_sample() {
        let d = detect_encoding(b"");
        assert_eq!(d.value, TextEncoding::Utf8);
        assert!(!d.is_defaulted());
    }

    #[test]
    fn should_detect_plain_utf8() {
        let d = detect_encoding("city,temp\nZürich,3\n".as_bytes());
        assert_eq!(d.value, TextEncoding::Utf8);
    }

    #[test]
    fn should_fall_back_to_cp1252() {
        // curly quotes and a euro sign, invalid as UTF-8
        let d = detect_encoding(b"\x93quoted\x94,\x80 5\n");
        assert_eq!(d.value, TextEncoding::Windows1252);
        assert!(!d.is_defaulted());
    }

    #[test]
    fn should_default_to_latin1() {
        let d = detect_encoding(b"caf\xE9 \x81\n");
        assert_eq!(d.value, TextEncoding::Latin1);
        assert!(d.is_defaulted());
    }

    #[test]
    fn should_have_no_bom_for_unsigned_encodings() {
        assert!(TextEncoding::Utf8.bom().is_empty());
        assert!(TextEncoding::Windows1252.bom().is_empty());
        assert!(TextEncoding::Latin1.bom().is_empty());
        assert_eq!(TextEncoding::Utf16Le.bom(), &[0xFF, 0xFE]);
    }

    #[test]
    fn should_read_bounded_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.csv");
        fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();

        let short = read_sample(&path, 6).unwrap();
        assert_eq!(short.bytes, b"a,b\n1,");
        assert!(short.truncated);

        let whole = read_sample(&path, 1024).unwrap();
        assert_eq!(whole.bytes.len(), 12);
        assert!(!whole.truncated);
    }

    #[test]
    fn should_read_whole_file_with_unbounded_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let sample = read_sample(&path, usize::MAX).unwrap();

        assert_eq!(sample.bytes, b"a,b\n1,2\n");
        assert!(!sample.truncated);
    }

    #[test]
    fn should_drop_partial_line_from_truncated_text() {
        let sample = Sample {
            bytes: b"a,b\n1,2\n3,".to_vec(),
            truncated: true,
        };
        assert_eq!(sample.text(TextEncoding::Utf8, 1024), "a,b\n1,2\n");

        let complete = Sample {
            bytes: b"a,b\n1,2".to_vec(),
            truncated: false,
        };
        assert_eq!(complete.text(TextEncoding::Utf8, 1024), "a,b\n1,2");
        assert_eq!(complete.text(TextEncoding::Utf8, 5), "a,b\n");
    }
}
