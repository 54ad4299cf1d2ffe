//! Streams a file in any detected encoding as UTF-8 bytes.
//!
//! The CSV reader sits on top of [`Transcoder`], which sits on top of
//! [`CountingReader`], so the byte offset into the raw file is always known
//! for progress reporting.

use std::{
    char::REPLACEMENT_CHARACTER,
    fs::File,
    io::{self, ErrorKind, Read},
    mem,
    path::Path,
};

use encoding_rs::{CoderResult, Decoder, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

use crate::detect::TextEncoding;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Counts the bytes pulled from the wrapped reader.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    bytes_read: u64,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        CountingReader {
            inner,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

enum Inner {
    /// Encodings covered by `encoding_rs`.
    Whatwg(Decoder),
    /// `encoding_rs` has no UTF-32 support.
    Utf32 {
        big_endian: bool,
        at_start: bool,
        pending: Vec<u8>,
    },
    /// `encoding_rs` maps the Latin-1 label onto Windows-1252, so the two
    /// are kept apart here.
    Latin1,
}

/// Incremental decoder from a [`TextEncoding`] to UTF-8.
///
/// Byte-order-marks are stripped and undecodable input becomes U+FFFD.
pub struct TextDecoder {
    inner: Inner,
}

impl TextDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        let inner = match encoding {
            TextEncoding::Utf8Sig => Inner::Whatwg(UTF_8.new_decoder_with_bom_removal()),
            TextEncoding::Utf8 => Inner::Whatwg(UTF_8.new_decoder_without_bom_handling()),
            TextEncoding::Utf16Le => Inner::Whatwg(UTF_16LE.new_decoder_with_bom_removal()),
            TextEncoding::Utf16Be => Inner::Whatwg(UTF_16BE.new_decoder_with_bom_removal()),
            TextEncoding::Windows1252 => {
                Inner::Whatwg(WINDOWS_1252.new_decoder_without_bom_handling())
            }
            TextEncoding::Utf32Le => Inner::Utf32 {
                big_endian: false,
                at_start: true,
                pending: Vec::new(),
            },
            TextEncoding::Utf32Be => Inner::Utf32 {
                big_endian: true,
                at_start: true,
                pending: Vec::new(),
            },
            TextEncoding::Latin1 => Inner::Latin1,
        };

        TextDecoder { inner }
    }

    /// Decodes all of `src`, appending to `dst`. Pass `last` with the final
    /// buffer so incomplete trailing sequences are flushed as U+FFFD.
    pub fn decode_to(&mut self, src: &[u8], dst: &mut String, last: bool) {
        match &mut self.inner {
            Inner::Whatwg(decoder) => {
                let mut src = src;
                loop {
                    let needed = decoder
                        .max_utf8_buffer_length(src.len())
                        .unwrap_or(src.len() * 3 + 16);
                    dst.reserve(needed);

                    let (result, read, _) = decoder.decode_to_string(src, dst, last);
                    src = &src[read..];
                    if let CoderResult::InputEmpty = result {
                        break;
                    }
                }
            }
            Inner::Utf32 {
                big_endian,
                at_start,
                pending,
            } => {
                let mut data = mem::take(pending);
                data.extend_from_slice(src);

                let mut units = data.chunks_exact(4);
                for unit in &mut units {
                    let bytes = [unit[0], unit[1], unit[2], unit[3]];
                    let code = if *big_endian {
                        u32::from_be_bytes(bytes)
                    } else {
                        u32::from_le_bytes(bytes)
                    };
                    if mem::take(at_start) && code == 0xFEFF {
                        continue;
                    }
                    dst.push(char::from_u32(code).unwrap_or(REPLACEMENT_CHARACTER));
                }

                let remainder = units.remainder();
                if last {
                    if !remainder.is_empty() {
                        dst.push(REPLACEMENT_CHARACTER);
                    }
                } else {
                    *pending = remainder.to_vec();
                }
            }
            Inner::Latin1 => dst.extend(src.iter().map(|&b| char::from(b))),
        }
    }
}

/// A reader yielding the UTF-8 transcoding of `source`.
pub struct Transcoder<R> {
    source: R,
    decoder: TextDecoder,
    raw: Vec<u8>,
    decoded: String,
    pos: usize,
    eof: bool,
}

impl<R: Read> Transcoder<R> {
    pub fn new(source: R, encoding: TextEncoding) -> Self {
        Transcoder {
            source,
            decoder: TextDecoder::new(encoding),
            raw: vec![0; READ_BUFFER_BYTES],
            decoded: String::new(),
            pos: 0,
            eof: false,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }
}

impl<R: Read> Read for Transcoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.decoded.clear();
            self.pos = 0;

            let n = match self.source.read(&mut self.raw) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                self.eof = true;
                self.decoder.decode_to(&[], &mut self.decoded, true);
            } else {
                self.decoder
                    .decode_to(&self.raw[..n], &mut self.decoded, false);
            }
        }

        let available = &self.decoded.as_bytes()[self.pos..];
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.pos += len;

        Ok(len)
    }
}

/// Opens `path` for reading as UTF-8 text.
pub fn open_decoded(
    path: &Path,
    encoding: TextEncoding,
) -> io::Result<Transcoder<CountingReader<File>>> {
    let file = File::open(path)?;
    Ok(Transcoder::new(CountingReader::new(file), encoding))
}

// -- Tests -------------------------------------------------------------------
