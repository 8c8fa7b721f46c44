//! Streaming, chunked character input.
//!
//! Turns any `std::io::Read` into a stream of `char`s for `saphyr_parser`
//! without loading the whole input into memory. `encoding_rs_io` sniffs a BOM
//! and decodes UTF-16 on the fly; this layer then pulls fixed-size chunks of
//! UTF-8 on demand and stitches together characters that straddle two chunks.

use std::cell::RefCell;
use std::io::{self, BufReader, Read};
use std::rc::Rc;

use encoding_rs_io::DecodeReaderBytesBuilder;
use saphyr_parser::BufferedInput;

/// Slot where the character stream parks a read failure.
///
/// The tokenizer only sees end of input; whoever drives it checks this slot
/// afterwards and reports the I/O error instead of whatever the truncated
/// input provoked.
pub(crate) type SharedIoError = Rc<RefCell<Option<io::Error>>>;

pub struct ChunkedChars<R: Read> {
    reader: R,
    /// Reusable read buffer; its length is the chunk size.
    chunk: Vec<u8>,
    /// Decoded text not yet handed out.
    buf: String,
    /// Byte index into `buf` of the next character.
    idx: usize,
    /// Leading bytes of a UTF-8 sequence cut off at the end of the last chunk.
    partial: Vec<u8>,
    /// Optional hard cap on total decoded bytes.
    max_bytes: Option<usize>,
    total_bytes: usize,
    err: SharedIoError,
}

impl<R: Read> ChunkedChars<R> {
    pub fn new(
        reader: R,
        chunk_size: usize,
        max_bytes: Option<usize>,
        err: SharedIoError,
    ) -> Self {
        Self {
            reader,
            chunk: vec![0u8; chunk_size.max(1)],
            buf: String::new(),
            idx: 0,
            partial: Vec::new(),
            max_bytes,
            total_bytes: 0,
            err,
        }
    }

    /// Read one chunk, retrying on `Interrupted`.
    fn read_chunk(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.chunk) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    /// Refill `buf` with the next run of complete characters.
    ///
    /// Returns `Ok(true)` when new text is available, `Ok(false)` at end of
    /// input.
    fn refill(&mut self) -> io::Result<bool> {
        loop {
            let n = self.read_chunk()?;
            if n == 0 {
                if !self.partial.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "input ends inside a UTF-8 sequence",
                    ));
                }
                return Ok(false);
            }

            if let Some(limit) = self.max_bytes {
                self.total_bytes = self.total_bytes.saturating_add(n);
                if self.total_bytes > limit {
                    return Err(io::Error::new(
                        io::ErrorKind::FileTooLarge,
                        format!("input size limit of {limit} bytes exceeded"),
                    ));
                }
            }

            self.partial.extend_from_slice(&self.chunk[..n]);
            let complete = match std::str::from_utf8(&self.partial) {
                Ok(_) => self.partial.len(),
                // Truncated sequence at the end: keep it for the next chunk.
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            };
            if complete == 0 {
                continue;
            }

            let text = std::str::from_utf8(&self.partial[..complete])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.buf.clear();
            self.buf.push_str(text);
            self.idx = 0;
            self.partial.drain(..complete);
            return Ok(true);
        }
    }
}

impl<R: Read> Iterator for ChunkedChars<R> {
    type Item = char;

    /// Next character, or `None` at end of input. A read failure also ends the
    /// stream, after being stored in the shared error slot.
    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.buf[self.idx..].chars().next() {
                self.idx += ch.len_utf8();
                return Some(ch);
            }
            match self.refill() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(error) => {
                    self.err.replace(Some(error));
                    return None;
                }
            }
        }
    }
}

/// Reader-backed tokenizer input.
pub(crate) type ReaderInput<'a> = BufferedInput<ChunkedChars<BufReader<Box<dyn Read + 'a>>>>;

/// Creates buffered input and returns both the input and the slot that will
/// hold a read failure, which the tokenizer gives no way to reach later.
pub(crate) fn buffered_input_from_reader<'a, R: Read + 'a>(
    reader: R,
    chunk_size: usize,
    max_bytes: Option<usize>,
) -> (ReaderInput<'a>, SharedIoError) {
    // No forced encoding: sniff the BOM, default to UTF-8. The BOM itself is
    // not content.
    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(None)
        .strip_bom(true)
        .build(reader);

    let error: SharedIoError = Rc::new(RefCell::new(None));

    let br = BufReader::new(Box::new(decoder) as Box<dyn Read + 'a>);
    let char_iter = ChunkedChars::new(br, chunk_size, max_bytes, error.clone());

    (BufferedInput::new(char_iter), error)
}

/// Decodes a whole byte slice: UTF-16 after a BOM, UTF-8 otherwise, BOM
/// removed. Bytes that are not valid UTF-8 fail with `InvalidData`.
pub(crate) fn decode_slice(bytes: &[u8]) -> io::Result<String> {
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(None)
        .strip_bom(true)
        .build(bytes);
    let mut text = String::with_capacity(bytes.len());
    decoder.read_to_string(&mut text)?;
    Ok(text)
}
