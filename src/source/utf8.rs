//! Incremental UTF-8 decoding over arbitrary byte readers.

use std::io::Read;

use crate::source::{CharSource, SourceError};

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const READ_CHUNK: usize = 4096;

/// Character source that decodes a byte reader as strict UTF-8.
///
/// An initial byte-order mark is recognized, recorded, and elided from
/// the character stream. Multi-byte sequences may arrive split across
/// reads; undecoded tail bytes are carried until completed.
pub struct Utf8Source<R> {
    reader: R,
    pending: Vec<u8>,
    consumed: usize,
    bom_checked: bool,
    bom_found: bool,
    reader_done: bool,
}

impl<R: Read> Utf8Source<R> {
    /// Creates a decoding source over the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            consumed: 0,
            bom_checked: false,
            bom_found: false,
            reader_done: false,
        }
    }

    /// Returns `true` when the input began with a UTF-8 byte-order mark.
    pub fn bom_detected(&self) -> bool {
        self.bom_found
    }

    fn fill_pending(&mut self) -> Result<(), SourceError> {
        let mut chunk = [0u8; READ_CHUNK];
        let read = self.reader.read(&mut chunk)?;
        if read == 0 {
            self.reader_done = true;
        } else {
            self.pending.extend_from_slice(&chunk[..read]);
        }
        Ok(())
    }

    fn strip_bom(&mut self) -> Result<(), SourceError> {
        while !self.bom_checked {
            if self.pending.len() >= BOM.len() || self.reader_done {
                if self.pending.starts_with(&BOM) {
                    self.pending.drain(..BOM.len());
                    self.consumed += BOM.len();
                    self.bom_found = true;
                }
                self.bom_checked = true;
            } else {
                self.fill_pending()?;
            }
        }
        Ok(())
    }
}

impl<R: Read> CharSource for Utf8Source<R> {
    fn read_chars(&mut self, out: &mut [char]) -> Result<usize, SourceError> {
        if out.is_empty() {
            return Ok(0);
        }
        self.strip_bom()?;

        loop {
            if self.pending.is_empty() {
                if self.reader_done {
                    return Ok(0);
                }
                self.fill_pending()?;
                continue;
            }

            let valid_up_to = match std::str::from_utf8(&self.pending) {
                Ok(_) => self.pending.len(),
                Err(error) => {
                    if error.valid_up_to() == 0 {
                        if error.error_len().is_some() {
                            return Err(SourceError::InvalidUtf8 {
                                offset: self.consumed,
                            });
                        }
                        // Incomplete trailing sequence: wait for more
                        // bytes, or fail if the reader is already dry.
                        if self.reader_done {
                            return Err(SourceError::InvalidUtf8 {
                                offset: self.consumed,
                            });
                        }
                        self.fill_pending()?;
                        continue;
                    }
                    error.valid_up_to()
                }
            };

            let decoded = std::str::from_utf8(&self.pending[..valid_up_to])
                .expect("prefix below valid_up_to must be valid UTF-8");

            let mut written = 0;
            let mut used = 0;
            for ch in decoded.chars() {
                if written == out.len() {
                    break;
                }
                out[written] = ch;
                written += 1;
                used += ch.len_utf8();
            }

            self.pending.drain(..used);
            self.consumed += used;
            return Ok(written);
        }
    }
}
