//! Character-stream capability and input adapters.
//!
//! The scanner consumes characters through one narrow trait so that
//! in-memory text and decoded byte streams feed the same machinery.

mod utf8;

use thiserror::Error;

pub use utf8::Utf8Source;

/// Failure reading characters from an underlying input.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The wrapped byte stream failed.
    #[error("failed to read from the underlying stream")]
    Io(#[from] std::io::Error),
    /// The byte stream is not valid UTF-8.
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    InvalidUtf8 {
        /// Absolute byte offset of the offending sequence.
        offset: usize,
    },
}

/// A pull-based supplier of Unicode characters.
pub trait CharSource {
    /// Fills `out` from the front and returns how many characters were
    /// written. A return of zero signals that no characters are currently
    /// available; callers treat repeated zero returns as end of stream.
    fn read_chars(&mut self, out: &mut [char]) -> Result<usize, SourceError>;
}

/// In-memory character source over owned text.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    offset: usize,
}

impl TextSource {
    /// Creates a source over the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: 0,
        }
    }
}

impl From<&str> for TextSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextSource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl CharSource for TextSource {
    fn read_chars(&mut self, out: &mut [char]) -> Result<usize, SourceError> {
        let mut written = 0;
        for (index, ch) in self.text[self.offset..].char_indices() {
            if written == out.len() {
                self.offset += index;
                return Ok(written);
            }
            out[written] = ch;
            written += 1;
        }
        self.offset = self.text.len();
        Ok(written)
    }
}
