//! Streaming tokenizer for `#EXTM3U`-family HLS playlist text.
//!
//! The crate exposes two layers: [`source`] adapts concrete inputs
//! (in-memory text, byte readers) to a character-stream capability, and
//! [`lexer`] scans that stream into a flat sequence of located tokens.

pub mod lexer;
pub mod source;
