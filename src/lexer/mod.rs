//! Playlist scanner module.
//!
//! A deterministic state machine drives tokenization: each call to
//! [`Scanner::advance`] runs the machine until exactly one token of the
//! requested visibility has been produced. Malformed input never aborts
//! the scan; the one non-local violation (data between a closing quote
//! and the next delimiter) surfaces as [`TokenKind::UnexpectedData`].

mod window;

pub mod token;

use tracing::trace;

use crate::lexer::window::{CharWindow, SENTINEL};
use crate::source::{CharSource, SourceError, TextSource};

pub use token::{Token, TokenKind};

/// Scanner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScannerOptions {
    /// When `true`, structural tokens (markers, separators, line and
    /// stream terminators) are returned to the caller instead of being
    /// consumed silently.
    pub verbose: bool,
}

/// Lexical states of the playlist scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Start of a logical line.
    LineStart,
    /// Just after the `#` marker.
    CommentOrTagName,
    /// Cursor at the `:` following a tag name.
    TagNameValueSeparator,
    /// Payload region after `:`, attribute-or-value still undecided.
    TagValueOrAttributeName,
    /// Cursor at the `=` following an attribute name.
    AttributeNameValueSeparator,
    /// Just after `=`, quoted-or-unquoted still undecided.
    AttributeValueOrQuotedValueMarker,
    /// Inside a quoted value.
    QuotedAttributeValue,
    /// Cursor at the closing `"`.
    QuotedAttributeValueTerminator,
    /// Junk between a closing `"` and the next delimiter.
    PostQuoteData,
    /// Cursor at the `,` between attributes.
    AttributeSeparator,
    /// Attribute name after a `,`.
    AttributeName,
    /// Cursor at a line terminator.
    EndOfLine,
    /// Stream exhausted, final token not yet produced.
    EndOfFile,
    /// Terminal.
    Finished,
}

/// Outcome of one state-machine step.
enum Step {
    /// A token was materialized.
    Emitted,
    /// The state changed without producing a token.
    Continue,
    /// No further tokens exist.
    Done,
}

/// How a scan-ahead loop stopped.
enum Halt {
    /// The requested delimiter is at the cursor.
    Delimiter,
    /// A line terminator (`\n` or `\r\n`) is at the cursor.
    LineBreak,
    /// The stream ended.
    EndOfInput,
}

/// Where the remainder of a line ended.
enum LineEnd {
    /// A line terminator is at the cursor.
    Break,
    /// The stream ended.
    Input,
}

fn is_attribute_name(chars: &[char]) -> bool {
    !chars.is_empty()
        && chars
            .iter()
            .all(|&ch| matches!(ch, 'A'..='Z' | '0'..='9' | '-'))
}

/// Streaming tokenizer over a character source.
///
/// Owns its source exclusively for its lifetime. All mutation happens on
/// the calling thread inside [`Scanner::advance`]; tokens are produced in
/// strict source order.
pub struct Scanner<S> {
    window: CharWindow<S>,
    state: State,
    verbose: bool,
    failed: bool,
    anchor: usize,
    anchor_line: usize,
    anchor_column: usize,
    token_kind: TokenKind,
    token_value: String,
    token_line: usize,
    token_column: usize,
}

impl Scanner<TextSource> {
    /// Creates a scanner over in-memory text with default options.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(TextSource::new(text))
    }
}

impl<S: CharSource> Scanner<S> {
    /// Creates a scanner with default options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, ScannerOptions::default())
    }

    /// Creates a scanner with explicit options.
    pub fn with_options(source: S, options: ScannerOptions) -> Self {
        Self {
            window: CharWindow::new(source),
            state: State::LineStart,
            verbose: options.verbose,
            failed: false,
            anchor: 0,
            anchor_line: 1,
            anchor_column: 1,
            token_kind: TokenKind::None,
            token_value: String::new(),
            token_line: 1,
            token_column: 1,
        }
    }

    /// Returns the 1-based line immediately following the last-consumed
    /// character.
    pub fn line(&self) -> usize {
        self.window.line()
    }

    /// Returns the 1-based column immediately following the
    /// last-consumed character.
    pub fn column(&self) -> usize {
        self.window.column()
    }

    /// Returns the kind of the last-emitted token.
    pub fn token_kind(&self) -> TokenKind {
        self.token_kind
    }

    /// Returns the text of the last-emitted token.
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    /// Returns the starting line of the last-emitted token.
    pub fn token_line(&self) -> usize {
        self.token_line
    }

    /// Returns the starting column of the last-emitted token.
    pub fn token_column(&self) -> usize {
        self.token_column
    }

    /// Snapshots the last-emitted token as an owned value.
    pub fn token(&self) -> Token {
        Token::new(
            self.token_kind,
            self.token_value.clone(),
            self.token_line,
            self.token_column,
        )
    }

    /// Advances to the next token of the configured visibility.
    ///
    /// Returns `Ok(true)` when a token was produced and `Ok(false)` once
    /// the stream is exhausted. A source failure is returned once; the
    /// scanner then sticks in a failed state and reports no more tokens.
    pub fn advance(&mut self) -> Result<bool, SourceError> {
        if self.failed {
            return Ok(false);
        }
        loop {
            let step = match self.step() {
                Ok(step) => step,
                Err(error) => {
                    self.failed = true;
                    return Err(error);
                }
            };
            match step {
                Step::Done => return Ok(false),
                Step::Continue => {}
                Step::Emitted => {
                    if self.verbose || !self.token_kind.is_structural() {
                        return Ok(true);
                    }
                }
            }
        }
    }

    /// Combines [`Scanner::advance`] with a token snapshot.
    pub fn read_token(&mut self) -> Result<Option<Token>, SourceError> {
        if self.advance()? {
            Ok(Some(self.token()))
        } else {
            Ok(None)
        }
    }

    /// Collects every remaining token in source order.
    pub fn drain(&mut self) -> Result<Vec<Token>, SourceError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.read_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn step(&mut self) -> Result<Step, SourceError> {
        match self.state {
            State::LineStart => self.line_start(),
            State::CommentOrTagName => self.comment_or_tag_name(),
            State::TagNameValueSeparator => {
                self.single_char(TokenKind::TagNameValueSeparator, State::TagValueOrAttributeName)
            }
            State::TagValueOrAttributeName => self.tag_value_or_attribute_name(),
            State::AttributeNameValueSeparator => self.single_char(
                TokenKind::AttributeNameValueSeparator,
                State::AttributeValueOrQuotedValueMarker,
            ),
            State::AttributeValueOrQuotedValueMarker => self.attribute_value_or_marker(),
            State::QuotedAttributeValue => self.quoted_attribute_value(),
            State::QuotedAttributeValueTerminator => self.quoted_value_terminator(),
            State::PostQuoteData => self.post_quote_data(),
            State::AttributeSeparator => {
                self.single_char(TokenKind::AttributeSeparator, State::AttributeName)
            }
            State::AttributeName => self.attribute_name(),
            State::EndOfLine => self.end_of_line(),
            State::EndOfFile => self.end_of_file(),
            State::Finished => Ok(Step::Done),
        }
    }

    /// Opens a token at the cursor: shifts the window if crowded, then
    /// records the anchor and its position.
    fn open_token(&mut self) {
        self.window.shift_if_crowded();
        self.anchor = self.window.offset();
        self.anchor_line = self.window.line();
        self.anchor_column = self.window.column();
    }

    /// Materializes the open token with the given kind.
    fn emit(&mut self, kind: TokenKind) {
        self.token_kind = kind;
        self.token_value = self.window.take_from(self.anchor);
        self.token_line = self.anchor_line;
        self.token_column = self.anchor_column;
        trace!(
            kind = ?self.token_kind,
            line = self.token_line,
            column = self.token_column,
            "token emitted"
        );
    }

    /// Consumes characters until the stream ends or a line terminator is
    /// reached. The terminator is not consumed.
    fn scan_line_remainder(&mut self) -> Result<LineEnd, SourceError> {
        loop {
            let ch = self.window.current();
            if ch == SENTINEL && !self.window.pending() {
                if self.window.is_eof()? {
                    return Ok(LineEnd::Input);
                }
                continue;
            }
            if ch == '\n' || (ch == '\r' && self.window.next_is_line_feed()?) {
                return Ok(LineEnd::Break);
            }
            self.window.bump();
        }
    }

    /// Consumes characters until `delimiter`, a line terminator, or the
    /// end of the stream. The stopping character is not consumed.
    fn scan_until_delimiter(&mut self, delimiter: char) -> Result<Halt, SourceError> {
        loop {
            let ch = self.window.current();
            if ch == SENTINEL && !self.window.pending() {
                if self.window.is_eof()? {
                    return Ok(Halt::EndOfInput);
                }
                continue;
            }
            if ch == delimiter {
                return Ok(Halt::Delimiter);
            }
            if ch == '\n' || (ch == '\r' && self.window.next_is_line_feed()?) {
                return Ok(Halt::LineBreak);
            }
            self.window.bump();
        }
    }

    /// Emits the single character at the cursor as `kind` and moves to
    /// `next`. Used for the separator states, whose predecessor already
    /// verified the character.
    fn single_char(&mut self, kind: TokenKind, next: State) -> Result<Step, SourceError> {
        self.open_token();
        self.window.bump();
        self.emit(kind);
        self.state = next;
        Ok(Step::Emitted)
    }

    fn line_start(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        if !self.window.has_lookahead(0)? {
            self.state = State::EndOfFile;
            return Ok(Step::Continue);
        }
        if self.window.peek(0) == '#' {
            self.window.bump();
            self.emit(TokenKind::CommentMarker);
            self.state = State::CommentOrTagName;
            return Ok(Step::Emitted);
        }
        match self.scan_line_remainder()? {
            LineEnd::Break => {
                self.emit(TokenKind::Uri);
                self.state = State::EndOfLine;
            }
            LineEnd::Input => {
                self.emit(TokenKind::Uri);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn comment_or_tag_name(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        let tagged = self.window.has_lookahead(2)?
            && self.window.peek(0) == 'E'
            && self.window.peek(1) == 'X'
            && self.window.peek(2) == 'T';
        if tagged {
            match self.scan_until_delimiter(':')? {
                Halt::Delimiter => {
                    self.emit(TokenKind::TagName);
                    self.state = State::TagNameValueSeparator;
                }
                Halt::LineBreak => {
                    self.emit(TokenKind::TagName);
                    self.state = State::EndOfLine;
                }
                Halt::EndOfInput => {
                    self.emit(TokenKind::TagName);
                    self.state = State::EndOfFile;
                }
            }
        } else {
            match self.scan_line_remainder()? {
                LineEnd::Break => {
                    self.emit(TokenKind::Comment);
                    self.state = State::EndOfLine;
                }
                LineEnd::Input => {
                    self.emit(TokenKind::Comment);
                    self.state = State::EndOfFile;
                }
            }
        }
        Ok(Step::Emitted)
    }

    fn tag_value_or_attribute_name(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        match self.scan_until_delimiter('=')? {
            Halt::Delimiter => {
                if is_attribute_name(self.window.lexeme(self.anchor)) {
                    self.emit(TokenKind::AttributeName);
                    self.state = State::AttributeNameValueSeparator;
                    return Ok(Step::Emitted);
                }
                // Not an attribute list after all. The decision is
                // one-shot: later `=` in the same payload stay literal.
                self.window.bump();
                match self.scan_line_remainder()? {
                    LineEnd::Break => {
                        self.emit(TokenKind::TagValue);
                        self.state = State::EndOfLine;
                    }
                    LineEnd::Input => {
                        self.emit(TokenKind::TagValue);
                        self.state = State::EndOfFile;
                    }
                }
            }
            Halt::LineBreak => {
                self.emit(TokenKind::TagValue);
                self.state = State::EndOfLine;
            }
            Halt::EndOfInput => {
                self.emit(TokenKind::TagValue);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn attribute_value_or_marker(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        if self.window.has_lookahead(0)? && self.window.peek(0) == '"' {
            self.window.bump();
            self.emit(TokenKind::QuotedAttributeValueMarker);
            self.state = State::QuotedAttributeValue;
            return Ok(Step::Emitted);
        }
        match self.scan_until_delimiter(',')? {
            Halt::Delimiter => {
                self.emit(TokenKind::AttributeValue);
                self.state = State::AttributeSeparator;
            }
            Halt::LineBreak => {
                self.emit(TokenKind::AttributeValue);
                self.state = State::EndOfLine;
            }
            Halt::EndOfInput => {
                self.emit(TokenKind::AttributeValue);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn quoted_attribute_value(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        match self.scan_until_delimiter('"')? {
            Halt::Delimiter => {
                self.emit(TokenKind::QuotedAttributeValue);
                self.state = State::QuotedAttributeValueTerminator;
            }
            // An unterminated value keeps its partial content; no
            // terminator token is synthesized.
            Halt::LineBreak => {
                self.emit(TokenKind::QuotedAttributeValue);
                self.state = State::EndOfLine;
            }
            Halt::EndOfInput => {
                self.emit(TokenKind::QuotedAttributeValue);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn quoted_value_terminator(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        self.window.bump();
        self.state = if !self.window.has_lookahead(0)? {
            State::EndOfFile
        } else {
            let next = self.window.peek(0);
            if next == ',' {
                State::AttributeSeparator
            } else if next == '\n' || (next == '\r' && self.window.next_is_line_feed()?) {
                State::EndOfLine
            } else {
                State::PostQuoteData
            }
        };
        self.emit(TokenKind::QuotedAttributeValueTerminator);
        Ok(Step::Emitted)
    }

    fn post_quote_data(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        match self.scan_until_delimiter(',')? {
            Halt::Delimiter => {
                self.emit(TokenKind::UnexpectedData);
                self.state = State::AttributeSeparator;
            }
            Halt::LineBreak => {
                self.emit(TokenKind::UnexpectedData);
                self.state = State::EndOfLine;
            }
            Halt::EndOfInput => {
                self.emit(TokenKind::UnexpectedData);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn attribute_name(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        match self.scan_until_delimiter('=')? {
            Halt::Delimiter => {
                self.emit(TokenKind::AttributeName);
                self.state = State::AttributeNameValueSeparator;
            }
            Halt::LineBreak => {
                self.emit(TokenKind::AttributeName);
                self.state = State::EndOfLine;
            }
            Halt::EndOfInput => {
                self.emit(TokenKind::AttributeName);
                self.state = State::EndOfFile;
            }
        }
        Ok(Step::Emitted)
    }

    fn end_of_line(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        self.window.consume_line_break();
        self.emit(TokenKind::EndOfLine);
        self.state = State::LineStart;
        Ok(Step::Emitted)
    }

    fn end_of_file(&mut self) -> Result<Step, SourceError> {
        self.open_token();
        self.emit(TokenKind::EndOfFile);
        self.state = State::Finished;
        Ok(Step::Emitted)
    }
}
