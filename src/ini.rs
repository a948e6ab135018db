//! A small, self-contained parser for INI-style files.
//!
//! The parser is a byte-at-a-time state machine.  It knows nothing
//! about what the sections and keys mean; it reports them to an
//! `IniHandler` in file order and stops at the first error.
//!
//! Syntax: a file is a sequence of `[section]` headings, each followed
//! by `key = value` lines.  `;` starts a comment anywhere a value or a
//! heading may end.  Values may be wrapped in single or double quotes,
//! in which case they are taken verbatim (no escapes).  Unquoted values
//! and keys lose their trailing whitespace.  A backslash immediately
//! before a line break joins the two lines.  CRLF and bare CR are both
//! accepted as line breaks.

use std::io::{ErrorKind, Read};
use std::str;

use crate::err::*;

const READ_SIZE: usize = 4096;

/// Receiver for the events produced by `Parser::parse`.  An error
/// returned from either method aborts the parse and is passed back to
/// the caller unchanged.
pub trait IniHandler {
    fn begin_section(&mut self, name: &str) -> Result<(), HLError>;
    fn value_pair(&mut self, key: &str, value: &str) -> Result<(), HLError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    StartComment,   // comment before the first heading
    Comment,
    LineStart,
    SectionHead,
    LineEnd,
    EntryKey,
    EntrySep,
    EntryValue,
    SingleQuoted,
    DoubleQuoted,
    Eof,
    Error,
}

/// Accumulates one section name, key, or value.  Cleared, never
/// shrunk, between tokens.
struct TokenBuffer {
    bytes: Vec<u8>,
}

impl TokenBuffer {
    fn new() -> TokenBuffer {
        TokenBuffer { bytes: Vec::new() }
    }

    fn push(&mut self, c: u8) -> Result<(), ()> {
        if self.bytes.len() == self.bytes.capacity() {
            let grow = if self.bytes.capacity() == 0 { 32 }
                       else { self.bytes.capacity() };
            self.bytes.try_reserve(grow).map_err(|_| ())?;
        }
        self.bytes.push(c);
        Ok(())
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }

    fn rstrip(&mut self) {
        while let Some(&c) = self.bytes.last() {
            if is_space(c) {
                self.bytes.pop();
            } else {
                break;
            }
        }
    }

    fn as_str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.bytes)
    }
}

fn is_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// One parse of one input stream.  `parse` consumes the parser, so a
/// fresh one is needed for every stream.
pub struct Parser<R> {
    input: R,
    state: State,
    line: u32,
    char_line: u32,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    pushback: Option<u8>,
}

impl<R: Read> Parser<R> {
    pub fn new(input: R) -> Parser<R> {
        Parser {
            input: input,
            state: State::Start,
            line: 1,
            char_line: 1,
            buf: vec![0; READ_SIZE],
            pos: 0,
            len: 0,
            pushback: None,
        }
    }

    fn fail(&mut self, line: u32, msg: &str) -> HLError {
        self.state = State::Error;
        parse_err(line, msg)
    }

    fn raw_byte(&mut self) -> Result<Option<u8>, HLError> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }
        if self.pos >= self.len {
            self.pos = 0;
            self.len = loop {
                match self.input.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let line = self.line;
                        return Err(self.fail(line,
                                             &format!("I/O error: {}", e)));
                    }
                }
            };
            if self.len == 0 {
                return Ok(None);
            }
        }
        let c = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(c))
    }

    /// Next logical character, with line breaks normalized to `\n` and
    /// escaped line breaks removed.  `char_line` is left holding the
    /// line the returned character sits on.
    fn next_char(&mut self) -> Result<Option<u8>, HLError> {
        loop {
            let mut c = match self.raw_byte()? {
                Some(c) => c,
                None => return Ok(None),
            };
            let mut continuation = false;
            if c == b'\\' {
                match self.raw_byte()? {
                    Some(n) if n == b'\r' || n == b'\n' => {
                        continuation = true;
                        c = n;
                    },
                    Some(n) => self.pushback = Some(n),
                    None => (),
                }
            }
            if c == b'\r' {
                match self.raw_byte()? {
                    Some(b'\n') | None => (),
                    Some(n) => self.pushback = Some(n),
                }
                c = b'\n';
            }
            self.char_line = self.line;
            if c == b'\n' {
                self.line += 1;
            }
            if !continuation {
                return Ok(Some(c));
            }
        }
    }

    fn push(&mut self, buf: &mut TokenBuffer, c: u8, line: u32)
            -> Result<(), HLError> {
        buf.push(c).map_err(|_| self.fail(line, "out of memory"))
    }

    fn emit_section<H: IniHandler>(&mut self, handler: &mut H,
                                   section: &TokenBuffer, line: u32)
                                   -> Result<(), HLError> {
        let name = match section.as_str() {
            Ok(s) => s,
            Err(_) => return Err(self.fail(line, "invalid UTF-8")),
        };
        handler.begin_section(name).map_err(|e| {
            self.state = State::Error;
            e
        })
    }

    fn emit_pair<H: IniHandler>(&mut self, handler: &mut H,
                                key: &TokenBuffer, value: &TokenBuffer,
                                line: u32) -> Result<(), HLError> {
        let (k, v) = match (key.as_str(), value.as_str()) {
            (Ok(k), Ok(v)) => (k, v),
            _ => return Err(self.fail(line, "invalid UTF-8")),
        };
        handler.value_pair(k, v).map_err(|e| {
            self.state = State::Error;
            e
        })
    }

    /// Run the state machine over the whole input.
    pub fn parse<H: IniHandler>(mut self, handler: &mut H)
                                -> Result<(), HLError> {
        let mut section = TokenBuffer::new();
        let mut key = TokenBuffer::new();
        let mut value = TokenBuffer::new();

        self.state = State::Start;
        while let Some(c) = self.next_char()? {
            let line = self.char_line;
            match self.state {
                State::Start => {
                    if is_blank(c) || c == b'\n' {
                    } else if c == b';' {
                        self.state = State::StartComment;
                    } else if c == b'[' {
                        section.clear();
                        self.state = State::SectionHead;
                    } else {
                        return Err(self.fail(line,
                                             "expected section heading"));
                    }
                },
                State::StartComment => {
                    if c == b'\n' {
                        self.state = State::Start;
                    }
                },
                State::Comment => {
                    if c == b'\n' {
                        self.state = State::LineStart;
                    }
                },
                State::LineStart => {
                    if is_blank(c) || c == b'\n' {
                    } else if c == b';' {
                        self.state = State::Comment;
                    } else if c == b'[' {
                        section.clear();
                        self.state = State::SectionHead;
                    } else {
                        key.clear();
                        value.clear();
                        self.push(&mut key, c, line)?;
                        self.state = State::EntryKey;
                    }
                },
                State::SectionHead => {
                    if c == b']' {
                        self.emit_section(handler, &section, line)?;
                        self.state = State::LineEnd;
                    } else if c == b'\n' {
                        return Err(self.fail(line, "expected ']'"));
                    } else {
                        self.push(&mut section, c, line)?;
                    }
                },
                State::LineEnd => {
                    if is_blank(c) {
                    } else if c == b';' {
                        self.state = State::Comment;
                    } else if c == b'\n' {
                        self.state = State::LineStart;
                    } else {
                        return Err(self.fail(line, "expected end of line"));
                    }
                },
                State::EntryKey => {
                    if c == b'=' {
                        key.rstrip();
                        self.state = State::EntrySep;
                    } else if c == b'\n' {
                        return Err(self.fail(line, "expected value with key"));
                    } else {
                        self.push(&mut key, c, line)?;
                    }
                },
                State::EntrySep => {
                    if is_blank(c) {
                    } else if c == b'\'' {
                        self.state = State::SingleQuoted;
                    } else if c == b'"' {
                        self.state = State::DoubleQuoted;
                    } else if c == b'\n' || c == b';' {
                        // "key =" with nothing after it
                        self.emit_pair(handler, &key, &value, line)?;
                        self.state = if c == b';' { State::Comment }
                                     else { State::LineStart };
                    } else {
                        self.push(&mut value, c, line)?;
                        self.state = State::EntryValue;
                    }
                },
                State::EntryValue => {
                    if c == b'\n' || c == b';' {
                        value.rstrip();
                        self.emit_pair(handler, &key, &value, line)?;
                        self.state = if c == b';' { State::Comment }
                                     else { State::LineStart };
                    } else {
                        self.push(&mut value, c, line)?;
                    }
                },
                State::SingleQuoted => {
                    if c == b'\'' {
                        self.emit_pair(handler, &key, &value, line)?;
                        self.state = State::LineEnd;
                    } else if c == b'\n' {
                        return Err(self.fail(line, "expected single quote"));
                    } else {
                        self.push(&mut value, c, line)?;
                    }
                },
                State::DoubleQuoted => {
                    if c == b'"' {
                        self.emit_pair(handler, &key, &value, line)?;
                        self.state = State::LineEnd;
                    } else if c == b'\n' {
                        return Err(self.fail(line, "expected double quote"));
                    } else {
                        self.push(&mut value, c, line)?;
                    }
                },
                State::Eof | State::Error => unreachable!(),
            }
        }

        let line = self.line;
        match self.state {
            State::Start | State::StartComment | State::Comment
                | State::LineStart | State::LineEnd => (),
            State::EntryValue => {
                value.rstrip();
                self.emit_pair(handler, &key, &value, line)?;
            },
            _ => return Err(self.fail(line, "unexpected end of file")),
        }
        self.state = State::Eof;
        Ok(())
    }
}

/// Parse everything readable from `input`, reporting to `handler`.
pub fn parse<R: Read, H: IniHandler>(input: R, handler: &mut H)
                                     -> Result<(), HLError> {
    Parser::new(input).parse(handler)
}

/// Collects every value of one key within one section.  Section and
/// key names are compared ignoring ASCII case; a section that appears
/// more than once is searched each time.
pub struct KeyLookup {
    section: String,
    key: String,
    active: bool,
    pub values: Vec<String>,
}

impl KeyLookup {
    pub fn new(section: &str, key: &str) -> KeyLookup {
        KeyLookup {
            section: String::from(section),
            key: String::from(key),
            active: false,
            values: Vec::new(),
        }
    }
}

impl IniHandler for KeyLookup {
    fn begin_section(&mut self, name: &str) -> Result<(), HLError> {
        self.active = name.eq_ignore_ascii_case(&self.section);
        Ok(())
    }

    fn value_pair(&mut self, key: &str, value: &str) -> Result<(), HLError> {
        if self.active && key.eq_ignore_ascii_case(&self.key) {
            self.values.push(String::from(value));
        }
        Ok(())
    }
}
