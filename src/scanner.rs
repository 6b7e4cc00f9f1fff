//! Single-pass comment scanner.
//!
//! [`scan`] walks a byte buffer once, skipping string and character literals,
//! and hands every enabled comment opener to its matcher. Matchers write the
//! comment body to the sink with the opener stripped, padded so the comment keeps
//! its column, and terminate each output line with `\r\n` (optionally preceded by
//! ` <line number>`).

use std::io::Write;
use std::ops::AddAssign;

use crate::category::CategorySet;
use crate::error::Result;

const LINE_BREAK: &[u8] = b"\r\n";
const TAB_WIDTH: usize = 4;

/// Comments found per category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommentCount {
    pub c: u64,
    /// `//` comments of any dialect, Rust included.
    pub cc: u64,
    pub asm: u64,
    pub python: u64,
    pub rust: u64,
}

impl CommentCount {
    /// Counter for a single category flag; zero for empty or combined sets.
    pub fn for_category(&self, category: CategorySet) -> u64 {
        if category == CategorySet::C {
            self.c
        } else if category == CategorySet::CPP_LINE {
            self.cc
        } else if category == CategorySet::ASM {
            self.asm
        } else if category == CategorySet::PYTHON {
            self.python
        } else if category == CategorySet::RUST {
            self.rust
        } else {
            0
        }
    }
}

impl AddAssign for CommentCount {
    fn add_assign(&mut self, other: Self) {
        self.c += other.c;
        self.cc += other.cc;
        self.asm += other.asm;
        self.python += other.python;
        self.rust += other.rust;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub categories: CategorySet,
    pub line_numbers: bool,
}

/// Scan `src`, writing every enabled comment to `sink`.
///
/// Unterminated literals and comments run to the end of the buffer. The only
/// error is a failed write to `sink`.
pub fn scan<W: Write>(src: &[u8], options: ScanOptions, sink: &mut W) -> Result<CommentCount> {
    Scanner {
        src,
        pos: 0,
        line: 1,
        column: 0,
        options,
        out: sink,
        count: CommentCount::default(),
    }
    .run()
}

/// If the backslash at `pos` starts a run of `\`, `\r` and `\n` bytes that
/// reaches a newline, returns the position just past that newline.
fn continuation_end(src: &[u8], pos: usize) -> Option<usize> {
    if src.get(pos) != Some(&b'\\') {
        return None;
    }
    for (offset, &byte) in src[pos..].iter().enumerate() {
        match byte {
            b'\n' => return Some(pos + offset + 1),
            b'\\' | b'\r' => {}
            _ => return None,
        }
    }
    None
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

struct Scanner<'a, W> {
    src: &'a [u8],
    pos: usize,
    line: u64,
    /// Columns of code since the last newline, used to pad the next comment.
    column: usize,
    options: ScanOptions,
    out: &'a mut W,
    count: CommentCount,
}

impl<W: Write> Scanner<'_, W> {
    fn run(mut self) -> Result<CommentCount> {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'"' | b'\'' => self.quoted(byte)?,
                b'/' if self.peek(1) == Some(b'/') && self.enabled(CategorySet::RUST) => {
                    self.rust_line()?
                }
                b'/' if self.peek(1) == Some(b'/') && self.enabled(CategorySet::CPP_LINE) => {
                    self.cpp_line()?
                }
                b'/' if self.peek(1) == Some(b'*') && self.enabled(CategorySet::RUST) => {
                    self.rust_block()?
                }
                b'/' if self.peek(1) == Some(b'*') && self.enabled(CategorySet::C) => {
                    self.c_block()?
                }
                b';' if self.enabled(CategorySet::ASM) => self.asm_line()?,
                b'#' if self.enabled(CategorySet::PYTHON) => self.python_line()?,
                b'r' | b'b' if self.enabled(CategorySet::RUST) => match self.raw_string_end() {
                    Some(end) => self.skip_to(end),
                    None => self.step(),
                },
                _ => self.step(),
            }
        }
        Ok(self.count)
    }

    fn enabled(&self, category: CategorySet) -> bool {
        self.options.categories.contains(category)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn at(&self, pattern: &[u8]) -> bool {
        self.src[self.pos..].starts_with(pattern)
    }

    /// Length of the line break at the cursor: 1 for `\n`, 2 for `\r\n`.
    fn line_break_len(&self) -> Option<usize> {
        if self.at(b"\n") {
            Some(1)
        } else if self.at(b"\r\n") {
            Some(2)
        } else {
            None
        }
    }

    /// Consume one byte of code, keeping line and column bookkeeping.
    fn step(&mut self) {
        let Some(byte) = self.peek(0) else {
            return;
        };
        self.pos += 1;
        match byte {
            b'\n' => {
                self.line += 1;
                self.column = 0;
            }
            b'\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
    }

    fn quoted(&mut self, quote: u8) -> Result<()> {
        if self.enabled(CategorySet::PYTHON)
            && self.peek(1) == Some(quote)
            && self.peek(2) == Some(quote)
        {
            return self.docstring(quote);
        }
        if quote == b'\'' && self.enabled(CategorySet::RUST) && self.at_lifetime() {
            self.step();
            return Ok(());
        }
        self.skip_literal(quote);
        Ok(())
    }

    /// `'a` or `'label` rather than a character literal such as `'a'`.
    fn at_lifetime(&self) -> bool {
        matches!(self.peek(1), Some(b) if b.is_ascii_alphabetic() || b == b'_')
            && self.peek(2) != Some(b'\'')
    }

    /// End of a Rust raw string (`r"..."`, `br#"..."#`) opening at the cursor.
    /// Unterminated raw strings run to the end of the buffer.
    fn raw_string_end(&self) -> Option<usize> {
        if self.pos > 0 && is_ident_byte(self.src[self.pos - 1]) {
            return None;
        }
        let rest = &self.src[self.pos..];
        let rest = rest.strip_prefix(b"b").unwrap_or(rest);
        let rest = rest.strip_prefix(b"r")?;
        let hashes = rest.iter().take_while(|&&b| b == b'#').count();
        let body = rest[hashes..].strip_prefix(b"\"")?;
        let body_start = self.src.len() - body.len();

        let mut closing = vec![b'"'];
        closing.resize(hashes + 1, b'#');
        let end = body
            .windows(closing.len())
            .position(|window| window == closing.as_slice())
            .map_or(self.src.len(), |offset| body_start + offset + closing.len());
        Some(end)
    }

    fn skip_to(&mut self, end: usize) {
        while self.pos < end {
            self.step();
        }
    }

    fn skip_literal(&mut self, quote: u8) {
        self.step();
        while let Some(byte) = self.peek(0) {
            self.step();
            if byte == b'\\' {
                self.step();
            } else if byte == quote {
                return;
            }
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn emit_range(&mut self, start: usize, end: usize) -> Result<()> {
        let src = self.src;
        self.emit(&src[start..end])
    }

    /// Pad the comment out to the column where it starts in the source.
    fn begin_comment(&mut self) -> Result<()> {
        let pad = std::mem::take(&mut self.column);
        self.emit(&b" ".repeat(pad))
    }

    fn end_output_line(&mut self) -> Result<()> {
        if self.options.line_numbers {
            let annotation = format!(" {}", self.line);
            self.emit(annotation.as_bytes())?;
        }
        self.emit(LINE_BREAK)
    }

    /// A line boundary inside a comment.
    fn break_comment_line(&mut self) -> Result<()> {
        self.end_output_line()?;
        self.line += 1;
        Ok(())
    }

    fn cpp_line(&mut self) -> Result<()> {
        self.count.cc += 1;
        self.begin_comment()?;
        self.pos += 2;
        self.line_body(true)
    }

    fn rust_line(&mut self) -> Result<()> {
        self.count.cc += 1;
        self.count.rust += 1;
        self.begin_comment()?;
        let doc = (self.at(b"///") && !self.at(b"////")) || self.at(b"//!");
        if doc {
            self.pos += 3;
            self.emit(b" ")?;
        } else {
            self.pos += 2;
        }
        self.line_body(true)
    }

    fn asm_line(&mut self) -> Result<()> {
        self.count.asm += 1;
        self.begin_comment()?;
        self.pos += 1;
        self.line_body(false)
    }

    fn python_line(&mut self) -> Result<()> {
        self.count.python += 1;
        self.begin_comment()?;
        self.pos += 1;
        self.line_body(false)
    }

    /// Emit up to the end of the physical line, leaving the newline to the driver.
    fn line_body(&mut self, continuation: bool) -> Result<()> {
        let mut start = self.pos;
        while let Some(byte) = self.peek(0) {
            if self.line_break_len().is_some() {
                break;
            }
            if continuation && byte == b'\\' {
                if let Some(next) = continuation_end(self.src, self.pos) {
                    self.emit_range(start, self.pos)?;
                    self.break_comment_line()?;
                    self.pos = next;
                    start = next;
                    continue;
                }
            }
            self.pos += 1;
        }
        self.emit_range(start, self.pos)?;
        self.end_output_line()
    }

    fn c_block(&mut self) -> Result<()> {
        self.count.c += 1;
        self.begin_comment()?;
        self.pos += 2;
        self.delimited_body(b"*/", None, false)
    }

    fn rust_block(&mut self) -> Result<()> {
        self.count.rust += 1;
        self.begin_comment()?;
        self.pos += 2;
        self.delimited_body(b"*/", Some(b"/*".as_slice()), false)
    }

    fn docstring(&mut self, quote: u8) -> Result<()> {
        self.count.python += 1;
        self.begin_comment()?;
        self.pos += 3;
        self.delimited_body(&[quote; 3], None, true)
    }

    /// Emit until `close` (balanced against `nested_open` when given). With
    /// `escapes`, a backslash protects the byte after it.
    fn delimited_body(
        &mut self,
        close: &[u8],
        nested_open: Option<&[u8]>,
        escapes: bool,
    ) -> Result<()> {
        let mut depth = 1usize;
        let mut start = self.pos;
        while self.pos < self.src.len() {
            if self.at(close) {
                depth -= 1;
                if depth == 0 {
                    self.emit_range(start, self.pos)?;
                    self.pos += close.len();
                    return self.end_output_line();
                }
                self.pos += close.len();
                continue;
            }
            if let Some(open) = nested_open {
                if self.at(open) {
                    depth += 1;
                    self.pos += open.len();
                    continue;
                }
            }
            if let Some(len) = self.line_break_len() {
                self.emit_range(start, self.pos)?;
                self.pos += len;
                self.break_comment_line()?;
                start = self.pos;
                continue;
            }
            if escapes && self.peek(0) == Some(b'\\') {
                if let Some(escaped) = self.peek(1) {
                    if escaped != b'\n' && escaped != b'\r' {
                        self.pos += 2;
                        continue;
                    }
                }
            }
            self.pos += 1;
        }
        self.emit_range(start, self.pos)?;
        self.end_output_line()
    }
}
