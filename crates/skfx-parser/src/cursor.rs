//! Byte-level cursor over effect source text.
//!
//! Only ASCII is significant to the scanner; any other byte is treated as
//! an opaque character, so every span the cursor hands out starts and ends
//! on an ASCII boundary and slicing never splits a UTF-8 sequence.

use std::num::ParseIntError;

use skfx_ir::Span;

pub(crate) struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(crate) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    pub fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    /// Consumes `b` if it is the next byte.
    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips whitespace and comments.
    pub fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Skips a preprocessor line, honoring `\` continuations.
    pub fn skip_directive(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.pos += 2;
                continue;
            }
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Reads an identifier at the current position.
    pub fn ident(&mut self) -> Option<(&'a str, Span)> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        let span = Span::from_range(start, self.pos);
        Some((span.slice(self.src), span))
    }

    /// Reads a decimal integer literal, with an optional `u`/`U` suffix.
    ///
    /// Returns `None` when no digits follow, and `Some(Err(..))` when the
    /// digits do not fit in a `u32`.
    pub fn integer(&mut self) -> Option<Result<u32, ParseIntError>> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        let value = self.src[start..self.pos].parse();
        if matches!(self.peek(), Some(b'u' | b'U')) {
            self.pos += 1;
        }
        Some(value)
    }

    /// Starting at an opening brace, finds the matching closing brace.
    ///
    /// Depth goes up on every `{` and down on every `}`; the scan ends when
    /// it returns to zero. Returns the offset one past the closing brace, or
    /// `None` if the text ends first.
    pub fn match_braces(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Starting at an opening parenthesis, finds the matching `)`.
    pub fn match_parens(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &b) in self.bytes.iter().enumerate().skip(open) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Skips to just past the next `;` outside any brackets, or to the end
    /// of a braced block that is not followed by `;`.
    pub fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let save = self.pos;
                        self.skip_trivia();
                        if !self.eat(b';') {
                            self.pos = save;
                        }
                        return;
                    }
                }
                b';' if depth == 0 => return,
                _ => {}
            }
        }
    }
}

/// Returns `true` if `name` occurs in `text` as a whole identifier.
pub fn contains_identifier(text: &str, name: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(name).any(|(i, _)| {
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + name.len()).copied();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

/// Returns `true` if `text` has a `layout(local_size_*) in;` declaration
/// outside comments and preprocessor lines.
pub fn declares_workgroup_size(text: &str) -> bool {
    let mut c = Cursor::new(text);
    loop {
        c.skip_trivia();
        match c.peek() {
            None => return false,
            Some(b'#') => {
                c.skip_directive();
                continue;
            }
            Some(_) => {}
        }
        match c.ident() {
            Some(("layout", _)) => {
                c.skip_trivia();
                if c.peek() != Some(b'(') {
                    continue;
                }
                let open = c.pos();
                let Some(close) = c.match_parens(open) else {
                    return false;
                };
                let qualifiers = &text[open + 1..close - 1];
                c.set_pos(close);
                c.skip_trivia();
                let is_input = matches!(c.ident(), Some(("in", _)));
                if is_input
                    && ["local_size_x", "local_size_y", "local_size_z"]
                        .iter()
                        .any(|name| contains_identifier(qualifiers, name))
                {
                    return true;
                }
            }
            Some(_) => {}
            None => c.bump(),
        }
    }
}
