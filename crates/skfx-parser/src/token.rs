//! Token extraction.
//!
//! The tokenizer walks the top level of a pass body left to right and pulls
//! out the declarations the rest of the pipeline rewrites: vertex
//! attributes, qualified members (`uniform`/`extern`/`buffer`/`stage`),
//! structs and methods. Method bodies are delimited by brace depth.
//! Fragment colour outputs (`SK_COLOR0`..`SK_COLOR7`) are found by a
//! separate scan over arbitrary text.
//!
//! Anything the tokenizer does not recognise (`const` globals, `#define`,
//! `layout(...) in;`, prototypes) is left in place and passed through to
//! the generated stages untouched.

use skfx_ir::{ArraySize, Span, StageKind};

use crate::ParseError;
use crate::cursor::{Cursor, is_ident_char};

/// `attrib Type Name;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttribToken<'a> {
    pub ty: &'a str,
    pub name: &'a str,
    pub span: Span,
}

/// `Qualifier Type Name;` or `Qualifier Type Name[N];`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternToken<'a> {
    /// The qualifier word exactly as written (`uniform`, `extern`, ...).
    pub qualifier: &'a str,
    /// `readonly buffer ...`.
    pub read_only: bool,
    pub ty: &'a str,
    /// Base name without the array suffix.
    pub name: &'a str,
    /// Name including the array suffix, if any.
    pub identifier: &'a str,
    pub array: Option<ArraySize>,
    pub span: Span,
}

/// `struct Name { ... };`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructToken<'a> {
    pub name: &'a str,
    pub members: Vec<MemberToken<'a>>,
    pub span: Span,
}

/// One `Type name[N];` line inside a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberToken<'a> {
    pub ty: &'a str,
    pub name: &'a str,
    pub array: Option<ArraySize>,
}

/// A function definition; entry methods carry their stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodToken<'a> {
    pub return_type: &'a str,
    pub name: &'a str,
    /// Text between the parentheses.
    pub params: &'a str,
    pub stage: Option<StageKind>,
    /// Return type through the matching closing brace.
    pub span: Span,
    /// Opening through closing brace.
    pub body: Span,
}

impl<'a> MethodToken<'a> {
    /// Full method text, from the return type to the closing brace.
    pub fn text(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }
}

/// `SK_COLORn` inside a method body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputToken {
    pub index: u8,
    pub span: Span,
}

/// Every token of one pass body, each list in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenStream<'a> {
    pub attribs: Vec<AttribToken<'a>>,
    pub externs: Vec<ExternToken<'a>>,
    pub structs: Vec<StructToken<'a>>,
    pub methods: Vec<MethodToken<'a>>,
    pub outputs: Vec<OutputToken>,
}

const OUTPUT_PREFIX: &str = "SK_COLOR";

/// Statements with three words that are not member declarations.
const PASSTHROUGH_KEYWORDS: &[&str] = &["precision", "const"];

/// Tokenize one pass body.
pub fn tokenize(source: &str) -> Result<TokenStream<'_>, ParseError> {
    let mut tokenizer = Tokenizer {
        cursor: Cursor::new(source),
        stream: TokenStream::default(),
    };
    tokenizer.run()?;
    let mut stream = tokenizer.stream;
    for method in &stream.methods {
        stream
            .outputs
            .extend(scan_outputs(method.body.slice(source), method.body.start));
    }
    Ok(stream)
}

/// Finds every `SK_COLOR0`..`SK_COLOR7` in `text`. Spans are shifted by
/// `base` so they index into the text `text` was cut from.
pub fn scan_outputs(text: &str, base: usize) -> Vec<OutputToken> {
    let bytes = text.as_bytes();
    let mut outputs = Vec::new();
    for (i, _) in text.match_indices(OUTPUT_PREFIX) {
        if i > 0 && is_ident_char(bytes[i - 1]) {
            continue;
        }
        let digit_at = i + OUTPUT_PREFIX.len();
        let Some(&digit) = bytes.get(digit_at) else {
            continue;
        };
        if !(b'0'..=b'7').contains(&digit) {
            continue;
        }
        if bytes.get(digit_at + 1).is_some_and(|&b| is_ident_char(b)) {
            continue;
        }
        outputs.push(OutputToken {
            index: digit - b'0',
            span: Span::new(base + i, OUTPUT_PREFIX.len() + 1),
        });
    }
    outputs
}

fn is_member_form(words: &[(&str, Span)]) -> bool {
    match words {
        [("readonly", _), ("buffer", _), _, _] => true,
        [(qualifier, _), _, _] => !PASSTHROUGH_KEYWORDS.contains(qualifier),
        _ => false,
    }
}

struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    stream: TokenStream<'a>,
}

/// What ended a run of words at the top level.
enum Terminator {
    Semicolon,
    OpenParen,
    Other,
}

impl<'a> Tokenizer<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            self.cursor.skip_trivia();
            let Some(b) = self.cursor.peek() else {
                return Ok(());
            };
            match b {
                b'#' => self.cursor.skip_directive(),
                b';' => self.cursor.bump(),
                b if b.is_ascii_alphabetic() || b == b'_' => self.item()?,
                _ => {
                    return Err(ParseError::Syntax {
                        offset: self.cursor.pos(),
                        message: format!("unexpected character '{}'", char::from(b)),
                    });
                }
            }
        }
    }

    /// Scans one top-level item starting at an identifier.
    fn item(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.pos();
        let mut words: Vec<(&'a str, Span)> = Vec::new();
        let mut array: Option<(ArraySize, usize)> = None;
        let mut bad_array = None;

        let terminator = loop {
            self.cursor.skip_trivia();
            if let Some(word) = self.cursor.ident() {
                if words.len() == 1 && words[0].0 == "struct" {
                    return self.structure(start, word.0);
                }
                words.push(word);
                continue;
            }
            match self.cursor.peek() {
                Some(b'[') if !words.is_empty() && array.is_none() => {
                    match self.array_suffix() {
                        Ok(suffix) => array = Some(suffix),
                        Err(err) => {
                            bad_array = Some(err);
                            break Terminator::Other;
                        }
                    }
                }
                Some(b';') => break Terminator::Semicolon,
                Some(b'(') => break Terminator::OpenParen,
                _ => break Terminator::Other,
            }
        };

        match terminator {
            Terminator::Semicolon => {
                self.cursor.bump();
                let span = Span::from_range(start, self.cursor.pos());
                self.declaration(&words, array, span);
                Ok(())
            }
            Terminator::OpenParen if words.len() == 2 && array.is_none() => {
                self.method(start, words[0].0, words[1].0)
            }
            _ => match bad_array {
                // A malformed length on something shaped like a member is an
                // error; on anything else the statement is plain GLSL.
                Some(err) if is_member_form(&words) => Err(err),
                _ => {
                    self.cursor.set_pos(start);
                    self.cursor.skip_statement();
                    Ok(())
                }
            },
        }
    }

    /// `[N]` or `[]` after a declared name. Returns the size and the offset
    /// just past the closing bracket.
    fn array_suffix(&mut self) -> Result<(ArraySize, usize), ParseError> {
        let open = self.cursor.pos();
        self.cursor.bump();
        self.cursor.skip_trivia();
        let size = match self.cursor.integer() {
            Some(Ok(0)) => {
                return Err(ParseError::Syntax {
                    offset: open,
                    message: "array length must be positive".into(),
                });
            }
            Some(Ok(n)) => ArraySize::Constant(n),
            Some(Err(_)) => {
                return Err(ParseError::Syntax {
                    offset: open,
                    message: "array length out of range".into(),
                });
            }
            None => ArraySize::Runtime,
        };
        self.cursor.skip_trivia();
        if !self.cursor.eat(b']') {
            return Err(ParseError::Syntax {
                offset: open,
                message: "array length must be an integer literal".into(),
            });
        }
        Ok((size, self.cursor.pos()))
    }

    /// Classifies a `;`-terminated run of words.
    fn declaration(
        &mut self,
        words: &[(&'a str, Span)],
        array: Option<(ArraySize, usize)>,
        span: Span,
    ) {
        let source = self.cursor.src();
        let identifier = |name: Span| match array {
            Some((_, end)) => Span::from_range(name.start, end).slice(source),
            None => name.slice(source),
        };
        match words {
            [("attrib", _), (ty, _), (name, _)] if array.is_none() => {
                self.stream.attribs.push(AttribToken {
                    ty: *ty,
                    name: *name,
                    span,
                });
            }
            [("readonly", _), ("buffer", _), (ty, _), (name, name_span)] => {
                self.stream.externs.push(ExternToken {
                    qualifier: "buffer",
                    read_only: true,
                    ty: *ty,
                    name: *name,
                    identifier: identifier(*name_span),
                    array: array.map(|(size, _)| size),
                    span,
                });
            }
            [(qualifier, _), (ty, _), (name, name_span)]
                if !PASSTHROUGH_KEYWORDS.contains(qualifier) =>
            {
                self.stream.externs.push(ExternToken {
                    qualifier: *qualifier,
                    read_only: false,
                    ty: *ty,
                    name: *name,
                    identifier: identifier(*name_span),
                    array: array.map(|(size, _)| size),
                    span,
                });
            }
            _ => log::trace!("passing through top-level statement at {}", span.start),
        }
    }

    /// `struct Name { members };`, with the cursor just past `Name`.
    fn structure(&mut self, start: usize, name: &'a str) -> Result<(), ParseError> {
        self.cursor.skip_trivia();
        let open = self.cursor.pos();
        if !self.cursor.eat(b'{') {
            return Err(ParseError::Syntax {
                offset: open,
                message: format!("expected '{{' after struct {name}"),
            });
        }
        let Some(end) = self.cursor.match_braces(open) else {
            return Err(ParseError::Syntax {
                offset: start,
                message: format!("struct {name} is never closed"),
            });
        };
        let members = self.struct_members(open + 1, end - 1)?;
        self.cursor.set_pos(end);
        self.cursor.skip_trivia();
        self.cursor.eat(b';');
        self.stream.structs.push(StructToken {
            name,
            members,
            span: Span::from_range(start, self.cursor.pos()),
        });
        Ok(())
    }

    fn struct_members(&mut self, from: usize, to: usize) -> Result<Vec<MemberToken<'a>>, ParseError> {
        let mut members = Vec::new();
        self.cursor.set_pos(from);
        loop {
            self.cursor.skip_trivia();
            if self.cursor.pos() >= to {
                return Ok(members);
            }
            let line_start = self.cursor.pos();
            let mut words = Vec::new();
            while let Some((word, _)) = self.cursor.ident() {
                words.push(word);
                self.cursor.skip_trivia();
            }
            let mut array = None;
            if self.cursor.peek() == Some(b'[') {
                array = Some(self.array_suffix()?.0);
                self.cursor.skip_trivia();
            }
            if words.len() < 2 || !self.cursor.eat(b';') {
                return Err(ParseError::Syntax {
                    offset: line_start,
                    message: "expected 'Type name;' inside struct".into(),
                });
            }
            members.push(MemberToken {
                ty: words[words.len() - 2],
                name: words[words.len() - 1],
                array,
            });
        }
    }

    /// `Return name(params) { body }`, with the cursor on the `(`.
    fn method(&mut self, start: usize, return_type: &'a str, name: &'a str) -> Result<(), ParseError> {
        let source = self.cursor.src();
        let open_paren = self.cursor.pos();
        let Some(close_paren) = self.cursor.match_parens(open_paren) else {
            return Err(ParseError::Syntax {
                offset: open_paren,
                message: format!("parameter list of '{name}' is never closed"),
            });
        };
        let params = Span::from_range(open_paren + 1, close_paren - 1).slice(source);
        self.cursor.set_pos(close_paren);
        self.cursor.skip_trivia();

        if self.cursor.eat(b';') {
            // Prototype; stays in the generated code as is.
            return Ok(());
        }
        let open = self.cursor.pos();
        if self.cursor.peek() != Some(b'{') {
            return Err(ParseError::Syntax {
                offset: open,
                message: format!("expected '{{' to start the body of '{name}'"),
            });
        }
        let Some(end) = self.cursor.match_braces(open) else {
            return Err(ParseError::InvalidMethodSyntax {
                name: name.to_string(),
                offset: start,
            });
        };
        self.cursor.set_pos(end);

        let stage = StageKind::from_entry_name(name);
        self.stream.methods.push(MethodToken {
            return_type,
            name,
            params,
            stage,
            span: Span::from_range(start, end),
            body: Span::from_range(open, end),
        });
        Ok(())
    }
}
