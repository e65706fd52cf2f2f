//! Effect source parser for skfx.
//!
//! Splits an effect document into passes, tokenizes each pass body with a
//! hand-written scanner and lowers the tokens into an
//! [`skfx_ir::EffectDocument`].
//!
//! A document either consists only of `pass Name { ... }` blocks, or has no
//! pass blocks at all, in which case the whole text is one pass named
//! [`DEFAULT_PASS_NAME`].

mod cursor;
mod lower;
mod token;

use std::collections::HashSet;

use skfx_ir::{EffectDocument, Span};

use crate::cursor::Cursor;

pub use cursor::{contains_identifier, declares_workgroup_size};
pub use token::{
    AttribToken, ExternToken, MemberToken, MethodToken, OutputToken, StructToken, TokenStream,
    scan_outputs, tokenize,
};

/// Name given to the pass of a document without `pass` blocks.
pub const DEFAULT_PASS_NAME: &str = "Main";

/// Parse an effect document into its passes.
pub fn parse(name: &str, source: &str) -> Result<EffectDocument, ParseError> {
    let mut passes = Vec::new();
    for (pass_name, body) in split_passes(source)? {
        let text = body.slice(source);
        let tokens = tokenize(text).map_err(|e| e.offset_by(body.start))?;
        log::debug!(
            "pass '{pass_name}': {} attrib(s), {} member(s), {} struct(s), {} method(s)",
            tokens.attribs.len(),
            tokens.externs.len(),
            tokens.structs.len(),
            tokens.methods.len()
        );
        passes.push(lower::lower_pass(pass_name, text, &tokens));
    }
    Ok(EffectDocument {
        name: name.to_string(),
        passes,
    })
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// A method body's braces never balance before the end of the source.
    #[error("method '{name}' at byte {offset} has unbalanced braces")]
    InvalidMethodSyntax { name: String, offset: usize },
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("duplicate pass '{0}'")]
    DuplicatePass(String),
}

impl ParseError {
    /// Byte offset of the error within the text it was reported for.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Self::InvalidMethodSyntax { offset, .. } | Self::Syntax { offset, .. } => Some(offset),
            Self::DuplicatePass(_) => None,
        }
    }

    /// Shifts the reported offset by `base`, turning a pass-relative error
    /// into a document-relative one.
    fn offset_by(self, base: usize) -> Self {
        match self {
            Self::InvalidMethodSyntax { name, offset } => Self::InvalidMethodSyntax {
                name,
                offset: offset + base,
            },
            Self::Syntax { offset, message } => Self::Syntax {
                offset: offset + base,
                message,
            },
            other => other,
        }
    }
}

/// Converts a byte offset into a 1-based `(line, column)` pair.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = offset - before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1) + 1;
    (line, column)
}

/// Finds the `pass Name { ... }` blocks of a document. Each returned span
/// covers the text between the braces.
fn split_passes(source: &str) -> Result<Vec<(&str, Span)>, ParseError> {
    let mut cursor = Cursor::new(source);
    let mut passes = Vec::new();
    let mut seen = HashSet::new();

    loop {
        cursor.skip_trivia();
        if cursor.is_eof() {
            break;
        }
        let start = cursor.pos();
        let Some(name) = pass_header(&mut cursor) else {
            if passes.is_empty() {
                return Ok(vec![(DEFAULT_PASS_NAME, Span::new(0, source.len()))]);
            }
            return Err(ParseError::Syntax {
                offset: start,
                message: "only pass blocks may appear next to other pass blocks".into(),
            });
        };
        let open = cursor.pos();
        let Some(end) = cursor.match_braces(open) else {
            return Err(ParseError::Syntax {
                offset: start,
                message: format!("pass {name} is never closed"),
            });
        };
        if !seen.insert(name) {
            return Err(ParseError::DuplicatePass(name.to_string()));
        }
        passes.push((name, Span::from_range(open + 1, end - 1)));
        cursor.set_pos(end);
    }

    if passes.is_empty() {
        passes.push((DEFAULT_PASS_NAME, Span::new(0, source.len())));
    }
    Ok(passes)
}

/// Reads `pass Name` and leaves the cursor on the `{`.
fn pass_header<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    let save = cursor.pos();
    let header = (|| {
        let (keyword, _) = cursor.ident()?;
        if keyword != "pass" {
            return None;
        }
        cursor.skip_trivia();
        let (name, _) = cursor.ident()?;
        cursor.skip_trivia();
        (cursor.peek() == Some(b'{')).then_some(name)
    })();
    if header.is_none() {
        cursor.set_pos(save);
    }
    header
}
