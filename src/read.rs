// Copyright 2014 Nick Fitzgerald
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parsing source text into `Value`s, in the scratch arena.
//!
//! Quote, backquote, and comma all desugar at read time into ordinary
//! two-element lists (`'x` -> `(quote x)`, `` `x `` -> `(backquote x)`,
//! `,x` -> `(comma x)`), so the evaluator never has to know about reader
//! syntax at all — only about the `quote`/`backquote` primitives and
//! `backquote`'s own recognition of `(comma _)` subforms.

use std::iter::Peekable;
use std::str::Chars;

use crate::context::Context;
use crate::error::ReadError;
use crate::value::Value;

/// Tokens (symbols, numbers, strings) longer than this are a read error
/// rather than an unbounded scratch-arena allocation.
const MAX_TOKEN_LEN: usize = 500;

/// List literals with more elements than this are a read error, for the
/// same reason.
const MAX_LIST_LEN: usize = 1024;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == ';' || c == '(' || c == ')' || c == '"'
}

fn is_symbol_initial(c: char) -> bool {
    c.is_alphabetic() || is_symbol_special_initial(c) || c == '+' || c == '-'
}

fn is_symbol_special_initial(c: char) -> bool {
    matches!(
        c,
        '!' | '$' | '%' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '~' | '_' | '^'
    )
}

fn is_symbol_subsequent(c: char) -> bool {
    is_symbol_initial(c) || c.is_ascii_digit() || c == '.'
}

/// A recursive-descent reader over one source string. Reads forms lazily,
/// one at a time, so a caller can evaluate (and reset the scratch arena
/// after) each form before the next one is even parsed — see `read_all`'s
/// doc comment for why holding every form in memory across a reset is
/// unsound.
pub struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Reader<'a> {
        Reader {
            chars: src.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Skip whitespace and `;`-to-end-of-line comments.
    fn skip_atmosphere(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(';') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Read one top-level form, or `None` at end of input.
    pub fn read_value(&mut self, ctx: &mut Context) -> Result<Option<Value>, ReadError> {
        self.skip_atmosphere();
        match self.peek() {
            None => Ok(None),
            Some('(') => self.read_list(ctx).map(Some),
            Some(')') => Err(ReadError::UnexpectedCloseParen),
            Some('"') => self.read_string(ctx).map(Some),
            Some('\'') => {
                self.advance();
                self.read_wrapped(ctx, "quote")
            }
            Some('`') => {
                self.advance();
                self.read_wrapped(ctx, "backquote")
            }
            Some(',') => {
                self.advance();
                self.read_wrapped(ctx, "comma")
            }
            Some(_) => self.read_atom_or_number(ctx).map(Some),
        }
    }

    /// Read `'<form>'`/`` `<form>` ``/`,<form>` as `(name <form>)`.
    fn read_wrapped(&mut self, ctx: &mut Context, name: &str) -> Result<Option<Value>, ReadError> {
        let inner = self.read_value(ctx)?.ok_or(ReadError::UnexpectedEof)?;
        let name_atom = ctx.make_scratch_atom(name);
        let tail = ctx.scratch_cons(inner, Value::Nil);
        Ok(Some(ctx.scratch_cons(name_atom, tail)))
    }

    fn read_list(&mut self, ctx: &mut Context) -> Result<Value, ReadError> {
        self.advance(); // consume '('
        let mut elems = Vec::new();
        let mut tail = Value::Nil;
        loop {
            self.skip_atmosphere();
            match self.peek() {
                None => return Err(ReadError::UnexpectedEof),
                Some(')') => {
                    self.advance();
                    break;
                }
                Some('.') if self.is_dot_delimiter() => {
                    self.advance();
                    tail = self.read_value(ctx)?.ok_or(ReadError::UnexpectedEof)?;
                    self.skip_atmosphere();
                    match self.advance() {
                        Some(')') => break,
                        _ => return Err(ReadError::MalformedDottedPair),
                    }
                }
                Some(_) => {
                    if elems.len() >= MAX_LIST_LEN {
                        return Err(ReadError::ListTooLong { max: MAX_LIST_LEN });
                    }
                    let v = self.read_value(ctx)?.ok_or(ReadError::UnexpectedEof)?;
                    elems.push(v);
                }
            }
        }
        let mut list = tail;
        for v in elems.into_iter().rev() {
            list = ctx.scratch_cons(v, list);
        }
        Ok(list)
    }

    /// `.` only introduces a dotted tail when it stands alone as a token
    /// (followed by whitespace or a delimiter); `.5` and `foo.bar` are
    /// not dotted-pair syntax.
    fn is_dot_delimiter(&mut self) -> bool {
        let mut clone = self.chars.clone();
        clone.next(); // the '.' itself
        match clone.peek() {
            None => true,
            Some(c) => c.is_whitespace() || is_delimiter(*c),
        }
    }

    fn read_string(&mut self, ctx: &mut Context) -> Result<Value, ReadError> {
        self.advance(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(ReadError::UnterminatedString),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => return Err(ReadError::UnterminatedString),
                },
                Some(c) => s.push(c),
            }
            if s.len() > MAX_TOKEN_LEN {
                return Err(ReadError::TokenTooLong { max: MAX_TOKEN_LEN });
            }
        }
        Ok(ctx.make_scratch_string(&s))
    }

    fn read_token(&mut self) -> Result<String, ReadError> {
        let mut tok = String::new();
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            tok.push(c);
            self.advance();
            if tok.len() > MAX_TOKEN_LEN {
                return Err(ReadError::TokenTooLong { max: MAX_TOKEN_LEN });
            }
        }
        Ok(tok)
    }

    fn read_atom_or_number(&mut self, ctx: &mut Context) -> Result<Value, ReadError> {
        let tok = self.read_token()?;
        if tok.is_empty() {
            return Err(ReadError::UnexpectedEof);
        }
        if looks_numeric(&tok) {
            match tok.parse::<f64>() {
                Ok(n) => return Ok(Value::Number(n)),
                Err(_) => return Err(ReadError::MalformedNumber(tok)),
            }
        }
        if !tok.chars().next().map(is_symbol_initial).unwrap_or(false)
            || !tok.chars().all(is_symbol_subsequent)
        {
            return Err(ReadError::MalformedNumber(tok));
        }
        Ok(ctx.make_scratch_atom(&tok))
    }
}

fn looks_numeric(tok: &str) -> bool {
    let bytes = tok.as_bytes();
    let start = if bytes[0] == b'+' || bytes[0] == b'-' { 1 } else { 0 };
    start < bytes.len() && bytes[start..].iter().any(u8::is_ascii_digit)
        && bytes[start..]
            .iter()
            .all(|b| b.is_ascii_digit() || *b == b'.')
}

/// Read a single top-level form from `src`. Returns `Ok(None)` if `src`
/// is empty or contains only whitespace/comments.
pub fn read_one(ctx: &mut Context, src: &str) -> Result<Option<Value>, ReadError> {
    let mut reader = Reader::new(src);
    reader.read_value(ctx)
}

/// Read every top-level form in `src`, in order, into one `Vec`. All of
/// the returned values live in the scratch arena from the single read
/// pass that produced them; do not reset the scratch arena until every
/// form in the `Vec` has been evaluated, or the remaining ones become
/// stale indices. Driving evaluation off of `Reader` directly (as
/// `run_file` does) and resetting between forms avoids this trap.
pub fn read_all(ctx: &mut Context, src: &str) -> Result<Vec<Value>, ReadError> {
    let mut reader = Reader::new(src);
    let mut forms = Vec::new();
    while let Some(v) = reader.read_value(ctx)? {
        forms.push(v);
    }
    Ok(forms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::environment::list_to_vec;

    #[test]
    fn reads_a_number() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "42").unwrap().unwrap();
        assert_eq!(v.as_number(), Some(42.0));
    }

    #[test]
    fn reads_a_negative_number() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "-3.5").unwrap().unwrap();
        assert_eq!(v.as_number(), Some(-3.5));
    }

    #[test]
    fn reads_an_atom() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "foo?").unwrap().unwrap();
        assert_eq!(v.as_atom_name(&ctx), Some("foo?"));
    }

    #[test]
    fn reads_a_list() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "(1 2 3)").unwrap().unwrap();
        let items = list_to_vec(&ctx, v);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn reads_a_dotted_pair() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "(1 . 2)").unwrap().unwrap();
        match v {
            Value::Cons(ptr) => {
                let cell = ctx.resolve_cons(ptr);
                assert_eq!(cell.car.as_number(), Some(1.0));
                assert_eq!(cell.cdr.as_number(), Some(2.0));
            }
            _ => panic!("expected a cons"),
        }
    }

    #[test]
    fn quote_desugars_to_quote_form() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "'x").unwrap().unwrap();
        let items = list_to_vec(&ctx, v);
        assert_eq!(items[0].as_atom_name(&ctx), Some("quote"));
        assert_eq!(items[1].as_atom_name(&ctx), Some("x"));
    }

    #[test]
    fn comma_desugars_inside_backquote() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "`(1 ,x)").unwrap().unwrap();
        let items = list_to_vec(&ctx, v);
        assert_eq!(items[0].as_atom_name(&ctx), Some("backquote"));
    }

    #[test]
    fn skips_line_comments() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "; a comment\n42").unwrap().unwrap();
        assert_eq!(v.as_number(), Some(42.0));
    }

    #[test]
    fn reads_a_string_with_escapes() {
        let mut ctx = Context::new();
        let v = read_one(&mut ctx, "\"a\\\"b\"").unwrap().unwrap();
        match v {
            Value::Str(ptr) => assert_eq!(ctx.resolve_string(ptr), "a\"b"),
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn empty_input_reads_nothing() {
        let mut ctx = Context::new();
        assert!(read_one(&mut ctx, "   ").unwrap().is_none());
    }

    #[test]
    fn read_all_collects_multiple_forms() {
        let mut ctx = Context::new();
        let forms = read_all(&mut ctx, "1 2 3").unwrap();
        assert_eq!(forms.len(), 3);
    }
}
