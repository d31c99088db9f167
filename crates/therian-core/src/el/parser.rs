//! Property path parser
//!
//! Accepts dotted and bracketed paths such as `address.lines[0]` or
//! `attributes['home page'].url`.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::PathSegment;
use crate::value::Value;
use crate::{Error, Result};
use std::iter::Peekable;
use std::str::CharIndices;

/// Parse a path expression into its segments
pub fn parse_path(expression: &str) -> Result<Vec<PathSegment>> {
    PathParser::new(expression).parse()
}

struct PathParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Expression {
            expression: self.input.to_string(),
            message: message.into(),
        }
    }

    fn parse(mut self) -> Result<Vec<PathSegment>> {
        let mut segments = Vec::new();
        if self.input.trim().is_empty() {
            return Err(self.error("empty path"));
        }

        match self.chars.peek() {
            Some((_, '[')) => {}
            _ => segments.push(PathSegment::Property(self.identifier()?)),
        }

        while let Some((pos, c)) = self.chars.next() {
            match c {
                '.' => segments.push(PathSegment::Property(self.identifier()?)),
                '[' => {
                    segments.push(self.bracket()?);
                    self.expect(']')?;
                }
                other => {
                    return Err(self.error(format!("unexpected '{}' at offset {}", other, pos)));
                }
            }
        }
        Ok(segments)
    }

    fn identifier(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || *c == '_' || *c == '$' {
                ident.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected a property name"));
        }
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(format!("property name '{}' starts with a digit", ident)));
        }
        Ok(ident)
    }

    fn bracket(&mut self) -> Result<PathSegment> {
        match self.chars.peek() {
            Some((_, quote @ ('\'' | '"'))) => {
                let quote = *quote;
                self.chars.next();
                let mut key = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, '\\')) => match self.chars.next() {
                            Some((_, escaped)) => key.push(escaped),
                            None => return Err(self.error("unterminated escape")),
                        },
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => key.push(c),
                        None => return Err(self.error("unterminated string key")),
                    }
                }
                Ok(PathSegment::Key(Value::string(key)))
            }
            Some((_, c)) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some((_, c)) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(*c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                digits
                    .parse::<usize>()
                    .map(PathSegment::Index)
                    .map_err(|e| self.error(format!("invalid index '{}': {}", digits, e)))
            }
            _ => Err(self.error("expected an index or a quoted key")),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(self.error(format!(
                "expected '{}' at offset {}, found '{}'",
                expected, pos, c
            ))),
            None => Err(self.error(format!("expected '{}' at end of input", expected))),
        }
    }
}
