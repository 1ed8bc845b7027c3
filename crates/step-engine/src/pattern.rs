//! Step pattern compilation
//!
//! Patterns are written in a cucumber-expression dialect:
//!
//! - `{string}` a double-quoted string, captured without the quotes
//! - `{int}` a signed integer
//! - `{float}` a signed decimal number
//! - `{word}` a run of non-whitespace characters
//! - `(s)` optional literal text
//! - `{{` / `}}` literal braces, `\x` a literal `x`
//!
//! Every pattern compiles to an anchored regular expression with one capture
//! group per placeholder, so capture positions line up with the typed slots.

use crate::error::{Result, StepError};
use regex::Regex;
use std::iter::Peekable;
use std::str::CharIndices;

/// Type of a placeholder slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Float,
    Word,
}

impl ParamKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamKind::String),
            "int" => Some(ParamKind::Int),
            "float" => Some(ParamKind::Float),
            "word" => Some(ParamKind::Word),
            _ => None,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            ParamKind::String => r#""([^"]*)""#,
            ParamKind::Int => r"(-?\d+)",
            ParamKind::Float => r"(-?(?:\d+(?:\.\d*)?|\.\d+))",
            ParamKind::Word => r"(\S+)",
        }
    }

    fn parse(self, raw: &str) -> Result<Arg> {
        match self {
            ParamKind::String | ParamKind::Word => Ok(Arg::Str(raw.to_string())),
            ParamKind::Int => raw
                .parse()
                .map(Arg::Int)
                .map_err(|err: std::num::ParseIntError| StepError::InvalidArgument {
                    value: raw.to_string(),
                    reason: err.to_string(),
                }),
            ParamKind::Float => raw
                .parse()
                .map(Arg::Float)
                .map_err(|err: std::num::ParseFloatError| StepError::InvalidArgument {
                    value: raw.to_string(),
                    reason: err.to_string(),
                }),
        }
    }
}

/// A typed value extracted from step text
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Optional(String),
    Placeholder(ParamKind),
}

#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    regex: Regex,
    slots: Vec<ParamKind>,
}

impl StepPattern {
    /// Compile `source`, rejecting unknown placeholders and unbalanced
    /// braces or parentheses.
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = lex(source)?;
        let mut regex = String::with_capacity(source.len() * 2 + 2);
        let mut slots = Vec::new();
        regex.push('^');
        for token in tokens {
            match token {
                Token::Literal(text) => regex.push_str(&regex::escape(&text)),
                Token::Optional(text) => {
                    regex.push_str("(?:");
                    regex.push_str(&regex::escape(&text));
                    regex.push_str(")?");
                }
                Token::Placeholder(kind) => {
                    regex.push_str(kind.regex());
                    slots.push(kind);
                }
            }
        }
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|err| invalid(source, err.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            regex,
            slots,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn slots(&self) -> &[ParamKind] {
        &self.slots
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Typed arguments when `text` matches, `None` otherwise
    pub fn extract(&self, text: &str) -> Option<Result<Vec<Arg>>> {
        let captures = self.regex.captures(text)?;
        let args = self
            .slots
            .iter()
            .zip(captures.iter().skip(1))
            .map(|(kind, capture)| kind.parse(capture.map_or("", |m| m.as_str())))
            .collect();
        Some(args)
    }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> StepError {
    StepError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => literal.push(escaped),
                None => literal.push('\\'),
            },
            '{' if next_is(&mut chars, '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if next_is(&mut chars, '}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                flush(&mut literal, &mut tokens);
                let name = take_until(&mut chars, '}')
                    .ok_or_else(|| invalid(source, format!("missing closing '}}' for placeholder at byte {index}")))?;
                let kind = ParamKind::from_name(&name)
                    .ok_or_else(|| invalid(source, format!("unknown placeholder type `{name}`")))?;
                tokens.push(Token::Placeholder(kind));
            }
            '}' => return Err(invalid(source, format!("unmatched '}}' at byte {index}"))),
            '(' => {
                flush(&mut literal, &mut tokens);
                let text = take_until(&mut chars, ')')
                    .ok_or_else(|| invalid(source, format!("missing closing ')' for optional text at byte {index}")))?;
                if text.is_empty() || text.contains(['(', '{', '}']) {
                    return Err(invalid(source, format!("invalid optional text `({text})`")));
                }
                tokens.push(Token::Optional(text));
            }
            ')' => return Err(invalid(source, format!("unmatched ')' at byte {index}"))),
            other => literal.push(other),
        }
    }

    flush(&mut literal, &mut tokens);
    Ok(tokens)
}

fn next_is(chars: &mut Peekable<CharIndices<'_>>, expected: char) -> bool {
    chars.peek().is_some_and(|&(_, c)| c == expected)
}

fn take_until(chars: &mut Peekable<CharIndices<'_>>, end: char) -> Option<String> {
    let mut text = String::new();
    for (_, c) in chars.by_ref() {
        if c == end {
            return Some(text);
        }
        text.push(c);
    }
    None
}

fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}
