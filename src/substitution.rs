//! Variable substitution: the first stage of line processing.
//!
//! The raw line is split into quote-aware regions, `$name` references are
//! replaced with their values, and the regions are joined back together with
//! their original quotes. Quote removal and word splitting happen later, in
//! the parser.

use crate::env::Environment;
use crate::error::SubstitutionError;

/// A region of the raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Unquoted text without `$`, `'` or `"`.
    PlainText(String),
    /// Contents of `'...'`; never substituted.
    SingleQuoted(String),
    /// Contents of `"..."`; only `PlainText` and `VariableRef` appear inside.
    DoubleQuoted(Vec<Token>),
    /// `$name`, holding just the name.
    VariableRef(String),
}

impl Token {
    /// Serialize the token, replacing variable references with their values.
    fn expand(&self, env: &Environment, out: &mut String) {
        match self {
            Token::PlainText(text) => out.push_str(text),
            Token::SingleQuoted(text) => {
                out.push('\'');
                out.push_str(text);
                out.push('\'');
            }
            Token::DoubleQuoted(inner) => {
                out.push('"');
                for token in inner {
                    token.expand(env, out);
                }
                out.push('"');
            }
            Token::VariableRef(name) => out.push_str(&env.get(name)),
        }
    }
}

pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

struct Scanner {
    input: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Scanner {
            input: line.chars().collect(),
            pos: 0,
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    /// 1-based column of the character at `pos`.
    fn column(pos: usize) -> usize {
        pos + 1
    }

    fn scan(mut self) -> Result<Vec<Token>, SubstitutionError> {
        let mut out = Vec::new();
        while let Some(ch) = self.peek_char() {
            let token = match ch {
                '\'' => self.single_quoted()?,
                '"' => self.double_quoted()?,
                '$' => self.variable()?,
                _ => Token::PlainText(self.run_while(|c| !matches!(c, '$' | '\'' | '"'))),
            };
            out.push(token);
        }
        Ok(out)
    }

    fn run_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if !keep(ch) {
                break;
            }
            text.push(ch);
            self.pos += 1;
        }
        text
    }

    fn single_quoted(&mut self) -> Result<Token, SubstitutionError> {
        let start = self.pos;
        self.read_char();
        let text = self.run_while(|c| c != '\'');
        match self.read_char() {
            Some('\'') => Ok(Token::SingleQuoted(text)),
            _ => Err(SubstitutionError::UnfinishedQuote {
                quote: '\'',
                column: Self::column(start),
            }),
        }
    }

    fn double_quoted(&mut self) -> Result<Token, SubstitutionError> {
        let start = self.pos;
        self.read_char();
        let mut inner = Vec::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.read_char();
                    return Ok(Token::DoubleQuoted(inner));
                }
                Some('$') => inner.push(self.variable()?),
                Some(_) => inner.push(Token::PlainText(
                    self.run_while(|c| !matches!(c, '$' | '"')),
                )),
                None => {
                    return Err(SubstitutionError::UnfinishedQuote {
                        quote: '"',
                        column: Self::column(start),
                    });
                }
            }
        }
    }

    fn variable(&mut self) -> Result<Token, SubstitutionError> {
        let dollar = self.pos;
        self.read_char();
        match self.peek_char() {
            Some(c) if is_name_start(c) => Ok(Token::VariableRef(self.run_while(is_name_char))),
            _ => Err(SubstitutionError::InvalidVariable {
                column: Self::column(dollar),
            }),
        }
    }
}

/// Split a raw line into substitution regions.
pub fn tokenize(line: &str) -> Result<Vec<Token>, SubstitutionError> {
    Scanner::new(line).scan()
}

/// Replace every `$name` outside single quotes with its value from `env`.
///
/// Quotes are kept in the output and spacing is untouched, so the result can be
/// fed straight into [`crate::parser::parse`]. Unset variables expand to the
/// empty string.
pub fn substitute(line: &str, env: &Environment) -> Result<String, SubstitutionError> {
    let tokens = tokenize(line)?;
    tracing::trace!(?tokens, "substitution tokens");
    let mut out = String::with_capacity(line.len());
    for token in &tokens {
        token.expand(env, &mut out);
    }
    Ok(out)
}
