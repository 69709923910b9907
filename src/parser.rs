//! Grammar of a substituted line.
//!
//! ```text
//! Line       := Blank* (Assignment | Pipeline) Blank*
//! Assignment := Identifier "=" Argument
//! Pipeline   := Command (Blank* "|" Blank* Command)*
//! Command    := Name (Blank+ Argument)*
//! Argument   := (DoubleQuoted | SingleQuoted | BareWord)+
//! ```
//!
//! Assignment is tried first. An alternative only matches when it consumes the
//! whole line, so `x=1 2` is rejected instead of being read as `x=1`.

use crate::error::ParseError;
use crate::substitution::{is_name_char, is_name_start};

/// One quoting region of an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Unquoted run without whitespace, quotes or `|`.
    Bare(String),
    /// Contents of `'...'`.
    SingleQuoted(String),
    /// Contents of `"..."`.
    DoubleQuoted(String),
}

impl Fragment {
    fn content(&self) -> &str {
        match self {
            Fragment::Bare(s) | Fragment::SingleQuoted(s) | Fragment::DoubleQuoted(s) => s,
        }
    }

    fn push_verbatim(&self, out: &mut String) {
        match self {
            Fragment::Bare(s) => out.push_str(s),
            Fragment::SingleQuoted(s) => {
                out.push('\'');
                out.push_str(s);
                out.push('\'');
            }
            Fragment::DoubleQuoted(s) => {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
        }
    }
}

/// A single shell word made of adjacent fragments, e.g. `ab"cd"'ef'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    fragments: Vec<Fragment>,
}

impl Argument {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// The word with quotes removed, as built-ins see it.
    pub fn content(&self) -> String {
        self.fragments.iter().map(Fragment::content).collect()
    }

    /// The word exactly as written, quotes included.
    pub fn verbatim(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            fragment.push_verbatim(&mut out);
        }
        out
    }
}

/// `name arg*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToken {
    pub name: String,
    pub args: Vec<Argument>,
}

/// Commands joined by `|`, in execution order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineToken {
    pub commands: Vec<CommandToken>,
}

/// `variable=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentToken {
    pub variable: String,
    pub value: Argument,
}

/// A fully parsed line: exactly one assignment or one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Assignment(AssignmentToken),
    Pipeline(PipelineToken),
}

fn is_blank(ch: char) -> bool {
    ch.is_whitespace()
}

fn is_bare_char(ch: char) -> bool {
    !is_blank(ch) && !matches!(ch, '\'' | '"' | '|')
}

fn is_command_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '/' | '-')
}

struct LineParser {
    input: Vec<char>,
    pos: usize,
}

impl LineParser {
    fn new(line: &str) -> Self {
        LineParser {
            input: line.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !keep(ch) {
                break;
            }
            text.push(ch);
            self.pos += 1;
        }
        text
    }

    /// Skip blanks, returning how many were skipped.
    fn skip_blanks(&mut self) -> usize {
        self.take_while(is_blank).chars().count()
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_blanks();
        match self.peek() {
            None => Ok(()),
            Some(found) => Err(ParseError::UnexpectedCharacter {
                found,
                column: self.column(),
            }),
        }
    }

    /// Assignment line: the whole input must be consumed.
    fn assignment_line(mut self) -> Result<AssignmentToken, ParseError> {
        self.skip_blanks();
        let variable = self.identifier()?;
        match self.consume() {
            Some('=') => {}
            Some(found) => {
                return Err(ParseError::UnexpectedCharacter {
                    found,
                    column: self.pos,
                });
            }
            None => return Err(ParseError::MissingValue { variable }),
        }
        let value = match self.argument()? {
            Some(value) => value,
            None => return Err(ParseError::MissingValue { variable }),
        };
        self.expect_end()?;
        Ok(AssignmentToken { variable, value })
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(c) if is_name_start(c) => Ok(self.take_while(is_name_char)),
            Some(found) => Err(ParseError::UnexpectedCharacter {
                found,
                column: self.column(),
            }),
            None => Err(ParseError::MissingCommandName {
                column: self.column(),
            }),
        }
    }

    /// Pipeline line: the whole input must be consumed.
    fn pipeline_line(mut self) -> Result<PipelineToken, ParseError> {
        self.skip_blanks();
        let mut commands = vec![self.command()?];

        loop {
            let save = self.pos;
            self.skip_blanks();
            if self.peek() == Some('|') {
                self.consume();
                self.skip_blanks();
                commands.push(self.command()?);
            } else {
                self.pos = save;
                break;
            }
        }

        self.expect_end()?;
        Ok(PipelineToken { commands })
    }

    fn command(&mut self) -> Result<CommandToken, ParseError> {
        let name = self.take_while(is_command_name_char);
        if name.is_empty() {
            return Err(ParseError::MissingCommandName {
                column: self.column(),
            });
        }

        let mut args = Vec::new();
        loop {
            let save = self.pos;
            if self.skip_blanks() == 0 {
                break;
            }
            match self.argument()? {
                Some(arg) => args.push(arg),
                None => {
                    self.pos = save;
                    break;
                }
            }
        }

        Ok(CommandToken { name, args })
    }

    /// Adjacent fragments up to the next blank, `|` or end of input.
    fn argument(&mut self) -> Result<Option<Argument>, ParseError> {
        let mut fragments = Vec::new();
        loop {
            match self.peek() {
                Some('\'') => fragments.push(Fragment::SingleQuoted(self.quoted('\'')?)),
                Some('"') => fragments.push(Fragment::DoubleQuoted(self.quoted('"')?)),
                Some(c) if is_bare_char(c) => fragments.push(Fragment::Bare(self.take_while(is_bare_char))),
                _ => break,
            }
        }
        Ok((!fragments.is_empty()).then(|| Argument::new(fragments)))
    }

    fn quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let column = self.column();
        self.consume();
        let text = self.take_while(|c| c != quote);
        match self.consume() {
            Some(_) => Ok(text),
            None => Err(ParseError::UnfinishedQuote { quote, column }),
        }
    }
}

/// Does the line start with `Identifier=` (after leading blanks)?
fn looks_like_assignment(line: &str) -> bool {
    let rest = line.trim_start();
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => {}
        _ => return false,
    }
    chars.find(|c| !is_name_char(*c)) == Some('=')
}

/// Parse a substituted line into an assignment or a pipeline.
pub fn parse(line: &str) -> Result<Line, ParseError> {
    let assignment_err = match LineParser::new(line).assignment_line() {
        Ok(assignment) => return Ok(Line::Assignment(assignment)),
        Err(err) => err,
    };
    match LineParser::new(line).pipeline_line() {
        Ok(pipeline) => Ok(Line::Pipeline(pipeline)),
        Err(_) if looks_like_assignment(line) => Err(assignment_err),
        Err(err) => Err(err),
    }
}
