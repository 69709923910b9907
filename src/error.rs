//! Error types for each stage of line processing.
//!
//! Every stage has its own error type. The layer above wraps it with extra
//! context and keeps the original as its `source`.

use thiserror::Error;

/// Errors raised while expanding `$name` references.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    /// A quoted region was opened but never closed.
    #[error("substitution: unterminated {quote} quote starting at column {column}")]
    UnfinishedQuote { quote: char, column: usize },

    /// `$` is not followed by a character that can start a variable name.
    #[error("substitution: `$` at column {column} is not followed by a variable name")]
    InvalidVariable { column: usize },
}

/// A command's own arguments could not be parsed (e.g. bad `grep` flags).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{command}: {message}")]
pub struct ArgumentError {
    pub command: String,
    pub message: String,
}

/// Errors raised while turning a substituted line into invocations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A command name was expected (start of line or after `|`).
    #[error("parse: command name expected at column {column}")]
    MissingCommandName { column: usize },

    /// A quoted argument fragment was opened but never closed.
    #[error("parse: unterminated {quote} quote starting at column {column}")]
    UnfinishedQuote { quote: char, column: usize },

    /// Something was left over after the longest valid prefix.
    #[error("parse: unexpected `{found}` at column {column}")]
    UnexpectedCharacter { found: char, column: usize },

    /// `name=` was not followed by a value.
    #[error("parse: assignment to `{variable}` has no value")]
    MissingValue { variable: String },

    /// Flags of a built-in were rejected.
    #[error("parse: {0}")]
    Arguments(#[from] ArgumentError),
}

/// A single invocation failed while executing.
#[derive(Error, Debug)]
#[error("{command}: {source}")]
pub struct CommandError {
    pub command: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl CommandError {
    pub fn new(
        command: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            command: command.into(),
            source: source.into(),
        }
    }
}

/// A pipeline stage failed; the whole line is aborted.
#[derive(Error, Debug)]
#[error("interpreter: stage {stage} failed: {source}")]
pub struct InterpreterError {
    /// Zero-based position of the failing invocation in the pipeline.
    pub stage: usize,
    #[source]
    pub source: CommandError,
}

/// Any failure of a whole line.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_interpreter_error_keeps_command_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = InterpreterError {
            stage: 1,
            source: CommandError::new("cat", io),
        };

        assert_eq!(
            err.to_string(),
            "interpreter: stage 1 failed: cat: no such file"
        );
        let cause = err.source().expect("command error");
        assert_eq!(cause.to_string(), "cat: no such file");
        assert_eq!(
            cause.source().map(|e| e.to_string()),
            Some("no such file".to_string())
        );
    }

    #[test]
    fn test_argument_error_is_a_parse_error() {
        let err: ParseError = ArgumentError {
            command: "grep".to_string(),
            message: "missing pattern".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "parse: grep: missing pattern");

        let shell: ShellError = err.into();
        assert!(matches!(shell, ShellError::Parse(ParseError::Arguments(_))));
    }
}
