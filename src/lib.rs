//! A small line-oriented shell.
//!
//! Each input line goes through three stages: `$name` substitution against
//! the session [`Environment`], parsing into a variable assignment or a
//! pipeline of commands, and interpretation of the resulting
//! [`CommandInvocation`]s. Stages of a pipeline run one after another; the
//! complete output of a stage becomes the input of the next one.
//!
//! Built-in commands (`cat`, `echo`, `exit`, `pwd`, `wc`, `grep`, `cd`, `ls`)
//! are implemented in Rust. Any other name is resolved through the session
//! `PATH` and started as a child process.
//!
//! [`Shell`] ties the stages together and provides the interactive loop.

pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod external;
mod factory;
mod interpreter;
pub mod io_adapters;
pub mod parser;
mod shell;
pub mod substitution;

pub use command::{CommandInvocation, ExecutableCommand, ExitCode, TERMINATE};
pub use env::Environment;
pub use error::ShellError;
pub use factory::CommandFactory;
pub use interpreter::Interpreter;
pub use io_adapters::Buffer;
pub use shell::Shell;
