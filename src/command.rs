use crate::builtin::{Assignment, Cat, Cd, Echo, Exit, Grep, Ls, Pwd, Wc};
use crate::env::Environment;
use crate::error::CommandError;
use crate::external::ExternalCommand;
use crate::io_adapters::Buffer;
use anyhow::Result;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success. [`TERMINATE`] asks the caller to stop
/// reading further lines.
pub type ExitCode = i32;

/// Status returned by `exit`: halts the pipeline and ends the session.
pub const TERMINATE: ExitCode = -1;

/// Object-safe trait for anything that can run as one pipeline stage.
///
/// A command reads the previous stage's result from `input` and writes its
/// whole result into `output`.
pub trait ExecutableCommand {
    /// Name reported in errors.
    fn name(&self) -> &str;

    fn execute(
        &self,
        env: &mut Environment,
        input: &Buffer,
        output: &mut Buffer,
    ) -> Result<ExitCode>;
}

/// A fully resolved command, ready to be executed by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandInvocation {
    Assignment(Assignment),
    Cat(Cat),
    Echo(Echo),
    Exit(Exit),
    Pwd(Pwd),
    Wc(Wc),
    Grep(Grep),
    Cd(Cd),
    Ls(Ls),
    External(ExternalCommand),
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for CommandInvocation {
                fn from(cmd: $variant) -> Self {
                    CommandInvocation::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(Assignment, Cat, Echo, Exit, Pwd, Wc, Grep, Cd, Ls);

impl From<ExternalCommand> for CommandInvocation {
    fn from(cmd: ExternalCommand) -> Self {
        CommandInvocation::External(cmd)
    }
}

impl CommandInvocation {
    fn as_command(&self) -> &dyn ExecutableCommand {
        match self {
            CommandInvocation::Assignment(c) => c,
            CommandInvocation::Cat(c) => c,
            CommandInvocation::Echo(c) => c,
            CommandInvocation::Exit(c) => c,
            CommandInvocation::Pwd(c) => c,
            CommandInvocation::Wc(c) => c,
            CommandInvocation::Grep(c) => c,
            CommandInvocation::Cd(c) => c,
            CommandInvocation::Ls(c) => c,
            CommandInvocation::External(c) => c,
        }
    }

    pub fn name(&self) -> &str {
        self.as_command().name()
    }

    /// Run the command, tagging any failure with the command's name.
    ///
    /// The error message keeps the whole context chain, down to the OS error.
    pub fn execute(
        &self,
        env: &mut Environment,
        input: &Buffer,
        output: &mut Buffer,
    ) -> Result<ExitCode, CommandError> {
        let cmd = self.as_command();
        cmd.execute(env, input, output)
            .map_err(|source| CommandError::new(cmd.name(), format!("{:#}", source)))
    }
}
