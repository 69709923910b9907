use crate::builtin::{Assignment, BuiltinCommand, Cat, Cd, Echo, Exit, Grep, Ls, Pwd, Wc};
use crate::command::CommandInvocation;
use crate::error::ArgumentError;
use crate::external::ExternalCommand;
use crate::parser::{Argument, Line};

/// Constructor of a single built-in, registered by name.
pub(crate) trait Constructor {
    fn name(&self) -> &'static str;

    /// Build the built-in from quote-stripped arguments.
    fn create(&self, args: Vec<String>) -> Result<CommandInvocation, ArgumentError>;
}

/// Factory allows creating instances of one built-in command type.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + Into<CommandInvocation>> Constructor for Factory<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn create(&self, args: Vec<String>) -> Result<CommandInvocation, ArgumentError> {
        T::create(args).map(Into::into)
    }
}

/// Maps command names and arguments to invocations.
///
/// Names found in the registry become built-ins and see their arguments with
/// quotes removed. Any other name becomes an [`ExternalCommand`] that receives
/// its arguments verbatim.
pub struct CommandFactory {
    builtins: Vec<Box<dyn Constructor>>,
}

impl CommandFactory {
    /// Names of all built-in commands.
    pub fn builtin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.iter().map(|b| b.name())
    }

    /// Build one invocation. Only flag parsing of a built-in can fail.
    pub fn create(&self, name: &str, args: &[Argument]) -> Result<CommandInvocation, ArgumentError> {
        match self.builtins.iter().find(|b| b.name() == name) {
            Some(builtin) => builtin.create(args.iter().map(Argument::content).collect()),
            None => Ok(ExternalCommand::new(name, args.iter().map(Argument::verbatim).collect()).into()),
        }
    }

    /// Build the invocations of a parsed line, in execution order.
    pub fn build(&self, line: Line) -> Result<Vec<CommandInvocation>, ArgumentError> {
        match line {
            Line::Assignment(token) => Ok(vec![
                Assignment {
                    variable: token.variable,
                    value: token.value.content(),
                }
                .into(),
            ]),
            Line::Pipeline(pipeline) => pipeline
                .commands
                .iter()
                .map(|cmd| self.create(&cmd.name, &cmd.args))
                .collect(),
        }
    }
}

impl Default for CommandFactory {
    /// The registry: `cat`, `echo`, `exit`, `pwd`, `wc`, `grep`, `cd`, `ls`.
    fn default() -> Self {
        Self {
            builtins: vec![
                Box::new(Factory::<Cat>::default()),
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Wc>::default()),
                Box::new(Factory::<Grep>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Ls>::default()),
            ],
        }
    }
}
