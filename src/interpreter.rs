use crate::command::{CommandInvocation, ExitCode};
use crate::env::Environment;
use crate::error::InterpreterError;
use crate::io_adapters::Buffer;

/// Executes lists of invocations as pipelines against a session environment.
///
/// Example
/// ```
/// use line_shell::{CommandFactory, Environment, Interpreter, parser};
/// let mut interpreter = Interpreter::new(Environment::empty());
/// let line = parser::parse("echo hello | cat").unwrap();
/// let invocations = CommandFactory::default().build(line).unwrap();
/// let (code, output) = interpreter.interpret(&invocations).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(output.as_deref(), Some("hello"));
/// ```
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run `invocations` left to right, feeding each stage's output to the next.
    ///
    /// Every stage finishes before the next one starts. A non-zero status (the
    /// terminate status of `exit`) stops the pipeline and is returned together
    /// with the output produced before that stage. A failing stage aborts the
    /// whole pipeline.
    pub fn interpret(
        &mut self,
        invocations: &[CommandInvocation],
    ) -> Result<(ExitCode, Option<String>), InterpreterError> {
        let mut input = Buffer::new();
        let mut output = Buffer::new();
        let mut code = 0;

        for (stage, invocation) in invocations.iter().enumerate() {
            code = invocation
                .execute(&mut self.env, &input, &mut output)
                .map_err(|source| InterpreterError { stage, source })?;
            tracing::debug!(stage, command = invocation.name(), code, "stage finished");

            if code != 0 {
                return Ok((code, input.into_inner()));
            }
            input.clear();
            std::mem::swap(&mut input, &mut output);
        }

        Ok((code, input.into_inner()))
    }
}

impl Default for Interpreter {
    /// Interpreter over the process environment.
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{Assignment, Cat, Echo, Exit, Grep, Pwd, Wc};
    use crate::command::TERMINATE;
    use std::fs;
    use tempfile::TempDir;

    fn echo(args: &[&str]) -> CommandInvocation {
        Echo {
            args: args.iter().map(|s| s.to_string()).collect(),
        }
        .into()
    }

    fn cat(files: &[&str]) -> CommandInvocation {
        Cat {
            files: files.iter().map(|s| s.to_string()).collect(),
        }
        .into()
    }

    fn wc() -> CommandInvocation {
        Wc { files: Vec::new() }.into()
    }

    #[test]
    fn test_echo_pipe_cat() {
        let mut interp = Interpreter::new(Environment::empty());
        let result = interp.interpret(&[echo(&["cat", "dog"]), cat(&[])]).unwrap();
        assert_eq!(result, (0, Some("cat dog".to_string())));
    }

    #[test]
    fn test_three_stage_pipeline() {
        let mut interp = Interpreter::new(Environment::empty());
        let result = interp.interpret(&[echo(&["cat", "dog"]), wc(), cat(&[])]).unwrap();
        assert_eq!(result, (0, Some("1 2 7".to_string())));
    }

    #[test]
    fn test_later_stage_ignores_input_when_given_arguments() {
        let mut interp = Interpreter::new(Environment::empty());
        let result = interp.interpret(&[echo(&["x"]), echo(&["y"])]).unwrap();
        assert_eq!(result, (0, Some("y".to_string())));
    }

    #[test]
    fn test_no_output_is_none() {
        let mut interp = Interpreter::new(Environment::empty());
        assert_eq!(interp.interpret(&[cat(&[])]).unwrap(), (0, None));
        assert_eq!(interp.interpret(&[wc()]).unwrap(), (0, None));
        assert_eq!(interp.interpret(&[]).unwrap(), (0, None));
    }

    #[test]
    fn test_exit_stops_pipeline_and_keeps_previous_output() {
        let tmp = TempDir::new().unwrap();
        let mut interp = Interpreter::new(Environment::empty());
        interp.env_mut().current_dir = tmp.path().to_path_buf();

        // the last stage would fail if it ran
        let result = interp
            .interpret(&[echo(&["hi"]), Exit.into(), cat(&["missing"])])
            .unwrap();
        assert_eq!(result, (TERMINATE, Some("hi".to_string())));

        assert_eq!(interp.interpret(&[Exit.into()]).unwrap(), (TERMINATE, None));
    }

    #[test]
    fn test_failing_stage_aborts_with_position() {
        let tmp = TempDir::new().unwrap();
        let mut interp = Interpreter::new(Environment::empty());
        interp.env_mut().current_dir = tmp.path().to_path_buf();

        let err = interp
            .interpret(&[echo(&["a"]), cat(&["text3"]), Exit.into()])
            .unwrap_err();
        assert_eq!(err.stage, 1);
        assert_eq!(err.source.command, "cat");
    }

    #[test]
    fn test_assignment_mutates_environment() {
        let mut interp = Interpreter::new(Environment::empty());
        let assign = |v: &str| -> CommandInvocation {
            Assignment {
                variable: "x".to_string(),
                value: v.to_string(),
            }
            .into()
        };

        assert_eq!(interp.interpret(&[assign("1")]).unwrap(), (0, None));
        assert_eq!(interp.env().get("x"), "1");
        assert_eq!(interp.interpret(&[assign("2")]).unwrap(), (0, None));
        assert_eq!(interp.env().get("x"), "2");
    }

    #[test]
    fn test_files_flow_through_pipeline() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("text1"), "Cat   dog\n    rat\n").unwrap();
        let mut interp = Interpreter::new(Environment::empty());
        interp.env_mut().current_dir = tmp.path().to_path_buf();

        let result = interp.interpret(&[cat(&["text1"]), wc()]).unwrap();
        assert_eq!(result, (0, Some("2 3 18".to_string())));

        let grep = Grep {
            pattern: "rat".to_string(),
            files: Vec::new(),
            word_regexp: false,
            ignore_case: false,
            after_context: 0,
        };
        let result = interp.interpret(&[cat(&["text1"]), grep.into()]).unwrap();
        assert_eq!(result, (0, Some("    rat\n".to_string())));
    }

    #[test]
    fn test_pwd_reports_session_dir() {
        let tmp = TempDir::new().unwrap();
        let mut interp = Interpreter::new(Environment::empty());
        interp.env_mut().current_dir = tmp.path().to_path_buf();

        let (_, output) = interp.interpret(&[Pwd.into()]).unwrap();
        assert_eq!(output, Some(tmp.path().to_string_lossy().into_owned()));
    }
}
