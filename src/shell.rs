use crate::command::{ExitCode, TERMINATE};
use crate::env::Environment;
use crate::error::ShellError;
use crate::factory::CommandFactory;
use crate::interpreter::Interpreter;
use crate::parser;
use crate::substitution;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// An interactive session: substitution, parsing and interpretation of one
/// line at a time against a persistent environment.
///
/// Example
/// ```
/// use line_shell::{Environment, Shell};
/// let mut sh = Shell::new(Environment::empty());
/// assert_eq!(sh.run_line("x=123").unwrap(), (0, None));
/// let (code, output) = sh.run_line("echo $x | cat").unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(output.as_deref(), Some("123"));
/// ```
pub struct Shell {
    interpreter: Interpreter,
    factory: CommandFactory,
}

impl Shell {
    pub fn new(env: Environment) -> Self {
        Self {
            interpreter: Interpreter::new(env),
            factory: CommandFactory::default(),
        }
    }

    pub fn env(&self) -> &Environment {
        self.interpreter.env()
    }

    /// Process a single line.
    ///
    /// Returns the status and the output of the last stage. Nothing runs
    /// unless substitution and parsing of the whole line succeed.
    pub fn run_line(&mut self, line: &str) -> Result<(ExitCode, Option<String>), ShellError> {
        let substituted = substitution::substitute(line, self.interpreter.env())?;
        tracing::debug!(%substituted, "substituted line");

        let parsed = parser::parse(&substituted)?;
        tracing::debug!(?parsed, "parsed line");

        let invocations = self.factory.build(parsed).map_err(parser_error)?;
        Ok(self.interpreter.interpret(&invocations)?)
    }

    /// Read-Eval-Print Loop.
    ///
    /// Output goes to stdout, errors to stderr; an error never ends the
    /// session. Stops on `exit`, Ctrl-C or end of input.
    pub fn repl(&mut self, prompt: &str) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    match self.run_line(&line) {
                        Ok((code, output)) => {
                            if let Some(text) = output.filter(|t| !t.is_empty()) {
                                println!("{}", text);
                            }
                            if code == TERMINATE {
                                break;
                            }
                        }
                        Err(err) => eprintln!("{}", err),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Shell {
    /// A session over the current process environment.
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

fn parser_error(err: crate::error::ArgumentError) -> ShellError {
    ShellError::Parse(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, SubstitutionError};
    use std::fs;
    use tempfile::TempDir;

    fn shell() -> Shell {
        Shell::new(Environment::empty())
    }

    fn output(sh: &mut Shell, line: &str) -> Option<String> {
        let (code, out) = sh.run_line(line).unwrap();
        assert_eq!(code, 0, "line {:?}", line);
        out
    }

    fn text(sh: &mut Shell, line: &str) -> String {
        output(sh, line).unwrap_or_default()
    }

    fn shell_in(dir: &TempDir) -> Shell {
        let mut env = Environment::empty();
        env.current_dir = dir.path().to_path_buf();
        Shell::new(env)
    }

    #[test]
    fn test_echo_pipe_cat() {
        let mut sh = shell();
        assert_eq!(sh.run_line("echo X | cat").unwrap(), (0, Some("X".to_string())));
        assert_eq!(text(&mut sh, "echo | cat"), "");
        assert_eq!(
            text(&mut sh, "echo \"cat\" 'dog' rat | cat"),
            "cat dog rat"
        );
    }

    #[test]
    fn test_echo_quoting() {
        let mut sh = shell();
        assert_eq!(text(&mut sh, "    echo    "), "");
        assert_eq!(text(&mut sh, "echo \"\""), "");
        assert_eq!(text(&mut sh, "echo ''"), "");
        assert_eq!(text(&mut sh, "echo 123'123'\"123\""), "123123123");
        assert_eq!(
            text(&mut sh, "echo \"cat\"   'dog'  rat '123'!@ * "),
            "cat dog rat 123!@ *"
        );
        assert_eq!(text(&mut sh, "echo \"hello\""), "hello");
    }

    #[test]
    fn test_assignment_then_reference() {
        let mut sh = shell();
        assert_eq!(sh.run_line("x=123").unwrap(), (0, None));
        assert_eq!(text(&mut sh, "echo $x"), "123");

        assert_eq!(sh.run_line("x=$x").unwrap().0, 0);
        assert_eq!(text(&mut sh, "echo $x"), "123");
        assert_eq!(sh.run_line("abcABC=$x").unwrap().0, 0);
        assert_eq!(text(&mut sh, "echo $abcABC"), "123");
        assert_eq!(sh.run_line("x=123abc!").unwrap().0, 0);
        assert_eq!(text(&mut sh, "echo $x"), "123abc!");
        assert_eq!(sh.run_line("x=123'123'\"123\"").unwrap().0, 0);
        assert_eq!(text(&mut sh, "echo $x"), "123123123");
        assert_eq!(sh.env().get("x"), "123123123");
    }

    #[test]
    fn test_assignment_with_trailing_word_is_a_parse_error() {
        let mut sh = shell();
        assert!(matches!(sh.run_line("x=123 123"), Err(ShellError::Parse(_))));
        assert_eq!(sh.env().get("x"), "");
    }

    #[test]
    fn test_quote_sensitive_evaluation() {
        let mut sh = shell();
        sh.run_line("x=123").unwrap();
        sh.run_line("abc=abc").unwrap();
        sh.run_line("A1=!").unwrap();

        assert_eq!(text(&mut sh, "echo $x '$x' \"$x\""), "123 $x 123");
        assert_eq!(text(&mut sh, "echo $x'$x'\"$x\""), "123$x123");
        assert_eq!(text(&mut sh, "echo $x '$abc' \"$A1\""), "123 $abc !");
    }

    #[test]
    fn test_command_name_from_variables() {
        let mut sh = shell();
        sh.run_line("x=ec").unwrap();
        sh.run_line("y=ho").unwrap();
        sh.run_line("z=magic").unwrap();
        assert_eq!(text(&mut sh, "$x$y $z"), "magic");
    }

    #[test]
    fn test_unset_variable_and_bare_dollar() {
        let mut sh = shell();
        assert_eq!(sh.run_line("echo $missing").unwrap(), (0, Some(String::new())));
        assert!(matches!(
            sh.run_line("echo $"),
            Err(ShellError::Substitution(SubstitutionError::InvalidVariable { .. }))
        ));
    }

    #[test]
    fn test_exit_truncates_pipeline() {
        let mut sh = shell();
        let (code, out) = sh.run_line("echo hi | exit | wc").unwrap();
        assert_eq!(code, TERMINATE);
        assert_eq!(out.as_deref(), Some("hi"));
        assert_eq!(sh.run_line("exit").unwrap(), (TERMINATE, None));
    }

    #[test]
    fn test_files_and_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("text1"), "Cat   dog\n    rat\n").unwrap();
        let mut sh = shell_in(&dir);

        assert_eq!(text(&mut sh, "cat text1"), "Cat   dog\n    rat\n");
        assert_eq!(text(&mut sh, "cat text1 | wc"), "2 3 18");
        assert_eq!(text(&mut sh, "wc text1"), "2 3 18 text1");

        sh.run_line("file=text1").unwrap();
        assert_eq!(text(&mut sh, "echo $x | cat $file"), "Cat   dog\n    rat\n");

        sh.run_line("x=no_file").unwrap();
        match sh.run_line("echo $x | cat '$x'") {
            Err(ShellError::Interpreter(err)) => {
                assert_eq!(err.stage, 1);
                assert_eq!(err.source.command, "cat");
            }
            other => panic!("Expected interpreter error, got {:?}", other),
        }
        assert!(matches!(sh.run_line("wc text3"), Err(ShellError::Interpreter(_))));
    }

    #[test]
    fn test_grep_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("animals"), "cat\ndog\ncat cat\ndog rat\nrat\n").unwrap();
        let mut sh = shell_in(&dir);

        assert_eq!(text(&mut sh, "echo abc | grep abc | wc"), "1 1 3");
        assert_eq!(text(&mut sh, "echo abc | grep '^a.*$'"), "abc");
        assert_eq!(text(&mut sh, "echo | grep abc"), "");
        assert_eq!(text(&mut sh, "grep rat animals"), "dog rat\nrat\n");
        assert_eq!(
            text(&mut sh, "grep -A 1 -w dog animals"),
            "dog\ncat cat\ndog rat\nrat\n"
        );
    }

    #[test]
    fn test_grep_context_larger_than_input() {
        let mut sh = shell();
        assert_eq!(
            sh.run_line("echo abc | grep -A 18446744073709551615 abc").unwrap(),
            (0, Some("abc".to_string()))
        );
    }

    #[test]
    fn test_grep_without_pattern_is_an_argument_error() {
        let mut sh = shell();
        assert!(matches!(
            sh.run_line("grep"),
            Err(ShellError::Parse(ParseError::Arguments(_)))
        ));
    }

    #[test]
    fn test_cd_changes_session_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("inner.txt"), "x").unwrap();
        let mut sh = shell_in(&dir);

        assert_eq!(sh.run_line("cd sub").unwrap(), (0, None));
        assert_eq!(
            text(&mut sh, "pwd"),
            fs::canonicalize(dir.path().join("sub")).unwrap().to_string_lossy()
        );
        assert_eq!(text(&mut sh, "ls"), "inner.txt");
        assert_eq!(text(&mut sh, "cat inner.txt"), "x");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_fallback() {
        let mut env = Environment::empty();
        env.set("PATH", "/usr/bin:/bin");
        let mut sh = Shell::new(env);

        assert_eq!(text(&mut sh, "echo abc | tr a-c x-z"), "xyz");
        // quotes reach the child process untouched
        assert_eq!(text(&mut sh, "printf '%s' \"x\""), "'\"x\"'");
        assert!(matches!(sh.run_line("false"), Err(ShellError::Interpreter(_))));
    }

    #[test]
    fn test_structural_errors_run_nothing() {
        let mut sh = shell();
        assert!(matches!(sh.run_line("echo a |"), Err(ShellError::Parse(_))));
        assert!(matches!(sh.run_line(""), Err(ShellError::Parse(_))));
        assert!(matches!(
            sh.run_line("echo 'open"),
            Err(ShellError::Substitution(SubstitutionError::UnfinishedQuote { .. }))
        ));
    }
}
