use crate::command::{ExecutableCommand, ExitCode, TERMINATE};
use crate::env::Environment;
use crate::error::ArgumentError;
use crate::io_adapters::Buffer;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use regex::RegexBuilder;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are constructed from their quote-stripped arguments and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    const NAME: &'static str;

    /// Build the command from its arguments. Only flag parsing can fail.
    fn create(args: Vec<String>) -> Result<Self, ArgumentError>;

    /// Executes the command using the pipeline buffers and environment.
    ///
    /// Return value should follow shell conventions: 0 for success.
    fn run(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn execute(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        self.run(env, input, output)
    }
}

/// Parse `args` with [`argh`], turning an early exit (bad flags or `--help`)
/// into an [`ArgumentError`] carrying argh's message.
fn parse_flags<T: FromArgs>(name: &str, args: &[String]) -> Result<T, ArgumentError> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    T::from_args(&[name], &args).map_err(|EarlyExit { output, .. }| ArgumentError {
        command: name.to_string(),
        message: output.trim_end().to_string(),
    })
}

fn read_file(env: &Environment, name: &str) -> Result<String> {
    let path = env.resolve(name);
    fs::read_to_string(&path).with_context(|| format!("{}: cannot read file", name))
}

/// `name=value`. Not reachable by name; produced only for assignment lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub variable: String,
    pub value: String,
}

impl ExecutableCommand for Assignment {
    fn name(&self) -> &str {
        "assignment"
    }

    fn execute(&self, env: &mut Environment, _input: &Buffer, _output: &mut Buffer) -> Result<ExitCode> {
        env.set(self.variable.as_str(), self.value.as_str());
        Ok(0)
    }
}

/// Print the current working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pwd;

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";

    fn create(_args: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Pwd)
    }

    fn run(&self, env: &mut Environment, _input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        output.write(env.current_dir.to_string_lossy());
        Ok(0)
    }
}

/// Change the session working directory.
/// If no target is provided, changes to the directory specified by HOME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cd {
    /// Absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    fn create(args: Vec<String>) -> Result<Self, ArgumentError> {
        if args.len() > 1 {
            return Err(ArgumentError {
                command: Self::NAME.to_string(),
                message: "too many arguments".to_string(),
            });
        }
        Ok(Cd {
            target: args.into_iter().next(),
        })
    }

    fn run(&self, env: &mut Environment, _input: &Buffer, _output: &mut Buffer) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => bail!("no target and HOME not set"),
            },
        };

        let new_dir = env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("can't canonicalize {}", new_dir.display()))?;
        if !canonical.is_dir() {
            bail!("{}: not a directory", target.display());
        }
        env.current_dir = canonical;
        Ok(0)
    }
}

/// Ask the session to stop. Arguments are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";

    fn create(_args: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Exit)
    }

    fn run(&self, _env: &mut Environment, _input: &Buffer, _output: &mut Buffer) -> Result<ExitCode> {
        Ok(TERMINATE)
    }
}

/// Write the arguments separated by single spaces, without a trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";

    fn create(args: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Echo { args })
    }

    fn run(&self, _env: &mut Environment, _input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        output.write(self.args.join(" "));
        Ok(0)
    }
}

/// Count lines, words and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wc {
    pub files: Vec<String>,
}

impl Wc {
    fn statistics(text: &str) -> String {
        let lines = text.lines().count();
        let words = text.split_whitespace().count();
        let bytes = text.len();
        format!("{} {} {}", lines, words, bytes)
    }
}

impl BuiltinCommand for Wc {
    const NAME: &'static str = "wc";

    fn create(files: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Wc { files })
    }

    fn run(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        if self.files.is_empty() {
            if let Some(text) = input.read() {
                output.write(Self::statistics(text));
            }
            return Ok(0);
        }
        let mut report = Vec::with_capacity(self.files.len());
        for fname in &self.files {
            let text = read_file(env, fname)?;
            report.push(format!("{} {}", Self::statistics(&text), fname));
        }
        output.write(report.join("\n"));
        Ok(0)
    }
}

/// Print files, or forward the piped input when no file is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    const NAME: &'static str = "cat";

    fn create(files: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Cat { files })
    }

    fn run(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        if self.files.is_empty() {
            if let Some(text) = input.read() {
                output.write(text);
            }
            return Ok(0);
        }
        let mut result = String::new();
        for fname in &self.files {
            result.push_str(&read_file(env, fname)?);
        }
        output.write(result);
        Ok(0)
    }
}

/// List directory contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ls {
    pub paths: Vec<String>,
}

impl Ls {
    fn entries(env: &Environment, name: &str) -> Result<Vec<String>> {
        let path = env.resolve(name);
        if !path.is_dir() {
            if path.exists() {
                return Ok(vec![name.to_string()]);
            }
            bail!("{}: no such file or directory", name);
        }
        let mut names = fs::read_dir(&path)
            .with_context(|| format!("{}: cannot read directory", name))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("{}: cannot read directory", name))?;
        names.sort();
        Ok(names)
    }
}

impl BuiltinCommand for Ls {
    const NAME: &'static str = "ls";

    fn create(paths: Vec<String>) -> Result<Self, ArgumentError> {
        Ok(Ls { paths })
    }

    fn run(&self, env: &mut Environment, _input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        match self.paths.as_slice() {
            [] => output.write(Self::entries(env, ".")?.join("\n")),
            [single] => output.write(Self::entries(env, single)?.join("\n")),
            many => {
                let mut blocks = Vec::with_capacity(many.len());
                for name in many {
                    let names = Self::entries(env, name)?;
                    blocks.push(format!("{}:\n{}", name, names.join("\n")));
                }
                output.write(blocks.join("\n\n"));
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// print lines matching a pattern
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search. If none provided, reads the piped input.
    pub files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl Grep {
    fn process_source(
        &self,
        reader: &mut dyn Read,
        out: &mut String,
        file_name: Option<&str>,
        re: &regex::Regex,
    ) -> Result<()> {
        let mut reader = BufReader::new(reader);

        let mut lines = Vec::new();
        let mut match_indices = Vec::new();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).context("read error")? == 0 {
                break;
            }
            if re.is_match(line.trim_end_matches('\n')) {
                match_indices.push(lines.len());
            }
            lines.push(line);
        }

        let total_lines = lines.len();
        let mut to_print = vec![false; total_lines];
        for &match_line in &match_indices {
            let end_print = match_line
                .saturating_add(self.after_context)
                .saturating_add(1)
                .min(total_lines);
            for flag in &mut to_print[match_line..end_print] {
                *flag = true;
            }
        }

        let prefix = file_name
            .map(|name| format!("{}:", name))
            .unwrap_or_default();
        let mut last_printed_index: Option<usize> = None;

        for (i, line) in lines.iter().enumerate() {
            if !to_print[i] {
                continue;
            }
            if self.after_context > 0 && last_printed_index.is_some_and(|last| i > last + 1) {
                out.push_str("--\n");
            }
            out.push_str(&prefix);
            out.push_str(line);
            last_printed_index = Some(i);
        }

        Ok(())
    }
}

impl BuiltinCommand for Grep {
    const NAME: &'static str = "grep";

    fn create(args: Vec<String>) -> Result<Self, ArgumentError> {
        parse_flags(Self::NAME, &args)
    }

    fn run(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };

        let re = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("invalid regex pattern: {}", pattern))?;

        let mut result = String::new();
        if self.files.is_empty() {
            if input.is_empty() {
                return Ok(0);
            }
            self.process_source(&mut input.reader(), &mut result, None, &re)?;
        } else {
            let with_prefix = self.files.len() > 1;
            for file_name in &self.files {
                let mut f = fs::File::open(env.resolve(file_name))
                    .with_context(|| format!("{}: cannot open file", file_name))?;
                let prefix = with_prefix.then_some(file_name.as_str());
                self.process_source(&mut f, &mut result, prefix, &re)
                    .with_context(|| format!("{}: cannot read file", file_name))?;
            }
        }
        output.write(result);
        Ok(0)
    }
}
