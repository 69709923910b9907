use argh::FromArgs;
use line_shell::{Environment, Shell};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A line-oriented shell with pipelines and variables.
struct Options {
    #[argh(option, short = 'c')]
    /// run a single line and exit
    command: Option<String>,

    #[argh(option, default = "String::from(\"$ \")")]
    /// prompt shown in interactive mode
    prompt: String,

    #[argh(switch, short = 'v')]
    /// log every processing step to stderr
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let options: Options = argh::from_env();

    let level = if options.verbose { "line_shell=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let mut shell = Shell::new(Environment::new());

    if let Some(line) = options.command {
        return Ok(match shell.run_line(&line) {
            Ok((_, output)) => {
                if let Some(text) = output.filter(|t| !t.is_empty()) {
                    println!("{}", text);
                }
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        });
    }

    shell.repl(&options.prompt)?;
    Ok(ExitCode::SUCCESS)
}
