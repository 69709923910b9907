use crate::command::{ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::io_adapters::Buffer;
use anyhow::{Context, Result, anyhow, bail};
use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Command that is not a builtin; runs as a child process.
///
/// Arguments are forwarded verbatim, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    name: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl ExecutableCommand for ExternalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, env: &mut Environment, input: &Buffer, output: &mut Buffer) -> Result<ExitCode> {
        let search_paths = env.get("PATH");
        let program = find_command_path(
            OsStr::new(&search_paths),
            &env.current_dir,
            Path::new(&self.name),
        )
        .ok_or_else(|| anyhow!("command not found"))?;

        tracing::debug!(program = %program.display(), args = ?self.args, "spawning external command");
        let mut child = Command::new(&program)
            .args(&self.args)
            .env_clear()
            .envs(env.vars.iter())
            .current_dir(&env.current_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", program.display()))?;

        // The whole input goes in before any output is read.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input.text().as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(e).context("failed to write to child stdin");
                }
                _ => {}
            }
        }

        let result = child.wait_with_output().context("failed to wait for child")?;
        if !result.stderr.is_empty() {
            bail!("{}", String::from_utf8_lossy(&result.stderr).trim_end());
        }
        let code = match result.status.code() {
            Some(x) => x,
            None => terminated_by_signal(result.status),
        };
        if code != 0 {
            bail!("exited with status {}", code);
        }

        let mut stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        if stdout.ends_with('\n') {
            stdout.pop();
        }
        output.write(stdout);
        Ok(0)
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an existing file.
/// - `./foo`, or a relative path with several components (e.g. `bin/sh`):
///   resolved against `current_dir`.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, current_dir: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir {
        if let Some(found) = find_by_path(&current_dir.join(path)) {
            return Some(found);
        }
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()),
        _ => find_by_path(&current_dir.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    path.is_file().then(|| path.to_path_buf())
}
