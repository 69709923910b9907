use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Session-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: variables visible to substitution and to spawned processes.
/// - `current_dir`: the working directory of the session.
///
/// It is imported from the process once, at session start. Afterwards every
/// change (assignments, `cd`) stays local to the session.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory used by built-ins and external processes.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let mut env = Self::empty();
        env.vars.extend(stdenv::vars());
        env
    }

    /// An environment without variables, rooted at the process working directory.
    pub fn empty() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
        }
    }

    /// Value of `key`, or the empty string when it is unset.
    pub fn get(&self, key: &str) -> String {
        self.get_var(key).unwrap_or_default()
    }

    /// Value of `key` if it is set.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve `path` against the session working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
