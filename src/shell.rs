//! Shell kinds and builtin command names
//!
//! Builtins (`cd`, `export`, ...) are not files on the search path, so the
//! engine asks a [`BuiltinSource`] for them once per shell kind and keeps
//! the answer in its own [`BuiltinCache`].

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Duration};

use crate::error::{CompletionError, Result};

/// Supported shell types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl ShellKind {
    pub const ALL: [ShellKind; 4] = [
        ShellKind::Bash,
        ShellKind::Zsh,
        ShellKind::Fish,
        ShellKind::PowerShell,
    ];

    /// Shell kind from a path or program name (`/bin/zsh`, `-bash`,
    /// `pwsh.exe`). Shells without a builtin listing (`sh`, `tcsh`, `nu`, ...)
    /// yield `None`.
    pub fn detect(shell: &str) -> Option<Self> {
        let program = shell.rsplit(['/', '\\']).next().unwrap_or(shell);
        let name = program
            .trim_start_matches('-')
            .split('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let kind = match name.as_str() {
            "bash" => Some(ShellKind::Bash),
            "zsh" => Some(ShellKind::Zsh),
            "fish" => Some(ShellKind::Fish),
            "pwsh" | "powershell" => Some(ShellKind::PowerShell),
            _ => None,
        };
        if kind.is_none() {
            let e = CompletionError::UnknownShellKind(None);
            tracing::debug!(shell, error = %e, "shell.unrecognized");
        }
        kind
    }

    /// Command line that prints one builtin name per line
    fn builtin_query(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            ShellKind::Bash => ("bash", &["-c", "compgen -b"]),
            ShellKind::Zsh => ("zsh", &["-c", "print -rl -- ${(k)builtins}"]),
            ShellKind::Fish => ("fish", &["-c", "builtin -n"]),
            ShellKind::PowerShell => (
                "pwsh",
                &[
                    "-NoProfile",
                    "-Command",
                    "Get-Command -CommandType Cmdlet,Function | ForEach-Object { $_.Name }",
                ],
            ),
        }
    }
}

/// Provides builtin command names for a shell
#[async_trait]
pub trait BuiltinSource: Send + Sync {
    async fn builtins(&self, shell: ShellKind) -> Result<Vec<String>>;
}

/// Asks the installed shell for its builtins
#[derive(Clone, Debug)]
pub struct ShellBuiltinQuery {
    timeout_ms: u64,
}

impl ShellBuiltinQuery {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

#[async_trait]
impl BuiltinSource for ShellBuiltinQuery {
    async fn builtins(&self, shell: ShellKind) -> Result<Vec<String>> {
        let (program, args) = shell.builtin_query();
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompletionError::GeneratorSpawn {
                command: program.to_string(),
                source,
            })?;

        let output = timeout(Duration::from_millis(self.timeout_ms), child.wait_with_output())
            .await
            .map_err(|_| CompletionError::GeneratorTimeout {
                command: program.to_string(),
                timeout_ms: self.timeout_ms,
            })?
            .map_err(|source| CompletionError::GeneratorSpawn {
                command: program.to_string(),
                source,
            })?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Fixed builtin lists, for tests and hosts that already know them
#[derive(Clone, Debug, Default)]
pub struct StaticBuiltins {
    builtins: HashMap<ShellKind, Vec<String>>,
}

impl StaticBuiltins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, shell: ShellKind, names: &[&str]) -> Self {
        self.builtins
            .insert(shell, names.iter().map(|n| n.to_string()).collect());
        self
    }
}

#[async_trait]
impl BuiltinSource for StaticBuiltins {
    async fn builtins(&self, shell: ShellKind) -> Result<Vec<String>> {
        self.builtins
            .get(&shell)
            .cloned()
            .ok_or(CompletionError::UnknownShellKind(Some(shell)))
    }
}

/// Builtin names per shell kind, filled on first use and never invalidated
#[derive(Debug)]
pub struct BuiltinCache {
    cells: HashMap<ShellKind, OnceCell<Arc<Vec<String>>>>,
}

impl Default for BuiltinCache {
    fn default() -> Self {
        Self {
            cells: ShellKind::ALL
                .iter()
                .map(|kind| (*kind, OnceCell::new()))
                .collect(),
        }
    }
}

impl BuiltinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached builtins for `shell`, querying `source` the first time. A
    /// failed query caches an empty list.
    pub async fn get(&self, shell: ShellKind, source: &dyn BuiltinSource) -> Arc<Vec<String>> {
        let Some(cell) = self.cells.get(&shell) else {
            return Arc::new(Vec::new());
        };
        cell.get_or_init(|| async {
            match source.builtins(shell).await {
                Ok(names) => {
                    tracing::debug!(?shell, count = names.len(), "builtins.cached");
                    Arc::new(names)
                }
                Err(e) => {
                    tracing::debug!(?shell, error = %e, "builtins.unavailable");
                    Arc::new(Vec::new())
                }
            }
        })
        .await
        .clone()
    }

    pub fn is_cached(&self, shell: ShellKind) -> bool {
        self.cells.get(&shell).is_some_and(|c| c.initialized())
    }
}
