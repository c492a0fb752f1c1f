//! Executables on the search path
//!
//! Entries are normally supplied per request by the host. The label
//! matching rules here decide which spec a typed command word belongs to.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::candidate::CompletionKind;
use crate::config::ExtensionMatching;

/// A command reachable from the shell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableEntry {
    pub label: String,
    pub kind: CompletionKind,
    #[serde(default)]
    pub detail: Option<String>,
    /// The command an alias expands to
    #[serde(default)]
    pub definition_command: Option<String>,
}

impl ExecutableEntry {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: CompletionKind::Method,
            detail: None,
            definition_command: None,
        }
    }

    pub fn alias(label: &str, definition: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: CompletionKind::Alias,
            detail: Some(definition.to_string()),
            definition_command: Some(definition.to_string()),
        }
    }

    pub fn detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn is_alias(&self) -> bool {
        self.kind == CompletionKind::Alias
    }
}

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)\.[A-Za-z0-9_]+$").expect("valid extension regex"))
}

/// Drop one trailing `.ext` suffix, if present
pub fn strip_extension(label: &str) -> &str {
    extension_re()
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map_or(label, |m| m.as_str())
}

/// Whether a spec label offers completion for an executable label
pub fn spec_matches_executable(spec_label: &str, exe_label: &str, mode: ExtensionMatching) -> bool {
    match mode {
        ExtensionMatching::Prefix => exe_label.starts_with(spec_label),
        ExtensionMatching::Strip => {
            exe_label == spec_label || strip_extension(exe_label) == spec_label
        }
    }
}

/// Whether an already typed command word names `spec_label`
pub fn command_word_matches(spec_label: &str, word: &str, mode: ExtensionMatching) -> bool {
    match mode {
        ExtensionMatching::Prefix => word == spec_label,
        ExtensionMatching::Strip => word == spec_label || strip_extension(word) == spec_label,
    }
}

/// Resolve the command word through an alias definition, if one applies
pub fn resolve_alias<'a>(word: &'a str, executables: &'a [ExecutableEntry]) -> &'a str {
    executables
        .iter()
        .find(|e| e.label == word)
        .and_then(|e| e.definition_command.as_deref())
        .and_then(|def| def.split_whitespace().next())
        .unwrap_or(word)
}

/// List executables found in a `PATH`-style variable. First occurrence of a
/// label wins, matching shell lookup order.
pub fn scan_search_path(path_var: &str) -> Vec<ExecutableEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for dir in std::env::split_paths(path_var) {
        let Ok(read_dir) = fs::read_dir(&dir) else {
            continue;
        };
        let mut names: Vec<_> = read_dir
            .flatten()
            .filter(|e| is_executable(&e.path()))
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        names.sort();

        for name in names {
            if seen.insert(name.clone()) {
                let full = dir.join(&name);
                entries.push(ExecutableEntry::new(&name).detail(&full.display().to_string()));
            }
        }
    }

    tracing::debug!(count = entries.len(), "search_path.scanned");
    entries
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    const EXTENSIONS: &[&str] = &["exe", "cmd", "bat", "com", "ps1"];
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
