//! Script generator post-processing
//!
//! Spec files refer to transforms by name; the name is bound to a plain
//! function pointer when the spec is deserialized. Nothing is interpreted
//! at completion time.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A suggestion produced by a script generator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSuggestion {
    /// One or more labels; every alias becomes its own candidate
    pub names: Vec<String>,
    pub description: Option<String>,
}

impl GeneratedSuggestion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Maps (process stdout, current token texts) to suggestions
pub type PostProcessFn = fn(&str, &[String]) -> Vec<GeneratedSuggestion>;

/// A named, statically registered transform
#[derive(Clone, Copy)]
pub struct PostProcess {
    name: &'static str,
    func: PostProcessFn,
}

impl PostProcess {
    /// Look up a registered transform by name
    pub fn lookup(name: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|&(name, func)| Self { name, func })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, output: &str, tokens: &[String]) -> Vec<GeneratedSuggestion> {
        (self.func)(output, tokens)
    }

    /// Names of every registered transform
    pub fn registered() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(name, _)| *name)
    }
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            name: "lines",
            func: lines,
        }
    }
}

impl fmt::Debug for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PostProcess").field(&self.name).finish()
    }
}

impl PartialEq for PostProcess {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Serialize for PostProcess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for PostProcess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        PostProcess::lookup(&name).ok_or_else(|| {
            de::Error::custom(format!("unknown post-process transform `{}`", name))
        })
    }
}

const REGISTRY: &[(&str, PostProcessFn)] = &[
    ("lines", lines),
    ("gitBranches", git_branches),
    ("gitRemotes", git_remotes),
    ("keyValue", key_value),
];

/// One suggestion per non-empty line
fn lines(output: &str, _tokens: &[String]) -> Vec<GeneratedSuggestion> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(GeneratedSuggestion::new)
        .collect()
}

/// Output of `git branch --no-color`
fn git_branches(output: &str, _tokens: &[String]) -> Vec<GeneratedSuggestion> {
    output
        .lines()
        .filter(|line| !line.contains("HEAD ->") && !line.contains("HEAD detached"))
        .filter_map(|line| {
            let current = line.starts_with('*');
            let name = line.trim_start_matches('*').trim();
            if name.is_empty() {
                return None;
            }
            let description = if current { "Current branch" } else { "Branch" };
            Some(GeneratedSuggestion::new(name).with_description(description))
        })
        .collect()
}

/// Output of `git remote -v`: `name<TAB>url (fetch|push)`
fn git_remotes(output: &str, _tokens: &[String]) -> Vec<GeneratedSuggestion> {
    let mut seen = HashSet::new();
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            if !seen.insert(name.to_string()) {
                return None;
            }
            let suggestion = GeneratedSuggestion::new(name);
            Some(match parts.next() {
                Some(url) => suggestion.with_description(url),
                None => suggestion,
            })
        })
        .collect()
}

/// `alias[,alias...]<TAB>description` per line
fn key_value(output: &str, _tokens: &[String]) -> Vec<GeneratedSuggestion> {
    output
        .lines()
        .filter_map(|line| {
            let (names, description) = match line.split_once('\t') {
                Some((names, description)) => (names, Some(description.trim())),
                None => (line, None),
            };
            let names: Vec<String> = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect();
            if names.is_empty() {
                return None;
            }
            Some(GeneratedSuggestion {
                names,
                description: description.filter(|d| !d.is_empty()).map(String::from),
            })
        })
        .collect()
}
