//! Completion candidates
//!
//! Output types plus the label-deduplicating accumulator the engine fills.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::prefix::ReplacementRange;

/// What a candidate completes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// Command or subcommand
    Method,
    /// Option/flag
    Flag,
    Argument,
    Alias,
    Folder,
    File,
}

impl CompletionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionKind::Method => "method",
            CompletionKind::Flag => "flag",
            CompletionKind::Argument => "argument",
            CompletionKind::Alias => "alias",
            CompletionKind::Folder => "folder",
            CompletionKind::File => "file",
        }
    }
}

/// One completion offer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCandidate {
    pub label: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub replacement_start: usize,
    pub replacement_length: usize,
    pub kind: CompletionKind,
}

/// Ordered candidates, unique by label; the first writer wins
#[derive(Debug)]
pub struct CandidateSet {
    range: ReplacementRange,
    labels: HashSet<String>,
    candidates: Vec<CompletionCandidate>,
}

impl CandidateSet {
    pub fn new(range: ReplacementRange) -> Self {
        Self {
            range,
            labels: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    /// Add a candidate unless its label is already present
    pub fn push(
        &mut self,
        label: &str,
        kind: CompletionKind,
        description: Option<&str>,
    ) -> bool {
        if self.labels.contains(label) {
            return false;
        }
        self.labels.insert(label.to_string());
        self.candidates.push(CompletionCandidate {
            label: label.to_string(),
            detail: description.unwrap_or_default().to_string(),
            documentation: description.map(|d| format!("{}\n\n{}", label, d)),
            replacement_start: self.range.start,
            replacement_length: self.range.length,
            kind,
        });
        true
    }

    /// Add a candidate with explicit detail and no documentation
    pub fn push_detail(&mut self, label: &str, kind: CompletionKind, detail: &str) -> bool {
        if !self.push(label, kind, None) {
            return false;
        }
        if let Some(last) = self.candidates.last_mut() {
            last.detail = detail.to_string();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_vec(self) -> Vec<CompletionCandidate> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_label_wins() {
        let mut set = CandidateSet::new(ReplacementRange { start: 4, length: 2 });
        assert!(set.push("main", CompletionKind::Argument, Some("Current branch")));
        assert!(!set.push("main", CompletionKind::Method, None));
        assert!(set.push_detail("make", CompletionKind::Method, "/usr/bin/make"));

        let out = set.into_vec();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, CompletionKind::Argument);
        assert_eq!(out[0].documentation.as_deref(), Some("main\n\nCurrent branch"));
        assert_eq!(out[1].detail, "/usr/bin/make");
        assert_eq!(out[1].replacement_start, 4);
        assert_eq!(out[1].replacement_length, 2);
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in [CompletionKind::Method, CompletionKind::Flag, CompletionKind::Alias] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }
}
