//! Completion engine
//!
//! Turns a command line, cursor and host context into an ordered list of
//! candidates. Specs are visited sequentially in catalog order, so the
//! output order is deterministic:
//!
//! - command position: spec labels with a matching executable, then every
//!   remaining executable (path and shell builtins), plus a path request
//! - later positions: for the spec owning the command word, arguments
//!   (generators, then literal suggestions), subcommands, options
//!
//! Nothing here returns an error. Failures degrade into fewer candidates.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::candidate::{CandidateSet, CompletionCandidate, CompletionKind};
use crate::catalog::SpecCatalog;
use crate::config::EngineConfig;
use crate::cwd::resolve_cwd;
use crate::error::CompletionError;
use crate::executables::{
    command_word_matches, resolve_alias, spec_matches_executable, ExecutableEntry,
};
use crate::generators::GeneratorExecutor;
use crate::prefix::{extract_prefix, floor_char_boundary, ReplacementRange};
use crate::resolver::resolve;
use crate::shell::{BuiltinCache, BuiltinSource, ShellBuiltinQuery, ShellKind};
use crate::spec::CommandSpec;
use crate::tokens::{CommandLine, ShellTokenizer, TokenSource, TokenType};

/// Host-provided context for one request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionContext {
    #[serde(default)]
    pub available_executables: Vec<ExecutableEntry>,
    #[serde(default)]
    pub environment_variables: HashMap<String, String>,
    #[serde(default)]
    pub current_working_directory: Option<PathBuf>,
    #[serde(default)]
    pub shell_kind: Option<ShellKind>,
    /// Overrides the tokenizer's idea of the cursor position
    #[serde(default)]
    pub token_type: Option<TokenType>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub command_line: String,
    pub cursor_position: usize,
    #[serde(default)]
    pub context: CompletionContext,
}

impl CompletionRequest {
    pub fn new(command_line: &str, cursor_position: usize) -> Self {
        Self {
            command_line: command_line.to_string(),
            cursor_position,
            context: CompletionContext::default(),
        }
    }

    /// Request with the cursor at the end of the line
    pub fn at_end(command_line: &str) -> Self {
        Self::new(command_line, command_line.len())
    }

    pub fn with_context(mut self, context: CompletionContext) -> Self {
        self.context = context;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub candidates: Vec<CompletionCandidate>,
    pub files_requested: bool,
    pub folders_requested: bool,
    /// Directory to list when paths were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_cwd: Option<PathBuf>,
}

impl CompletionResponse {
    pub fn labels(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.label.as_str()).collect()
    }
}

/// Cooperative cancellation, polled between specs
pub trait CancellationCheck: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl CancellationCheck for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

/// Mutable state of one request
struct Aggregation {
    candidates: CandidateSet,
    files_requested: bool,
    folders_requested: bool,
    found_arg_context: bool,
}

impl Aggregation {
    fn into_response(self, resolved_cwd: Option<PathBuf>) -> CompletionResponse {
        CompletionResponse {
            candidates: self.candidates.into_vec(),
            files_requested: self.files_requested,
            folders_requested: self.folders_requested,
            resolved_cwd,
        }
    }
}

/// The main completion engine
pub struct CompletionEngine {
    catalog: SpecCatalog,
    config: EngineConfig,
    tokenizer: Box<dyn TokenSource>,
    builtins: Option<Box<dyn BuiltinSource>>,
    builtin_cache: BuiltinCache,
}

impl CompletionEngine {
    pub fn new(catalog: SpecCatalog, config: EngineConfig) -> Self {
        let builtins: Option<Box<dyn BuiltinSource>> = if config.query_shell_builtins {
            Some(Box::new(ShellBuiltinQuery::new(config.generator_timeout_ms)))
        } else {
            None
        };
        Self {
            catalog,
            config,
            tokenizer: Box::new(ShellTokenizer),
            builtins,
            builtin_cache: BuiltinCache::new(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: impl TokenSource + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn with_builtin_source(mut self, source: impl BuiltinSource + 'static) -> Self {
        self.builtins = Some(Box::new(source));
        self
    }

    pub fn catalog(&self) -> &SpecCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get completions for a request
    pub async fn complete(&self, request: &CompletionRequest) -> CompletionResponse {
        self.complete_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Get completions, returning early with partial results once `cancel`
    /// reports cancellation
    pub async fn complete_with_cancel(
        &self,
        request: &CompletionRequest,
        cancel: &dyn CancellationCheck,
    ) -> CompletionResponse {
        let context = &request.context;
        let prefix = extract_prefix(&request.command_line, request.cursor_position);
        let range = ReplacementRange::for_prefix(request.cursor_position, prefix);

        let mut acc = Aggregation {
            candidates: CandidateSet::new(range),
            files_requested: false,
            folders_requested: false,
            found_arg_context: false,
        };

        let command_line = match &context.current_working_directory {
            Some(_) => self
                .tokenizer
                .tokenize(&request.command_line, request.cursor_position),
            None => Err(CompletionError::TokenizationUnavailable(
                "no working directory".into(),
            )),
        };

        let token_type = context
            .token_type
            .or_else(|| command_line.as_ref().ok().map(CommandLine::token_type))
            .unwrap_or_else(|| guess_token_type(&request.command_line, request.cursor_position));

        match token_type {
            TokenType::Command => {
                if !self.complete_command_name(context, cancel, &mut acc).await {
                    return acc.into_response(None);
                }
            }
            TokenType::Other => match &command_line {
                Ok(command_line) => {
                    let finished = self
                        .complete_arguments(command_line, context, cancel, &mut acc)
                        .await;
                    if !finished {
                        return acc.into_response(None);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "complete.spec_pass_skipped"),
            },
        }

        if acc.candidates.is_empty()
            && !acc.files_requested
            && !acc.folders_requested
            && !acc.found_arg_context
        {
            acc.files_requested = true;
            acc.folders_requested = true;
        }

        let resolved_cwd = match &context.current_working_directory {
            Some(cwd) if acc.files_requested || acc.folders_requested => Some(
                resolve_cwd(prefix, cwd, &context.environment_variables, &self.config).await,
            ),
            _ => None,
        };

        tracing::debug!(
            candidates = acc.candidates.len(),
            files = acc.files_requested,
            folders = acc.folders_requested,
            "complete.finished"
        );
        acc.into_response(resolved_cwd)
    }

    /// Command position. Returns false when cancelled.
    async fn complete_command_name(
        &self,
        context: &CompletionContext,
        cancel: &dyn CancellationCheck,
        acc: &mut Aggregation,
    ) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let executables = self.executables_for(context).await;
        let mode = self.config.extension_matching;

        for spec in self.catalog.specs() {
            if cancel.is_cancelled() {
                tracing::debug!("complete.cancelled");
                return false;
            }
            for label in &spec.name {
                let offered = executables
                    .iter()
                    .any(|e| !e.is_alias() && spec_matches_executable(label, &e.label, mode));
                if offered {
                    acc.candidates
                        .push(label, CompletionKind::Method, spec.description.as_deref());
                }
            }
        }

        for exe in &executables {
            acc.candidates
                .push_detail(&exe.label, exe.kind, exe.detail.as_deref().unwrap_or_default());
        }

        acc.files_requested = true;
        acc.folders_requested = true;
        true
    }

    /// Later positions. Returns false when cancelled.
    async fn complete_arguments(
        &self,
        command_line: &CommandLine,
        context: &CompletionContext,
        cancel: &dyn CancellationCheck,
        acc: &mut Aggregation,
    ) -> bool {
        let word = command_line.command_word().unwrap_or_default();
        let definition = resolve_alias(word, &context.available_executables);
        let tokens: Vec<&str> = command_line
            .argument_tokens()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        let token_texts = command_line.token_texts();
        let executor =
            GeneratorExecutor::new(&self.config, context.current_working_directory.as_deref());

        for spec in self.catalog.specs() {
            if cancel.is_cancelled() {
                tracing::debug!("complete.cancelled");
                return false;
            }
            if !self.owns_command(spec, word, definition) {
                continue;
            }

            let ctx = resolve(spec, &tokens[..]);
            tracing::debug!(
                spec = ?spec.name.first(),
                categories = ?ctx.categories,
                "complete.resolved"
            );

            if ctx.categories.arguments {
                if let Some(arg) = ctx.arg {
                    acc.found_arg_context = true;
                    let generated = executor.run(arg, &token_texts).await;
                    acc.files_requested |= generated.files_requested;
                    acc.folders_requested |= generated.folders_requested;
                    for item in &generated.suggestions {
                        for name in &item.names {
                            acc.candidates.push(
                                name,
                                CompletionKind::Argument,
                                item.description.as_deref(),
                            );
                        }
                    }
                    for suggestion in &arg.suggestions {
                        for name in &suggestion.name {
                            acc.candidates.push(
                                name,
                                CompletionKind::Argument,
                                suggestion.description.as_deref(),
                            );
                        }
                    }
                }
            }

            if ctx.categories.subcommands {
                for sub in ctx.subcommands {
                    for label in &sub.name {
                        acc.candidates
                            .push(label, CompletionKind::Method, sub.description.as_deref());
                    }
                }
            }

            if ctx.categories.options {
                for option in &ctx.options {
                    for label in &option.name {
                        acc.candidates
                            .push(label, CompletionKind::Flag, option.description.as_deref());
                    }
                }
            }
        }
        true
    }

    fn owns_command(&self, spec: &CommandSpec, word: &str, definition: &str) -> bool {
        let mode = self.config.extension_matching;
        spec.name.iter().any(|label| {
            command_word_matches(label, word, mode) || command_word_matches(label, definition, mode)
        })
    }

    /// Request executables followed by shell builtins not already present
    async fn executables_for(&self, context: &CompletionContext) -> Vec<ExecutableEntry> {
        let mut executables = context.available_executables.clone();

        let (Some(shell), Some(source)) = (context.shell_kind, self.builtins.as_deref()) else {
            let e = CompletionError::UnknownShellKind(context.shell_kind);
            tracing::debug!(error = %e, "complete.builtins_skipped");
            return executables;
        };

        let builtins = self.builtin_cache.get(shell, source).await;
        for name in builtins.iter() {
            if !executables.iter().any(|e| &e.label == name) {
                executables.push(ExecutableEntry::new(name).detail("Shell builtin"));
            }
        }
        executables
    }
}

/// Token type when no tokenizer output is available
fn guess_token_type(line: &str, cursor: usize) -> TokenType {
    let before = &line[..floor_char_boundary(line, cursor)];
    if before.trim_start().contains(char::is_whitespace) {
        TokenType::Other
    } else {
        TokenType::Command
    }
}
