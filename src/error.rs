//! Error types for warp_complete
//!
//! Only catalog and config loading surface these to callers. Inside a
//! completion request every variant is logged and degraded into "fewer
//! candidates".

use std::path::PathBuf;

use thiserror::Error;

use crate::shell::ShellKind;

/// Errors produced while loading specs or resolving a completion request
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The token source could not produce tokens for the line
    #[error("tokenization unavailable: {0}")]
    TokenizationUnavailable(String),

    /// A script generator's command could not be started or awaited
    #[error("generator `{command}` failed to run: {source}")]
    GeneratorSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A script generator exited without printing anything
    #[error("generator `{command}` produced no output")]
    GeneratorOutputEmpty { command: String },

    /// A script generator ran past the configured timeout
    #[error("generator `{command}` timed out after {timeout_ms}ms")]
    GeneratorTimeout { command: String, timeout_ms: u64 },

    /// The directory portion of a path prefix did not resolve to a directory
    #[error("cannot resolve directory {}: {reason}", path.display())]
    DirectoryResolution { path: PathBuf, reason: String },

    /// No builtin command source exists for the shell
    #[error("no builtin command source for shell {0:?}")]
    UnknownShellKind(Option<ShellKind>),

    /// A spec document could not be parsed
    #[error("invalid spec in {origin}: {message}")]
    SpecParse { origin: String, message: String },

    /// A spec file or directory could not be read
    #[error("cannot read specs from {}: {source}", path.display())]
    SpecIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine configuration file could not be read or parsed
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CompletionError>;
