//! warp_complete - command line completion engine
//!
//! Given a partially typed command line and a cursor position, produces
//! ranked completion candidates from declarative command specs, the
//! executables on the search path and shell builtins.
//!
//! Modules:
//! - prefix: Fragment under the cursor and its replacement range
//! - tokens: Command line tokenization
//! - spec: Completion specification tree (Fig-compatible layout)
//! - post_process: Named transforms for generator output
//! - catalog: Ordered spec collection, builtin and file-loaded
//! - resolver: Walks tokens through a spec to the cursor context
//! - generators: Template and script generator execution
//! - executables: Executable entries and label matching
//! - shell: Shell kinds and cached builtin discovery
//! - cwd: Directory to list for path completion
//! - candidate: Output candidates and deduplication
//! - engine: Request/response aggregation
//! - config: Platform and generator settings
//! - error: Error type

pub mod candidate;
pub mod catalog;
pub mod config;
pub mod cwd;
pub mod engine;
pub mod error;
pub mod executables;
pub mod generators;
pub mod post_process;
pub mod prefix;
pub mod resolver;
pub mod shell;
pub mod spec;
pub mod tokens;

// Re-export key types for convenience
pub use candidate::{CompletionCandidate, CompletionKind};

pub use catalog::SpecCatalog;

pub use config::{EngineConfig, ExtensionMatching};

pub use cwd::resolve_cwd;

pub use engine::{
    CancellationCheck, CompletionContext, CompletionEngine, CompletionRequest,
    CompletionResponse,
};

pub use error::{CompletionError, Result};

pub use executables::{scan_search_path, ExecutableEntry};

pub use post_process::{GeneratedSuggestion, PostProcess};

pub use prefix::{extract_prefix, ReplacementRange};

pub use resolver::{resolve, ResolutionContext, SuggestionCategories};

pub use shell::{BuiltinCache, BuiltinSource, ShellBuiltinQuery, ShellKind, StaticBuiltins};

pub use spec::{ArgSpec, CommandSpec, GeneratorSpec, OptionSpec, SuggestionSpec, TemplateKind};

pub use tokens::{CommandLine, ShellTokenizer, Token, TokenSource, TokenType};

pub use tokio_util::sync::CancellationToken;
