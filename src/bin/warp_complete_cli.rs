/*!
 * Warp Complete CLI
 *
 * Runs the completion engine for a single command line and prints the
 * candidates, either as JSON or as tab separated lines.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warp_complete::{
    extract_prefix, scan_search_path, CompletionContext, CompletionEngine, CompletionRequest,
    CompletionResponse, EngineConfig, ShellKind, ShellTokenizer, SpecCatalog, TokenSource,
};

#[derive(Parser)]
#[command(name = "warp_complete_cli")]
#[command(about = "Warp Complete - command line completion engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a command line at the cursor
    Complete {
        /// Command line text
        #[arg(short, long, allow_hyphen_values = true)]
        line: String,

        /// Byte offset of the cursor (end of line if not provided)
        #[arg(short, long)]
        cursor: Option<usize>,

        /// Working directory (current directory if not provided)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Shell name or path (default: $SHELL)
        #[arg(short, long)]
        shell: Option<String>,

        /// Directory of extra JSON/YAML specs
        #[arg(long)]
        specs: Option<PathBuf>,

        /// Engine config file (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit the full response as JSON
        #[arg(short, long)]
        json: bool,

        /// Keep only candidates starting with the typed prefix
        #[arg(short, long)]
        filter: bool,
    },

    /// List command labels in the spec catalog
    Specs {
        /// Directory of extra JSON/YAML specs
        #[arg(long)]
        specs: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Complete {
            line,
            cursor,
            cwd,
            shell,
            specs,
            config,
            json,
            filter,
        } => {
            let opts = CompleteOpts {
                line,
                cursor,
                cwd,
                shell,
                specs,
                config,
                json,
                filter,
            };
            complete(opts).await
        }
        Commands::Specs { specs } => list_specs(specs),
        Commands::Version => {
            println!("warp_complete_cli v{}", env!("CARGO_PKG_VERSION"));
            println!("Warp Complete command line completion engine");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WARP_COMPLETE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct CompleteOpts {
    line: String,
    cursor: Option<usize>,
    cwd: Option<PathBuf>,
    shell: Option<String>,
    specs: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
    filter: bool,
}

async fn complete(opts: CompleteOpts) -> Result<()> {
    // Offsets past the end are treated as end of line by the engine
    let cursor = opts.cursor.unwrap_or(opts.line.len());

    let config = match &opts.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let catalog = load_catalog(opts.specs.as_ref())?;

    let cwd = match opts.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let shell_kind = opts
        .shell
        .or_else(|| std::env::var("SHELL").ok())
        .and_then(|s| ShellKind::detect(&s));
    let token_type = ShellTokenizer
        .tokenize(&opts.line, cursor)
        .ok()
        .map(|cmd| cmd.token_type());
    let path_var = std::env::var("PATH").unwrap_or_default();

    let context = CompletionContext {
        available_executables: scan_search_path(&path_var),
        environment_variables: std::env::vars().collect(),
        current_working_directory: Some(cwd),
        shell_kind,
        token_type,
    };
    let request = CompletionRequest::new(&opts.line, cursor).with_context(context);

    let engine = CompletionEngine::new(catalog, config);
    let mut response = engine.complete(&request).await;

    if opts.filter {
        let prefix = extract_prefix(&opts.line, cursor);
        response.candidates.retain(|c| c.label.starts_with(prefix));
    }

    if opts.json {
        let out = serde_json::to_string_pretty(&response).context("Failed to encode response")?;
        println!("{}", out);
    } else {
        print_lines(&response);
    }
    Ok(())
}

fn print_lines(response: &CompletionResponse) {
    for c in &response.candidates {
        println!("{}\t{}\t{}", c.label, c.kind.as_str(), c.detail);
    }
}

fn list_specs(specs: Option<PathBuf>) -> Result<()> {
    let catalog = load_catalog(specs.as_ref())?;
    for spec in catalog.specs() {
        println!("{}", spec.name.join(", "));
    }
    Ok(())
}

fn load_catalog(dir: Option<&PathBuf>) -> Result<SpecCatalog> {
    let mut catalog = SpecCatalog::new();
    if let Some(dir) = dir {
        let count = catalog
            .load_from_directory(dir)
            .with_context(|| format!("Failed to load specs from {}", dir.display()))?;
        tracing::debug!(count, dir = %dir.display(), "cli.specs_loaded");
    }
    Ok(catalog)
}
