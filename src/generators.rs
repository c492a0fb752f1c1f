//! Generator execution
//!
//! Template generators only raise path-listing flags. Script generators run
//! an external command once, with a timeout, and hand stdout to their
//! post-process transform. A failing generator contributes nothing and
//! never stops the others.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::config::EngineConfig;
use crate::error::{CompletionError, Result};
use crate::post_process::GeneratedSuggestion;
use crate::spec::{ArgSpec, GeneratorSpec, ScriptGenerator, TemplateKind};

/// What an argument's generators contributed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorOutput {
    pub files_requested: bool,
    pub folders_requested: bool,
    pub suggestions: Vec<GeneratedSuggestion>,
}

/// Evaluates the generators of one argument
#[derive(Clone, Debug)]
pub struct GeneratorExecutor {
    timeout_ms: u64,
    cwd: Option<PathBuf>,
}

impl GeneratorExecutor {
    pub fn new(config: &EngineConfig, cwd: Option<&Path>) -> Self {
        Self {
            timeout_ms: config.generator_timeout_ms,
            cwd: cwd.map(Path::to_path_buf),
        }
    }

    /// Run every generator of `arg` in declaration order
    pub async fn run(&self, arg: &ArgSpec, tokens: &[String]) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();

        for generator in arg.all_generators() {
            match generator.as_ref() {
                GeneratorSpec::Template(TemplateKind::Filepaths) => output.files_requested = true,
                GeneratorSpec::Template(TemplateKind::Folders) => output.folders_requested = true,
                GeneratorSpec::Script(script) => match self.run_script(script, tokens).await {
                    Ok(items) => output.suggestions.extend(items),
                    Err(e) => tracing::debug!(error = %e, "generator.skipped"),
                },
            }
        }

        output
    }

    async fn run_script(
        &self,
        script: &ScriptGenerator,
        tokens: &[String],
    ) -> Result<Vec<GeneratedSuggestion>> {
        let mut cmd = Command::new(&script.command);
        cmd.args(&script.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|source| CompletionError::GeneratorSpawn {
            command: script.command.clone(),
            source,
        })?;

        let output = timeout(Duration::from_millis(self.timeout_ms), child.wait_with_output())
            .await
            .map_err(|_| CompletionError::GeneratorTimeout {
                command: script.command.clone(),
                timeout_ms: self.timeout_ms,
            })?
            .map_err(|source| CompletionError::GeneratorSpawn {
                command: script.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(CompletionError::GeneratorOutputEmpty {
                command: script.command.clone(),
            });
        }

        let items = script.post_process.apply(&stdout, tokens);
        tracing::trace!(
            command = %script.command,
            post_process = script.post_process.name(),
            count = items.len(),
            "generator.finished"
        );
        Ok(items)
    }
}
