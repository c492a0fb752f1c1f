//! Working directory resolution for path completion
//!
//! When a prefix such as `src/comp` is being completed, the host should
//! list `src/` rather than the shell's directory. Every failure falls back
//! to the shell's directory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::config::EngineConfig;
use crate::error::{CompletionError, Result};

/// Directory whose entries should be offered for `prefix`
pub async fn resolve_cwd(
    prefix: &str,
    cwd: &Path,
    env: &HashMap<String, String>,
    config: &EngineConfig,
) -> PathBuf {
    match try_resolve_cwd(prefix, cwd, env, config).await {
        Ok(dir) => dir,
        Err(e) => {
            tracing::debug!(error = %e, "cwd.unchanged");
            cwd.to_path_buf()
        }
    }
}

async fn try_resolve_cwd(
    prefix: &str,
    cwd: &Path,
    env: &HashMap<String, String>,
    config: &EngineConfig,
) -> Result<PathBuf> {
    let Some(portion) = directory_portion(prefix, config) else {
        return Ok(cwd.to_path_buf());
    };

    let expanded = shellexpand::tilde_with_context(portion, || {
        env.get("HOME").or_else(|| env.get("USERPROFILE"))
    });
    let resolved = normalize(&cwd.join(expanded.as_ref()));

    let metadata = fs::metadata(&resolved)
        .await
        .map_err(|e| CompletionError::DirectoryResolution {
            path: resolved.clone(),
            reason: e.to_string(),
        })?;
    if !metadata.is_dir() {
        return Err(CompletionError::DirectoryResolution {
            path: resolved,
            reason: "not a directory".into(),
        });
    }
    Ok(resolved)
}

/// Text before the last path separator. The alternate separator is only
/// consulted when the native one does not occur.
fn directory_portion<'a>(prefix: &'a str, config: &EngineConfig) -> Option<&'a str> {
    let (idx, sep) = prefix
        .rfind(config.path_separator)
        .map(|idx| (idx, config.path_separator))
        .or_else(|| {
            config
                .alt_path_separator
                .and_then(|alt| prefix.rfind(alt).map(|idx| (idx, alt)))
        })?;

    // A leading separator means the filesystem root
    if idx == 0 {
        return Some(&prefix[..sep.len_utf8()]);
    }
    Some(&prefix[..idx])
}

/// Lexically resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
