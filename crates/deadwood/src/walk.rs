//! Source walker: deterministic enumeration of analyzable files.

use crate::config::Config;
use crate::path_util::{relative_posix, PackageIndex};
use crate::{Diagnostic, DiagnosticKind, EngineError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One discovered source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub abs_path: PathBuf,
    /// Repository-relative POSIX path.
    pub rel_path: String,
    /// Dotted module path derived from `rel_path`.
    pub module: String,
}

/// Directory names never worth descending into, regardless of globs.
fn is_pruned_dir(name: &str) -> bool {
    matches!(
        name,
        "__pycache__" | ".git" | ".hg" | "venv" | ".venv" | "node_modules" | ".pytest_cache"
    )
}

/// Enumerates source files under `root`, honoring the configured
/// include/exclude globs, in lexicographic `rel_path` order.
///
/// A missing root is fatal; unreadable entries are skipped with a
/// diagnostic.
pub fn walk_sources(
    root: &Path,
    config: &Config,
) -> Result<(Vec<SourceFile>, Vec<Diagnostic>), EngineError> {
    let root = dunce::canonicalize(root)
        .map_err(|_| EngineError::RootNotFound(root.display().to_string()))?;
    if !root.is_dir() {
        return Err(EngineError::RootNotFound(root.display().to_string()));
    }

    let mut diagnostics = Vec::new();
    let mut discovered: Vec<(PathBuf, String)> = Vec::new();

    let walker = WalkDir::new(&root).into_iter().filter_entry(|e| {
        !(e.file_type().is_dir()
            && e.file_name()
                .to_str()
                .map(is_pruned_dir)
                .unwrap_or(false))
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Io,
                    e.path().and_then(|p| p.to_str()),
                    None,
                    format!("unreadable entry skipped: {e}"),
                ));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative_posix(&root, entry.path()) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Io,
                entry.path().to_str(),
                None,
                "non-UTF-8 path skipped".to_string(),
            ));
            continue;
        };
        if !config.include.is_match(&rel) || config.exclude.is_match(&rel) {
            continue;
        }
        discovered.push((entry.path().to_path_buf(), rel));
    }

    discovered.sort_by(|a, b| a.1.cmp(&b.1));

    let rels: Vec<&str> = discovered.iter().map(|(_, r)| r.as_str()).collect();
    let index = PackageIndex::from_files(&rels);

    let files = discovered
        .into_iter()
        .map(|(abs_path, rel_path)| {
            let module = index.module_path(&rel_path);
            SourceFile {
                abs_path,
                rel_path,
                module,
            }
        })
        .collect();

    Ok((files, diagnostics))
}
