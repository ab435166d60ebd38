//! Path normalization and ModulePath derivation.
//!
//! File paths are repository-relative POSIX strings (forward slashes, no
//! leading `./`). Module paths are dotted names with `__init__` components
//! collapsed: `pkg/sub/__init__.py` → `pkg.sub`.

use std::collections::HashSet;
use std::path::Path;

/// Converts a path under `root` to the canonical repository-relative form.
///
/// Returns `None` when `path` is not under `root` or contains non-UTF-8
/// components.
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

/// Directory index used to derive module paths.
///
/// A directory is a package iff it contains `__init__.py` or directly
/// contains any source file. Leading non-package directories (e.g. a bare
/// `src/` holder) are stripped from module paths.
#[derive(Debug, Default)]
pub struct PackageIndex {
    package_dirs: HashSet<String>,
}

impl PackageIndex {
    /// Builds the index from the repository-relative paths of all discovered
    /// source files.
    pub fn from_files<S: AsRef<str>>(rel_files: &[S]) -> Self {
        let mut package_dirs = HashSet::new();
        for rel in rel_files {
            let rel = rel.as_ref();
            if let Some(dir) = parent_dir(rel) {
                // Directly contains a source file.
                package_dirs.insert(dir.to_string());
            }
            if file_name(rel) == "__init__.py" {
                if let Some(dir) = parent_dir(rel) {
                    package_dirs.insert(dir.to_string());
                }
            }
        }
        Self { package_dirs }
    }

    fn is_package(&self, dir: &str) -> bool {
        self.package_dirs.contains(dir)
    }

    /// Derives the dotted module path for a repository-relative file path.
    ///
    /// The longest trailing run of package directories is kept; directories
    /// above that run act as source roots and are stripped.
    pub fn module_path(&self, rel: &str) -> String {
        let name = file_name(rel);
        let stem = name.strip_suffix(".py").unwrap_or(name);

        let dirs: Vec<&str> = match parent_dir(rel) {
            Some(dir) if !dir.is_empty() => dir.split('/').collect(),
            _ => Vec::new(),
        };

        // First index from which every directory down to the file is a package.
        let mut cut = dirs.len();
        for k in 0..dirs.len() {
            let all_packages = (k..dirs.len()).all(|j| self.is_package(&dirs[..=j].join("/")));
            if all_packages {
                cut = k;
                break;
            }
        }

        let mut components: Vec<&str> = dirs[cut..].to_vec();
        if stem != "__init__" {
            components.push(stem);
        }

        if components.is_empty() {
            // `__init__.py` at the analysis root keeps its own stem.
            return stem.to_string();
        }
        components.join(".")
    }
}

fn file_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

fn parent_dir(rel: &str) -> Option<&str> {
    match rel.rfind('/') {
        Some(idx) => Some(&rel[..idx]),
        None => Some(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_posix() {
        let root = PathBuf::from("/proj");
        let path = PathBuf::from("/proj/pkg/sub/mod.py");
        assert_eq!(
            relative_posix(&root, &path).as_deref(),
            Some("pkg/sub/mod.py")
        );
        assert!(relative_posix(&root, &PathBuf::from("/other/x.py")).is_none());
    }

    #[test]
    fn test_flat_module() {
        let index = PackageIndex::from_files(&["app.py"]);
        assert_eq!(index.module_path("app.py"), "app");
    }

    #[test]
    fn test_namespace_directory_kept() {
        // `utils/` has no __init__.py but directly contains a source file.
        let index = PackageIndex::from_files(&["app.py", "utils/old.py"]);
        assert_eq!(index.module_path("utils/old.py"), "utils.old");
    }

    #[test]
    fn test_init_collapses() {
        let index = PackageIndex::from_files(&["pkg/__init__.py", "pkg/sub/__init__.py"]);
        assert_eq!(index.module_path("pkg/__init__.py"), "pkg");
        assert_eq!(index.module_path("pkg/sub/__init__.py"), "pkg.sub");
    }

    #[test]
    fn test_src_layout_stripped() {
        // `src/` holds no source files itself and has no __init__.py, so it is
        // a source root, not a package.
        let index = PackageIndex::from_files(&["src/pkg/__init__.py", "src/pkg/core.py"]);
        assert_eq!(index.module_path("src/pkg/core.py"), "pkg.core");
        assert_eq!(index.module_path("src/pkg/__init__.py"), "pkg");
    }

    #[test]
    fn test_root_init() {
        let index = PackageIndex::from_files(&["__init__.py"]);
        assert_eq!(index.module_path("__init__.py"), "__init__");
    }
}
