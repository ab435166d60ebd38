//! Import resolution against the project module set.
//!
//! Maps each [`ImportEdge`] to the project modules it executes and, when
//! statically known, the project symbol or module its local binding refers
//! to. Imports that leave the project are kept but marked `external` and
//! ignored by reachability.

use crate::ImportEdge;
use std::collections::{BTreeSet, HashSet};

/// Outcome of resolving one import edge.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub from_module: String,
    /// Local name bound by the import; `None` for star imports.
    pub binding: Option<String>,
    /// Name as written after `import` (`from x import NAME`), if any.
    pub imported_name: Option<String>,
    pub line: u32,
    pub is_star: bool,
    /// Target lies outside the project.
    pub external: bool,
    /// Project modules executed by this import (import-graph edges),
    /// including package ancestors.
    pub modules: Vec<String>,
    /// Project symbol the binding refers to, when statically known.
    pub symbol: Option<String>,
    /// Project module the binding refers to (bare or submodule imports).
    pub bound_module: Option<String>,
}

/// Resolves imports against the discovered module layout.
pub struct ImportResolver {
    modules: BTreeSet<String>,
    /// Modules backed by an `__init__.py` (packages).
    packages: HashSet<String>,
}

impl ImportResolver {
    pub fn new(modules: BTreeSet<String>, packages: HashSet<String>) -> Self {
        Self { modules, packages }
    }

    pub fn is_project_module(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    /// Resolves one edge. Never fails: unresolvable targets are `external`.
    pub fn resolve(&self, edge: &ImportEdge, symbols: &BTreeSet<String>) -> ResolvedImport {
        let mut out = ResolvedImport {
            from_module: edge.from_module.clone(),
            binding: edge.binding(),
            imported_name: edge.imported_name.clone(),
            line: edge.line,
            is_star: edge.is_star,
            external: true,
            modules: Vec::new(),
            symbol: None,
            bound_module: None,
        };

        let Some(target) = self.absolute_target(&edge.to_module, &edge.from_module) else {
            return out;
        };

        if edge.is_star {
            if self.modules.contains(&target) {
                out.external = false;
                out.modules = self.ancestors_in_project(&target);
            }
            return out;
        }

        match &edge.imported_name {
            None => {
                // `import a.b.c` — binds the root package, executes the chain.
                if self.modules.contains(&target) {
                    out.external = false;
                    out.modules = self.ancestors_in_project(&target);
                    let root = target.split('.').next().unwrap_or(&target);
                    if self.modules.contains(root) {
                        out.bound_module = Some(match &edge.alias {
                            // An alias binds the full target module, not the root.
                            Some(_) => target.clone(),
                            None => root.to_string(),
                        });
                    }
                }
            }
            Some(name) => {
                let submodule = format!("{target}.{name}");
                if self.modules.contains(&submodule) {
                    out.external = false;
                    out.modules = self.ancestors_in_project(&submodule);
                    out.bound_module = Some(submodule);
                } else if self.modules.contains(&target) {
                    out.external = false;
                    out.modules = self.ancestors_in_project(&target);
                    let qname = format!("{target}.{name}");
                    if symbols.contains(&qname) {
                        out.symbol = Some(qname);
                    }
                }
            }
        }

        out
    }

    /// Rewrites a possibly-relative import target to an absolute dotted path.
    fn absolute_target(&self, to_module: &str, from_module: &str) -> Option<String> {
        let dots = to_module.chars().take_while(|&c| c == '.').count();
        if dots == 0 {
            return Some(to_module.to_string());
        }

        // One dot means the containing package; each extra dot climbs once.
        let mut base: Vec<&str> = from_module.split('.').collect();
        if !self.packages.contains(from_module) {
            base.pop();
        }
        for _ in 1..dots {
            if base.is_empty() {
                return None;
            }
            base.pop();
        }

        let rest = &to_module[dots..];
        let mut parts = base;
        if !rest.is_empty() {
            parts.extend(rest.split('.'));
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("."))
    }

    /// `a.b.c` → every prefix that is a project module, shallowest first.
    fn ancestors_in_project(&self, module: &str) -> Vec<String> {
        let parts: Vec<&str> = module.split('.').collect();
        let mut out = Vec::new();
        for end in 1..=parts.len() {
            let prefix = parts[..end].join(".");
            if self.modules.contains(&prefix) {
                out.push(prefix);
            }
        }
        out
    }
}
