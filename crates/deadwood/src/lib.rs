//! # Deadwood: static dead-code analysis for Python web applications
//!
//! **Role**: Builds a cross-module symbol/usage graph from a Python source
//! tree, resolves imports, recognizes framework entrypoints (Flask routes,
//! Celery tasks, pytest fixtures, …) via pluggable rules, runs reachability
//! from the entrypoint set, and scores every definition with a 0–100 deletion
//! confidence plus a machine-readable reason trace.
//!
//! **Core Types**:
//! - [`Symbol`]: one definition (function, method, class, variable, import).
//! - [`Usage`]: one reference, attributed to its enclosing caller.
//! - [`ImportEdge`]: one imported name, before resolution.
//! - [`Diagnostic`]: non-fatal problems accumulated onto the report.
//!
//! The engine is a pure function of `(root, config)`: see
//! [`pipeline::analyze`]. No component mutates another's data; each stage
//! freezes its output before the next one runs.

pub mod collect;
pub mod config;
pub mod graph;
pub mod imports;
pub mod noqa;
pub mod parser;
pub mod path_util;
pub mod pipeline;
pub mod plugins;
pub mod report;
pub mod resolve;
pub mod score;
pub mod walk;

pub use config::Config;
pub use pipeline::{analyze, analyze_with_cancel, CancelToken};
pub use report::Report;

use serde::Serialize;
use std::collections::BTreeSet;

/// Python definition kinds tracked by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// `def foo(): ...` at module (or nested function) scope.
    Function,
    /// `def method(self): ...` inside a class body.
    Method,
    /// `class Foo: ...`
    Class,
    /// `x = 42` at module or class scope.
    Variable,
    /// One local binding created by an `import` / `from … import` statement.
    Import,
}

impl SymbolKind {
    /// Report label for the serialized item `type` field.
    pub fn report_label(self) -> &'static str {
        match self {
            SymbolKind::Function => "unused_function",
            SymbolKind::Method => "unused_method",
            SymbolKind::Class => "unused_class",
            SymbolKind::Variable => "unused_variable",
            SymbolKind::Import => "unused_import",
        }
    }
}

/// Source position of a definition or reference.
///
/// `file` is the repository-relative POSIX path; `line` is 1-indexed,
/// `col` is 0-indexed (tree-sitter columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

/// One definition extracted from a source file.
///
/// `qualified_name` is the unique key: `<module>.<name>`, or
/// `<module>.<Class>.<method>` for methods. Redefinitions within a module
/// keep the last definition and surface a single diagnostic.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub qualified_name: String,
    /// Leaf identifier.
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    /// Normalized decorator strings in source order (see `collect`).
    pub decorators: Vec<String>,
    /// Set by the entrypoint recognizer.
    pub is_entrypoint: bool,
    /// All matching recognizer reasons, e.g. `"flask:*.route"`.
    pub entrypoint_reasons: Vec<String>,
    /// Qualified name of the enclosing class (methods only).
    pub parent_class: Option<String>,
    /// Base-class expressions as written (classes only), e.g. `"db.Model"`.
    pub base_classes: Vec<String>,
    /// Suppression codes in effect on the definition line.
    pub noqa_codes: BTreeSet<String>,
    /// Body performs a non-literal dynamic attribute lookup.
    pub dynamic_risk: bool,
}

impl Symbol {
    /// Returns `true` for dunder names (`__init__`, `__repr__`, …).
    pub fn is_dunder(&self) -> bool {
        self.name.starts_with("__") && self.name.ends_with("__") && self.name.len() > 4
    }

    /// Returns `true` for single-leading-underscore private names.
    /// Dunders are not considered private.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_') && !self.name.starts_with("__")
    }
}

/// Reference kinds emitted by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    /// `f(…)` or `a.b(…)`.
    Call,
    /// `a.b.c` outside a call.
    Attribute,
    /// Imported name at an import statement.
    ImportRef,
    /// Bare identifier in an expression.
    NameRef,
    /// Outermost callable of a decorator expression.
    DecoratorRef,
}

/// One reference to a name, attributed to the nearest enclosing
/// function/method (`caller`), or to module scope when `caller` is absent.
#[derive(Debug, Clone)]
pub struct Usage {
    /// Leaf identifier as it appears.
    pub name: String,
    /// Full dotted form when statically known (`"app.route"`).
    pub attribute_chain: Option<String>,
    pub kind: UsageKind,
    pub location: Location,
    /// Qualified name of the enclosing FUNCTION/METHOD symbol, if any.
    pub caller: Option<String>,
    /// Reference occurs inside a module-level `if __name__ == "__main__"` block.
    pub in_main_block: bool,
}

/// One imported name, as written. Resolution happens in [`imports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    /// Importing module.
    pub from_module: String,
    /// Target as written: `"pkg.mod"`, `".utils"`, `"..core"`.
    pub to_module: String,
    /// `Some("c")` for `from a.b import c`; `None` for bare imports.
    pub imported_name: Option<String>,
    /// Local alias (`import a.b as ab`, `from x import y as z`).
    pub alias: Option<String>,
    pub is_star: bool,
    /// 1-indexed line of the import statement.
    pub line: u32,
}

impl ImportEdge {
    /// The local name this import binds in its module, `None` for star imports.
    pub fn binding(&self) -> Option<String> {
        if self.is_star {
            return None;
        }
        if let Some(alias) = &self.alias {
            return Some(alias.clone());
        }
        match &self.imported_name {
            Some(name) => Some(name.clone()),
            // `import a.b.c` binds the root package name `a`.
            None => self
                .to_module
                .split('.')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Non-fatal problem categories (§7 error policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Io,
    Parse,
    FileTooLarge,
    Redefinition,
    DynamicAttribute,
    ResolveAmbiguity,
    UnknownEntrypoint,
}

/// A diagnostic accumulated onto the report. Diagnostics never replace the
/// items array.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: Option<&str>, line: Option<u32>, message: String) -> Self {
        Self {
            kind,
            file: file.map(str::to_string),
            line,
            message,
        }
    }
}

/// Fatal errors. Everything else is a [`Diagnostic`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed configuration — surfaced before any work (§7).
    #[error("configuration error: {0}")]
    Config(String),

    /// The analysis root does not exist or is not a directory.
    #[error("analysis root not found: {0}")]
    RootNotFound(String),

    /// I/O error outside the per-file skip policy (e.g. walking the root).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree-sitter failed to load the Python grammar.
    #[error("parser initialization failed: {0}")]
    Parser(String),

    /// Cooperative cancellation was requested; no result is produced.
    #[error("analysis cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_symbol(name: &str) -> Symbol {
        Symbol {
            qualified_name: format!("mod.{name}"),
            name: name.into(),
            kind: SymbolKind::Function,
            location: Location {
                file: "mod.py".into(),
                line: 1,
                col: 0,
            },
            decorators: vec![],
            is_entrypoint: false,
            entrypoint_reasons: vec![],
            parent_class: None,
            base_classes: vec![],
            noqa_codes: BTreeSet::new(),
            dynamic_risk: false,
        }
    }

    #[test]
    fn test_is_dunder() {
        assert!(make_symbol("__init__").is_dunder());
        assert!(make_symbol("__tablename__").is_dunder());
        assert!(!make_symbol("__").is_dunder());
        assert!(!make_symbol("_private").is_dunder());
        assert!(!make_symbol("plain").is_dunder());
    }

    #[test]
    fn test_is_private() {
        assert!(make_symbol("_helper").is_private());
        assert!(!make_symbol("__init__").is_private());
        assert!(!make_symbol("helper").is_private());
    }

    #[test]
    fn test_report_labels() {
        assert_eq!(SymbolKind::Function.report_label(), "unused_function");
        assert_eq!(SymbolKind::Method.report_label(), "unused_method");
        assert_eq!(SymbolKind::Class.report_label(), "unused_class");
        assert_eq!(SymbolKind::Variable.report_label(), "unused_variable");
        assert_eq!(SymbolKind::Import.report_label(), "unused_import");
    }

    #[test]
    fn test_import_binding_alias() {
        let edge = ImportEdge {
            from_module: "app".into(),
            to_module: "pkg.tasks".into(),
            imported_name: Some("send".into()),
            alias: Some("send_task".into()),
            is_star: false,
            line: 1,
        };
        assert_eq!(edge.binding().as_deref(), Some("send_task"));
    }

    #[test]
    fn test_import_binding_bare_import_binds_root() {
        let edge = ImportEdge {
            from_module: "app".into(),
            to_module: "a.b.c".into(),
            imported_name: None,
            alias: None,
            is_star: false,
            line: 1,
        };
        assert_eq!(edge.binding().as_deref(), Some("a"));
    }

    #[test]
    fn test_import_binding_star_is_none() {
        let edge = ImportEdge {
            from_module: "app".into(),
            to_module: "pkg".into(),
            imported_name: None,
            alias: None,
            is_star: true,
            line: 1,
        };
        assert!(edge.binding().is_none());
    }
}
