//! Usage → symbol candidate resolution.
//!
//! Links each collected [`Usage`] to the project symbols it may refer to,
//! using per-module binding tables built from local definitions and resolved
//! imports, plus the conservative method heuristic: `x.m()` links to every
//! method named `m` on a class visible in the caller's module or one of its
//! project ancestors. Ties are preserved as multiple candidates and recorded
//! as `ResolveAmbiguity` diagnostics.

use crate::imports::ResolvedImport;
use crate::{Diagnostic, DiagnosticKind, Symbol, SymbolKind, Usage, UsageKind};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Class inheritance index over the project's CLASS symbols.
///
/// Bases are tracked by leaf name: without type inference, `Base` in
/// `class D(pkg.Base)` and `class D(Base)` are the same ancestor.
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    /// class qname → base expressions as written.
    bases: HashMap<String, Vec<String>>,
    /// base leaf name → project class qnames carrying that name.
    by_leaf: HashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    pub fn build(symbols: &BTreeMap<String, Symbol>) -> Self {
        let mut bases: HashMap<String, Vec<String>> = HashMap::new();
        let mut by_leaf: HashMap<String, Vec<String>> = HashMap::new();
        for symbol in symbols.values() {
            if symbol.kind != SymbolKind::Class {
                continue;
            }
            bases.insert(symbol.qualified_name.clone(), symbol.base_classes.clone());
            by_leaf
                .entry(symbol.name.clone())
                .or_default()
                .push(symbol.qualified_name.clone());
        }
        Self { bases, by_leaf }
    }

    /// True when `class_qname` transitively inherits from a base whose leaf
    /// name is `base_leaf` (external bases included).
    pub fn inherits_from(&self, class_qname: &str, base_leaf: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![class_qname];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(bases) = self.bases.get(current) else {
                continue;
            };
            for base in bases {
                let leaf = base.rsplit('.').next().unwrap_or(base);
                if leaf == base_leaf {
                    return true;
                }
                if let Some(classes) = self.by_leaf.get(leaf) {
                    for qname in classes {
                        stack.push(qname);
                    }
                }
            }
        }
        false
    }

    /// The class itself plus every project class it transitively inherits
    /// from (matched by base leaf name), in deterministic order.
    pub fn project_ancestors(&self, class_qname: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![class_qname.to_string()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            out.push(current.clone());
            let Some(bases) = self.bases.get(&current) else {
                continue;
            };
            for base in bases {
                let leaf = base.rsplit('.').next().unwrap_or(base);
                if let Some(classes) = self.by_leaf.get(leaf) {
                    for qname in classes {
                        stack.push(qname.clone());
                    }
                }
            }
        }
        out.sort();
        out
    }
}

/// What a name is bound to inside one module.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Top-level definition in this module.
    Local { qname: String },
    /// Import binding.
    Import {
        /// The IMPORT symbol itself, when one was collected.
        import_symbol: Option<String>,
        /// Project symbol the binding refers to.
        symbol: Option<String>,
        /// Project module the binding refers to.
        module: Option<String>,
    },
}

/// Per-module resolution view: bindings plus the class set visible for the
/// conservative method heuristic.
#[derive(Debug, Default)]
pub struct ModuleView {
    pub bindings: HashMap<String, Binding>,
    /// Project classes assignable from classes defined in or imported into
    /// this module (ancestors included).
    pub assignable_classes: HashSet<String>,
}

/// Builds the per-module views.
pub fn build_module_views(
    symbols: &BTreeMap<String, Symbol>,
    resolved_imports: &[ResolvedImport],
    hierarchy: &ClassHierarchy,
    file_to_module: &HashMap<String, String>,
) -> HashMap<String, ModuleView> {
    let mut views: HashMap<String, ModuleView> = HashMap::new();
    let mut visible_classes: HashMap<String, Vec<String>> = HashMap::new();

    // Imports first; same-named local definitions override them below.
    for import in resolved_imports {
        let Some(binding) = &import.binding else {
            continue;
        };
        let import_symbol = {
            let qname = format!("{}.{}", import.from_module, binding);
            symbols.contains_key(&qname).then_some(qname)
        };
        let view = views.entry(import.from_module.clone()).or_default();
        view.bindings.insert(
            binding.clone(),
            Binding::Import {
                import_symbol,
                symbol: import.symbol.clone(),
                module: import.bound_module.clone(),
            },
        );
        if let Some(target) = &import.symbol {
            if symbols.get(target).map(|s| s.kind) == Some(SymbolKind::Class) {
                visible_classes
                    .entry(import.from_module.clone())
                    .or_default()
                    .push(target.clone());
            }
        }
    }

    for symbol in symbols.values() {
        let Some(module) = file_to_module.get(&symbol.location.file) else {
            continue;
        };
        // Only top-level names participate in module bindings.
        if symbol.qualified_name != format!("{module}.{}", symbol.name) {
            continue;
        }
        if symbol.kind == SymbolKind::Import {
            continue; // already represented via resolved imports
        }
        let view = views.entry(module.clone()).or_default();
        view.bindings.insert(
            symbol.name.clone(),
            Binding::Local {
                qname: symbol.qualified_name.clone(),
            },
        );
        if symbol.kind == SymbolKind::Class {
            visible_classes
                .entry(module.clone())
                .or_default()
                .push(symbol.qualified_name.clone());
        }
    }

    for (module, classes) in visible_classes {
        let view = views.entry(module).or_default();
        for class in classes {
            for ancestor in hierarchy.project_ancestors(&class) {
                view.assignable_classes.insert(ancestor);
            }
        }
    }

    views
}

/// Resolution output: candidate targets per usage, parallel to the input
/// slice, plus ambiguity diagnostics.
#[derive(Debug, Default)]
pub struct Resolution {
    pub links: Vec<Vec<String>>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn resolve_usages(
    usages: &[Usage],
    symbols: &BTreeMap<String, Symbol>,
    views: &HashMap<String, ModuleView>,
    hierarchy: &ClassHierarchy,
    modules: &BTreeSet<String>,
    file_to_module: &HashMap<String, String>,
) -> Resolution {
    // Method-leaf index for the conservative fallback.
    let mut methods_by_leaf: HashMap<&str, Vec<&Symbol>> = HashMap::new();
    for symbol in symbols.values() {
        if symbol.kind == SymbolKind::Method {
            methods_by_leaf
                .entry(symbol.name.as_str())
                .or_default()
                .push(symbol);
        }
    }

    let mut resolution = Resolution {
        links: Vec::with_capacity(usages.len()),
        diagnostics: Vec::new(),
    };

    for usage in usages {
        let module = file_to_module
            .get(&usage.location.file)
            .cloned()
            .unwrap_or_default();
        let targets = resolve_one(
            usage,
            &module,
            symbols,
            views,
            hierarchy,
            modules,
            &methods_by_leaf,
            &mut resolution.diagnostics,
        );
        resolution.links.push(targets);
    }

    resolution
}

#[allow(clippy::too_many_arguments)]
fn resolve_one(
    usage: &Usage,
    module: &str,
    symbols: &BTreeMap<String, Symbol>,
    views: &HashMap<String, ModuleView>,
    hierarchy: &ClassHierarchy,
    modules: &BTreeSet<String>,
    methods_by_leaf: &HashMap<&str, Vec<&Symbol>>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let chain = usage
        .attribute_chain
        .clone()
        .unwrap_or_else(|| usage.name.clone());
    let segments: Vec<&str> = chain.split('.').collect();
    let head = segments[0];
    let rest = &segments[1..];
    let leaf = *segments.last().unwrap_or(&head);

    let mut targets: Vec<String> = Vec::new();
    let mut member_resolved = false;

    if usage.kind == UsageKind::ImportRef {
        // Absolute `from pkg import name` chains link the imported symbol.
        if let Some(target) = resolve_dotted(&chain, symbols, modules) {
            push_unique(&mut targets, target);
        }
        return targets;
    }

    // `self.x` / `cls.x` resolve against the caller's class hierarchy.
    if (head == "self" || head == "cls") && !rest.is_empty() {
        if let Some(class) = caller_class(usage, symbols) {
            let member = rest[0];
            for ancestor in hierarchy.project_ancestors(&class) {
                let qname = format!("{ancestor}.{member}");
                if symbols.contains_key(&qname) {
                    push_unique(&mut targets, qname);
                }
            }
        }
        return targets;
    }

    let view = views.get(module);
    match view.and_then(|v| v.bindings.get(head)) {
        Some(Binding::Local { qname }) => {
            // Chain-head credit: the bound name itself is used.
            push_unique(&mut targets, qname.clone());
            if !rest.is_empty()
                && symbols.get(qname).map(|s| s.kind) == Some(SymbolKind::Class)
            {
                let member = format!("{qname}.{}", rest[0]);
                if symbols.contains_key(&member) {
                    push_unique(&mut targets, member);
                    member_resolved = true;
                }
            }
        }
        Some(Binding::Import {
            import_symbol,
            symbol,
            module: bound_module,
        }) => {
            if let Some(import_symbol) = import_symbol {
                push_unique(&mut targets, import_symbol.clone());
            }
            if let Some(symbol_qname) = symbol {
                push_unique(&mut targets, symbol_qname.clone());
                if !rest.is_empty()
                    && symbols.get(symbol_qname).map(|s| s.kind) == Some(SymbolKind::Class)
                {
                    let member = format!("{symbol_qname}.{}", rest[0]);
                    if symbols.contains_key(&member) {
                        push_unique(&mut targets, member);
                        member_resolved = true;
                    }
                }
            }
            if let Some(bound) = bound_module {
                if !rest.is_empty() {
                    let full = format!("{bound}.{}", rest.join("."));
                    if let Some(target) = resolve_dotted(&full, symbols, modules) {
                        push_unique(&mut targets, target);
                        member_resolved = true;
                    }
                }
            }
        }
        None => {}
    }

    // Conservative method fallback for unresolved `x.m` chains.
    if !rest.is_empty()
        && !member_resolved
        && matches!(
            usage.kind,
            UsageKind::Call | UsageKind::Attribute | UsageKind::DecoratorRef
        )
    {
        if let Some(view) = view {
            let mut candidates: Vec<String> = Vec::new();
            if let Some(methods) = methods_by_leaf.get(leaf) {
                for method in methods {
                    let Some(parent) = &method.parent_class else {
                        continue;
                    };
                    if view.assignable_classes.contains(parent) {
                        push_unique(&mut candidates, method.qualified_name.clone());
                    }
                }
            }
            if candidates.len() > 1 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ResolveAmbiguity,
                    Some(&usage.location.file),
                    Some(usage.location.line),
                    format!("`{chain}` resolves to {} candidates", candidates.len()),
                ));
            }
            for candidate in candidates {
                push_unique(&mut targets, candidate);
            }
        }
    }

    targets
}

/// Resolves an absolute dotted path to a symbol: the longest project-module
/// prefix plus one or two member components.
fn resolve_dotted(
    full: &str,
    symbols: &BTreeMap<String, Symbol>,
    modules: &BTreeSet<String>,
) -> Option<String> {
    if symbols.contains_key(full) {
        return Some(full.to_string());
    }
    let parts: Vec<&str> = full.split('.').collect();
    for end in (1..parts.len()).rev() {
        let prefix = parts[..end].join(".");
        if modules.contains(&prefix) {
            let qname = format!("{prefix}.{}", parts[end..].join("."));
            if symbols.contains_key(&qname) {
                return Some(qname);
            }
            return None;
        }
    }
    None
}

fn caller_class(usage: &Usage, symbols: &BTreeMap<String, Symbol>) -> Option<String> {
    let caller = usage.caller.as_ref()?;
    symbols.get(caller)?.parent_class.clone()
}

fn push_unique(targets: &mut Vec<String>, qname: String) {
    if !targets.contains(&qname) {
        targets.push(qname);
    }
}
