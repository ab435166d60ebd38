//! Reachability engine: worklist closure over call, import, and containment
//! relations rooted at the entrypoint set.
//!
//! Nodes are project symbols plus one pseudo-node per module; module-scope
//! usages hang off the module node, so importing a module activates its
//! top-level references and import bindings without making every function in
//! it live. Cycles are handled by the worklist closure.

use crate::imports::ResolvedImport;
use crate::{Diagnostic, DiagnosticKind, Symbol, SymbolKind, Usage, UsageKind};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Symbol(String),
    Module(String),
}

/// Inputs frozen before reachability runs.
pub struct GraphInputs<'a> {
    pub symbols: &'a BTreeMap<String, Symbol>,
    pub usages: &'a [Usage],
    /// Candidate targets per usage, parallel to `usages`.
    pub links: &'a [Vec<String>],
    pub resolved_imports: &'a [ResolvedImport],
    /// Repository-relative file → module.
    pub file_to_module: &'a HashMap<String, String>,
    /// Module → repository-relative file, for every successfully parsed file.
    pub module_files: &'a BTreeMap<String, String>,
    /// Modules with a top-level `if __name__ == "__main__"` block.
    pub main_block_modules: &'a BTreeSet<String>,
    /// Qualified names supplied by the external infrastructure scan.
    pub extra_entrypoints: &'a [String],
}

/// Reachability outcome, frozen before scoring.
#[derive(Debug, Default)]
pub struct Reachability {
    pub reachable_symbols: HashSet<String>,
    pub reachable_modules: HashSet<String>,
    /// The root set R₀ actually used, for the report's `entrypoints` array.
    pub roots: BTreeSet<String>,
    /// Repository-relative paths of orphaned files.
    pub orphaned_files: BTreeSet<String>,
}

pub fn compute(inputs: &GraphInputs<'_>) -> (Reachability, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut graph: DiGraph<NodeKey, ()> = DiGraph::new();
    let mut nodes: HashMap<NodeKey, NodeIndex> = HashMap::new();

    let mut node = |graph: &mut DiGraph<NodeKey, ()>, key: NodeKey| -> NodeIndex {
        *nodes
            .entry(key.clone())
            .or_insert_with(|| graph.add_node(key))
    };

    // Containment and module membership.
    for symbol in inputs.symbols.values() {
        let sym_node = node(&mut graph, NodeKey::Symbol(symbol.qualified_name.clone()));
        if let Some(module) = inputs.file_to_module.get(&symbol.location.file) {
            let mod_node = node(&mut graph, NodeKey::Module(module.clone()));
            // A module is live once any of its symbols is.
            graph.add_edge(sym_node, mod_node, ());
            if symbol.kind == SymbolKind::Import {
                // Import bindings execute when their module does.
                graph.add_edge(mod_node, sym_node, ());
            }
        }
        if let Some(parent) = &symbol.parent_class {
            let class_node = node(&mut graph, NodeKey::Symbol(parent.clone()));
            // A live method keeps its class alive.
            graph.add_edge(sym_node, class_node, ());
            if symbol.name == "__init__" || symbol.is_dunder() {
                // A live class keeps its lifecycle methods alive.
                graph.add_edge(class_node, sym_node, ());
            }
        }
    }

    // Import graph: module → module.
    for import in inputs.resolved_imports {
        if import.external {
            continue;
        }
        let from = node(&mut graph, NodeKey::Module(import.from_module.clone()));
        for target in &import.modules {
            let to = node(&mut graph, NodeKey::Module(target.clone()));
            graph.add_edge(from, to, ());
        }
    }

    // Usage edges: calls and decorator references propagate to any target;
    // bare name and attribute references only keep variables alive.
    for (usage, targets) in inputs.usages.iter().zip(inputs.links) {
        if targets.is_empty() || usage.kind == UsageKind::ImportRef {
            continue;
        }
        let src = match usage
            .caller
            .as_ref()
            .filter(|c| inputs.symbols.contains_key(*c))
        {
            Some(caller) => node(&mut graph, NodeKey::Symbol(caller.clone())),
            None => match inputs.file_to_module.get(&usage.location.file) {
                Some(module) => node(&mut graph, NodeKey::Module(module.clone())),
                None => continue,
            },
        };
        for target in targets {
            let propagates = match usage.kind {
                UsageKind::Call | UsageKind::DecoratorRef => true,
                UsageKind::NameRef | UsageKind::Attribute => inputs
                    .symbols
                    .get(target)
                    .map(|s| s.kind == SymbolKind::Variable)
                    .unwrap_or(false),
                UsageKind::ImportRef => false,
            };
            if propagates {
                let dst = node(&mut graph, NodeKey::Symbol(target.clone()));
                graph.add_edge(src, dst, ());
            }
        }
    }

    // Root set R₀.
    let mut roots: BTreeSet<String> = BTreeSet::new();
    let mut root_nodes: Vec<NodeIndex> = Vec::new();
    for symbol in inputs.symbols.values() {
        let in_main_module = inputs
            .file_to_module
            .get(&symbol.location.file)
            .map(|m| inputs.main_block_modules.contains(m))
            .unwrap_or(false);
        if symbol.is_entrypoint || in_main_module {
            roots.insert(symbol.qualified_name.clone());
            root_nodes.push(node(&mut graph, NodeKey::Symbol(symbol.qualified_name.clone())));
        }
    }
    for extra in inputs.extra_entrypoints {
        if inputs.symbols.contains_key(extra) {
            roots.insert(extra.clone());
            root_nodes.push(node(&mut graph, NodeKey::Symbol(extra.clone())));
        } else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownEntrypoint,
                None,
                None,
                format!("configured entrypoint `{extra}` matches no symbol"),
            ));
        }
    }
    for module in inputs.main_block_modules {
        root_nodes.push(node(&mut graph, NodeKey::Module(module.clone())));
    }

    // Worklist closure.
    let mut seen: HashSet<NodeIndex> = HashSet::new();
    let mut worklist: Vec<NodeIndex> = root_nodes;
    while let Some(current) = worklist.pop() {
        if !seen.insert(current) {
            continue;
        }
        for neighbor in graph.neighbors(current) {
            if !seen.contains(&neighbor) {
                worklist.push(neighbor);
            }
        }
    }

    let mut reachable_symbols = HashSet::new();
    let mut reachable_modules = HashSet::new();
    for index in &seen {
        match &graph[*index] {
            NodeKey::Symbol(qname) => {
                reachable_symbols.insert(qname.clone());
            }
            NodeKey::Module(module) => {
                reachable_modules.insert(module.clone());
            }
        }
    }

    let orphaned_files = find_orphans(inputs, &roots);

    (
        Reachability {
            reachable_symbols,
            reachable_modules,
            roots,
            orphaned_files,
        },
        diagnostics,
    )
}

/// A file is orphaned iff its module is not import-reachable from any
/// entrypoint module and contains no entrypoints itself.
fn find_orphans(inputs: &GraphInputs<'_>, roots: &BTreeSet<String>) -> BTreeSet<String> {
    // Modules that contain entrypoints (or behave like scripts).
    let mut entry_modules: BTreeSet<String> = inputs.main_block_modules.clone();
    let mut modules_with_entrypoints: BTreeSet<String> = BTreeSet::new();
    for symbol in inputs.symbols.values() {
        if symbol.is_entrypoint || roots.contains(&symbol.qualified_name) {
            if let Some(module) = inputs.file_to_module.get(&symbol.location.file) {
                entry_modules.insert(module.clone());
                modules_with_entrypoints.insert(module.clone());
            }
        }
    }

    // Import adjacency, modules only.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for import in inputs.resolved_imports {
        if import.external {
            continue;
        }
        let entry = adjacency.entry(import.from_module.as_str()).or_default();
        for target in &import.modules {
            entry.push(target.as_str());
        }
    }

    let mut covered: HashSet<&str> = HashSet::new();
    let mut worklist: Vec<&str> = entry_modules.iter().map(|s| s.as_str()).collect();
    while let Some(module) = worklist.pop() {
        if !covered.insert(module) {
            continue;
        }
        if let Some(targets) = adjacency.get(module) {
            for target in targets {
                if !covered.contains(target) {
                    worklist.push(target);
                }
            }
        }
    }

    inputs
        .module_files
        .iter()
        .filter(|(module, _)| {
            !covered.contains(module.as_str()) && !modules_with_entrypoints.contains(*module)
        })
        .map(|(_, file)| file.clone())
        .collect()
}
