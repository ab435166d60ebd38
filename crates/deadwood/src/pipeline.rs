//! Analysis pipeline: `analyze(root, config) → Report`.
//!
//! Per-file parsing and collection fan out across a rayon pool (each worker
//! owns one parser); everything global — import resolution, recognition,
//! reachability, scoring, serialization — runs sequentially after the join.
//! Each stage freezes its output before the next stage starts, and the
//! cancel token is honored at file boundaries and between stages.

use crate::collect::{collect_tree, FileCollection};
use crate::config::Config;
use crate::graph::{self, GraphInputs};
use crate::imports::{ImportResolver, ResolvedImport};
use crate::noqa::{NoqaIndex, NoqaScanner};
use crate::parser::{read_source, FileError, ParserHost};
use crate::plugins::{self, RuleCtx};
use crate::report::Report;
use crate::resolve::{self, ClassHierarchy};
use crate::score::{score_symbol, ScoreInputs, Scored};
use crate::walk::walk_sources;
use crate::{Diagnostic, DiagnosticKind, EngineError, ImportEdge, Symbol, Usage};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked at file boundaries and before
/// each global stage. A cancelled analysis produces no result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Runs a full analysis.
pub fn analyze(root: &Path, config: &Config) -> Result<Report, EngineError> {
    analyze_with_cancel(root, config, &CancelToken::default())
}

enum WorkerResult {
    Collected {
        collection: FileCollection,
        noqa: NoqaIndex,
    },
    Skipped,
    Failed(FileError),
    HostInit(String),
}

/// Runs a full analysis with a caller-owned cancel token.
pub fn analyze_with_cancel(
    root: &Path,
    config: &Config,
    cancel: &CancelToken,
) -> Result<Report, EngineError> {
    let (files, mut diagnostics) = walk_sources(root, config)?;
    tracing::debug!(files = files.len(), "source walk complete");
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let scanner = NoqaScanner::new(&config.noqa_patterns)?;

    // Parallel parse + collect; one parser per worker.
    let outcomes: Vec<WorkerResult> = files
        .par_iter()
        .map_init(
            || ParserHost::new().map(|h| h.with_budget_ms(config.parse_timeout_ms)),
            |host, file| {
                if cancel.is_cancelled() {
                    return WorkerResult::Skipped;
                }
                let host = match host {
                    Ok(host) => host,
                    Err(e) => return WorkerResult::HostInit(e.to_string()),
                };
                let buffer = match read_source(&file.abs_path) {
                    Ok(buffer) => buffer,
                    Err(e) => return WorkerResult::Failed(e),
                };
                let source = buffer.bytes();
                let mut noqa = NoqaIndex::default();
                noqa.scan_file(&scanner, &file.rel_path, source);
                if source.is_empty() {
                    return WorkerResult::Collected {
                        collection: FileCollection {
                            rel_path: file.rel_path.clone(),
                            module: file.module.clone(),
                            ..Default::default()
                        },
                        noqa,
                    };
                }
                let tree = match host.parse(source) {
                    Ok(tree) => tree,
                    Err(e) => return WorkerResult::Failed(e),
                };
                let collection = collect_tree(tree.root_node(), source, &file.rel_path, &file.module);
                WorkerResult::Collected { collection, noqa }
            },
        )
        .collect();

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Merge into the frozen global tables.
    let mut symbols: BTreeMap<String, Symbol> = BTreeMap::new();
    let mut reported_redefinitions: HashSet<String> = HashSet::new();
    let mut usages: Vec<Usage> = Vec::new();
    let mut edges: Vec<ImportEdge> = Vec::new();
    let mut main_block_modules: BTreeSet<String> = BTreeSet::new();
    let mut module_files: BTreeMap<String, String> = BTreeMap::new();
    let mut file_to_module: HashMap<String, String> = HashMap::new();
    let mut packages: HashSet<String> = HashSet::new();
    let mut noqa = NoqaIndex::default();

    for (file, outcome) in files.iter().zip(outcomes) {
        match outcome {
            WorkerResult::HostInit(message) => return Err(EngineError::Parser(message)),
            WorkerResult::Skipped => return Err(EngineError::Cancelled),
            WorkerResult::Failed(error) => {
                diagnostics.push(file_error_diagnostic(&file.rel_path, error));
            }
            WorkerResult::Collected {
                collection,
                noqa: file_noqa,
            } => {
                file_to_module.insert(collection.rel_path.clone(), collection.module.clone());
                module_files.insert(collection.module.clone(), collection.rel_path.clone());
                if collection.rel_path.ends_with("__init__.py") {
                    packages.insert(collection.module.clone());
                }
                if collection.has_main_block {
                    main_block_modules.insert(collection.module.clone());
                }
                diagnostics.extend(collection.diagnostics);
                for symbol in collection.symbols {
                    let qname = symbol.qualified_name.clone();
                    let location = symbol.location.clone();
                    if symbols.insert(qname.clone(), symbol).is_some()
                        && reported_redefinitions.insert(qname.clone())
                    {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::Redefinition,
                            Some(&location.file),
                            Some(location.line),
                            format!("`{qname}` redefined; keeping the last definition"),
                        ));
                    }
                }
                usages.extend(collection.usages);
                edges.extend(collection.imports);
                noqa.merge(file_noqa);
            }
        }
    }
    tracing::debug!(
        symbols = symbols.len(),
        usages = usages.len(),
        "collection complete"
    );

    // Attach suppression codes to definitions.
    for symbol in symbols.values_mut() {
        if let Some(codes) = noqa.codes(&symbol.location.file, symbol.location.line) {
            symbol.noqa_codes = codes.clone();
        }
    }

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Import resolution.
    let module_set: BTreeSet<String> = module_files.keys().cloned().collect();
    let resolver = ImportResolver::new(module_set.clone(), packages);
    let symbol_names: BTreeSet<String> = symbols.keys().cloned().collect();
    let mut resolved_imports: Vec<ResolvedImport> = Vec::with_capacity(edges.len());
    // Relative imports carry no absolute chain on their IMPORT_REF usage, so
    // the resolved target takes its usage credit from here.
    let mut relative_credits: Vec<(String, String)> = Vec::new();
    for edge in &edges {
        let resolved = resolver.resolve(edge, &symbol_names);
        if edge.to_module.starts_with('.') {
            if let (Some(target), Some(from_file)) =
                (&resolved.symbol, module_files.get(&edge.from_module))
            {
                relative_credits.push((target.clone(), from_file.clone()));
            }
        }
        resolved_imports.push(resolved);
    }

    // Entrypoint recognition.
    let hierarchy = ClassHierarchy::build(&symbols);
    let rules = plugins::build_rules(&config.plugins);
    plugins::recognize(
        &mut symbols,
        &rules,
        &RuleCtx {
            hierarchy: &hierarchy,
        },
    );

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Usage → symbol resolution.
    let views = resolve::build_module_views(&symbols, &resolved_imports, &hierarchy, &file_to_module);
    let resolution = resolve::resolve_usages(
        &usages,
        &symbols,
        &views,
        &hierarchy,
        &module_set,
        &file_to_module,
    );
    diagnostics.extend(resolution.diagnostics);

    // Reachability.
    let (reachability, graph_diagnostics) = graph::compute(&GraphInputs {
        symbols: &symbols,
        usages: &usages,
        links: &resolution.links,
        resolved_imports: &resolved_imports,
        file_to_module: &file_to_module,
        module_files: &module_files,
        main_block_modules: &main_block_modules,
        extra_entrypoints: &config.extra_entrypoints,
    });
    diagnostics.extend(graph_diagnostics);
    tracing::debug!(
        reachable = reachability.reachable_symbols.len(),
        orphans = reachability.orphaned_files.len(),
        "reachability complete"
    );

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Usage counts: definition sites and orphaned-file usages excluded.
    let mut usage_counts: HashMap<String, usize> = HashMap::new();
    for (usage, targets) in usages.iter().zip(&resolution.links) {
        if reachability.orphaned_files.contains(&usage.location.file) {
            continue;
        }
        for target in targets {
            if let Some(symbol) = symbols.get(target) {
                if symbol.location.file == usage.location.file
                    && symbol.location.line == usage.location.line
                {
                    continue;
                }
            }
            *usage_counts.entry(target.clone()).or_insert(0) += 1;
        }
    }
    for (target, from_file) in &relative_credits {
        if !reachability.orphaned_files.contains(from_file) {
            *usage_counts.entry(target.clone()).or_insert(0) += 1;
        }
    }

    // Scoring and serialization.
    let score_inputs = ScoreInputs {
        config,
        rules: &rules,
        reachability: &reachability,
        usage_counts: &usage_counts,
        file_to_module: &file_to_module,
    };
    let scored: Vec<(&Symbol, Scored)> = symbols
        .values()
        .map(|symbol| (symbol, score_symbol(symbol, &score_inputs)))
        .collect();
    let entrypoints: Vec<String> = reachability.roots.iter().cloned().collect();
    let report = Report::build(
        scored,
        entrypoints,
        reachability.orphaned_files.len(),
        diagnostics,
    );
    tracing::debug!(items = report.summary.total, "analysis complete");
    Ok(report)
}

fn file_error_diagnostic(rel_path: &str, error: FileError) -> Diagnostic {
    match error {
        FileError::Io(e) => Diagnostic::new(
            DiagnosticKind::Io,
            Some(rel_path),
            None,
            format!("unreadable file skipped: {e}"),
        ),
        FileError::TooLarge => Diagnostic::new(
            DiagnosticKind::FileTooLarge,
            Some(rel_path),
            None,
            "file exceeds the 4 GB parser limit; skipped".to_string(),
        ),
        FileError::ParseFailed => Diagnostic::new(
            DiagnosticKind::Parse,
            Some(rel_path),
            None,
            "parse_failed: parser produced no tree".to_string(),
        ),
        FileError::SyntaxErrors => Diagnostic::new(
            DiagnosticKind::Parse,
            Some(rel_path),
            None,
            "parse_failed: syntax errors; file excluded from analysis".to_string(),
        ),
        FileError::Timeout {
            elapsed_ms,
            budget_ms,
        } => Diagnostic::new(
            DiagnosticKind::Parse,
            Some(rel_path),
            None,
            format!("parse_failed: parse took {elapsed_ms}ms (budget {budget_ms}ms)"),
        ),
    }
}
