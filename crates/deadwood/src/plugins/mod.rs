//! Entrypoint recognizer: pluggable rules over symbol attributes.
//!
//! A plugin is a pure predicate over a [`Symbol`]'s decorators, base
//! classes, name, and kind. The core runs every registered plugin; all
//! matching reasons are recorded. Decorator patterns use dotted-chain
//! matching: a leading `*.` anchors the remaining segments to the end of
//! the chain, and a trailing `*` inside a segment is a prefix wildcard, so
//! `app.route('/x', methods=['POST'])` matches `*.route`.

pub mod celery;
pub mod cli;
pub mod flask;
pub mod pydantic;
pub mod pytest;
pub mod restx;
pub mod sqlalchemy;

use crate::config::PluginId;
use crate::resolve::ClassHierarchy;
use crate::Symbol;
use std::collections::BTreeMap;

/// Context shared by all rules during recognition.
pub struct RuleCtx<'a> {
    pub hierarchy: &'a ClassHierarchy,
}

/// One entrypoint rule. Implementations are stateless and cheap; they run
/// for every symbol in the project.
pub trait EntrypointRule: Send + Sync {
    /// Plugin identifier used in reasons, e.g. `"flask"`.
    fn name(&self) -> &'static str;

    /// Decorator patterns this plugin reacts to, exposed so the scorer can
    /// apply decorator penalties without re-running recognition.
    fn decorator_patterns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns a reason string when the symbol is an entrypoint.
    fn inspect(&self, symbol: &Symbol, ctx: &RuleCtx<'_>) -> Option<String>;
}

/// Builds rule instances for the enabled plugin set, in a fixed order.
pub fn build_rules(ids: &[PluginId]) -> Vec<Box<dyn EntrypointRule>> {
    let mut rules: Vec<Box<dyn EntrypointRule>> = Vec::new();
    for id in ids {
        match id {
            PluginId::Flask => rules.push(Box::new(flask::FlaskRule)),
            PluginId::Celery => rules.push(Box::new(celery::CeleryRule)),
            PluginId::FlaskRestplus => rules.push(Box::new(restx::RestResourceRule)),
            PluginId::Sqlalchemy => rules.push(Box::new(sqlalchemy::SqlalchemyRule)),
            PluginId::Pydantic => rules.push(Box::new(pydantic::PydanticRule)),
            PluginId::Pytest => rules.push(Box::new(pytest::PytestRule)),
            PluginId::Click => rules.push(Box::new(cli::CommandRule { plugin: "click" })),
            PluginId::Typer => rules.push(Box::new(cli::CommandRule { plugin: "typer" })),
        }
    }
    rules
}

/// Runs every rule over every symbol, recording all matching reasons.
pub fn recognize(
    symbols: &mut BTreeMap<String, Symbol>,
    rules: &[Box<dyn EntrypointRule>],
    ctx: &RuleCtx<'_>,
) {
    for symbol in symbols.values_mut() {
        for rule in rules {
            if let Some(reason) = rule.inspect(symbol, ctx) {
                symbol.entrypoint_reasons.push(reason);
            }
        }
        if !symbol.entrypoint_reasons.is_empty() {
            symbol.is_entrypoint = true;
        }
    }
}

/// Distinct plugin names whose decorator patterns match any of the symbol's
/// decorators (scorer rule 4).
pub fn decorator_plugin_matches<'r>(
    symbol: &Symbol,
    rules: &'r [Box<dyn EntrypointRule>],
) -> Vec<&'r str> {
    let mut matched = Vec::new();
    for rule in rules {
        if first_decorator_match(rule.decorator_patterns(), &symbol.decorators).is_some()
            && !matched.contains(&rule.name())
        {
            matched.push(rule.name());
        }
    }
    matched
}

/// First pattern that matches any decorator, in pattern order.
pub fn first_decorator_match<'p>(
    patterns: &[&'p str],
    decorators: &[String],
) -> Option<&'p str> {
    patterns
        .iter()
        .find(|p| decorators.iter().any(|d| matches_decorator(p, d)))
        .copied()
}

/// Matches a normalized decorator string against one pattern.
pub fn matches_decorator(pattern: &str, decorator: &str) -> bool {
    let chain = decorator.split('(').next().unwrap_or(decorator).trim();
    let chain_segments: Vec<&str> = chain.split('.').collect();

    let (anchored_suffix, pattern_rest) = match pattern.strip_prefix("*.") {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let pattern_segments: Vec<&str> = pattern_rest.split('.').collect();

    if pattern_segments.len() > chain_segments.len() {
        return false;
    }
    if anchored_suffix && pattern_segments.len() == chain_segments.len() {
        // `*.route` needs at least one segment before `route`.
        return false;
    }
    let offset = chain_segments.len() - pattern_segments.len();
    pattern_segments
        .iter()
        .zip(&chain_segments[offset..])
        .all(|(p, c)| segment_matches(p, c))
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => segment.starts_with(prefix),
        None => pattern == segment,
    }
}
