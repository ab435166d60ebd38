//! Suspicion scorer: ordered delta recipe producing a 0–100 confidence and
//! a reason trace per symbol.
//!
//! Rule order matters and is part of the output contract: base score,
//! reachability, usage count, decorator penalties, naming penalties, noqa,
//! caps, clamp. Orphaned files short-circuit to 100.

use crate::config::Config;
use crate::graph::Reachability;
use crate::plugins::{decorator_plugin_matches, matches_decorator, EntrypointRule};
use crate::{Symbol, SymbolKind};
use std::collections::HashMap;

/// Band thresholds for the suggested action.
const DELETE_THRESHOLD: i32 = 80;
const REVIEW_THRESHOLD: i32 = 50;

/// Confidence ceiling for symbols whose bodies do dynamic attribute lookups.
const DYNAMIC_RISK_CAP: i32 = 50;

/// Confidence ceiling for heavily used symbols (≥ 5 non-orphan usages).
const HEAVY_USE_THRESHOLD: usize = 5;
const HEAVY_USE_CAP: i32 = 40;

/// Frozen inputs for one scoring pass.
pub struct ScoreInputs<'a> {
    pub config: &'a Config,
    pub rules: &'a [Box<dyn EntrypointRule>],
    pub reachability: &'a Reachability,
    /// Non-orphan usage count per symbol, definition sites excluded.
    pub usage_counts: &'a HashMap<String, usize>,
    pub file_to_module: &'a HashMap<String, String>,
}

/// Scoring outcome for one symbol.
#[derive(Debug, Clone)]
pub struct Scored {
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub suggested_action: &'static str,
}

pub fn suggested_action(confidence: u8) -> &'static str {
    let confidence = confidence as i32;
    if confidence >= DELETE_THRESHOLD {
        "delete"
    } else if confidence >= REVIEW_THRESHOLD {
        "review"
    } else {
        "keep"
    }
}

pub fn score_symbol(symbol: &Symbol, inputs: &ScoreInputs<'_>) -> Scored {
    let mut reasons: Vec<String> = Vec::new();

    // 1. Base by kind.
    let (base, label) = match symbol.kind {
        SymbolKind::Function => (60, "Function definition"),
        SymbolKind::Method => (60, "Method definition"),
        SymbolKind::Class => (55, "Class definition"),
        SymbolKind::Variable => (60, "Variable definition"),
        SymbolKind::Import => (70, "Import binding"),
    };
    let mut sum: i32 = base;
    reasons.push(format!("{label}: base +{base}"));

    // 2. Reachability. Orphaned files short-circuit every remaining rule.
    if inputs
        .reachability
        .orphaned_files
        .contains(&symbol.location.file)
    {
        reasons.push(format!("Orphaned file: {}", symbol.location.file));
        return Scored {
            confidence: 100,
            reasons,
            suggested_action: "delete",
        };
    }
    if symbol.is_entrypoint {
        reasons.push(format!(
            "Entrypoint ({}): -40",
            symbol.entrypoint_reasons.join(", ")
        ));
        sum -= 40;
    }
    let reachable = inputs
        .reachability
        .reachable_symbols
        .contains(&symbol.qualified_name);
    if reachable {
        reasons.push("Reachable from entrypoint set: -30".to_string());
        sum -= 30;
    } else {
        reasons.push("Not reachable from any entrypoint: +30".to_string());
        sum += 30;
    }

    // 3. Usage count. Entrypoints are invoked externally, so zero internal
    // usage carries no suspicion for them.
    let usages = inputs
        .usage_counts
        .get(&symbol.qualified_name)
        .copied()
        .unwrap_or(0);
    if usages == 0 {
        if !symbol.is_entrypoint {
            reasons.push("No usages found: +20".to_string());
            sum += 20;
        }
    } else {
        let discount = (10 * usages as i32).min(40);
        reasons.push(format!("Used {usages} time(s): -{discount}"));
        sum -= discount;
    }

    // 4. Decorator penalties.
    for plugin in decorator_plugin_matches(symbol, inputs.rules).iter().take(2) {
        reasons.push(format!("Decorator matches {plugin} entrypoint patterns: -20"));
        sum -= 20;
    }
    if inputs
        .config
        .ignore_decorators
        .iter()
        .any(|p| symbol.decorators.iter().any(|d| matches_decorator(p, d)))
    {
        reasons.push("Decorator in ignore list: -50".to_string());
        sum -= 50;
    }

    // 5. Naming penalties.
    if symbol.is_dunder() {
        reasons.push("Dunder name: -40".to_string());
        sum -= 40;
    }
    let module_reachable = inputs
        .file_to_module
        .get(&symbol.location.file)
        .map(|m| inputs.reachability.reachable_modules.contains(m))
        .unwrap_or(false);
    if symbol.is_private() && module_reachable {
        reasons.push("Private name in reachable module: -10".to_string());
        sum -= 10;
    }
    if inputs.config.ignore_names.is_match(&symbol.name) {
        reasons.push("Name matches ignore pattern: -50".to_string());
        sum -= 50;
    }

    // 6. Noqa suppression.
    if inputs.config.respect_noqa && !symbol.noqa_codes.is_empty() {
        let codes: Vec<&str> = symbol.noqa_codes.iter().map(String::as_str).collect();
        reasons.push(format!("Suppressed by noqa ({}): -50", codes.join(", ")));
        sum -= 50;
    }

    // Caps, then clamp.
    if symbol.dynamic_risk && sum > DYNAMIC_RISK_CAP {
        reasons.push(format!("Dynamic attribute access: capped at {DYNAMIC_RISK_CAP}"));
        sum = DYNAMIC_RISK_CAP;
    }
    if usages >= HEAVY_USE_THRESHOLD && sum > HEAVY_USE_CAP {
        reasons.push(format!("Heavily used ({usages} usages): capped at {HEAVY_USE_CAP}"));
        sum = HEAVY_USE_CAP;
    }
    let confidence = sum.clamp(0, 100) as u8;

    Scored {
        confidence,
        suggested_action: suggested_action(confidence),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginId;
    use crate::plugins::build_rules;
    use crate::{Location, Symbol};
    use std::collections::BTreeSet;

    fn make_symbol(name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            qualified_name: format!("app.{name}"),
            name: name.into(),
            kind,
            location: Location {
                file: "app.py".into(),
                line: 3,
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

    struct Harness {
        config: Config,
        rules: Vec<Box<dyn EntrypointRule>>,
        reachability: Reachability,
        usage_counts: HashMap<String, usize>,
        file_to_module: HashMap<String, String>,
    }

    impl Harness {
        fn new() -> Self {
            let mut reachability = Reachability::default();
            reachability.reachable_modules.insert("app".into());
            Self {
                config: Config::default_config(),
                rules: build_rules(&PluginId::ALL),
                reachability,
                usage_counts: HashMap::new(),
                file_to_module: [("app.py".to_string(), "app".to_string())]
                    .into_iter()
                    .collect(),
            }
        }

        fn score(&self, symbol: &Symbol) -> Scored {
            score_symbol(
                symbol,
                &ScoreInputs {
                    config: &self.config,
                    rules: &self.rules,
                    reachability: &self.reachability,
                    usage_counts: &self.usage_counts,
                    file_to_module: &self.file_to_module,
                },
            )
        }
    }

    #[test]
    fn test_entrypoint_route_scores_zero() {
        let mut harness = Harness::new();
        let mut symbol = make_symbol("index", SymbolKind::Function);
        symbol.decorators = vec!["app.route('/')".into()];
        symbol.is_entrypoint = true;
        symbol.entrypoint_reasons = vec!["flask:*.route".into()];
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());

        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 0);
        assert_eq!(scored.suggested_action, "keep");
        assert!(scored.reasons.iter().any(|r| r.contains("flask:*.route")));
    }

    #[test]
    fn test_orphan_short_circuits_to_100() {
        let mut harness = Harness::new();
        harness
            .reachability
            .orphaned_files
            .insert("app.py".to_string());
        let symbol = make_symbol("legacy", SymbolKind::Function);
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 100);
        assert_eq!(scored.suggested_action, "delete");
        assert!(scored.reasons.contains(&"Orphaned file: app.py".to_string()));
    }

    #[test]
    fn test_unreachable_private_helper_deletes() {
        let harness = Harness::new();
        let symbol = make_symbol("_helper", SymbolKind::Function);
        // base 60 + unreachable 30 + no usages 20 − private 10 = 100
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 100);
        assert_eq!(scored.suggested_action, "delete");
    }

    #[test]
    fn test_used_variable_stays_low() {
        let mut harness = Harness::new();
        let symbol = make_symbol("app", SymbolKind::Variable);
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());
        harness
            .usage_counts
            .insert(symbol.qualified_name.clone(), 1);
        // base 60 − reachable 30 − used 10 = 20
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 20);
        assert_eq!(scored.suggested_action, "keep");
    }

    #[test]
    fn test_reachable_used_import_stays_low() {
        let mut harness = Harness::new();
        let symbol = make_symbol("shared_task", SymbolKind::Import);
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());
        harness
            .usage_counts
            .insert(symbol.qualified_name.clone(), 1);
        // base 70 − reachable 30 − used 10 = 30
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 30);
        assert_eq!(scored.suggested_action, "keep");
    }

    #[test]
    fn test_noqa_drops_unused_import_to_keep() {
        let mut harness = Harness::new();
        let mut symbol = make_symbol("send_email", SymbolKind::Import);
        symbol.noqa_codes.insert("F401".into());
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());
        // base 70 − reachable 30 + unused 20 − noqa 50 = 10
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 10);
        assert_eq!(scored.suggested_action, "keep");
        assert!(scored.reasons.iter().any(|r| r.contains("F401")));
    }

    #[test]
    fn test_respect_noqa_false_skips_discount() {
        let mut harness = Harness::new();
        harness.config = Config::from_json(r#"{"linting": {"respect_noqa": false}}"#).unwrap();
        let mut symbol = make_symbol("send_email", SymbolKind::Import);
        symbol.noqa_codes.insert("F401".into());
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());
        // base 70 − reachable 30 + unused 20 = 60
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 60);
        assert_eq!(scored.suggested_action, "review");
    }

    #[test]
    fn test_heavy_use_cap() {
        let mut harness = Harness::new();
        let symbol = make_symbol("hub", SymbolKind::Import);
        harness
            .usage_counts
            .insert(symbol.qualified_name.clone(), 5);
        // base 70 + unreachable 30 − used 40 = 60, capped at 40
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 40);
        assert!(scored
            .reasons
            .iter()
            .any(|r| r.contains("capped at 40")));
    }

    #[test]
    fn test_dynamic_risk_cap() {
        let mut harness = Harness::new();
        let mut symbol = make_symbol("dispatch", SymbolKind::Function);
        symbol.dynamic_risk = true;
        harness.usage_counts.clear();
        // base 60 + unreachable 30 + unused 20 = 110 → capped at 50
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 50);
        assert_eq!(scored.suggested_action, "review");
    }

    #[test]
    fn test_decorator_plugin_penalty() {
        let harness = Harness::new();
        let mut symbol = make_symbol("task_fn", SymbolKind::Function);
        symbol.decorators = vec!["celery.task".into()];
        // base 60 + unreachable 30 + unused 20 − decorator 20 = 90
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 90);
        assert!(scored
            .reasons
            .iter()
            .any(|r| r.contains("celery entrypoint patterns")));
    }

    #[test]
    fn test_ignored_decorator_discount() {
        let mut harness = Harness::new();
        harness.config = Config::from_json(
            r#"{"linting": {"ignore_decorators": ["*.register"]}}"#,
        )
        .unwrap();
        let mut symbol = make_symbol("hook", SymbolKind::Function);
        symbol.decorators = vec!["registry.register".into()];
        // base 60 + unreachable 30 + unused 20 − ignore 50 = 60
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 60);
    }

    #[test]
    fn test_ignore_names_glob() {
        let mut harness = Harness::new();
        harness.config =
            Config::from_json(r#"{"linting": {"ignore_names": ["legacy_*"]}}"#).unwrap();
        let symbol = make_symbol("legacy_export", SymbolKind::Function);
        // base 60 + unreachable 30 + unused 20 − ignore 50 = 60
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 60);
    }

    #[test]
    fn test_dunder_penalty() {
        let mut harness = Harness::new();
        let mut symbol = make_symbol("__repr__", SymbolKind::Method);
        symbol.parent_class = Some("app.Box".into());
        harness
            .reachability
            .reachable_symbols
            .insert(symbol.qualified_name.clone());
        // base 60 − reachable 30 + unused 20 − dunder 40 = 10
        let scored = harness.score(&symbol);
        assert_eq!(scored.confidence, 10);
    }

    #[test]
    fn test_reasons_never_empty_and_confidence_in_range() {
        let harness = Harness::new();
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Variable,
            SymbolKind::Import,
        ] {
            let symbol = make_symbol("anything", kind);
            let scored = harness.score(&symbol);
            assert!(!scored.reasons.is_empty());
            assert!(scored.confidence <= 100);
        }
    }
}
