//! Pytest entrypoints: discovered test names and fixtures.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::{Symbol, SymbolKind};

const DECORATORS: &[&str] = &["pytest.fixture", "fixture"];

pub struct PytestRule;

impl EntrypointRule for PytestRule {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, _ctx: &RuleCtx<'_>) -> Option<String> {
        if let Some(pattern) = first_decorator_match(DECORATORS, &symbol.decorators) {
            return Some(format!("pytest:{pattern}"));
        }
        match symbol.kind {
            SymbolKind::Function | SymbolKind::Method if symbol.name.starts_with("test_") => {
                Some("pytest:test_*".to_string())
            }
            SymbolKind::Class if symbol.name.starts_with("Test") => {
                Some("pytest:Test*".to_string())
            }
            _ => None,
        }
    }
}
