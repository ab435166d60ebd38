//! Flask entrypoints: route and lifecycle decorators, app factories.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::{Symbol, SymbolKind};

const DECORATORS: &[&str] = &[
    "*.route",
    "*.before_request",
    "*.after_request",
    "*.errorhandler",
    "*.teardown_*",
    "*.cli.command",
];

/// Names conventionally discovered by WSGI servers and `flask run`.
const FACTORY_NAMES: &[&str] = &["create_app"];

pub struct FlaskRule;

impl EntrypointRule for FlaskRule {
    fn name(&self) -> &'static str {
        "flask"
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, _ctx: &RuleCtx<'_>) -> Option<String> {
        if let Some(pattern) = first_decorator_match(DECORATORS, &symbol.decorators) {
            return Some(format!("flask:{pattern}"));
        }
        if matches!(symbol.kind, SymbolKind::Function) && FACTORY_NAMES.contains(&symbol.name.as_str())
        {
            return Some(format!("flask:{}", symbol.name));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::make_symbol;
    use super::*;
    use crate::resolve::ClassHierarchy;

    fn ctx_and<F: FnOnce(&RuleCtx<'_>)>(f: F) {
        let hierarchy = ClassHierarchy::default();
        f(&RuleCtx {
            hierarchy: &hierarchy,
        })
    }

    #[test]
    fn test_route_decorator() {
        ctx_and(|ctx| {
            let mut symbol = make_symbol("index", SymbolKind::Function);
            symbol.decorators = vec!["app.route('/')".into()];
            assert_eq!(
                FlaskRule.inspect(&symbol, ctx).as_deref(),
                Some("flask:*.route")
            );
        });
    }

    #[test]
    fn test_teardown_wildcard() {
        ctx_and(|ctx| {
            let mut symbol = make_symbol("close_db", SymbolKind::Function);
            symbol.decorators = vec!["app.teardown_appcontext".into()];
            assert_eq!(
                FlaskRule.inspect(&symbol, ctx).as_deref(),
                Some("flask:*.teardown_*")
            );
        });
    }

    #[test]
    fn test_create_app_factory() {
        ctx_and(|ctx| {
            let symbol = make_symbol("create_app", SymbolKind::Function);
            assert_eq!(
                FlaskRule.inspect(&symbol, ctx).as_deref(),
                Some("flask:create_app")
            );
        });
    }

    #[test]
    fn test_plain_function_ignored() {
        ctx_and(|ctx| {
            let symbol = make_symbol("helper", SymbolKind::Function);
            assert!(FlaskRule.inspect(&symbol, ctx).is_none());
        });
    }
}
