//! SQLAlchemy entrypoints: validators, hybrid properties, event hooks.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::Symbol;

const DECORATORS: &[&str] = &["validates", "hybrid_property", "event.listens_for"];

pub struct SqlalchemyRule;

impl EntrypointRule for SqlalchemyRule {
    fn name(&self) -> &'static str {
        "sqlalchemy"
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, _ctx: &RuleCtx<'_>) -> Option<String> {
        first_decorator_match(DECORATORS, &symbol.decorators)
            .map(|pattern| format!("sqlalchemy:{pattern}"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::make_symbol;
    use super::*;
    use crate::resolve::ClassHierarchy;
    use crate::SymbolKind;

    #[test]
    fn test_validates_and_event_hook() {
        let hierarchy = ClassHierarchy::default();
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };

        let mut symbol = make_symbol("check_email", SymbolKind::Method);
        symbol.decorators = vec!["validates('email')".into()];
        assert_eq!(
            SqlalchemyRule.inspect(&symbol, &ctx).as_deref(),
            Some("sqlalchemy:validates")
        );

        let mut symbol = make_symbol("on_load", SymbolKind::Function);
        symbol.decorators = vec!["sqlalchemy.event.listens_for(User, 'load')".into()];
        assert_eq!(
            SqlalchemyRule.inspect(&symbol, &ctx).as_deref(),
            Some("sqlalchemy:event.listens_for")
        );

        let symbol = make_symbol("plain", SymbolKind::Function);
        assert!(SqlalchemyRule.inspect(&symbol, &ctx).is_none());
    }
}
