//! Click / Typer entrypoints: command and group decorators.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::Symbol;

const DECORATORS: &[&str] = &["*.command", "*.group"];

/// Shared matcher for both CLI frameworks; `plugin` keeps the reasons and
/// penalty attribution separate.
pub struct CommandRule {
    pub plugin: &'static str,
}

impl EntrypointRule for CommandRule {
    fn name(&self) -> &'static str {
        self.plugin
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, _ctx: &RuleCtx<'_>) -> Option<String> {
        first_decorator_match(DECORATORS, &symbol.decorators)
            .map(|pattern| format!("{}:{pattern}", self.plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::make_symbol;
    use super::*;
    use crate::resolve::ClassHierarchy;
    use crate::SymbolKind;

    #[test]
    fn test_command_and_group() {
        let hierarchy = ClassHierarchy::default();
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let rule = CommandRule { plugin: "click" };

        let mut symbol = make_symbol("migrate", SymbolKind::Function);
        symbol.decorators = vec!["cli.command()".into()];
        assert_eq!(
            rule.inspect(&symbol, &ctx).as_deref(),
            Some("click:*.command")
        );

        let mut symbol = make_symbol("db", SymbolKind::Function);
        symbol.decorators = vec!["app.group".into()];
        assert_eq!(rule.inspect(&symbol, &ctx).as_deref(), Some("click:*.group"));

        assert!(rule
            .inspect(&make_symbol("plain", SymbolKind::Function), &ctx)
            .is_none());
    }
}
