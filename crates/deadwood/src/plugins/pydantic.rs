//! Pydantic entrypoints: validator decorators and model classes.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::{Symbol, SymbolKind};

const DECORATORS: &[&str] = &["field_validator", "model_validator", "computed_field"];

pub struct PydanticRule;

impl EntrypointRule for PydanticRule {
    fn name(&self) -> &'static str {
        "pydantic"
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, ctx: &RuleCtx<'_>) -> Option<String> {
        if let Some(pattern) = first_decorator_match(DECORATORS, &symbol.decorators) {
            return Some(format!("pydantic:{pattern}"));
        }
        if symbol.kind == SymbolKind::Class
            && ctx.hierarchy.inherits_from(&symbol.qualified_name, "BaseModel")
        {
            return Some("pydantic:BaseModel".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::make_symbol;
    use super::*;
    use crate::resolve::ClassHierarchy;
    use crate::{Location, Symbol};
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn test_field_validator() {
        let hierarchy = ClassHierarchy::default();
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let mut symbol = make_symbol("check_name", SymbolKind::Method);
        symbol.decorators = vec!["field_validator('name')".into()];
        assert_eq!(
            PydanticRule.inspect(&symbol, &ctx).as_deref(),
            Some("pydantic:field_validator")
        );
    }

    #[test]
    fn test_base_model_class() {
        let mut table = BTreeMap::new();
        table.insert(
            "schemas.UserIn".to_string(),
            Symbol {
                qualified_name: "schemas.UserIn".into(),
                name: "UserIn".into(),
                kind: SymbolKind::Class,
                location: Location {
                    file: "schemas.py".into(),
                    line: 1,
                    col: 0,
                },
                decorators: vec![],
                is_entrypoint: false,
                entrypoint_reasons: vec![],
                parent_class: None,
                base_classes: vec!["BaseModel".into()],
                noqa_codes: BTreeSet::new(),
                dynamic_risk: false,
            },
        );
        let hierarchy = ClassHierarchy::build(&table);
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let symbol = table.get("schemas.UserIn").unwrap();
        assert_eq!(
            PydanticRule.inspect(symbol, &ctx).as_deref(),
            Some("pydantic:BaseModel")
        );
    }
}
