//! Flask-RESTPlus / RESTX entrypoints: HTTP verb methods on `Resource`
//! subclasses.

use super::{EntrypointRule, RuleCtx};
use crate::{Symbol, SymbolKind};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

pub struct RestResourceRule;

impl EntrypointRule for RestResourceRule {
    fn name(&self) -> &'static str {
        "flask-restplus"
    }

    fn inspect(&self, symbol: &Symbol, ctx: &RuleCtx<'_>) -> Option<String> {
        if symbol.kind != SymbolKind::Method {
            return None;
        }
        if !HTTP_METHODS.contains(&symbol.name.as_str()) {
            return None;
        }
        let parent = symbol.parent_class.as_deref()?;
        if ctx.hierarchy.inherits_from(parent, "Resource") {
            return Some(format!("flask-restplus:Resource.{}", symbol.name));
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

    fn class_symbol(qname: &str, bases: &[&str]) -> Symbol {
        Symbol {
            qualified_name: qname.into(),
            name: qname.rsplit('.').next().unwrap().into(),
            kind: SymbolKind::Class,
            location: Location {
                file: "api.py".into(),
                line: 1,
                col: 0,
            },
            decorators: vec![],
            is_entrypoint: false,
            entrypoint_reasons: vec![],
            parent_class: None,
            base_classes: bases.iter().map(|s| s.to_string()).collect(),
            noqa_codes: BTreeSet::new(),
            dynamic_risk: false,
        }
    }

    fn hierarchy_with(classes: Vec<Symbol>) -> ClassHierarchy {
        let mut table = BTreeMap::new();
        for class in classes {
            table.insert(class.qualified_name.clone(), class);
        }
        ClassHierarchy::build(&table)
    }

    #[test]
    fn test_get_on_resource_subclass() {
        let hierarchy = hierarchy_with(vec![class_symbol("api.UserResource", &["Resource"])]);
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let mut method = make_symbol("get", SymbolKind::Method);
        method.parent_class = Some("api.UserResource".into());
        assert_eq!(
            RestResourceRule.inspect(&method, &ctx).as_deref(),
            Some("flask-restplus:Resource.get")
        );
    }

    #[test]
    fn test_transitive_resource_base() {
        let hierarchy = hierarchy_with(vec![
            class_symbol("api.BaseApi", &["Resource"]),
            class_symbol("api.UserApi", &["BaseApi"]),
        ]);
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let mut method = make_symbol("post", SymbolKind::Method);
        method.parent_class = Some("api.UserApi".into());
        assert!(RestResourceRule.inspect(&method, &ctx).is_some());
    }

    #[test]
    fn test_non_http_name_ignored() {
        let hierarchy = hierarchy_with(vec![class_symbol("api.UserResource", &["Resource"])]);
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let mut method = make_symbol("serialize", SymbolKind::Method);
        method.parent_class = Some("api.UserResource".into());
        assert!(RestResourceRule.inspect(&method, &ctx).is_none());
    }

    #[test]
    fn test_plain_class_ignored() {
        let hierarchy = hierarchy_with(vec![class_symbol("api.Widget", &["object"])]);
        let ctx = RuleCtx {
            hierarchy: &hierarchy,
        };
        let mut method = make_symbol("get", SymbolKind::Method);
        method.parent_class = Some("api.Widget".into());
        assert!(RestResourceRule.inspect(&method, &ctx).is_none());
    }
}
