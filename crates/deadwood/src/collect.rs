//! Symbol & usage collector: one scope-tracked walk per parsed file.
//!
//! Emits a [`Symbol`] for every definition (functions, methods, classes,
//! module/class variables, import bindings) and a [`Usage`] for every
//! reference, attributed to the nearest enclosing function or method.
//! Decorators are normalized to deterministic strings; module-level
//! `if __name__ == "__main__":` blocks are detected here.

use crate::{Diagnostic, DiagnosticKind, ImportEdge, Location, Symbol, SymbolKind, Usage, UsageKind};
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;

/// Maximum rendered length of one decorator argument.
const DECORATOR_ARG_MAX: usize = 64;

/// Builtins that perform dynamic attribute dispatch on a name argument.
const DYNAMIC_LOOKUPS: &[&str] = &["getattr", "setattr", "hasattr", "delattr"];

/// Everything extracted from a single file.
#[derive(Debug, Default)]
pub struct FileCollection {
    pub rel_path: String,
    pub module: String,
    pub symbols: Vec<Symbol>,
    pub usages: Vec<Usage>,
    pub imports: Vec<ImportEdge>,
    pub has_main_block: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks an already-parsed tree.
pub fn collect_tree(root: Node<'_>, source: &[u8], rel_path: &str, module: &str) -> FileCollection {
    let mut collector = Collector {
        source,
        rel_path,
        module,
        out: FileCollection {
            rel_path: rel_path.to_string(),
            module: module.to_string(),
            ..Default::default()
        },
        scopes: Vec::new(),
        in_main_block: false,
        dynamic_risk: HashSet::new(),
    };
    collector.walk(root);

    let dynamic_risk = collector.dynamic_risk;
    let mut out = collector.out;
    for symbol in &mut out.symbols {
        if dynamic_risk.contains(&symbol.qualified_name) {
            symbol.dynamic_risk = true;
        }
    }
    out
}

enum Scope {
    Class { name: String, qname: String },
    Function { name: String, qname: String },
}

struct Collector<'a> {
    source: &'a [u8],
    rel_path: &'a str,
    module: &'a str,
    out: FileCollection,
    scopes: Vec<Scope>,
    in_main_block: bool,
    /// Qualified names whose bodies perform non-literal dynamic lookups.
    dynamic_risk: HashSet<String>,
}

impl<'a> Collector<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn location(&self, node: Node<'_>) -> Location {
        Location {
            file: self.rel_path.to_string(),
            line: node.start_position().row as u32 + 1,
            col: node.start_position().column as u32,
        }
    }

    fn qualify(&self, name: &str) -> String {
        let mut parts = vec![self.module.to_string()];
        for scope in &self.scopes {
            match scope {
                Scope::Class { name, .. } | Scope::Function { name, .. } => {
                    parts.push(name.clone())
                }
            }
        }
        parts.push(name.to_string());
        parts.join(".")
    }

    /// Nearest enclosing function/method, if any.
    fn caller(&self) -> Option<String> {
        self.scopes.iter().rev().find_map(|s| match s {
            Scope::Function { qname, .. } => Some(qname.clone()),
            Scope::Class { .. } => None,
        })
    }

    fn enclosing_class(&self) -> Option<&str> {
        match self.scopes.last() {
            Some(Scope::Class { qname, .. }) => Some(qname),
            _ => None,
        }
    }

    fn at_module_scope(&self) -> bool {
        self.scopes.is_empty()
    }

    fn emit_usage(&mut self, kind: UsageKind, name: &str, chain: Option<String>, node: Node<'_>) {
        if name.is_empty() {
            return;
        }
        let usage = Usage {
            name: name.to_string(),
            attribute_chain: chain,
            kind,
            location: self.location(node),
            caller: self.caller(),
            in_main_block: self.in_main_block,
        };
        self.out.usages.push(usage);
    }

    fn emit_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        node: Node<'_>,
        decorators: Vec<String>,
        parent_class: Option<String>,
        base_classes: Vec<String>,
    ) {
        self.out.symbols.push(Symbol {
            qualified_name: self.qualify(name),
            name: name.to_string(),
            kind,
            location: self.location(node),
            decorators,
            is_entrypoint: false,
            entrypoint_reasons: Vec::new(),
            parent_class,
            base_classes,
            noqa_codes: BTreeSet::new(),
            dynamic_risk: false,
        });
    }

    fn walk_children(&mut self, node: Node<'_>) {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i as u32) {
                self.walk(child);
            }
        }
    }

    fn walk(&mut self, node: Node<'_>) {
        match node.kind() {
            "function_definition" => self.handle_function(node, Vec::new()),
            "class_definition" => self.handle_class(node, Vec::new()),
            "decorated_definition" => self.handle_decorated(node),
            "import_statement" => self.handle_import(node),
            "import_from_statement" => self.handle_import_from(node),
            "future_import_statement" => {}
            "assignment" => self.handle_assignment(node),
            "augmented_assignment" => self.handle_augmented(node),
            "if_statement" => self.handle_if(node),
            "call" => self.handle_call(node),
            "attribute" => self.handle_attribute(node),
            "identifier" => {
                let name = self.text(node).to_string();
                self.emit_usage(UsageKind::NameRef, &name.clone(), Some(name), node);
            }
            "string" => {
                // Only f-string interpolations contain references.
                for i in 0..node.named_child_count() {
                    if let Some(child) = node.named_child(i as u32) {
                        if child.kind() == "interpolation" {
                            self.walk_children(child);
                        }
                    }
                }
            }
            "comment" => {}
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.walk(value);
                }
            }
            "lambda" => {
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.handle_parameters(params);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
            }
            "parameters" | "lambda_parameters" => self.handle_parameters(node),
            "global_statement" | "nonlocal_statement" => {}
            "for_statement" => {
                // The loop target binds names; only the iterable and body read.
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    self.walk(alt);
                }
            }
            "for_in_clause" => {
                // Comprehension clause: skip the binding target.
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right);
                }
            }
            "as_pattern" => {
                // `expr as name`: the alias is a binding, not a reference.
                if let Some(value) = node.named_child(0) {
                    self.walk(value);
                }
            }
            _ => self.walk_children(node),
        }
    }

    // --- definitions -----------------------------------------------------

    fn handle_decorated(&mut self, node: Node<'_>) {
        let mut decorators = Vec::new();
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i as u32) else { continue };
            if child.kind() != "decorator" {
                continue;
            }
            let Some(expr) = child.named_child(0) else { continue };
            decorators.push(self.normalize_decorator(expr));
            self.emit_decorator_usage(expr);
        }
        if let Some(inner) = node.child_by_field_name("definition") {
            match inner.kind() {
                "function_definition" => self.handle_function(inner, decorators),
                "class_definition" => self.handle_class(inner, decorators),
                _ => self.walk(inner),
            }
        }
    }

    /// DECORATOR_REF on the outermost callable name, then any call arguments.
    fn emit_decorator_usage(&mut self, expr: Node<'_>) {
        let callee = if expr.kind() == "call" {
            expr.child_by_field_name("function")
        } else {
            Some(expr)
        };
        if let Some(callee) = callee {
            match dotted_chain(callee, self.source) {
                Some(chain) => {
                    let leaf = chain.rsplit('.').next().unwrap_or(&chain).to_string();
                    self.emit_usage(UsageKind::DecoratorRef, &leaf, Some(chain), expr);
                }
                None => self.walk(callee),
            }
        }
        if expr.kind() == "call" {
            if let Some(args) = expr.child_by_field_name("arguments") {
                self.walk_children(args);
            }
        }
    }

    fn normalize_decorator(&self, expr: Node<'_>) -> String {
        if expr.kind() != "call" {
            return dotted_chain(expr, self.source).unwrap_or_else(|| self.text(expr).to_string());
        }
        let callee = expr
            .child_by_field_name("function")
            .and_then(|f| dotted_chain(f, self.source))
            .unwrap_or_else(|| {
                expr.child_by_field_name("function")
                    .map(|f| self.text(f).to_string())
                    .unwrap_or_default()
            });
        let mut rendered = Vec::new();
        if let Some(args) = expr.child_by_field_name("arguments") {
            for i in 0..args.named_child_count() {
                let Some(arg) = args.named_child(i as u32) else { continue };
                if arg.kind() == "comment" {
                    continue;
                }
                rendered.push(self.render_decorator_arg(arg));
            }
        }
        format!("{}({})", callee, rendered.join(", "))
    }

    fn render_decorator_arg(&self, arg: Node<'_>) -> String {
        let literal = match arg.kind() {
            "string" | "concatenated_string" | "integer" | "float" | "true" | "false"
            | "none" | "list" | "tuple" | "dictionary" | "set" => true,
            "unary_operator" => arg
                .named_child(0)
                .map(|c| matches!(c.kind(), "integer" | "float"))
                .unwrap_or(false),
            "keyword_argument" => arg
                .child_by_field_name("value")
                .map(|v| {
                    matches!(
                        v.kind(),
                        "string"
                            | "concatenated_string"
                            | "integer"
                            | "float"
                            | "true"
                            | "false"
                            | "none"
                            | "list"
                            | "tuple"
                            | "dictionary"
                            | "set"
                    )
                })
                .unwrap_or(false),
            _ => false,
        };
        if !literal {
            return "…".to_string();
        }
        let text = self.text(arg);
        if text.chars().count() > DECORATOR_ARG_MAX {
            text.chars().take(DECORATOR_ARG_MAX).collect()
        } else {
            text.to_string()
        }
    }

    fn handle_function(&mut self, node: Node<'_>, decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();

        // Annotations and default values evaluate in the enclosing scope.
        if let Some(params) = node.child_by_field_name("parameters") {
            self.handle_parameters(params);
        }
        if let Some(ret) = node.child_by_field_name("return_type") {
            self.walk(ret);
        }

        let (kind, parent_class) = match self.enclosing_class() {
            Some(class_qname) => (SymbolKind::Method, Some(class_qname.to_string())),
            None => (SymbolKind::Function, None),
        };
        self.emit_symbol(&name, kind, node, decorators, parent_class, Vec::new());

        let qname = self.qualify(&name);
        self.scopes.push(Scope::Function { name, qname });
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body);
        }
        self.scopes.pop();
    }

    fn handle_class(&mut self, node: Node<'_>, decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();

        let mut base_classes = Vec::new();
        if let Some(bases) = node.child_by_field_name("superclasses") {
            for i in 0..bases.named_child_count() {
                let Some(base) = bases.named_child(i as u32) else { continue };
                if matches!(base.kind(), "identifier" | "attribute") {
                    base_classes.push(self.text(base).to_string());
                }
                // Base expressions are references too.
                self.walk(base);
            }
        }

        self.emit_symbol(
            &name,
            SymbolKind::Class,
            node,
            decorators,
            None,
            base_classes,
        );

        let qname = self.qualify(&name);
        self.scopes.push(Scope::Class { name, qname });
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body);
        }
        self.scopes.pop();
    }

    fn handle_parameters(&mut self, params: Node<'_>) {
        for i in 0..params.named_child_count() {
            let Some(param) = params.named_child(i as u32) else { continue };
            match param.kind() {
                "identifier" => {} // plain parameter name: a binding
                "typed_parameter" => {
                    if let Some(ty) = param.child_by_field_name("type") {
                        self.walk(ty);
                    }
                }
                "default_parameter" => {
                    if let Some(value) = param.child_by_field_name("value") {
                        self.walk(value);
                    }
                }
                "typed_default_parameter" => {
                    if let Some(ty) = param.child_by_field_name("type") {
                        self.walk(ty);
                    }
                    if let Some(value) = param.child_by_field_name("value") {
                        self.walk(value);
                    }
                }
                // *args / **kwargs and positional markers bind, not read.
                _ => {}
            }
        }
    }

    fn variable_scope(&self) -> bool {
        self.at_module_scope() || matches!(self.scopes.last(), Some(Scope::Class { .. }))
    }

    fn handle_assignment(&mut self, node: Node<'_>) {
        let define = self.variable_scope() && node.child_by_field_name("right").is_some();
        if let Some(left) = node.child_by_field_name("left") {
            self.handle_assign_target(left, define);
        }
        if let Some(ty) = node.child_by_field_name("type") {
            self.walk(ty);
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
    }

    fn handle_assign_target(&mut self, target: Node<'_>, define: bool) {
        match target.kind() {
            "identifier" => {
                if define {
                    let name = self.text(target).to_string();
                    self.emit_symbol(&name, SymbolKind::Variable, target, Vec::new(), None, Vec::new());
                }
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                for i in 0..target.named_child_count() {
                    if let Some(child) = target.named_child(i as u32) {
                        self.handle_assign_target(child, define);
                    }
                }
            }
            "attribute" => {
                // Writing `obj.attr` still reads `obj`.
                self.handle_attribute(target);
            }
            "subscript" => self.walk_children(target),
            _ => {}
        }
    }

    fn handle_augmented(&mut self, node: Node<'_>) {
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind() == "identifier" {
                // Augmented assignment both reads and rebinds the name.
                let name = self.text(left).to_string();
                self.emit_usage(UsageKind::NameRef, &name.clone(), Some(name.clone()), left);
                if self.variable_scope() {
                    self.emit_symbol(&name, SymbolKind::Variable, left, Vec::new(), None, Vec::new());
                }
            } else {
                self.handle_assign_target(left, false);
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
    }

    // --- imports ---------------------------------------------------------

    fn handle_import(&mut self, node: Node<'_>) {
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i as u32) else { continue };
            let (target, alias, name_node) = match child.kind() {
                "dotted_name" => (self.text(child).to_string(), None, child),
                "aliased_import" => {
                    let Some(name) = child.child_by_field_name("name") else { continue };
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|a| self.text(a).to_string());
                    (self.text(name).to_string(), alias, child)
                }
                _ => continue,
            };
            self.record_import(target, None, alias, false, name_node);
        }
    }

    fn handle_import_from(&mut self, node: Node<'_>) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let target = self.text(module_node).to_string();

        let mut cursor = node.walk();
        let mut saw_name = false;
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            saw_name = true;
            match name_node.kind() {
                "dotted_name" => {
                    let imported = self.text(name_node).to_string();
                    self.record_import(target.clone(), Some(imported), None, false, name_node);
                }
                "aliased_import" => {
                    let Some(inner) = name_node.child_by_field_name("name") else { continue };
                    let imported = self.text(inner).to_string();
                    let alias = name_node
                        .child_by_field_name("alias")
                        .map(|a| self.text(a).to_string());
                    self.record_import(target.clone(), Some(imported), alias, false, name_node);
                }
                _ => {}
            }
        }

        if !saw_name {
            // `from x import *`
            let has_wildcard = (0..node.named_child_count())
                .filter_map(|i| node.named_child(i as u32))
                .any(|c| c.kind() == "wildcard_import");
            if has_wildcard {
                self.record_import(target, None, None, true, module_node);
            }
        }
    }

    fn record_import(
        &mut self,
        to_module: String,
        imported_name: Option<String>,
        alias: Option<String>,
        is_star: bool,
        node: Node<'_>,
    ) {
        let line = node.start_position().row as u32 + 1;
        let edge = ImportEdge {
            from_module: self.module.to_string(),
            to_module: to_module.clone(),
            imported_name: imported_name.clone(),
            alias,
            is_star,
            line,
        };
        if let Some(binding) = edge.binding() {
            // Only module/class-scope imports create inspectable bindings.
            if self.variable_scope() {
                self.emit_symbol(&binding, SymbolKind::Import, node, Vec::new(), None, Vec::new());
            }
            let referenced = imported_name.unwrap_or_else(|| binding.clone());
            let chain = if to_module.starts_with('.') {
                None
            } else if edge.imported_name.is_some() {
                Some(format!("{to_module}.{referenced}"))
            } else {
                Some(to_module.clone())
            };
            self.emit_usage(UsageKind::ImportRef, &referenced, chain, node);
        }
        self.out.imports.push(edge);
    }

    // --- expressions -----------------------------------------------------

    fn handle_if(&mut self, node: Node<'_>) {
        let is_main_guard = self.at_module_scope()
            && node
                .child_by_field_name("condition")
                .map(|c| {
                    let text = self.text(c);
                    text.contains("__name__")
                        && (text.contains("\"__main__\"") || text.contains("'__main__'"))
                })
                .unwrap_or(false);

        if let Some(condition) = node.child_by_field_name("condition") {
            self.walk(condition);
        }
        if let Some(consequence) = node.child_by_field_name("consequence") {
            if is_main_guard {
                self.out.has_main_block = true;
                let saved = self.in_main_block;
                self.in_main_block = true;
                self.walk(consequence);
                self.in_main_block = saved;
            } else {
                self.walk(consequence);
            }
        }
        let mut cursor = node.walk();
        let alternatives: Vec<Node<'_>> =
            node.children_by_field_name("alternative", &mut cursor).collect();
        for alt in alternatives {
            self.walk(alt);
        }
    }

    fn handle_call(&mut self, node: Node<'_>) {
        let callee = node.child_by_field_name("function");

        // Dynamic attribute dispatch: literal second argument becomes a
        // synthetic NAME_REF; anything else flags the enclosing symbol.
        if let Some(callee_node) = callee {
            if callee_node.kind() == "identifier"
                && DYNAMIC_LOOKUPS.contains(&self.text(callee_node))
            {
                self.handle_dynamic_lookup(node);
            }
        }

        if let Some(callee_node) = callee {
            match dotted_chain(callee_node, self.source) {
                Some(chain) => {
                    let leaf = chain.rsplit('.').next().unwrap_or(&chain).to_string();
                    self.emit_usage(UsageKind::Call, &leaf, Some(chain), node);
                }
                None => self.walk(callee_node),
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.walk_children(args);
        }
    }

    fn handle_dynamic_lookup(&mut self, call: Node<'_>) {
        let Some(args) = call.child_by_field_name("arguments") else {
            return;
        };
        let Some(name_arg) = args.named_child(1) else {
            return;
        };
        if name_arg.kind() == "string" {
            if let Some(literal) = string_content(name_arg, self.source) {
                self.emit_usage(UsageKind::NameRef, &literal.clone(), Some(literal), name_arg);
            }
            return;
        }
        let caller = self.caller();
        if let Some(qname) = &caller {
            self.dynamic_risk.insert(qname.clone());
        }
        self.out.diagnostics.push(Diagnostic::new(
            DiagnosticKind::DynamicAttribute,
            Some(self.rel_path),
            Some(name_arg.start_position().row as u32 + 1),
            match &caller {
                Some(qname) => format!("non-literal dynamic lookup in {qname}"),
                None => "non-literal dynamic lookup at module scope".to_string(),
            },
        ));
    }

    fn handle_attribute(&mut self, node: Node<'_>) {
        match dotted_chain(node, self.source) {
            Some(chain) => {
                let leaf = chain.rsplit('.').next().unwrap_or(&chain).to_string();
                self.emit_usage(UsageKind::Attribute, &leaf, Some(chain), node);
            }
            None => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.walk(object);
                }
                if let Some(attr) = node.child_by_field_name("attribute") {
                    let leaf = self.text(attr).to_string();
                    self.emit_usage(UsageKind::Attribute, &leaf, None, node);
                }
            }
        }
    }
}

/// Renders a pure `a.b.c` chain; `None` when any link is not an identifier.
fn dotted_chain(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node.utf8_text(source).ok()?.to_string()),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attr = node.child_by_field_name("attribute")?;
            let prefix = dotted_chain(object, source)?;
            Some(format!("{}.{}", prefix, attr.utf8_text(source).ok()?))
        }
        _ => None,
    }
}

/// Extracts the text of a plain string literal (no interpolations).
fn string_content(node: Node<'_>, source: &[u8]) -> Option<String> {
    let mut content = String::new();
    for i in 0..node.named_child_count() {
        let child = node.named_child(i as u32)?;
        match child.kind() {
            "string_content" => content.push_str(child.utf8_text(source).ok()?),
            "interpolation" => return None,
            _ => {}
        }
    }
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserHost;

    fn collect_src(source: &str) -> FileCollection {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse(source.as_bytes()).unwrap();
        collect_tree(tree.root_node(), source.as_bytes(), "mod.py", "mod")
    }

    fn find<'a>(out: &'a FileCollection, qname: &str) -> &'a Symbol {
        out.symbols
            .iter()
            .find(|s| s.qualified_name == qname)
            .unwrap_or_else(|| panic!("no symbol {qname}"))
    }

    #[test]
    fn test_function_symbol() {
        let out = collect_src("def hello():\n    pass\n");
        let sym = find(&out, "mod.hello");
        assert_eq!(sym.kind, SymbolKind::Function);
        assert_eq!(sym.name, "hello");
        assert_eq!(sym.location.line, 1);
        assert!(sym.parent_class.is_none());
    }

    #[test]
    fn test_method_and_class() {
        let out = collect_src("class Box:\n    def open(self):\n        pass\n");
        let class = find(&out, "mod.Box");
        assert_eq!(class.kind, SymbolKind::Class);
        let method = find(&out, "mod.Box.open");
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.parent_class.as_deref(), Some("mod.Box"));
    }

    #[test]
    fn test_nested_function_is_function() {
        let out = collect_src("def outer():\n    def inner():\n        pass\n");
        let inner = find(&out, "mod.outer.inner");
        assert_eq!(inner.kind, SymbolKind::Function);
    }

    #[test]
    fn test_class_bases_recorded_and_referenced() {
        let out = collect_src("class Derived(Base, db.Model):\n    pass\n");
        let class = find(&out, "mod.Derived");
        assert_eq!(class.base_classes, vec!["Base", "db.Model"]);
        assert!(out
            .usages
            .iter()
            .any(|u| u.kind == UsageKind::NameRef && u.name == "Base"));
        assert!(out
            .usages
            .iter()
            .any(|u| u.kind == UsageKind::Attribute
                && u.attribute_chain.as_deref() == Some("db.Model")));
    }

    #[test]
    fn test_module_variable() {
        let out = collect_src("LIMIT = 10\n");
        let var = find(&out, "mod.LIMIT");
        assert_eq!(var.kind, SymbolKind::Variable);
    }

    #[test]
    fn test_tuple_unpacking_binds_each_name() {
        let out = collect_src("a, b = 1, 2\n");
        assert_eq!(find(&out, "mod.a").kind, SymbolKind::Variable);
        assert_eq!(find(&out, "mod.b").kind, SymbolKind::Variable);
    }

    #[test]
    fn test_local_assignment_is_not_a_symbol() {
        let out = collect_src("def f():\n    local = 1\n    return local\n");
        assert!(out.symbols.iter().all(|s| s.name != "local"));
    }

    #[test]
    fn test_decorator_normalization_plain_and_call() {
        let out = collect_src("@app.route('/x', methods=['POST'])\ndef handler():\n    pass\n");
        let sym = find(&out, "mod.handler");
        assert_eq!(sym.decorators, vec!["app.route('/x', methods=['POST'])"]);

        let out = collect_src("@staticmethod\ndef util():\n    pass\n");
        assert_eq!(find(&out, "mod.util").decorators, vec!["staticmethod"]);
    }

    #[test]
    fn test_decorator_non_literal_arg_elided() {
        let out = collect_src("@register(make_key())\ndef target():\n    pass\n");
        assert_eq!(find(&out, "mod.target").decorators, vec!["register(…)"]);
    }

    #[test]
    fn test_decorator_ref_usage() {
        let out = collect_src("@app.route('/')\ndef index():\n    return 'ok'\n");
        let dec = out
            .usages
            .iter()
            .find(|u| u.kind == UsageKind::DecoratorRef)
            .unwrap();
        assert_eq!(dec.name, "route");
        assert_eq!(dec.attribute_chain.as_deref(), Some("app.route"));
        assert!(dec.caller.is_none());
    }

    #[test]
    fn test_call_usage_with_caller() {
        let out = collect_src("def run():\n    helper(1)\n");
        let call = out
            .usages
            .iter()
            .find(|u| u.kind == UsageKind::Call && u.name == "helper")
            .unwrap();
        assert_eq!(call.caller.as_deref(), Some("mod.run"));
    }

    #[test]
    fn test_attribute_chain_usage() {
        let out = collect_src("def run():\n    return settings.db.url\n");
        let attr = out
            .usages
            .iter()
            .find(|u| u.kind == UsageKind::Attribute)
            .unwrap();
        assert_eq!(attr.name, "url");
        assert_eq!(attr.attribute_chain.as_deref(), Some("settings.db.url"));
    }

    #[test]
    fn test_imports_bare_from_alias_star() {
        let out = collect_src(
            "import os.path\nfrom flask import Flask\nfrom pkg import thing as alias\nfrom x import *\n",
        );
        assert_eq!(out.imports.len(), 4);

        let bare = &out.imports[0];
        assert_eq!(bare.to_module, "os.path");
        assert_eq!(bare.binding().as_deref(), Some("os"));

        let from = &out.imports[1];
        assert_eq!(from.to_module, "flask");
        assert_eq!(from.imported_name.as_deref(), Some("Flask"));

        let aliased = &out.imports[2];
        assert_eq!(aliased.binding().as_deref(), Some("alias"));

        let star = &out.imports[3];
        assert!(star.is_star);
        assert!(star.binding().is_none());

        // One IMPORT symbol per binding; the star import has none.
        let import_symbols: Vec<&str> = out
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Import)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(import_symbols, vec!["os", "Flask", "alias"]);
    }

    #[test]
    fn test_relative_import() {
        let out = collect_src("from ..core import engine\n");
        assert_eq!(out.imports[0].to_module, "..core");
        assert_eq!(out.imports[0].imported_name.as_deref(), Some("engine"));
    }

    #[test]
    fn test_import_ref_usage() {
        let out = collect_src("from pkg.tasks import send\n");
        let usage = out
            .usages
            .iter()
            .find(|u| u.kind == UsageKind::ImportRef)
            .unwrap();
        assert_eq!(usage.name, "send");
        assert_eq!(usage.attribute_chain.as_deref(), Some("pkg.tasks.send"));
    }

    #[test]
    fn test_main_block_detection() {
        let out = collect_src(
            "def main():\n    pass\n\nif __name__ == \"__main__\":\n    main()\n",
        );
        assert!(out.has_main_block);
        let call = out
            .usages
            .iter()
            .find(|u| u.kind == UsageKind::Call && u.name == "main")
            .unwrap();
        assert!(call.in_main_block);
        assert!(call.caller.is_none());
    }

    #[test]
    fn test_getattr_literal_becomes_name_ref() {
        let out = collect_src("def pick(obj):\n    return getattr(obj, \"handler\")\n");
        assert!(out
            .usages
            .iter()
            .any(|u| u.kind == UsageKind::NameRef && u.name == "handler"));
        assert!(out.diagnostics.is_empty());
        assert!(!find(&out, "mod.pick").dynamic_risk);
    }

    #[test]
    fn test_getattr_dynamic_flags_enclosing() {
        let out = collect_src("def pick(obj, key):\n    return getattr(obj, key)\n");
        assert!(find(&out, "mod.pick").dynamic_risk);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::DynamicAttribute);
    }

    #[test]
    fn test_annotation_and_default_references_collected() {
        let out = collect_src("def f(x: Config = DEFAULT) -> Result:\n    return x\n");
        let names: Vec<&str> = out
            .usages
            .iter()
            .filter(|u| u.kind == UsageKind::NameRef)
            .map(|u| u.name.as_str())
            .collect();
        assert!(names.contains(&"Config"));
        assert!(names.contains(&"DEFAULT"));
        assert!(names.contains(&"Result"));
        // Annotations/defaults belong to the enclosing scope, not the function.
        assert!(out
            .usages
            .iter()
            .filter(|u| u.name == "Config")
            .all(|u| u.caller.is_none()));
    }

    #[test]
    fn test_augmented_assignment_reads_and_rebinds() {
        let out = collect_src("count = 0\ncount += 1\n");
        assert!(out
            .usages
            .iter()
            .any(|u| u.kind == UsageKind::NameRef && u.name == "count"));
        assert_eq!(
            out.symbols
                .iter()
                .filter(|s| s.name == "count")
                .count(),
            2
        );
    }

    #[test]
    fn test_fstring_interpolation_collected() {
        let out = collect_src("def f(v):\n    return f\"value={v + offset}\"\n");
        assert!(out
            .usages
            .iter()
            .any(|u| u.kind == UsageKind::NameRef && u.name == "offset"));
    }

    #[test]
    fn test_empty_source() {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse(b"# just a comment\n").unwrap();
        let out = collect_tree(tree.root_node(), b"# just a comment\n", "mod.py", "mod");
        assert!(out.symbols.is_empty());
        assert!(out.usages.is_empty());
    }
}
