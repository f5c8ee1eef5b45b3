//! The semantic analyzer.
//!
//! Walks the AST with a pre-hoisted symbol graph, resolving names,
//! types, calls, and operators, and leaving behind resolved
//! references, completion hints, highlight re-classifications, and
//! diagnostics. Errors never abort the walk: an unresolvable
//! sub-expression yields `None` and downstream checks stay silent
//! about it.

mod calls;
mod expr;
mod func_match;
mod operators;
mod stmt;

pub use calls::CallSite;

use crate::builtin;
use crate::completion::CompletionHint;
use crate::conversion::can_convert;
use crate::hoist::{AnalyzeTask, HoistResult};
use crate::symbols::{
    LinkedNode, ResolvedType, ScopeId, Symbol, SymbolArena, SymbolId, SymbolReference,
    SymbolVariable, TemplateParamKey, TemplateTranslate, TypeSource,
};
use asls_core::{Diagnostics, HighlightKind, Highlights, Span, TokenId, TokenRange};
use asls_parser::ast::*;
use asls_parser::lexer::{Token, TokenKind};
use std::rc::Rc;
use tracing::debug;

/// How a variable declaration enters the symbol graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarRegister {
    /// A statement-level declaration: insert fresh symbols.
    Declare,
    /// A hoisted declaration: patch the pre-registered symbols.
    Patch,
}

pub struct Analyzer<'a, 'out> {
    pub(crate) symbols: SymbolArena<'a>,
    tokens: &'a [Token<'a>],
    diagnostics: &'out mut Diagnostics,
    highlights: &'out mut Highlights,
    pub(crate) scope: ScopeId,
    /// When non-zero, diagnostics, references, hints, and highlight
    /// changes are suppressed (overload scoring re-resolves
    /// signatures without re-reporting their problems).
    quiet: u32,
}

impl<'a, 'out> Analyzer<'a, 'out> {
    /// Run the analysis queue produced by the hoist pass and return
    /// the populated scope tree.
    pub fn run(
        hoist: HoistResult<'a>,
        tokens: &'a [Token<'a>],
        diagnostics: &'out mut Diagnostics,
        highlights: &'out mut Highlights,
    ) -> SymbolArena<'a> {
        let global = hoist.global_scope;
        let mut analyzer = Analyzer {
            symbols: hoist.symbols,
            tokens,
            diagnostics,
            highlights,
            scope: global,
            quiet: 0,
        };
        debug!(tasks = hoist.analyze_queue.len(), "analyzing hoisted declarations");
        for task in hoist.analyze_queue {
            analyzer.run_task(task);
        }
        analyzer.symbols
    }

    fn run_task(&mut self, task: AnalyzeTask<'a>) {
        match task {
            AnalyzeTask::Var { scope, node } => self.with_scope(scope, |a| {
                a.analyze_var_decl(node, VarRegister::Patch);
            }),
            AnalyzeTask::Func {
                scope,
                symbol,
                node,
            } => self.run_func_task(scope, symbol, node),
            AnalyzeTask::VirtualProp { scope, node } => self.run_virtual_prop_task(scope, node),
            AnalyzeTask::EnumMembers { scope, node } => self.with_scope(scope, |a| {
                for member in node.members {
                    if let Some(value) = member.value {
                        a.analyze_expr_node(value);
                    }
                }
            }),
        }
    }

    fn run_func_task(&mut self, func_scope: ScopeId, _symbol: SymbolId, node: &'a FuncDecl<'a>) {
        self.with_scope(func_scope, |a| {
            for param in node.params {
                let ty = a.analyze_type(param.ty);
                if let Some(default) = param.default {
                    let default_ty = a.analyze_expr_node(default);
                    if !can_convert(&a.symbols, &default_ty, &ty) {
                        a.error(a.span_of(default.range), "Type mismatch.");
                    }
                }
                if let Some(name) = param.name {
                    let symbol = Symbol::Variable(SymbolVariable {
                        name: name.name,
                        decl_token: Some(name.token),
                        ty: ty.clone(),
                        is_instance_member: false,
                        is_parameter: true,
                        access: Access::Public,
                    });
                    if a.symbols.insert_symbol(a.scope, symbol).is_err() {
                        a.error(name.span, format!("'{}' is already declared.", name.name));
                    }
                }
            }

            // Resolve the written return type once, loudly; call
            // sites re-resolve it quietly.
            if let FuncHead::Returns { return_type, .. } = node.head {
                let _ = a.analyze_type(return_type);
            }

            for statement in node.body.statements {
                a.analyze_statement(statement);
            }
        });
    }

    fn run_virtual_prop_task(&mut self, declaring: ScopeId, node: &'a VirtualPropDecl<'a>) {
        let ty = self.with_scope(declaring, |a| a.analyze_type(node.ty));

        // Patch the property variable registered by the hoist pass.
        if let Some(id) = self.symbols.lookup(declaring, node.name.name) {
            if let Symbol::Variable(var) = self.symbols.symbol_mut(id) {
                var.ty = ty.clone();
            }
        }

        for accessor in node.accessors {
            let key = match accessor.kind {
                AccessorKind::Get => format!("get_{}", node.name.name),
                AccessorKind::Set => format!("set_{}", node.name.name),
            };
            let Some(accessor_scope) = self.symbols.find_child_scope(declaring, &key) else {
                continue;
            };
            self.with_scope(accessor_scope, |a| {
                if accessor.kind == AccessorKind::Set {
                    // Setters receive the incoming value implicitly.
                    let _ = a.symbols.insert_symbol(
                        a.scope,
                        Symbol::Variable(SymbolVariable {
                            name: "value",
                            decl_token: None,
                            ty: ty.clone(),
                            is_instance_member: false,
                            is_parameter: true,
                            access: Access::Public,
                        }),
                    );
                }
                if let Some(body) = accessor.body {
                    for statement in body.statements {
                        a.analyze_statement(statement);
                    }
                }
            });
        }
    }

    // =====================================================================
    // Context plumbing
    // =====================================================================

    pub(crate) fn with_scope<R>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        self.scope = scope;
        let result = f(self);
        self.scope = saved;
        result
    }

    pub(crate) fn quietly<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.quiet += 1;
        let result = f(self);
        self.quiet -= 1;
        result
    }

    pub(crate) fn error(&mut self, span: Span, message: impl Into<String>) {
        if self.quiet == 0 {
            self.diagnostics.error(span, message);
        }
    }

    pub(crate) fn reclassify(&mut self, token: TokenId, kind: HighlightKind) {
        if self.quiet == 0 {
            self.highlights.set(token, kind);
        }
    }

    pub(crate) fn add_reference(&mut self, token: TokenId, symbol: SymbolId) {
        if self.quiet == 0 {
            let scope = self.scope;
            self.symbols
                .scope_mut(scope)
                .referenced
                .push(SymbolReference { token, symbol });
        }
    }

    pub(crate) fn add_hint(&mut self, hint: CompletionHint) {
        if self.quiet == 0 {
            let scope = self.scope;
            self.symbols.scope_mut(scope).hints.push(hint);
        }
    }

    /// The source span of a node's token range.
    pub(crate) fn span_of(&self, range: TokenRange) -> Span {
        let start = self.tokens[range.start.index()].span;
        let end = self.tokens[range.end.index()].span;
        start.merge(end)
    }

    /// The next non-comment token after `token`, if any.
    fn next_meaningful(&self, token: TokenId) -> Option<&'a Token<'a>> {
        self.tokens[token.index() + 1..]
            .iter()
            .find(|t| t.kind != TokenKind::Comment)
    }

    pub(crate) fn builtin_type(&self, name: &str) -> Option<ResolvedType> {
        self.symbols
            .lookup(self.symbols.global(), name)
            .map(ResolvedType::plain)
    }

    pub(crate) fn is_number(&self, ty: &ResolvedType) -> bool {
        self.symbols
            .symbol(ty.symbol)
            .as_type()
            .is_some_and(|t| t.is_number_type)
    }

    pub(crate) fn is_user_object(&self, ty: &ResolvedType) -> bool {
        self.symbols
            .symbol(ty.symbol)
            .as_type()
            .is_some_and(|t| t.members_scope.is_some() && !t.is_system_type)
    }

    pub(crate) fn type_name(&self, ty: &ResolvedType) -> &'a str {
        self.symbols.symbol(ty.symbol).name()
    }

    /// Substitute a template parameter through the active translation.
    pub(crate) fn apply_translate(
        &self,
        ty: Option<ResolvedType>,
        translate: &Option<Rc<TemplateTranslate>>,
    ) -> Option<ResolvedType> {
        let ty = ty?;
        let Some(map) = translate else {
            return Some(ty);
        };
        if let Symbol::Type(symbol) = self.symbols.symbol(ty.symbol) {
            if let TypeSource::TemplateParam(token) = symbol.source {
                if let Some(substituted) = map.get(&TemplateParamKey::Token(token)) {
                    return substituted
                        .clone()
                        .map(|s| if ty.is_handler { s.with_handler(true) } else { s });
                }
            }
        }
        Some(ty)
    }

    // =====================================================================
    // Types and scopes
    // =====================================================================

    /// Resolve a written type to a [`ResolvedType`].
    ///
    /// `auto` and `?` resolve to nothing; the caller substitutes an
    /// inferred type where the grammar allows one.
    pub(crate) fn analyze_type(&mut self, node: &'a TypeNode<'a>) -> Option<ResolvedType> {
        if matches!(
            node.datatype.kind,
            DataTypeKind::Auto | DataTypeKind::Unresolvable
        ) {
            return None;
        }
        let ident = node.datatype.ident;

        let found = if let Some(scope_node) = node.scope {
            let scope = self.analyze_scope(scope_node)?;
            self.symbols
                .lookup(scope, ident.name)
                .map(|id| (id, scope))
        } else {
            self.symbols.lookup_walk(self.scope, ident.name)
        };
        let Some((mut symbol_id, found_scope)) = found else {
            self.error(ident.span, format!("'{}' is not defined.", ident.name));
            return None;
        };

        // A hit on a constructor means the lookup landed inside the
        // class's member scope; the type itself is a sibling of that
        // scope, one level up.
        if self.symbols.symbol(symbol_id).as_function().is_some() {
            if let Some(parent) = self.symbols.scope(found_scope).parent {
                if let Some((retry, _)) = self.symbols.lookup_walk(parent, ident.name) {
                    symbol_id = retry;
                }
            }
        }

        let Some(symbol_type) = self.symbols.symbol(symbol_id).as_type() else {
            self.error(ident.span, format!("'{}' is not a type.", ident.name));
            return None;
        };
        let is_funcdef = matches!(symbol_type.source, TypeSource::FuncDef(_));
        let highlight = match symbol_type.source {
            TypeSource::Class(_) => Some(HighlightKind::Class),
            TypeSource::Interface(_) => Some(HighlightKind::Interface),
            TypeSource::Enum(_) => Some(HighlightKind::Enum),
            TypeSource::TypeDef(_) | TypeSource::FuncDef(_) | TypeSource::TemplateParam(_) => {
                Some(HighlightKind::Type)
            }
            TypeSource::Primitive => None,
        };
        let template_params: Vec<TokenId> = symbol_type
            .template_params
            .iter()
            .map(|p| p.token)
            .collect();

        if let Some(kind) = highlight {
            self.reclassify(ident.token, kind);
        }
        self.add_reference(ident.token, symbol_id);

        // Pairwise template bindings, keyed by parameter token.
        let mut translate = None;
        if !node.template_args.is_empty() || !template_params.is_empty() {
            let mut map = TemplateTranslate::default();
            for (index, &param) in template_params.iter().enumerate() {
                let bound = node
                    .template_args
                    .get(index)
                    .map(|arg| self.analyze_type(arg))
                    .unwrap_or(None);
                map.insert(TemplateParamKey::Token(param), bound);
            }
            // Arguments beyond the declared parameters still get
            // resolved so their own problems surface.
            for extra in node.template_args.iter().skip(template_params.len()) {
                let _ = self.analyze_type(extra);
            }
            if !map.is_empty() {
                translate = Some(Rc::new(map));
            }
        }

        let mut resolved = ResolvedType {
            symbol: symbol_id,
            is_handler: is_funcdef || node.ref_modifier != RefModifier::None,
            translate,
        };

        // `T[]` sugar: an instantiation of the built-in array type
        // with T as its single template argument.
        if node.is_array {
            if let Some(array) = self.builtin_type(builtin::ARRAY_TYPE) {
                let mut map = TemplateTranslate::default();
                map.insert(
                    TemplateParamKey::Builtin(builtin::ARRAY_TEMPLATE_PARAM),
                    Some(resolved.clone()),
                );
                resolved = ResolvedType {
                    symbol: array.symbol,
                    is_handler: false,
                    translate: Some(Rc::new(map)),
                };
            }
        }

        let span = self.span_of(node.range);
        self.add_hint(CompletionHint::Type {
            target: resolved.clone(),
            span,
        });
        Some(resolved)
    }

    /// Resolve a `[::] id1::id2::…` prefix to the scope it names.
    pub(crate) fn analyze_scope(&mut self, node: &'a ScopeNode<'a>) -> Option<ScopeId> {
        let mut current = if node.is_global {
            self.symbols.global()
        } else {
            self.scope
        };

        for (index, ident) in node.path.iter().enumerate() {
            // Hint covers the identifier through its '::'.
            let mut span = ident.span;
            if let Some(next) = self.next_meaningful(ident.token) {
                if next.text == "::" {
                    span = span.merge(next.span);
                }
            }
            self.add_hint(CompletionHint::Namespace {
                path: node.path[..=index].iter().map(|p| p.token).collect(),
                span,
            });

            let mut hop = self.symbols.find_child_scope(current, ident.name);
            if hop.is_none() && index == 0 && !node.is_global {
                // The first hop may name a scope visible from an
                // ancestor; climb and retry.
                let mut climb = self.symbols.scope(current).parent;
                while let Some(scope) = climb {
                    if let Some(found) = self.symbols.find_child_scope(scope, ident.name) {
                        hop = Some(found);
                        break;
                    }
                    climb = self.symbols.scope(scope).parent;
                }
            }

            let Some(next_scope) = hop else {
                self.error(ident.span, "Invalid scope.");
                return None;
            };
            self.reclassify(ident.token, HighlightKind::Namespace);
            current = next_scope;
        }

        for arg in node.template_args {
            let _ = self.analyze_type(arg);
        }
        Some(current)
    }

    // =====================================================================
    // Variable declarations
    // =====================================================================

    pub(crate) fn analyze_var_decl(&mut self, node: &'a VarDecl<'a>, register: VarRegister) {
        let declared = if node.ty.is_auto() {
            None
        } else {
            self.analyze_type(node.ty)
        };

        for declarator in node.declarators {
            let mut var_ty = declared.clone();
            match declarator.init {
                None => {
                    if node.ty.is_auto() {
                        self.error(
                            declarator.name.span,
                            "'auto' requires an initializer.",
                        );
                    }
                }
                Some(VarInit::Assign(assign)) => {
                    let init_ty = self.analyze_assign(assign);
                    if node.ty.is_auto() {
                        var_ty = init_ty;
                    } else if !can_convert(&self.symbols, &init_ty, &declared) {
                        self.error(self.span_of(assign.range), "Type mismatch.");
                    }
                }
                Some(VarInit::InitList(list)) => {
                    // Braced initializers have no inferred type yet;
                    // contents are analyzed, the check is skipped.
                    self.analyze_init_list(list);
                }
                Some(VarInit::Args(args)) => {
                    if let Some(target) = declared.clone() {
                        self.analyze_construct_args(target, declarator.name, args);
                    } else {
                        for arg in args.args {
                            let _ = self.analyze_assign(arg.value);
                        }
                    }
                }
            }

            match register {
                VarRegister::Declare => {
                    let symbol = Symbol::Variable(SymbolVariable {
                        name: declarator.name.name,
                        decl_token: Some(declarator.name.token),
                        ty: var_ty,
                        is_instance_member: false,
                        is_parameter: false,
                        access: node.access,
                    });
                    if self.symbols.insert_symbol(self.scope, symbol).is_err() {
                        self.error(
                            declarator.name.span,
                            format!("'{}' is already declared.", declarator.name.name),
                        );
                    }
                }
                VarRegister::Patch => {
                    if let Some(id) = self.symbols.lookup(self.scope, declarator.name.name) {
                        if let Symbol::Variable(var) = self.symbols.symbol_mut(id) {
                            var.ty = var_ty;
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn analyze_init_list(&mut self, list: &'a InitList<'a>) {
        for element in list.elements {
            match element {
                InitElement::Assign(assign) => {
                    let _ = self.analyze_assign(assign);
                }
                InitElement::List(inner) => self.analyze_init_list(inner),
            }
        }
    }

    /// The class type `this` refers to in the current scope chain.
    pub(crate) fn this_type(&self) -> Option<ResolvedType> {
        let class_scope = self
            .symbols
            .enclosing_scope(self.scope, |n| matches!(n, LinkedNode::Class(_)))?;
        let Some(LinkedNode::Class(class)) = self.symbols.scope(class_scope).linked_node else {
            return None;
        };
        let parent = self.symbols.scope(class_scope).parent?;
        let (id, _) = self.symbols.lookup_walk(parent, class.name.name)?;
        self.symbols
            .symbol(id)
            .as_type()
            .map(|_| ResolvedType::plain(id))
    }
}
