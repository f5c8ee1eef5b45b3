//! Call and member-access analysis.
//!
//! Call sites dispatch on what the callee name resolves to: a type
//! becomes a constructor call, a variable holding a function value is
//! called directly, a user-typed value is called through `opCall`,
//! and a function goes through overload resolution.

use super::Analyzer;
use crate::conversion::can_convert;
use crate::symbols::{ResolvedType, ScopeId, Symbol, SymbolId, TemplateParamKey, TypeSource};
use asls_core::{HighlightKind, Span, TokenId};
use asls_parser::ast::*;

/// One call site, as the overload checker sees it: who is being
/// called, with which argument types, where.
#[derive(Debug)]
pub struct CallSite<'a> {
    pub name: &'a str,
    pub name_token: TokenId,
    pub span: Span,
    pub arg_types: Vec<Option<ResolvedType>>,
    pub arg_spans: Vec<Span>,
}

impl<'a, 'out> Analyzer<'a, 'out> {
    /// Analyze an argument list into types and spans.
    fn analyze_args(&mut self, args: &'a ArgList<'a>) -> (Vec<Option<ResolvedType>>, Vec<Span>) {
        let mut types = Vec::with_capacity(args.args.len());
        let mut spans = Vec::with_capacity(args.args.len());
        for arg in args.args {
            spans.push(self.span_of(arg.value.range));
            types.push(self.analyze_assign(arg.value));
        }
        (types, spans)
    }

    fn call_site(
        &mut self,
        name: Ident<'a>,
        args: &'a ArgList<'a>,
    ) -> CallSite<'a> {
        let (arg_types, arg_spans) = self.analyze_args(args);
        CallSite {
            name: name.name,
            name_token: name.token,
            span: name.span,
            arg_types,
            arg_spans,
        }
    }

    /// `name(args)` with optional scope prefix.
    pub(crate) fn analyze_func_call(&mut self, call: &'a FuncCall<'a>) -> Option<ResolvedType> {
        if call.name.name == "super" {
            // Base-class construction; bases are not completed here,
            // so the arguments are analyzed and the call accepted.
            let _ = self.analyze_args(call.args);
            return None;
        }

        let found = if let Some(scope_node) = call.scope {
            let scope = self.analyze_scope(scope_node)?;
            self.symbols.lookup(scope, call.name.name)
        } else {
            self.symbols
                .lookup_walk(self.scope, call.name.name)
                .map(|(id, _)| id)
        };

        let site = self.call_site(call.name, call.args);
        let Some(symbol_id) = found else {
            self.error(
                call.name.span,
                format!("'{}' is not defined.", call.name.name),
            );
            return None;
        };
        self.dispatch_call(symbol_id, site)
    }

    fn dispatch_call(&mut self, symbol_id: SymbolId, site: CallSite<'a>) -> Option<ResolvedType> {
        match self.symbols.symbol(symbol_id) {
            Symbol::Type(symbol_type) => {
                let highlight = match symbol_type.source {
                    TypeSource::Class(_) => HighlightKind::Class,
                    TypeSource::Interface(_) => HighlightKind::Interface,
                    TypeSource::Enum(_) => HighlightKind::Enum,
                    _ => HighlightKind::Type,
                };
                self.reclassify(site.name_token, highlight);
                self.construct_with(ResolvedType::plain(symbol_id), site)
            }
            Symbol::Variable(var) => {
                let value_ty = var.ty.clone();
                self.reclassify(site.name_token, HighlightKind::Variable);
                let value_ty = value_ty?;
                match self.symbols.symbol(value_ty.symbol) {
                    // A delegate holding a concrete function.
                    Symbol::Function(_) => {
                        let translate = value_ty.translate.clone();
                        self.check_function_match(&site, value_ty.symbol, translate, None)
                    }
                    Symbol::Type(ty) => {
                        if let TypeSource::FuncDef(funcdef) = ty.source {
                            self.check_funcdef_call(funcdef, &site)
                        } else {
                            // A callable object: rewrite to `opCall`.
                            self.method_site_on(&value_ty, "opCall", site)
                        }
                    }
                    Symbol::Variable(_) => None,
                }
            }
            Symbol::Function(_) => self.check_function_match(&site, symbol_id, None, None),
        }
    }

    /// A construct expression `TYPE(args)`.
    pub(crate) fn analyze_construct_call(
        &mut self,
        call: &'a ConstructCall<'a>,
    ) -> Option<ResolvedType> {
        let target = self.analyze_type(call.ty);
        let site = {
            let (arg_types, arg_spans) = self.analyze_args(call.args);
            CallSite {
                name: call.ty.datatype.ident.name,
                name_token: call.ty.datatype.ident.token,
                span: call.ty.datatype.ident.span,
                arg_types,
                arg_spans,
            }
        };
        let target = target?;
        self.construct_with(target, site)
    }

    /// A variable declarator with parenthesized arguments:
    /// `A a(42);` constructs the declared type.
    pub(crate) fn analyze_construct_args(
        &mut self,
        target: ResolvedType,
        name: Ident<'a>,
        args: &'a ArgList<'a>,
    ) -> Option<ResolvedType> {
        let site = self.call_site(name, args);
        self.construct_with(target, site)
    }

    /// Constructor dispatch: a declared constructor overload when one
    /// exists, otherwise the built-in construction rules.
    fn construct_with(&mut self, target: ResolvedType, site: CallSite<'a>) -> Option<ResolvedType> {
        let Some(symbol_type) = self.symbols.symbol(target.symbol).as_type() else {
            return None;
        };
        let type_name = symbol_type.name;
        let members_scope = symbol_type.members_scope;
        let is_enum = matches!(symbol_type.source, TypeSource::Enum(_));

        if let Some(members) = members_scope {
            let constructor = self
                .symbols
                .lookup(members, type_name)
                .filter(|&id| self.symbols.symbol(id).as_function().is_some());
            if let Some(constructor) = constructor {
                let translate = target.translate.clone();
                return self.check_function_match(&site, constructor, translate, Some(target));
            }
        }

        if is_enum {
            let int_ty = self.builtin_type("int");
            let one_integer = site.arg_types.len() == 1
                && can_convert(&self.symbols, &site.arg_types[0], &int_ty);
            if one_integer {
                self.add_reference(site.name_token, target.symbol);
                return Some(target);
            }
            self.error(site.span, "Enum constructor requires an integer.");
            return None;
        }

        if site.arg_types.is_empty() {
            // Default construction succeeds silently.
            self.add_reference(site.name_token, target.symbol);
            return Some(target);
        }
        self.error(
            site.span,
            format!("'{}' does not have a matching constructor.", site.name),
        );
        None
    }

    /// `value.name(args)` — the value's type must expose the method.
    pub(crate) fn analyze_method_call(
        &mut self,
        lhs: Option<ResolvedType>,
        name: Ident<'a>,
        args: &'a ArgList<'a>,
    ) -> Option<ResolvedType> {
        let site = self.call_site(name, args);
        let lhs = lhs?;
        self.method_site_on(&lhs, name.name, site)
    }

    fn method_site_on(
        &mut self,
        lhs: &ResolvedType,
        method: &str,
        site: CallSite<'a>,
    ) -> Option<ResolvedType> {
        let Some(members) = self
            .symbols
            .symbol(lhs.symbol)
            .as_type()
            .and_then(|t| t.members_scope)
        else {
            self.error(site.span, format!("'{}' is not defined.", method));
            return None;
        };
        let Some(found) = self.symbols.lookup(members, method) else {
            self.error(site.span, format!("'{}' is not defined.", method));
            return None;
        };
        if self.symbols.symbol(found).as_function().is_none() {
            self.error(site.span, format!("'{}' is not a method.", method));
            return None;
        }
        let translate = lhs.translate.clone();
        self.check_function_match(&site, found, translate, None)
    }

    /// `value.name` — field access with access control.
    pub(crate) fn analyze_field_access(
        &mut self,
        lhs: Option<ResolvedType>,
        name: Ident<'a>,
    ) -> Option<ResolvedType> {
        let lhs = lhs?;
        let Some(members) = self
            .symbols
            .symbol(lhs.symbol)
            .as_type()
            .and_then(|t| t.members_scope)
        else {
            self.error(name.span, format!("'{}' is not defined.", name.name));
            return None;
        };
        let Some(found) = self.symbols.lookup(members, name.name) else {
            self.error(name.span, format!("'{}' is not defined.", name.name));
            return None;
        };

        self.add_reference(name.token, found);
        match self.symbols.symbol(found) {
            Symbol::Variable(var) => {
                let ty = var.ty.clone();
                let access = var.access;
                if !self.is_allowed_to_access_member(access, members) {
                    self.error(
                        name.span,
                        format!("'{}' is not public member.", name.name),
                    );
                }
                self.apply_translate(ty, &lhs.translate)
            }
            // A method taken as a value.
            Symbol::Function(_) => Some(ResolvedType::plain(found)),
            Symbol::Type(_) => Some(ResolvedType::plain(found)),
        }
    }

    /// Public members are open; private and protected members are
    /// visible only from inside the declaring type's scopes.
    fn is_allowed_to_access_member(&self, access: Access, members_scope: ScopeId) -> bool {
        match access {
            Access::Public => true,
            Access::Private | Access::Protected => {
                let mut cursor = Some(self.scope);
                while let Some(scope) = cursor {
                    if scope == members_scope {
                        return true;
                    }
                    cursor = self.symbols.scope(scope).parent;
                }
                false
            }
        }
    }

    /// `value[args]` — rewritten to `opIndex`, with the built-in
    /// array type answered from its template binding directly.
    pub(crate) fn analyze_index_op(
        &mut self,
        lhs: Option<ResolvedType>,
        term: &'a ValueTerm<'a>,
        args: &'a ArgList<'a>,
    ) -> Option<ResolvedType> {
        let (arg_types, arg_spans) = self.analyze_args(args);
        let lhs = lhs?;

        let symbol_type = self.symbols.symbol(lhs.symbol).as_type()?;
        if symbol_type.is_system_type && symbol_type.name == crate::builtin::ARRAY_TYPE {
            return lhs.translate.as_ref().and_then(|map| {
                map.get(&TemplateParamKey::Builtin(crate::builtin::ARRAY_TEMPLATE_PARAM))
                    .cloned()
                    .flatten()
            });
        }

        let site = CallSite {
            name: "opIndex",
            name_token: term.range.start,
            span: self.span_of(term.range),
            arg_types,
            arg_spans,
        };
        self.method_site_on(&lhs, "opIndex", site)
    }

    /// `value(args)` — calling a value: a function reference, a
    /// funcdef-typed delegate, or an `opCall` object.
    pub(crate) fn analyze_value_call(
        &mut self,
        lhs: Option<ResolvedType>,
        term: &'a ValueTerm<'a>,
        args: &'a ArgList<'a>,
    ) -> Option<ResolvedType> {
        let (arg_types, arg_spans) = self.analyze_args(args);
        let lhs = lhs?;
        let site = CallSite {
            name: self.type_name(&lhs),
            name_token: term.range.start,
            span: self.span_of(term.range),
            arg_types,
            arg_spans,
        };

        match self.symbols.symbol(lhs.symbol) {
            Symbol::Function(_) => {
                let translate = lhs.translate.clone();
                self.check_function_match(&site, lhs.symbol, translate, None)
            }
            Symbol::Type(ty) => {
                if let TypeSource::FuncDef(funcdef) = ty.source {
                    self.check_funcdef_call(funcdef, &site)
                } else {
                    self.method_site_on(&lhs, "opCall", site)
                }
            }
            Symbol::Variable(_) => None,
        }
    }

    /// Check a call against a funcdef's written signature.
    fn check_funcdef_call(
        &mut self,
        funcdef: &'a FuncDefDecl<'a>,
        site: &CallSite<'a>,
    ) -> Option<ResolvedType> {
        if site.arg_types.len() != funcdef.params.len() {
            self.error(
                site.span,
                format!("No matching signature for '{}'.", site.name),
            );
            return None;
        }
        for (arg, param) in site.arg_types.iter().zip(funcdef.params) {
            let param_ty = self.quietly(|a| a.analyze_type(param.ty));
            if !can_convert(&self.symbols, arg, &param_ty) {
                self.error(
                    site.span,
                    format!("No matching signature for '{}'.", site.name),
                );
                return None;
            }
        }
        self.quietly(|a| a.analyze_type(funcdef.return_type))
    }
}
