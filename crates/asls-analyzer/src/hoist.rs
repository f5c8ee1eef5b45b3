//! Declaration hoisting.
//!
//! Registers every top-level declaration into the scope tree before
//! any body is analyzed, so mutually referencing definitions resolve
//! regardless of source order. The pass produces the global scope and
//! an ordered queue of analysis tasks; body analysis consumes the
//! queue and may be abandoned between entries.

use crate::builtin;
use crate::symbols::{
    FuncSource, LinkedNode, ResolvedType, ScopeId, Symbol, SymbolArena, SymbolFunction, SymbolId,
    SymbolType, SymbolVariable, TypeSource,
};
use asls_core::Diagnostics;
use asls_parser::ast::*;
use tracing::trace;

/// One deferred body-analysis unit, in source order.
#[derive(Debug)]
pub enum AnalyzeTask<'a> {
    /// Resolve a hoisted variable declaration's type and initializers.
    Var {
        scope: ScopeId,
        node: &'a VarDecl<'a>,
    },
    /// Resolve a function's signature and analyze its body.
    Func {
        scope: ScopeId,
        symbol: SymbolId,
        node: &'a FuncDecl<'a>,
    },
    /// Resolve a virtual property's type and analyze its accessors.
    VirtualProp {
        scope: ScopeId,
        node: &'a VirtualPropDecl<'a>,
    },
    /// Analyze enumerator value expressions.
    EnumMembers {
        scope: ScopeId,
        node: &'a EnumDecl<'a>,
    },
}

/// Output contract of the hoist pass.
#[derive(Debug)]
pub struct HoistResult<'a> {
    pub symbols: SymbolArena<'a>,
    pub global_scope: ScopeId,
    pub analyze_queue: Vec<AnalyzeTask<'a>>,
}

/// Hoist a parsed script into a fresh symbol graph.
pub fn hoist<'a>(script: &Script<'a>, diagnostics: &mut Diagnostics) -> HoistResult<'a> {
    let mut symbols = SymbolArena::new();
    builtin::install(&mut symbols);
    let global_scope = symbols.global();

    let mut hoister = Hoister {
        symbols,
        queue: Vec::new(),
        diagnostics,
    };
    hoister.hoist_items(global_scope, script.items());
    trace!(
        symbols = hoister.symbols.symbol_count(),
        scopes = hoister.symbols.scope_count(),
        "hoist complete"
    );

    HoistResult {
        symbols: hoister.symbols,
        global_scope,
        analyze_queue: hoister.queue,
    }
}

struct Hoister<'a, 'out> {
    symbols: SymbolArena<'a>,
    queue: Vec<AnalyzeTask<'a>>,
    diagnostics: &'out mut Diagnostics,
}

impl<'a, 'out> Hoister<'a, 'out> {
    fn duplicate(&mut self, ident: Ident<'a>) {
        self.diagnostics.error(
            ident.span,
            format!("'{}' is already declared.", ident.name),
        );
    }

    fn hoist_items(&mut self, scope: ScopeId, items: &'a [Item<'a>]) {
        for item in items {
            match *item {
                Item::Namespace(node) => self.hoist_namespace(scope, node),
                Item::Class(node) => self.hoist_class(scope, node),
                Item::Mixin(node) => self.hoist_class(scope, node.class),
                Item::Interface(node) => self.hoist_interface(scope, node),
                Item::Enum(node) => self.hoist_enum(scope, node),
                Item::FuncDef(node) => self.hoist_funcdef(scope, node),
                Item::TypeDef(node) => self.hoist_typedef(scope, node),
                Item::Func(node) => self.hoist_func(scope, node),
                Item::VirtualProp(node) => self.hoist_virtual_prop(scope, node, false),
                Item::Var(node) => self.hoist_var(scope, node, false),
                Item::Import(node) => self.hoist_import(scope, node),
            }
        }
    }

    fn hoist_namespace(&mut self, scope: ScopeId, node: &'a NamespaceDecl<'a>) {
        let mut current = scope;
        for segment in node.path {
            current = self
                .symbols
                .named_scope(current, segment.name, Some(LinkedNode::Namespace(node)));
        }
        self.hoist_items(current, node.items);
    }

    fn hoist_class(&mut self, scope: ScopeId, node: &'a ClassDecl<'a>) {
        let members_scope =
            self.symbols
                .new_scope(scope, Some(node.name.name), Some(LinkedNode::Class(node)));

        let inserted = self.symbols.insert_symbol(
            scope,
            Symbol::Type(SymbolType {
                name: node.name.name,
                decl_token: Some(node.name.token),
                source: TypeSource::Class(node),
                template_params: node.template_params,
                members_scope: Some(members_scope),
                is_system_type: false,
                is_number_type: false,
            }),
        );
        if let Err(existing) = inserted {
            // A forward declaration reopens: point the earlier symbol
            // at this definition. Anything else is a clash.
            let reopened = match self.symbols.symbol_mut(existing) {
                Symbol::Type(ty)
                    if matches!(ty.source, TypeSource::Class(prior) if prior.members.is_empty()) =>
                {
                    ty.source = TypeSource::Class(node);
                    ty.template_params = node.template_params;
                    ty.members_scope = Some(members_scope);
                    true
                }
                _ => false,
            };
            if !reopened {
                self.duplicate(node.name);
            }
        }

        for param in node.template_params {
            let _ = self.symbols.insert_symbol(
                members_scope,
                Symbol::Type(SymbolType {
                    name: param.name,
                    decl_token: Some(param.token),
                    source: TypeSource::TemplateParam(param.token),
                    template_params: &[],
                    members_scope: None,
                    is_system_type: false,
                    is_number_type: false,
                }),
            );
        }

        for member in node.members {
            match *member {
                ClassMember::Func(func) => self.hoist_func(members_scope, func),
                ClassMember::FuncDef(funcdef) => self.hoist_funcdef(members_scope, funcdef),
                ClassMember::VirtualProp(prop) => {
                    self.hoist_virtual_prop(members_scope, prop, true)
                }
                ClassMember::Var(var) => self.hoist_var(members_scope, var, true),
            }
        }
    }

    fn hoist_interface(&mut self, scope: ScopeId, node: &'a InterfaceDecl<'a>) {
        let members_scope = self.symbols.new_scope(
            scope,
            Some(node.name.name),
            Some(LinkedNode::Interface(node)),
        );
        if self
            .symbols
            .insert_symbol(
                scope,
                Symbol::Type(SymbolType {
                    name: node.name.name,
                    decl_token: Some(node.name.token),
                    source: TypeSource::Interface(node),
                    template_params: &[],
                    members_scope: Some(members_scope),
                    is_system_type: false,
                    is_number_type: false,
                }),
            )
            .is_err()
        {
            self.duplicate(node.name);
        }

        for member in node.members {
            match *member {
                InterfaceMember::Method(method) => {
                    let inserted = self.symbols.insert_symbol(
                        members_scope,
                        Symbol::Function(SymbolFunction {
                            name: method.name.name,
                            decl_token: Some(method.name.token),
                            source: FuncSource::IntfMethod(method),
                            scope: members_scope,
                            next_overload: None,
                        }),
                    );
                    if inserted.is_err() {
                        self.duplicate(method.name);
                    }
                }
                InterfaceMember::VirtualProp(prop) => {
                    self.hoist_virtual_prop(members_scope, prop, true)
                }
            }
        }
    }

    fn hoist_enum(&mut self, scope: ScopeId, node: &'a EnumDecl<'a>) {
        let members_scope =
            self.symbols
                .new_scope(scope, Some(node.name.name), Some(LinkedNode::Enum(node)));
        let inserted = self.symbols.insert_symbol(
            scope,
            Symbol::Type(SymbolType {
                name: node.name.name,
                decl_token: Some(node.name.token),
                source: TypeSource::Enum(node),
                template_params: &[],
                members_scope: Some(members_scope),
                is_system_type: false,
                is_number_type: false,
            }),
        );
        let enum_id = match inserted {
            Ok(id) => id,
            Err(_) => {
                self.duplicate(node.name);
                return;
            }
        };

        for member in node.members {
            let inserted = self.symbols.insert_symbol(
                members_scope,
                Symbol::Variable(SymbolVariable {
                    name: member.name.name,
                    decl_token: Some(member.name.token),
                    ty: Some(ResolvedType::plain(enum_id)),
                    is_instance_member: false,
                    is_parameter: false,
                    access: Access::Public,
                }),
            );
            if inserted.is_err() {
                self.duplicate(member.name);
            }
        }
        self.queue.push(AnalyzeTask::EnumMembers {
            scope: members_scope,
            node,
        });
    }

    fn hoist_funcdef(&mut self, scope: ScopeId, node: &'a FuncDefDecl<'a>) {
        if self
            .symbols
            .insert_symbol(
                scope,
                Symbol::Type(SymbolType {
                    name: node.name.name,
                    decl_token: Some(node.name.token),
                    source: TypeSource::FuncDef(node),
                    template_params: &[],
                    members_scope: None,
                    is_system_type: false,
                    is_number_type: false,
                }),
            )
            .is_err()
        {
            self.duplicate(node.name);
        }
    }

    fn hoist_typedef(&mut self, scope: ScopeId, node: &'a TypeDefDecl<'a>) {
        let is_number = !matches!(node.base.name, "void" | "bool");
        if self
            .symbols
            .insert_symbol(
                scope,
                Symbol::Type(SymbolType {
                    name: node.name.name,
                    decl_token: Some(node.name.token),
                    source: TypeSource::TypeDef(node),
                    template_params: &[],
                    members_scope: None,
                    is_system_type: false,
                    is_number_type: is_number,
                }),
            )
            .is_err()
        {
            self.duplicate(node.name);
        }
    }

    fn hoist_func(&mut self, scope: ScopeId, node: &'a FuncDecl<'a>) {
        let func_scope =
            self.symbols
                .new_scope(scope, Some(node.name.name), Some(LinkedNode::Func(node)));

        for param in node.template_params {
            let _ = self.symbols.insert_symbol(
                func_scope,
                Symbol::Type(SymbolType {
                    name: param.name,
                    decl_token: Some(param.token),
                    source: TypeSource::TemplateParam(param.token),
                    template_params: &[],
                    members_scope: None,
                    is_system_type: false,
                    is_number_type: false,
                }),
            );
        }

        let inserted = self.symbols.insert_symbol(
            scope,
            Symbol::Function(SymbolFunction {
                name: node.name.name,
                decl_token: Some(node.name.token),
                source: FuncSource::Func(node),
                scope: func_scope,
                next_overload: None,
            }),
        );
        match inserted {
            Ok(symbol) => self.queue.push(AnalyzeTask::Func {
                scope: func_scope,
                symbol,
                node,
            }),
            Err(_) => self.duplicate(node.name),
        }
    }

    fn hoist_virtual_prop(&mut self, scope: ScopeId, node: &'a VirtualPropDecl<'a>, member: bool) {
        let inserted = self.symbols.insert_symbol(
            scope,
            Symbol::Variable(SymbolVariable {
                name: node.name.name,
                decl_token: Some(node.name.token),
                ty: None,
                is_instance_member: member,
                is_parameter: false,
                access: node.access,
            }),
        );
        if inserted.is_err() {
            self.duplicate(node.name);
        }

        for accessor in node.accessors {
            let key = match accessor.kind {
                AccessorKind::Get => format!("get_{}", node.name.name),
                AccessorKind::Set => format!("set_{}", node.name.name),
            };
            if self.symbols.find_child_scope(scope, &key).is_none() {
                self.symbols
                    .new_scope(scope, Some(&key), Some(LinkedNode::VirtualProp(node)));
            }
        }
        self.queue.push(AnalyzeTask::VirtualProp { scope, node });
    }

    fn hoist_var(&mut self, scope: ScopeId, node: &'a VarDecl<'a>, member: bool) {
        for declarator in node.declarators {
            let inserted = self.symbols.insert_symbol(
                scope,
                Symbol::Variable(SymbolVariable {
                    name: declarator.name.name,
                    decl_token: Some(declarator.name.token),
                    ty: None,
                    is_instance_member: member,
                    is_parameter: false,
                    access: node.access,
                }),
            );
            if inserted.is_err() {
                self.duplicate(declarator.name);
            }
        }
        self.queue.push(AnalyzeTask::Var { scope, node });
    }

    fn hoist_import(&mut self, scope: ScopeId, node: &'a ImportDecl<'a>) {
        let inserted = self.symbols.insert_symbol(
            scope,
            Symbol::Function(SymbolFunction {
                name: node.name.name,
                decl_token: Some(node.name.token),
                source: FuncSource::Import(node),
                scope,
                next_overload: None,
            }),
        );
        if inserted.is_err() {
            self.duplicate(node.name);
        }
    }
}
