//! The symbol graph: types, functions, variables, and lexical scopes.
//!
//! Scopes form a tree rooted at the global scope and outlive the
//! analysis pass — language-server queries (go-to-definition,
//! completion) read them afterwards. Both scopes and symbols live in
//! index-keyed arenas so back-references (a scope to the AST node
//! that created it, a reference to its declaration) are plain indices
//! instead of owning pointers.

use crate::completion::CompletionHint;
use asls_parser::ast::{
    Access, ClassDecl, EnumDecl, FuncDecl, FuncDefDecl, Ident, ImportDecl, InterfaceDecl,
    IntfMethod, LambdaExpr, NamespaceDecl, ParamDecl, TypeDefDecl, TypeNode, VirtualPropDecl,
};
use asls_core::TokenId;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Index of a symbol in the [`SymbolArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Index of a scope in the [`SymbolArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// The AST origin of a declared type.
#[derive(Debug, Clone, Copy)]
pub enum TypeSource<'a> {
    Class(&'a ClassDecl<'a>),
    Interface(&'a InterfaceDecl<'a>),
    Enum(&'a EnumDecl<'a>),
    TypeDef(&'a TypeDefDecl<'a>),
    FuncDef(&'a FuncDefDecl<'a>),
    /// A built-in primitive; has no declaration site.
    Primitive,
    /// A template parameter of an enclosing declaration.
    TemplateParam(TokenId),
}

/// A named type.
#[derive(Debug)]
pub struct SymbolType<'a> {
    pub name: &'a str,
    /// The declaring identifier token; `None` for built-ins.
    pub decl_token: Option<TokenId>,
    pub source: TypeSource<'a>,
    /// Declared template parameter identifiers, in order.
    pub template_params: &'a [Ident<'a>],
    /// Member scope for classes, interfaces, and enums.
    pub members_scope: Option<ScopeId>,
    pub is_system_type: bool,
    pub is_number_type: bool,
}

/// A declared variable, field, parameter, or enum member.
#[derive(Debug)]
pub struct SymbolVariable<'a> {
    pub name: &'a str,
    pub decl_token: Option<TokenId>,
    /// Resolved type; patched in once the declaring site is analyzed.
    pub ty: Option<ResolvedType>,
    pub is_instance_member: bool,
    pub is_parameter: bool,
    pub access: Access,
}

/// Where a function symbol's signature comes from.
#[derive(Debug, Clone, Copy)]
pub enum FuncSource<'a> {
    Func(&'a FuncDecl<'a>),
    IntfMethod(&'a IntfMethod<'a>),
    Import(&'a ImportDecl<'a>),
}

/// A declared function; overloads form a linked chain through
/// `next_overload`.
#[derive(Debug)]
pub struct SymbolFunction<'a> {
    pub name: &'a str,
    pub decl_token: Option<TokenId>,
    pub source: FuncSource<'a>,
    /// The function's own scope, in which its signature resolves.
    pub scope: ScopeId,
    pub next_overload: Option<SymbolId>,
}

/// What a function declares it returns.
#[derive(Debug, Clone, Copy)]
pub enum FuncReturn<'a> {
    /// A written return type.
    Type(&'a TypeNode<'a>, bool),
    /// A constructor; the call site supplies the constructed type.
    Constructed,
    /// Destructors and setters.
    Nothing,
}

impl<'a> SymbolFunction<'a> {
    pub fn params(&self) -> &'a [ParamDecl<'a>] {
        match self.source {
            FuncSource::Func(node) => node.params,
            FuncSource::IntfMethod(node) => node.params,
            FuncSource::Import(node) => node.params,
        }
    }

    pub fn return_decl(&self) -> FuncReturn<'a> {
        match self.source {
            FuncSource::Func(node) => match node.head {
                asls_parser::ast::FuncHead::Returns {
                    return_type,
                    is_ref,
                } => FuncReturn::Type(return_type, is_ref),
                asls_parser::ast::FuncHead::Constructor => FuncReturn::Constructed,
                asls_parser::ast::FuncHead::Destructor => FuncReturn::Nothing,
            },
            FuncSource::IntfMethod(node) => FuncReturn::Type(node.return_type, node.is_ref),
            FuncSource::Import(node) => FuncReturn::Type(node.return_type, node.is_ref),
        }
    }
}

/// Any symbol.
#[derive(Debug)]
pub enum Symbol<'a> {
    Type(SymbolType<'a>),
    Variable(SymbolVariable<'a>),
    Function(SymbolFunction<'a>),
}

impl<'a> Symbol<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Symbol::Type(s) => s.name,
            Symbol::Variable(s) => s.name,
            Symbol::Function(s) => s.name,
        }
    }

    pub fn decl_token(&self) -> Option<TokenId> {
        match self {
            Symbol::Type(s) => s.decl_token,
            Symbol::Variable(s) => s.decl_token,
            Symbol::Function(s) => s.decl_token,
        }
    }

    pub fn as_type(&self) -> Option<&SymbolType<'a>> {
        match self {
            Symbol::Type(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&SymbolFunction<'a>> {
        match self {
            Symbol::Function(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&SymbolVariable<'a>> {
        match self {
            Symbol::Variable(s) => Some(s),
            _ => None,
        }
    }
}

/// Key of a template parameter inside a [`TemplateTranslate`].
///
/// Script-declared templates are keyed by the identity of their
/// parameter token; built-in templates (the array type) have no
/// tokens and use a fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateParamKey {
    Token(TokenId),
    Builtin(&'static str),
}

/// A binding of template parameters to concrete types at an
/// instantiation site.
pub type TemplateTranslate = FxHashMap<TemplateParamKey, Option<ResolvedType>>;

/// A use-site type: a symbol plus handle flag and template bindings.
/// Immutable once created; clones share the translation map.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub symbol: SymbolId,
    pub is_handler: bool,
    pub translate: Option<Rc<TemplateTranslate>>,
}

impl ResolvedType {
    pub fn plain(symbol: SymbolId) -> Self {
        Self {
            symbol,
            is_handler: false,
            translate: None,
        }
    }

    pub fn with_handler(mut self, is_handler: bool) -> Self {
        self.is_handler = is_handler;
        self
    }
}

/// A resolved reference from a use site back to a declaration.
#[derive(Debug, Clone, Copy)]
pub struct SymbolReference {
    pub token: TokenId,
    pub symbol: SymbolId,
}

/// The AST node a scope was created for.
#[derive(Debug, Clone, Copy)]
pub enum LinkedNode<'a> {
    Namespace(&'a NamespaceDecl<'a>),
    Class(&'a ClassDecl<'a>),
    Interface(&'a InterfaceDecl<'a>),
    Enum(&'a EnumDecl<'a>),
    Func(&'a FuncDecl<'a>),
    VirtualProp(&'a VirtualPropDecl<'a>),
    Lambda(&'a LambdaExpr<'a>),
    Block,
}

/// One lexical scope.
#[derive(Debug)]
pub struct SymbolScope<'a> {
    /// Scope name; `None` for anonymous block scopes.
    pub key: Option<String>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: FxHashMap<&'a str, SymbolId>,
    /// Use-site references, for go-to-definition.
    pub referenced: Vec<SymbolReference>,
    /// Hints consumed by the external completer.
    pub hints: Vec<CompletionHint>,
    pub linked_node: Option<LinkedNode<'a>>,
}

/// Arena owning the scope tree and all symbols of one analysis.
#[derive(Debug)]
pub struct SymbolArena<'a> {
    scopes: Vec<SymbolScope<'a>>,
    symbols: Vec<Symbol<'a>>,
}

impl<'a> Default for SymbolArena<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SymbolArena<'a> {
    /// Create an arena containing only an empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![SymbolScope {
                key: None,
                parent: None,
                children: Vec::new(),
                symbols: FxHashMap::default(),
                referenced: Vec::new(),
                hints: Vec::new(),
                linked_node: None,
            }],
            symbols: Vec::new(),
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &SymbolScope<'a> {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut SymbolScope<'a> {
        &mut self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol<'a> {
        &mut self.symbols[id.0 as usize]
    }

    /// Create a child scope.
    pub fn new_scope(
        &mut self,
        parent: ScopeId,
        key: Option<&str>,
        linked_node: Option<LinkedNode<'a>>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(SymbolScope {
            key: key.map(str::to_owned),
            parent: Some(parent),
            children: Vec::new(),
            symbols: FxHashMap::default(),
            referenced: Vec::new(),
            hints: Vec::new(),
            linked_node,
        });
        self.scope_mut(parent).children.push(id);
        id
    }

    /// The named child scope of `parent`, if one exists.
    pub fn find_child_scope(&self, parent: ScopeId, key: &str) -> Option<ScopeId> {
        self.scope(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.scope(child).key.as_deref() == Some(key))
    }

    /// Reuse or create a named child scope (namespaces reopen).
    pub fn named_scope(
        &mut self,
        parent: ScopeId,
        key: &str,
        linked_node: Option<LinkedNode<'a>>,
    ) -> ScopeId {
        match self.find_child_scope(parent, key) {
            Some(existing) => existing,
            None => self.new_scope(parent, Some(key), linked_node),
        }
    }

    /// Append a symbol and bind it in `scope`.
    ///
    /// A function inserted under a name already bound to a function
    /// is chained as an overload. Any other clash reports the
    /// existing binding via `Err`.
    pub fn insert_symbol(
        &mut self,
        scope: ScopeId,
        symbol: Symbol<'a>,
    ) -> Result<SymbolId, SymbolId> {
        let name = symbol.name();
        if let Some(&existing) = self.scope(scope).symbols.get(name) {
            if matches!(symbol, Symbol::Function(_))
                && matches!(self.symbol(existing), Symbol::Function(_))
            {
                let id = SymbolId(self.symbols.len() as u32);
                self.symbols.push(symbol);

                let mut cursor = existing;
                loop {
                    let Symbol::Function(func) = self.symbol(cursor) else {
                        unreachable!("overload chain only links functions");
                    };
                    match func.next_overload {
                        Some(next) => cursor = next,
                        None => break,
                    }
                }
                if let Symbol::Function(func) = self.symbol_mut(cursor) {
                    func.next_overload = Some(id);
                }
                return Ok(id);
            }
            return Err(existing);
        }

        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name();
        self.symbols.push(symbol);
        self.scope_mut(scope).symbols.insert(name, id);
        Ok(id)
    }

    /// Shallow lookup in one scope.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).symbols.get(name).copied()
    }

    /// Lookup walking parent scopes; returns the declaring scope too.
    pub fn lookup_walk(&self, scope: ScopeId, name: &str) -> Option<(SymbolId, ScopeId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(symbol) = self.lookup(id, name) {
                return Some((symbol, id));
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// The ids of an overload chain, starting at `first`.
    pub fn overload_chain(&self, first: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self
                .symbol(id)
                .as_function()
                .and_then(|f| f.next_overload);
        }
        chain
    }

    /// Walk up from `scope` to the nearest scope whose linked node
    /// satisfies `predicate`.
    pub fn enclosing_scope(
        &self,
        scope: ScopeId,
        predicate: impl Fn(&LinkedNode<'a>) -> bool,
    ) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scope(id).linked_node.as_ref().is_some_and(&predicate) {
                return Some(id);
            }
            current = self.scope(id).parent;
        }
        None
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_type(name: &'static str) -> Symbol<'static> {
        Symbol::Type(SymbolType {
            name,
            decl_token: None,
            source: TypeSource::Primitive,
            template_params: &[],
            members_scope: None,
            is_system_type: true,
            is_number_type: false,
        })
    }

    #[test]
    fn insert_and_lookup() {
        let mut arena = SymbolArena::new();
        let global = arena.global();
        let id = arena.insert_symbol(global, dummy_type("int")).unwrap();
        assert_eq!(arena.lookup(global, "int"), Some(id));
        assert_eq!(arena.lookup(global, "float"), None);
    }

    #[test]
    fn duplicate_non_function_reports_existing() {
        let mut arena = SymbolArena::new();
        let global = arena.global();
        let first = arena.insert_symbol(global, dummy_type("A")).unwrap();
        let clash = arena.insert_symbol(global, dummy_type("A"));
        assert_eq!(clash, Err(first));
    }

    #[test]
    fn lookup_walk_climbs_parents() {
        let mut arena = SymbolArena::new();
        let global = arena.global();
        let inner = arena.new_scope(global, Some("Game"), None);
        let id = arena.insert_symbol(global, dummy_type("int")).unwrap();

        let (found, declaring) = arena.lookup_walk(inner, "int").unwrap();
        assert_eq!(found, id);
        assert_eq!(declaring, global);
        assert_eq!(arena.lookup(inner, "int"), None);
    }

    #[test]
    fn named_scope_reopens() {
        let mut arena = SymbolArena::new();
        let global = arena.global();
        let first = arena.named_scope(global, "Game", None);
        let second = arena.named_scope(global, "Game", None);
        assert_eq!(first, second);
        assert_eq!(arena.scope(global).children.len(), 1);
    }
}
