//! Declaration AST nodes.

use super::expr::{ArgList, Assign, Expr, InitList};
use super::stmt::StatBlock;
use super::types::TypeNode;
use super::Ident;
use asls_core::TokenRange;

/// A top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    Import(&'a ImportDecl<'a>),
    TypeDef(&'a TypeDefDecl<'a>),
    Mixin(&'a MixinDecl<'a>),
    Namespace(&'a NamespaceDecl<'a>),
    Class(&'a ClassDecl<'a>),
    Interface(&'a InterfaceDecl<'a>),
    Enum(&'a EnumDecl<'a>),
    FuncDef(&'a FuncDefDecl<'a>),
    Func(&'a FuncDecl<'a>),
    VirtualProp(&'a VirtualPropDecl<'a>),
    Var(&'a VarDecl<'a>),
}

/// `'namespace' IDENT {'::' IDENT} '{' SCRIPT '}'`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamespaceDecl<'a> {
    pub path: &'a [Ident<'a>],
    pub items: &'a [Item<'a>],
    pub range: TokenRange,
}

/// `shared` / `external` / `abstract` / `final` prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityAttrs {
    pub is_shared: bool,
    pub is_external: bool,
    pub is_abstract: bool,
    pub is_final: bool,
}

impl EntityAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Member access restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'a> {
    /// Bracketed metadata blocks preceding the declaration, verbatim.
    pub metadata: &'a [TokenRange],
    pub attrs: EntityAttrs,
    pub name: Ident<'a>,
    pub template_params: &'a [Ident<'a>],
    pub bases: &'a [Ident<'a>],
    pub members: &'a [ClassMember<'a>],
    /// The `{ … }` body, distinct from the node range.
    pub scope_range: TokenRange,
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassMember<'a> {
    Func(&'a FuncDecl<'a>),
    FuncDef(&'a FuncDefDecl<'a>),
    VirtualProp(&'a VirtualPropDecl<'a>),
    Var(&'a VarDecl<'a>),
}

impl ClassMember<'_> {
    pub fn range(&self) -> TokenRange {
        match self {
            Self::Func(m) => m.range,
            Self::FuncDef(m) => m.range,
            Self::VirtualProp(m) => m.range,
            Self::Var(m) => m.range,
        }
    }
}

/// `'mixin' CLASS`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixinDecl<'a> {
    pub class: &'a ClassDecl<'a>,
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumDecl<'a> {
    pub attrs: EntityAttrs,
    pub name: Ident<'a>,
    pub members: &'a [EnumMember<'a>],
    pub scope_range: TokenRange,
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumMember<'a> {
    pub name: Ident<'a>,
    pub value: Option<&'a Expr<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceDecl<'a> {
    pub attrs: EntityAttrs,
    pub name: Ident<'a>,
    pub bases: &'a [Ident<'a>],
    pub members: &'a [InterfaceMember<'a>],
    pub scope_range: TokenRange,
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterfaceMember<'a> {
    Method(&'a IntfMethod<'a>),
    VirtualProp(&'a VirtualPropDecl<'a>),
}

/// A body-less method signature inside an interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntfMethod<'a> {
    pub return_type: &'a TypeNode<'a>,
    pub is_ref: bool,
    pub name: Ident<'a>,
    pub params: &'a [ParamDecl<'a>],
    pub is_const: bool,
    pub range: TokenRange,
}

/// What a function declaration starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FuncHead<'a> {
    /// Named after the enclosing class, no return type.
    Constructor,
    /// `~ClassName()`
    Destructor,
    Returns {
        return_type: &'a TypeNode<'a>,
        is_ref: bool,
    },
}

/// Trailing attributes: `override`, `final`, `explicit`, `property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuncAttrs {
    pub is_override: bool,
    pub is_final: bool,
    pub is_explicit: bool,
    pub is_property: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncDecl<'a> {
    pub metadata: &'a [TokenRange],
    pub attrs: EntityAttrs,
    pub access: Access,
    pub head: FuncHead<'a>,
    pub name: Ident<'a>,
    pub template_params: &'a [Ident<'a>],
    pub params: &'a [ParamDecl<'a>],
    pub is_const: bool,
    pub func_attrs: FuncAttrs,
    /// Always present; empty when the declaration ended in `;`.
    pub body: &'a StatBlock<'a>,
    pub range: TokenRange,
}

impl<'a> FuncDecl<'a> {
    pub fn is_constructor(&self) -> bool {
        matches!(self.head, FuncHead::Constructor)
    }

    pub fn is_destructor(&self) -> bool {
        matches!(self.head, FuncHead::Destructor)
    }

    pub fn return_type(&self) -> Option<&'a TypeNode<'a>> {
        match self.head {
            FuncHead::Returns { return_type, .. } => Some(return_type),
            _ => None,
        }
    }
}

/// Reference passing mode of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamRef {
    #[default]
    ByValue,
    Ref,
    RefIn,
    RefOut,
    RefInOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDecl<'a> {
    pub ty: &'a TypeNode<'a>,
    pub ref_kind: ParamRef,
    pub name: Option<Ident<'a>>,
    pub default: Option<&'a Expr<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualPropDecl<'a> {
    pub access: Access,
    pub ty: &'a TypeNode<'a>,
    pub is_ref: bool,
    pub name: Ident<'a>,
    pub accessors: &'a [PropAccessor<'a>],
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropAccessor<'a> {
    pub kind: AccessorKind,
    pub is_const: bool,
    pub attrs: FuncAttrs,
    pub body: Option<&'a StatBlock<'a>>,
    pub range: TokenRange,
}

/// `'funcdef' TYPE ['&'] IDENT PARAMLIST ';'`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncDefDecl<'a> {
    pub attrs: EntityAttrs,
    pub return_type: &'a TypeNode<'a>,
    pub is_ref: bool,
    pub name: Ident<'a>,
    pub params: &'a [ParamDecl<'a>],
    pub range: TokenRange,
}

/// `'typedef' PRIMTYPE IDENT ';'`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDefDecl<'a> {
    pub base: Ident<'a>,
    pub name: Ident<'a>,
    pub range: TokenRange,
}

/// `'import' TYPE ['&'] IDENT PARAMLIST FUNCATTR 'from' STRING ';'`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportDecl<'a> {
    pub return_type: &'a TypeNode<'a>,
    pub is_ref: bool,
    pub name: Ident<'a>,
    pub params: &'a [ParamDecl<'a>],
    pub func_attrs: FuncAttrs,
    /// The module string literal after `from`.
    pub from_module: Ident<'a>,
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'a> {
    pub metadata: &'a [TokenRange],
    pub access: Access,
    pub ty: &'a TypeNode<'a>,
    pub declarators: &'a [VarDeclarator<'a>],
    pub range: TokenRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclarator<'a> {
    pub name: Ident<'a>,
    pub init: Option<VarInit<'a>>,
}

/// The initializer of one declarator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarInit<'a> {
    /// `= expr`
    Assign(&'a Assign<'a>),
    /// `= { … }`
    InitList(&'a InitList<'a>),
    /// `(args)` — a constructor call.
    Args(&'a ArgList<'a>),
}
