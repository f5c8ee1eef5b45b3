//! Type and scope-prefix AST nodes.

use super::Ident;
use asls_core::TokenRange;

/// A type as written in source:
/// `['const'] SCOPE DATATYPE ['<' … '>'] { '[' ']' | '@' ['const'] }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeNode<'a> {
    pub is_const: bool,
    pub scope: Option<&'a ScopeNode<'a>>,
    pub datatype: DataType<'a>,
    pub template_args: &'a [&'a TypeNode<'a>],
    /// `T[]` — rewritten by the analyzer to the built-in array type.
    pub is_array: bool,
    pub ref_modifier: RefModifier,
    pub range: TokenRange,
}

impl<'a> TypeNode<'a> {
    /// Whether this is the `auto` placeholder.
    pub fn is_auto(&self) -> bool {
        self.datatype.kind == DataTypeKind::Auto
    }

    /// Whether this names the primitive `void`.
    pub fn is_void(&self) -> bool {
        self.datatype.kind == DataTypeKind::Primitive && self.datatype.ident.name == "void"
    }
}

/// The name portion of a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataType<'a> {
    pub ident: Ident<'a>,
    pub kind: DataTypeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTypeKind {
    /// A user-declared type name.
    Identifier,
    /// A primitive type keyword.
    Primitive,
    /// The `auto` placeholder, replaced by the initializer's type.
    Auto,
    /// The `?` wildcard of variadic-style declarations.
    Unresolvable,
}

/// The handle suffix of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefModifier {
    #[default]
    None,
    /// `@`
    At,
    /// `@const`
    AtConst,
}

/// A scope prefix: `['::'] {IDENT '::'}` with optional template
/// arguments on the last segment (`Outer<int>::Inner`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeNode<'a> {
    /// Leading `::`, anchoring the lookup at the global scope.
    pub is_global: bool,
    pub path: &'a [Ident<'a>],
    pub template_args: &'a [&'a TypeNode<'a>],
    pub range: TokenRange,
}
