//! Built-in types installed into every fresh global scope.

use crate::symbols::{Symbol, SymbolArena, SymbolId, SymbolType, TypeSource};

/// The primitive type names of the language.
pub const PRIMITIVES: &[&str] = &[
    "void", "bool", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "float", "double",
];

/// The template parameter name of the built-in array type.
pub const ARRAY_TEMPLATE_PARAM: &str = "T";

/// Name of the built-in array type targeted by `T[]` sugar.
pub const ARRAY_TYPE: &str = "array";

fn is_number(name: &str) -> bool {
    !matches!(name, "void" | "bool")
}

/// Register primitives and the array template in the global scope.
///
/// Returns the id of the array type.
pub fn install(arena: &mut SymbolArena<'_>) -> SymbolId {
    let global = arena.global();
    for &name in PRIMITIVES {
        arena
            .insert_symbol(
                global,
                Symbol::Type(SymbolType {
                    name,
                    decl_token: None,
                    source: TypeSource::Primitive,
                    template_params: &[],
                    members_scope: None,
                    is_system_type: true,
                    is_number_type: is_number(name),
                }),
            )
            .expect("fresh global scope has no primitive clashes");
    }
    arena
        .insert_symbol(
            global,
            Symbol::Type(SymbolType {
                name: ARRAY_TYPE,
                decl_token: None,
                source: TypeSource::Primitive,
                template_params: &[],
                members_scope: None,
                is_system_type: true,
                is_number_type: false,
            }),
        )
        .expect("fresh global scope has no array clash")
}
