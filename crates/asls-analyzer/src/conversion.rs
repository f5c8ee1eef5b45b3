//! Implicit conversion rules between resolved types.
//!
//! Unknown operands convert silently: a sub-expression whose type
//! could not be resolved already produced its own diagnostic, and
//! propagating the failure would only cascade noise.

use crate::symbols::{ResolvedType, SymbolArena, TypeSource};

/// Whether `src` implicitly converts to `dst`.
pub fn can_convert(
    arena: &SymbolArena<'_>,
    src: &Option<ResolvedType>,
    dst: &Option<ResolvedType>,
) -> bool {
    let (Some(src), Some(dst)) = (src, dst) else {
        return true;
    };
    if src.symbol == dst.symbol {
        return true;
    }

    let src_sym = arena.symbol(src.symbol);
    let dst_sym = arena.symbol(dst.symbol);

    match (src_sym, dst_sym) {
        (crate::symbols::Symbol::Type(s), crate::symbols::Symbol::Type(d)) => {
            // Any two numbers convert (widening and narrowing alike;
            // scripts lean on this heavily).
            if s.is_number_type && d.is_number_type {
                return true;
            }
            // Enum values convert to integers, not the other way.
            if matches!(s.source, TypeSource::Enum(_)) && d.is_number_type {
                return true;
            }
            // An unresolved template parameter accepts anything.
            if matches!(d.source, TypeSource::TemplateParam(_))
                || matches!(s.source, TypeSource::TemplateParam(_))
            {
                return true;
            }
            false
        }
        // A concrete function converts to a funcdef handle.
        (crate::symbols::Symbol::Function(_), crate::symbols::Symbol::Type(d)) => {
            matches!(d.source, TypeSource::FuncDef(_))
        }
        _ => false,
    }
}

/// The result type of a numeric binary operation.
///
/// Picks the wider of the two by a fixed ranking, defaulting to int.
pub fn numeric_common(
    arena: &SymbolArena<'_>,
    lhs: &ResolvedType,
    rhs: &ResolvedType,
) -> ResolvedType {
    const RANKING: &[&str] = &["double", "float", "uint64", "int64"];

    let lhs_name = arena.symbol(lhs.symbol).name();
    let rhs_name = arena.symbol(rhs.symbol).name();
    for &name in RANKING {
        if lhs_name == name {
            return lhs.clone();
        }
        if rhs_name == name {
            return rhs.clone();
        }
    }
    if lhs_name == rhs_name {
        return lhs.clone();
    }
    // Mixed smaller integers widen to plain int; fall back to the
    // left operand if the int symbol is somehow absent.
    arena
        .lookup(arena.global(), "int")
        .map(ResolvedType::plain)
        .unwrap_or_else(|| lhs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::symbols::SymbolArena;

    fn arena_with_builtins() -> SymbolArena<'static> {
        let mut arena = SymbolArena::new();
        builtin::install(&mut arena);
        arena
    }

    fn builtin_ty(arena: &SymbolArena<'_>, name: &str) -> Option<ResolvedType> {
        arena.lookup(arena.global(), name).map(ResolvedType::plain)
    }

    #[test]
    fn numbers_convert_among_each_other() {
        let arena = arena_with_builtins();
        let int = builtin_ty(&arena, "int");
        let float = builtin_ty(&arena, "float");
        let boolean = builtin_ty(&arena, "bool");

        assert!(can_convert(&arena, &int, &float));
        assert!(can_convert(&arena, &float, &int));
        assert!(!can_convert(&arena, &int, &boolean));
        assert!(!can_convert(&arena, &boolean, &int));
    }

    #[test]
    fn unknown_converts_silently() {
        let arena = arena_with_builtins();
        let int = builtin_ty(&arena, "int");
        assert!(can_convert(&arena, &None, &int));
        assert!(can_convert(&arena, &int, &None));
    }

    #[test]
    fn identity_converts() {
        let arena = arena_with_builtins();
        let boolean = builtin_ty(&arena, "bool");
        assert!(can_convert(&arena, &boolean, &boolean));
    }

    #[test]
    fn common_type_ranking() {
        let arena = arena_with_builtins();
        let int = builtin_ty(&arena, "int").unwrap();
        let double = builtin_ty(&arena, "double").unwrap();
        let int8 = builtin_ty(&arena, "int8").unwrap();

        let wide = numeric_common(&arena, &int, &double);
        assert_eq!(arena.symbol(wide.symbol).name(), "double");

        let same = numeric_common(&arena, &int, &int);
        assert_eq!(arena.symbol(same.symbol).name(), "int");

        let mixed = numeric_common(&arena, &int8, &int);
        assert_eq!(arena.symbol(mixed.symbol).name(), "int");
    }
}
