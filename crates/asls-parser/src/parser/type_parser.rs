//! Type and scope-prefix grammar.
//!
//! Scope prefixes and template argument lists are speculatively
//! attempted from many sites (every type, function call, and variable
//! access), so both go through the memoization cache.

use super::parsed::Parsed;
use super::state::{CacheKind, MemoValue, ParserState};
use crate::ast::*;
use crate::lexer::ReservedFlags;
use asls_core::HighlightKind;
use bumpalo::collections::Vec as BumpVec;

impl<'a, 'out> ParserState<'a, 'out> {
    /// Whether the current token can begin a `TYPE`.
    pub(crate) fn could_start_type(&self) -> bool {
        let token = self.next();
        token.is_identifier()
            || token.has(ReservedFlags::PRIME_TYPE)
            || token.is_reserved("::")
            || token.is_reserved("const")
            || token.is_reserved("auto")
            || token.is_reserved("?")
    }

    /// `TYPE ::= ['const'] SCOPE DATATYPE ['<' …'>'] {'[]' | '@' ['const']}`
    pub(crate) fn parse_type(&mut self) -> Parsed<&'a TypeNode<'a>> {
        let mark = self.marker();
        let start = self.next_id();

        let is_const = if self.next().is_reserved("const") {
            self.commit(HighlightKind::Keyword);
            true
        } else {
            false
        };

        let scope = self.parse_scope_opt();

        let Some(datatype) = self.parse_datatype() else {
            self.backtrack(mark);
            return Parsed::Mismatch;
        };

        let template_args = if self.next().is_reserved("<") {
            match self.parse_type_templates() {
                Parsed::Ok(args) => args,
                // A '<' that is not a template list belongs to the
                // surrounding expression.
                _ => &[],
            }
        } else {
            &[]
        };

        let mut is_array = false;
        let mut ref_modifier = RefModifier::None;
        loop {
            if self.next().is_reserved("[") && self.next_at(1).is_reserved("]") {
                self.commit(HighlightKind::Operator);
                self.commit(HighlightKind::Operator);
                is_array = true;
                continue;
            }
            if self.next().is_reserved("@") {
                self.commit(HighlightKind::Operator);
                ref_modifier = if self.next().is_reserved("const") {
                    self.commit(HighlightKind::Keyword);
                    RefModifier::AtConst
                } else {
                    RefModifier::At
                };
                continue;
            }
            break;
        }

        Parsed::Ok(self.alloc(TypeNode {
            is_const,
            scope,
            datatype,
            template_args,
            is_array,
            ref_modifier,
            range: self.range_from(start),
        }))
    }

    fn parse_datatype(&mut self) -> Option<DataType<'a>> {
        let token = self.next();
        let (kind, highlight) = if token.is_identifier() {
            (DataTypeKind::Identifier, HighlightKind::Type)
        } else if token.has(ReservedFlags::PRIME_TYPE) {
            (DataTypeKind::Primitive, HighlightKind::Builtin)
        } else if token.is_reserved("auto") {
            (DataTypeKind::Auto, HighlightKind::Keyword)
        } else if token.is_reserved("?") {
            (DataTypeKind::Unresolvable, HighlightKind::Operator)
        } else {
            return None;
        };
        let ident = self.make_ident();
        self.commit(highlight);
        Some(DataType { ident, kind })
    }

    /// `SCOPE ::= ['::'] {IDENT '::'} [IDENT '<'…'>' '::']`, memoized.
    ///
    /// Returns `None` when no scope prefix is present; the cursor is
    /// then unchanged.
    pub(crate) fn parse_scope_opt(&mut self) -> Option<&'a ScopeNode<'a>> {
        if let Some(MemoValue::Scope(cached)) = self.cache_restore(CacheKind::Scope) {
            return cached.ok();
        }

        let mark = self.marker();
        let start = self.next_id();

        let is_global = if self.next().is_reserved("::") {
            self.commit(HighlightKind::Operator);
            true
        } else {
            false
        };

        let mut path = BumpVec::new_in(self.arena);
        let mut template_args: &'a [&'a TypeNode<'a>] = &[];
        loop {
            if !self.next().is_identifier() {
                break;
            }
            if self.next_at(1).is_reserved("::") {
                let ident = self.make_ident();
                self.commit(HighlightKind::Namespace);
                self.commit(HighlightKind::Operator);
                path.push(ident);
                continue;
            }
            if self.next_at(1).is_reserved("<") {
                // A templated segment must still be followed by '::'
                // to be part of the scope, and it terminates it.
                let segment_mark = self.marker();
                let ident = self.make_ident();
                self.commit(HighlightKind::Namespace);
                if let Parsed::Ok(args) = self.parse_type_templates() {
                    if self.next().is_reserved("::") {
                        self.commit(HighlightKind::Operator);
                        path.push(ident);
                        template_args = args;
                        break;
                    }
                }
                self.backtrack(segment_mark);
            }
            break;
        }

        if !is_global && path.is_empty() {
            self.backtrack(mark);
            self.cache_store(CacheKind::Scope, mark, MemoValue::Scope(Parsed::Mismatch));
            return None;
        }

        let node = self.alloc(ScopeNode {
            is_global,
            path: path.into_bump_slice(),
            template_args,
            range: self.range_from(start),
        });
        self.cache_store(CacheKind::Scope, mark, MemoValue::Scope(Parsed::Ok(node)));
        Some(node)
    }

    /// `'<' TYPE {',' TYPE} '>'`, memoized and fully speculative: any
    /// failure rewinds to the `<`, which then reads as a comparison.
    pub(crate) fn parse_type_templates(&mut self) -> Parsed<&'a [&'a TypeNode<'a>]> {
        if let Some(MemoValue::TypeTemplates(cached)) = self.cache_restore(CacheKind::TypeTemplates)
        {
            return cached;
        }

        let mark = self.marker();
        if !self.next().is_reserved("<") {
            self.cache_store(
                CacheKind::TypeTemplates,
                mark,
                MemoValue::TypeTemplates(Parsed::Mismatch),
            );
            return Parsed::Mismatch;
        }
        self.commit(HighlightKind::Operator);

        let mut args = BumpVec::new_in(self.arena);
        loop {
            match self.parse_type() {
                Parsed::Ok(ty) => args.push(ty),
                _ => {
                    self.backtrack(mark);
                    self.cache_store(
                        CacheKind::TypeTemplates,
                        mark,
                        MemoValue::TypeTemplates(Parsed::Mismatch),
                    );
                    return Parsed::Mismatch;
                }
            }
            if self.next().is_reserved(",") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            if self.next().is_reserved(">") {
                self.commit(HighlightKind::Operator);
                break;
            }
            self.backtrack(mark);
            self.cache_store(
                CacheKind::TypeTemplates,
                mark,
                MemoValue::TypeTemplates(Parsed::Mismatch),
            );
            return Parsed::Mismatch;
        }

        let slice = args.into_bump_slice();
        self.cache_store(
            CacheKind::TypeTemplates,
            mark,
            MemoValue::TypeTemplates(Parsed::Ok(slice)),
        );
        Parsed::Ok(slice)
    }

    /// Declaration-side template parameter list: `'<' IDENT {',' IDENT} '>'`.
    ///
    /// Fully speculative; an unparsable list yields no parameters.
    pub(crate) fn parse_template_params_opt(&mut self) -> &'a [Ident<'a>] {
        if !self.next().is_reserved("<") {
            return &[];
        }
        let mark = self.marker();
        self.commit(HighlightKind::Operator);

        let mut params = BumpVec::new_in(self.arena);
        loop {
            // The C++-style `class T` spelling is tolerated.
            if self.next().is_reserved("class") {
                self.commit(HighlightKind::Keyword);
            }
            if !self.next().is_identifier() {
                self.backtrack(mark);
                return &[];
            }
            let ident = self.make_ident();
            self.commit(HighlightKind::Type);
            params.push(ident);

            if self.next().is_reserved(",") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            if self.next().is_reserved(">") {
                self.commit(HighlightKind::Operator);
                break;
            }
            self.backtrack(mark);
            return &[];
        }
        params.into_bump_slice()
    }
}
