//! Declaration grammar.
//!
//! Declarations with overlapping prefixes (entity attributes shared by
//! class/enum/interface; functions vs. virtual properties vs.
//! variables) are disambiguated by speculative attempts in a fixed
//! order, accepting the first parser that does not mismatch.

use super::parsed::Parsed;
use super::state::{CacheKind, ListStep, MemoValue, ParserState};
use crate::ast::*;
use asls_core::{HighlightKind, TokenRange};
use bumpalo::collections::Vec as BumpVec;

impl<'a, 'out> ParserState<'a, 'out> {
    pub(crate) fn parse_script_root(&mut self) -> Script<'a> {
        let start = self.next_id();
        let items = self.parse_script(false);
        let range = self.range_from(start);
        Script::new(items, range)
    }

    /// `SCRIPT ::= {IMPORT|ENUM|TYPEDEF|CLASS|MIXIN|INTERFACE|FUNCDEF|
    ///              VIRTPROP|VAR|FUNC|NAMESPACE|';'}`
    fn parse_script(&mut self, in_block: bool) -> &'a [Item<'a>] {
        let mut items = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                break;
            }
            if in_block && self.next().is_reserved("}") {
                break;
            }
            if self.next().is_reserved(";") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            match self.parse_item() {
                Parsed::Ok(item) => items.push(item),
                Parsed::Pending => {}
                Parsed::Mismatch => {
                    self.error("Expected a declaration.");
                    self.step();
                }
            }
        }
        items.into_bump_slice()
    }

    fn parse_item(&mut self) -> Parsed<Item<'a>> {
        let token = self.next();
        if token.is_reserved("namespace") {
            return self.parse_namespace().map(Item::Namespace);
        }
        if token.is_reserved("typedef") {
            return self.parse_typedef().map(Item::TypeDef);
        }
        if token.is_reserved("mixin") {
            return self.parse_mixin().map(Item::Mixin);
        }
        if token.is_reserved("import") {
            return self.parse_import().map(Item::Import);
        }

        match self.parse_enum() {
            Parsed::Ok(node) => return Parsed::Ok(Item::Enum(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        match self.parse_class() {
            Parsed::Ok(node) => return Parsed::Ok(Item::Class(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        match self.parse_interface() {
            Parsed::Ok(node) => return Parsed::Ok(Item::Interface(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        match self.parse_funcdef() {
            Parsed::Ok(node) => return Parsed::Ok(Item::FuncDef(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        match self.parse_func() {
            Parsed::Ok(node) => return Parsed::Ok(Item::Func(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        match self.parse_virtual_prop() {
            Parsed::Ok(node) => return Parsed::Ok(Item::VirtualProp(node)),
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {}
        }
        self.parse_var().map(Item::Var)
    }

    /// `'namespace' IDENT {'::' IDENT} '{' SCRIPT '}'`
    fn parse_namespace(&mut self) -> Parsed<&'a NamespaceDecl<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);

        let mut path = BumpVec::new_in(self.arena);
        loop {
            if !self.next().is_identifier() {
                self.error("Expected identifier.");
                return Parsed::Pending;
            }
            path.push(self.make_ident());
            self.commit(HighlightKind::Namespace);
            if self.next().is_reserved("::") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            break;
        }

        if !self.expect("{", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let items = self.parse_script(true);
        self.expect("}", HighlightKind::Operator);

        Parsed::Ok(self.alloc(NamespaceDecl {
            path: path.into_bump_slice(),
            items,
            range: self.range_from(start),
        }))
    }

    /// `{'shared'|'abstract'|'final'|'external'}`, memoized.
    pub(crate) fn parse_entity_attrs(&mut self) -> EntityAttrs {
        if let Some(MemoValue::EntityAttrs(cached)) = self.cache_restore(CacheKind::EntityAttrs) {
            return cached.ok().unwrap_or_default();
        }

        let mark = self.marker();
        let mut attrs = EntityAttrs::default();
        loop {
            let token = self.next();
            let flag = match token.text {
                "shared" if token.is_reserved("shared") => &mut attrs.is_shared,
                "external" if token.is_reserved("external") => &mut attrs.is_external,
                "abstract" if token.is_reserved("abstract") => &mut attrs.is_abstract,
                "final" if token.is_reserved("final") => &mut attrs.is_final,
                _ => break,
            };
            *flag = true;
            self.commit(HighlightKind::Keyword);
        }
        self.cache_store(
            CacheKind::EntityAttrs,
            mark,
            MemoValue::EntityAttrs(Parsed::Ok(attrs)),
        );
        attrs
    }

    /// Bracket-balanced `[…]` metadata blocks, preserved verbatim and
    /// classified as decorators. An unterminated block backtracks
    /// cleanly.
    fn parse_metadata(&mut self) -> &'a [TokenRange] {
        let mut blocks = BumpVec::new_in(self.arena);
        while self.next().is_reserved("[") {
            let mark = self.marker();
            let start = self.next_id();
            self.commit(HighlightKind::Decorator);

            let mut depth = 1u32;
            while depth > 0 {
                if self.is_end() {
                    break;
                }
                let token = self.next();
                if token.is_reserved("[") {
                    depth += 1;
                } else if token.is_reserved("]") {
                    depth -= 1;
                }
                self.commit(HighlightKind::Decorator);
            }

            if depth > 0 {
                self.backtrack(mark);
                break;
            }
            blocks.push(TokenRange::new(start, self.prev_id()));
        }
        blocks.into_bump_slice()
    }

    fn parse_access(&mut self) -> Access {
        if self.next().is_reserved("private") {
            self.commit(HighlightKind::Keyword);
            Access::Private
        } else if self.next().is_reserved("protected") {
            self.commit(HighlightKind::Keyword);
            Access::Protected
        } else {
            Access::Public
        }
    }

    /// `{'override'|'final'|'explicit'|'property'}`
    fn parse_func_attrs(&mut self) -> FuncAttrs {
        let mut attrs = FuncAttrs::default();
        loop {
            let token = self.next();
            let flag = match token.text {
                "override" if token.is_reserved("override") => &mut attrs.is_override,
                "final" if token.is_reserved("final") => &mut attrs.is_final,
                "explicit" if token.is_reserved("explicit") => &mut attrs.is_explicit,
                "property" if token.is_reserved("property") => &mut attrs.is_property,
                _ => break,
            };
            *flag = true;
            self.commit(HighlightKind::Keyword);
        }
        attrs
    }

    /// `CLASS ::= {attrs} 'class' IDENT (';' | [':' bases] '{' members '}')`
    fn parse_class(&mut self) -> Parsed<&'a ClassDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let metadata = self.parse_metadata();
        let attrs = self.parse_entity_attrs();

        if !self.next().is_reserved("class") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        self.commit(HighlightKind::Keyword);

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Class);

        let template_params = self.parse_template_params_opt();

        // Forward declaration.
        if self.next().is_reserved(";") {
            let end = self.next_id();
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(self.alloc(ClassDecl {
                metadata,
                attrs,
                name,
                template_params,
                bases: &[],
                members: &[],
                scope_range: TokenRange::single(end),
                range: self.range_from(start),
            }));
        }

        let mut bases = BumpVec::new_in(self.arena);
        if self.next().is_reserved(":") {
            self.commit(HighlightKind::Operator);
            loop {
                if !self.next().is_identifier() {
                    self.error("Expected identifier.");
                    break;
                }
                bases.push(self.make_ident());
                self.commit(HighlightKind::Type);
                if self.next().is_reserved(",") {
                    self.commit(HighlightKind::Operator);
                    continue;
                }
                break;
            }
        }

        if !self.expect("{", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let scope_start = self.prev_id();
        let members = self.parse_class_members();
        self.expect("}", HighlightKind::Operator);
        let scope_range = TokenRange::new(scope_start, self.prev_id());

        Parsed::Ok(self.alloc(ClassDecl {
            metadata,
            attrs,
            name,
            template_params,
            bases: bases.into_bump_slice(),
            members,
            scope_range,
            range: self.range_from(start),
        }))
    }

    /// `{VIRTPROP|FUNC|VAR|FUNCDEF}` until the closing brace, trying
    /// the alternatives in a fixed order and taking the first that is
    /// not a mismatch.
    fn parse_class_members(&mut self) -> &'a [ClassMember<'a>] {
        let mut members = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() || self.next().is_reserved("}") {
                break;
            }
            if self.next().is_reserved(";") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            match self.parse_funcdef() {
                Parsed::Ok(node) => {
                    members.push(ClassMember::FuncDef(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_func() {
                Parsed::Ok(node) => {
                    members.push(ClassMember::Func(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_virtual_prop() {
                Parsed::Ok(node) => {
                    members.push(ClassMember::VirtualProp(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_var() {
                Parsed::Ok(node) => {
                    members.push(ClassMember::Var(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            self.error("Expected class member.");
            self.step();
        }
        members.into_bump_slice()
    }

    /// `'mixin' CLASS`
    fn parse_mixin(&mut self) -> Parsed<&'a MixinDecl<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        match self.parse_class() {
            Parsed::Ok(class) => Parsed::Ok(self.alloc(MixinDecl {
                class,
                range: self.range_from(start),
            })),
            _ => {
                self.error("Expected class declaration.");
                Parsed::Pending
            }
        }
    }

    /// `ENUM ::= {attrs} 'enum' IDENT (';' | '{' members [','] '}')`
    fn parse_enum(&mut self) -> Parsed<&'a EnumDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let attrs = self.parse_entity_attrs();

        if !self.next().is_reserved("enum") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        self.commit(HighlightKind::Keyword);

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Enum);

        // Forward declaration.
        if self.next().is_reserved(";") {
            let end = self.next_id();
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(self.alloc(EnumDecl {
                attrs,
                name,
                members: &[],
                scope_range: TokenRange::single(end),
                range: self.range_from(start),
            }));
        }

        if !self.expect("{", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let scope_start = self.prev_id();

        let mut members = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                self.error("Expected '}'");
                break;
            }
            // A trailing comma leaves the cursor on the brace.
            if self.next().is_reserved("}") {
                self.commit(HighlightKind::Operator);
                break;
            }
            if !self.next().is_identifier() {
                self.error("Expected identifier.");
                self.step();
                continue;
            }
            let member_name = self.make_ident();
            self.commit(HighlightKind::EnumMember);

            let mut value = None;
            if self.next().is_reserved("=") {
                self.commit(HighlightKind::Operator);
                match self.parse_expr() {
                    Parsed::Ok(expr) => value = Some(expr),
                    Parsed::Mismatch => self.error("Expected expression."),
                    Parsed::Pending => {}
                }
            }
            members.push(EnumMember {
                name: member_name,
                value,
            });

            match self.expect_continuous_or_close(",", "}", true) {
                ListStep::Closed => break,
                ListStep::Continued => continue,
                ListStep::Aborted => break,
            }
        }
        let scope_range = TokenRange::new(scope_start, self.prev_id());

        Parsed::Ok(self.alloc(EnumDecl {
            attrs,
            name,
            members: members.into_bump_slice(),
            scope_range,
            range: self.range_from(start),
        }))
    }

    /// `INTERFACE ::= {attrs} 'interface' IDENT
    ///                 (';' | [':' bases] '{' {VIRTPROP|INTFMTHD} '}')`
    fn parse_interface(&mut self) -> Parsed<&'a InterfaceDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let attrs = self.parse_entity_attrs();

        if !self.next().is_reserved("interface") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        self.commit(HighlightKind::Keyword);

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Interface);

        if self.next().is_reserved(";") {
            let end = self.next_id();
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(self.alloc(InterfaceDecl {
                attrs,
                name,
                bases: &[],
                members: &[],
                scope_range: TokenRange::single(end),
                range: self.range_from(start),
            }));
        }

        let mut bases = BumpVec::new_in(self.arena);
        if self.next().is_reserved(":") {
            self.commit(HighlightKind::Operator);
            loop {
                if !self.next().is_identifier() {
                    self.error("Expected identifier.");
                    break;
                }
                bases.push(self.make_ident());
                self.commit(HighlightKind::Interface);
                if self.next().is_reserved(",") {
                    self.commit(HighlightKind::Operator);
                    continue;
                }
                break;
            }
        }

        if !self.expect("{", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let scope_start = self.prev_id();

        let mut members = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() || self.next().is_reserved("}") {
                break;
            }
            if self.next().is_reserved(";") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            match self.parse_virtual_prop() {
                Parsed::Ok(node) => {
                    members.push(InterfaceMember::VirtualProp(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_intf_method() {
                Parsed::Ok(node) => {
                    members.push(InterfaceMember::Method(node));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            self.error("Expected interface member.");
            self.step();
        }
        self.expect("}", HighlightKind::Operator);
        let scope_range = TokenRange::new(scope_start, self.prev_id());

        Parsed::Ok(self.alloc(InterfaceDecl {
            attrs,
            name,
            bases: bases.into_bump_slice(),
            members: members.into_bump_slice(),
            scope_range,
            range: self.range_from(start),
        }))
    }

    /// `INTFMTHD ::= TYPE ['&'] IDENT PARAMLIST ['const'] ';'`
    fn parse_intf_method(&mut self) -> Parsed<&'a IntfMethod<'a>> {
        let mark = self.marker();
        let start = self.next_id();

        let return_type = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => return Parsed::Mismatch,
        };
        let is_ref = if self.next().is_reserved("&") {
            self.commit(HighlightKind::Operator);
            true
        } else {
            false
        };
        if !self.next().is_identifier() || !self.next_at(1).is_reserved("(") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Function);

        let params = match self.parse_param_list() {
            Parsed::Ok(params) => params,
            _ => {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
        };
        let is_const = if self.next().is_reserved("const") {
            self.commit(HighlightKind::Keyword);
            true
        } else {
            false
        };
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(IntfMethod {
            return_type,
            is_ref,
            name,
            params,
            is_const,
            range: self.range_from(start),
        }))
    }

    /// `TYPEDEF ::= 'typedef' PRIMTYPE IDENT ';'`
    fn parse_typedef(&mut self) -> Parsed<&'a TypeDefDecl<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);

        if !self.next().has(crate::lexer::ReservedFlags::PRIME_TYPE) {
            self.error("Expected primitive type.");
            return Parsed::Pending;
        }
        let base = self.make_ident();
        self.commit(HighlightKind::Builtin);

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Type);
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(TypeDefDecl {
            base,
            name,
            range: self.range_from(start),
        }))
    }

    /// `FUNCDEF ::= {attrs} 'funcdef' TYPE ['&'] IDENT PARAMLIST ';'`
    fn parse_funcdef(&mut self) -> Parsed<&'a FuncDefDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let attrs = self.parse_entity_attrs();

        if !self.next().is_reserved("funcdef") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        self.commit(HighlightKind::Keyword);

        let return_type = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.error("Expected type.");
                return Parsed::Pending;
            }
        };
        let is_ref = if self.next().is_reserved("&") {
            self.commit(HighlightKind::Operator);
            true
        } else {
            false
        };

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Function);

        let params = match self.parse_param_list() {
            Parsed::Ok(params) => params,
            _ => {
                self.error("Expected parameter list.");
                return Parsed::Pending;
            }
        };
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(FuncDefDecl {
            attrs,
            return_type,
            is_ref,
            name,
            params,
            range: self.range_from(start),
        }))
    }

    /// `IMPORT ::= 'import' TYPE ['&'] IDENT PARAMLIST FUNCATTR
    ///             'from' STRING ';'`
    fn parse_import(&mut self) -> Parsed<&'a ImportDecl<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);

        let return_type = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.error("Expected type.");
                return Parsed::Pending;
            }
        };
        let is_ref = if self.next().is_reserved("&") {
            self.commit(HighlightKind::Operator);
            true
        } else {
            false
        };

        if !self.next().is_identifier() {
            self.error("Expected identifier.");
            return Parsed::Pending;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Function);

        let params = match self.parse_param_list() {
            Parsed::Ok(params) => params,
            _ => {
                self.error("Expected parameter list.");
                return Parsed::Pending;
            }
        };
        let func_attrs = self.parse_func_attrs();

        if !self.expect("from", HighlightKind::Keyword) {
            return Parsed::Pending;
        }
        if !self.next().is_string() {
            self.error("Expected module string.");
            return Parsed::Pending;
        }
        let from_module = self.make_ident();
        self.commit(HighlightKind::String);
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(ImportDecl {
            return_type,
            is_ref,
            name,
            params,
            func_attrs,
            from_module,
            range: self.range_from(start),
        }))
    }

    /// `FUNC ::= {attrs} [access] [TYPE ['&'] | '~'] IDENT PARAMLIST
    ///           ['const'] FUNCATTR (';' | STATBLOCK)`
    ///
    /// Fully speculative until the `(` after the name is seen; any
    /// earlier failure rewinds and mismatches so variables and
    /// properties can be tried at the same position.
    pub(crate) fn parse_func(&mut self) -> Parsed<&'a FuncDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let metadata = self.parse_metadata();
        let attrs = self.parse_entity_attrs();
        let access = self.parse_access();

        let (head, name) = if self.next().is_reserved("~") {
            self.commit(HighlightKind::Operator);
            if !self.next().is_identifier() {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
            let name = self.make_ident();
            self.commit(HighlightKind::Class);
            (FuncHead::Destructor, name)
        } else if self.next().is_identifier() && self.next_at(1).is_reserved("(") {
            let name = self.make_ident();
            self.commit(HighlightKind::Class);
            (FuncHead::Constructor, name)
        } else {
            let return_type = match self.parse_type() {
                Parsed::Ok(ty) => ty,
                _ => {
                    self.backtrack(mark);
                    return Parsed::Mismatch;
                }
            };
            let is_ref = if self.next().is_reserved("&") {
                self.commit(HighlightKind::Operator);
                true
            } else {
                false
            };
            if !self.next().is_identifier() || !self.next_at(1).is_reserved("(") {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
            let name = self.make_ident();
            self.commit(HighlightKind::Function);
            (
                FuncHead::Returns {
                    return_type,
                    is_ref,
                },
                name,
            )
        };

        let template_params = self.parse_template_params_opt();
        let params = match self.parse_param_list() {
            Parsed::Ok(params) => params,
            _ => {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
        };

        let is_const = if self.next().is_reserved("const") {
            self.commit(HighlightKind::Keyword);
            true
        } else {
            false
        };
        let func_attrs = self.parse_func_attrs();

        // The body is always present; a declaration ending in ';'
        // gets an empty block over that token.
        let body = if self.next().is_reserved(";") {
            let end = self.next_id();
            self.commit(HighlightKind::Operator);
            self.alloc(StatBlock {
                statements: &[],
                range: TokenRange::single(end),
            })
        } else {
            match self.parse_stat_block() {
                Parsed::Ok(body) => body,
                Parsed::Mismatch => {
                    self.error("Expected function body.");
                    return Parsed::Pending;
                }
                Parsed::Pending => return Parsed::Pending,
            }
        };

        Parsed::Ok(self.alloc(FuncDecl {
            metadata,
            attrs,
            access,
            head,
            name,
            template_params,
            params,
            is_const,
            func_attrs,
            body,
            range: self.range_from(start),
        }))
    }

    /// `PARAMLIST ::= '(' ['void' | TYPE TYPEMOD [IDENT] ['=' EXPR]
    ///                {',' …}] ')'`
    ///
    /// Speculative: an unparsable list rewinds to the `(` and
    /// mismatches, letting the caller re-read the tokens as a
    /// variable initializer.
    fn parse_param_list(&mut self) -> Parsed<&'a [ParamDecl<'a>]> {
        if !self.next().is_reserved("(") {
            return Parsed::Mismatch;
        }
        let mark = self.marker();
        self.commit(HighlightKind::Operator);

        let mut params = BumpVec::new_in(self.arena);
        if self.next().is_reserved("void") && self.next_at(1).is_reserved(")") {
            self.commit(HighlightKind::Builtin);
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(params.into_bump_slice());
        }
        if self.next().is_reserved(")") {
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(params.into_bump_slice());
        }

        loop {
            let ty = match self.parse_type() {
                Parsed::Ok(ty) => ty,
                _ => {
                    self.backtrack(mark);
                    return Parsed::Mismatch;
                }
            };
            let ref_kind = self.parse_param_ref();
            let name = if self.next().is_identifier() {
                let name = self.make_ident();
                self.commit(HighlightKind::Parameter);
                Some(name)
            } else {
                None
            };
            let default = if self.next().is_reserved("=") {
                self.commit(HighlightKind::Operator);
                match self.parse_expr() {
                    Parsed::Ok(expr) => Some(expr),
                    _ => {
                        self.backtrack(mark);
                        return Parsed::Mismatch;
                    }
                }
            } else {
                None
            };
            params.push(ParamDecl {
                ty,
                ref_kind,
                name,
                default,
            });

            if self.next().is_reserved(",") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            if self.next().is_reserved(")") {
                self.commit(HighlightKind::Operator);
                break;
            }
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        Parsed::Ok(params.into_bump_slice())
    }

    /// `TYPEMOD ::= ['&' ['in'|'out'|'inout']]`
    fn parse_param_ref(&mut self) -> ParamRef {
        if !self.next().is_reserved("&") {
            return ParamRef::ByValue;
        }
        self.commit(HighlightKind::Operator);
        if self.next().is_reserved("in") {
            self.commit(HighlightKind::Keyword);
            ParamRef::RefIn
        } else if self.next().is_reserved("out") {
            self.commit(HighlightKind::Keyword);
            ParamRef::RefOut
        } else if self.next().is_reserved("inout") {
            self.commit(HighlightKind::Keyword);
            ParamRef::RefInOut
        } else {
            ParamRef::Ref
        }
    }

    /// `VIRTPROP ::= [access] TYPE ['&'] IDENT
    ///               '{' {('get'|'set') ['const'] FUNCATTR (STATBLOCK|';')} '}'`
    pub(crate) fn parse_virtual_prop(&mut self) -> Parsed<&'a VirtualPropDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let access = self.parse_access();

        let ty = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
        };
        let is_ref = if self.next().is_reserved("&") {
            self.commit(HighlightKind::Operator);
            true
        } else {
            false
        };
        if !self.next().is_identifier() || !self.next_at(1).is_reserved("{") {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        let name = self.make_ident();
        self.commit(HighlightKind::Variable);
        self.commit(HighlightKind::Operator);

        let mut accessors = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                self.error("Expected '}'");
                break;
            }
            if self.next().is_reserved("}") {
                self.commit(HighlightKind::Operator);
                break;
            }
            let kind = if self.next().is_reserved("get") {
                AccessorKind::Get
            } else if self.next().is_reserved("set") {
                AccessorKind::Set
            } else {
                self.error("Expected 'get' or 'set'");
                self.step();
                continue;
            };
            let accessor_start = self.next_id();
            self.commit(HighlightKind::Keyword);

            let is_const = if self.next().is_reserved("const") {
                self.commit(HighlightKind::Keyword);
                true
            } else {
                false
            };
            let attrs = self.parse_func_attrs();

            let body = if self.next().is_reserved(";") {
                self.commit(HighlightKind::Operator);
                None
            } else {
                match self.parse_stat_block() {
                    Parsed::Ok(body) => Some(body),
                    Parsed::Mismatch => {
                        self.error("Expected accessor body or ';'");
                        None
                    }
                    Parsed::Pending => None,
                }
            };
            accessors.push(PropAccessor {
                kind,
                is_const,
                attrs,
                body,
                range: self.range_from(accessor_start),
            });
        }

        Parsed::Ok(self.alloc(VirtualPropDecl {
            access,
            ty,
            is_ref,
            name,
            accessors: accessors.into_bump_slice(),
            range: self.range_from(start),
        }))
    }

    /// `VAR ::= [access] TYPE IDENT [init] {',' IDENT [init]} ';'`
    pub(crate) fn parse_var(&mut self) -> Parsed<&'a VarDecl<'a>> {
        let mark = self.marker();
        let start = self.next_id();
        let metadata = self.parse_metadata();
        let access = self.parse_access();

        let ty = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.backtrack(mark);
                return Parsed::Mismatch;
            }
        };
        // `auto` needs an initializer, but a missing one is the
        // analyzer's diagnostic, not a parse mismatch.
        if !self.next().is_identifier() {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }
        // The token after the name decides whether this is a variable
        // at all.
        let follow = self.next_at(1);
        if !(follow.is_reserved("=")
            || follow.is_reserved(",")
            || follow.is_reserved(";")
            || follow.is_reserved("("))
        {
            self.backtrack(mark);
            return Parsed::Mismatch;
        }

        let mut declarators = BumpVec::new_in(self.arena);
        loop {
            if !self.next().is_identifier() {
                self.error("Expected identifier.");
                break;
            }
            let name = self.make_ident();
            self.commit(HighlightKind::Variable);

            let init = if self.next().is_reserved("=") {
                self.commit(HighlightKind::Operator);
                if self.next().is_reserved("{") {
                    match self.parse_init_list() {
                        Parsed::Ok(list) => Some(VarInit::InitList(list)),
                        _ => return Parsed::Pending,
                    }
                } else {
                    match self.parse_assign() {
                        Parsed::Ok(assign) => Some(VarInit::Assign(assign)),
                        Parsed::Mismatch => {
                            self.error("Expected expression.");
                            return Parsed::Pending;
                        }
                        Parsed::Pending => return Parsed::Pending,
                    }
                }
            } else if self.next().is_reserved("(") {
                match self.parse_arg_list() {
                    Parsed::Ok(args) => Some(VarInit::Args(args)),
                    _ => return Parsed::Pending,
                }
            } else {
                None
            };
            declarators.push(VarDeclarator { name, init });

            if self.next().is_reserved(",") {
                self.commit(HighlightKind::Operator);
                continue;
            }
            break;
        }
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(VarDecl {
            metadata,
            access,
            ty,
            declarators: declarators.into_bump_slice(),
            range: self.range_from(start),
        }))
    }
}
