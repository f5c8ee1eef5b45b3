//! Expression grammar.
//!
//! Expressions parse to a flat, right-leaning list of terms and
//! operators; precedence is applied later by the analyzer. This file
//! also owns virtual-token synthesis: the tokenizer never fuses `>`
//! with its neighbors, so `>=`, `>>`, `>>=`, `>>>`, `>>>=` and `!is`
//! are recognized here from strictly adjacent tokens.

use super::parsed::Parsed;
use super::state::{ListStep, ParserState};
use crate::ast::*;
use crate::lexer::ReservedFlags;
use asls_core::{HighlightKind, Span};
use bumpalo::collections::Vec as BumpVec;

impl<'a, 'out> ParserState<'a, 'out> {
    /// `ASSIGN ::= CONDITION [ASSIGNOP ASSIGN]` — right-associative.
    pub(crate) fn parse_assign(&mut self) -> Parsed<&'a Assign<'a>> {
        let start = self.next_id();
        let condition = match self.parse_condition() {
            Parsed::Ok(condition) => condition,
            Parsed::Mismatch => return Parsed::Mismatch,
            Parsed::Pending => return Parsed::Pending,
        };

        let mut tail = None;
        if let Some((op, count)) = self.peek_assign_op() {
            self.consume_op_tokens(count);
            match self.parse_assign() {
                Parsed::Ok(rhs) => tail = Some(AssignTail { op, rhs }),
                Parsed::Mismatch => self.error("Expected expression."),
                Parsed::Pending => {}
            }
        }

        Parsed::Ok(self.alloc(Assign {
            condition,
            tail,
            range: self.range_from(start),
        }))
    }

    /// `CONDITION ::= EXPR ['?' ASSIGN ':' ASSIGN]`.
    ///
    /// The ternary is attached only when both branches parse.
    pub(crate) fn parse_condition(&mut self) -> Parsed<&'a Condition<'a>> {
        let start = self.next_id();
        let expr = match self.parse_expr() {
            Parsed::Ok(expr) => expr,
            Parsed::Mismatch => return Parsed::Mismatch,
            Parsed::Pending => return Parsed::Pending,
        };

        let mut ternary = None;
        if self.next().is_reserved("?") {
            self.commit(HighlightKind::Operator);
            let true_assign = self.parse_assign();
            if true_assign.is_mismatch() {
                self.error("Expected expression.");
            }
            if self.expect(":", HighlightKind::Operator) {
                let false_assign = self.parse_assign();
                if false_assign.is_mismatch() {
                    self.error("Expected expression.");
                }
                if let (Some(true_assign), Some(false_assign)) =
                    (true_assign.ok(), false_assign.ok())
                {
                    ternary = Some(Ternary {
                        true_assign,
                        false_assign,
                    });
                }
            }
        }

        Parsed::Ok(self.alloc(Condition {
            expr,
            ternary,
            range: self.range_from(start),
        }))
    }

    /// `EXPR ::= EXPRTERM {EXPROP EXPRTERM}`, kept flat.
    pub(crate) fn parse_expr(&mut self) -> Parsed<&'a Expr<'a>> {
        let start = self.next_id();
        let head = match self.parse_expr_term() {
            Parsed::Ok(head) => head,
            Parsed::Mismatch => return Parsed::Mismatch,
            Parsed::Pending => return Parsed::Pending,
        };

        let mut tail = None;
        if let Some((op, count)) = self.peek_expr_op() {
            self.consume_op_tokens(count);
            match self.parse_expr() {
                Parsed::Ok(rhs) => tail = Some(ExprTail { op, rhs }),
                Parsed::Mismatch => self.error("Expected expression term."),
                Parsed::Pending => {}
            }
        }

        Parsed::Ok(self.alloc(Expr {
            head,
            tail,
            range: self.range_from(start),
        }))
    }

    /// `EXPRTERM ::= ([TYPE '='] INITLIST) | ({preOp} EXPRVALUE {postOp})`
    fn parse_expr_term(&mut self) -> Parsed<ExprTerm<'a>> {
        let start = self.next_id();

        if self.next().is_reserved("{") {
            return self.parse_init_list().map(|list| ExprTerm::InitList {
                ty: None,
                list,
                range: self.range_from(start),
            });
        }

        // `TYPE '=' INITLIST`, speculatively.
        if self.could_start_type() {
            let mark = self.marker();
            if let Parsed::Ok(ty) = self.parse_type() {
                if self.next().is_reserved("=") && self.next_at(1).is_reserved("{") {
                    self.commit(HighlightKind::Operator);
                    return match self.parse_init_list() {
                        Parsed::Ok(list) => Parsed::Ok(ExprTerm::InitList {
                            ty: Some(ty),
                            list,
                            range: self.range_from(start),
                        }),
                        _ => Parsed::Pending,
                    };
                }
            }
            self.backtrack(mark);
        }

        let mut pre_ops = BumpVec::new_in(self.arena);
        while self.next().has(ReservedFlags::EXPR_PRE_OP) {
            let token = self.next();
            let Some(op) = PreOp::from_text(token.text) else {
                break;
            };
            pre_ops.push(OpToken {
                op,
                token: self.next_id(),
                span: token.span,
            });
            self.commit(HighlightKind::Operator);
        }

        let value = match self.parse_expr_value() {
            Parsed::Ok(value) => value,
            Parsed::Pending => return Parsed::Pending,
            Parsed::Mismatch => {
                if pre_ops.is_empty() {
                    return Parsed::Mismatch;
                }
                self.error("Expected an expression value.");
                return Parsed::Pending;
            }
        };

        let post_ops = self.parse_post_ops();
        let term = self.alloc(ValueTerm {
            pre_ops: pre_ops.into_bump_slice(),
            value,
            post_ops,
            range: self.range_from(start),
        });
        Parsed::Ok(ExprTerm::Value(term))
    }

    /// The head value of a term, most specific alternatives first.
    fn parse_expr_value(&mut self) -> Parsed<ExprValue<'a>> {
        let token = self.next();
        let start = self.next_id();

        if token.is_reserved("void") {
            let ident = self.make_ident();
            self.commit(HighlightKind::Builtin);
            return Parsed::Ok(ExprValue::Void(ident));
        }

        if token.is_reserved("cast") {
            return self.parse_cast().map(ExprValue::Cast);
        }

        if token.is_reserved("(") {
            self.commit(HighlightKind::Operator);
            let assign = match self.parse_assign() {
                Parsed::Ok(assign) => assign,
                Parsed::Mismatch => {
                    self.error("Expected expression.");
                    return Parsed::Pending;
                }
                Parsed::Pending => return Parsed::Pending,
            };
            self.expect(")", HighlightKind::Operator);
            return Parsed::Ok(ExprValue::Paren(assign));
        }

        if let Some(literal) = self.try_parse_literal() {
            return Parsed::Ok(ExprValue::Literal(literal));
        }

        if token.is_reserved("function") && self.lambda_follows() {
            return self.parse_lambda().map(ExprValue::Lambda);
        }

        if token.is_reserved("this") {
            let name = self.make_ident();
            self.commit(HighlightKind::Keyword);
            return Parsed::Ok(ExprValue::VarAccess(self.alloc(VarAccess {
                scope: None,
                name,
                range: self.range_from(start),
            })));
        }

        if token.is_reserved("super") && self.next_at(1).is_reserved("(") {
            let name = self.make_ident();
            self.commit(HighlightKind::Keyword);
            return match self.parse_arg_list() {
                Parsed::Ok(args) => Parsed::Ok(ExprValue::FuncCall(self.alloc(FuncCall {
                    scope: None,
                    name,
                    args,
                    range: self.range_from(start),
                }))),
                _ => Parsed::Pending,
            };
        }

        // FUNCCALL ::= SCOPE IDENT ARGLIST
        let mark = self.marker();
        let scope = self.parse_scope_opt();
        if self.next().is_identifier() && self.next_at(1).is_reserved("(") {
            let name = self.make_ident();
            self.commit(HighlightKind::Function);
            return match self.parse_arg_list() {
                Parsed::Ok(args) => Parsed::Ok(ExprValue::FuncCall(self.alloc(FuncCall {
                    scope,
                    name,
                    args,
                    range: self.range_from(start),
                }))),
                _ => Parsed::Pending,
            };
        }
        self.backtrack(mark);

        // CONSTRUCTCALL ::= TYPE ARGLIST — catches what FUNCCALL
        // cannot name: primitives and template instantiations.
        let construct_mark = self.marker();
        if let Parsed::Ok(ty) = self.parse_type() {
            if self.next().is_reserved("(") {
                return match self.parse_arg_list() {
                    Parsed::Ok(args) => {
                        Parsed::Ok(ExprValue::ConstructCall(self.alloc(ConstructCall {
                            ty,
                            args,
                            range: self.range_from(start),
                        })))
                    }
                    _ => Parsed::Pending,
                };
            }
        }
        self.backtrack(construct_mark);

        // VARACCESS ::= SCOPE IDENT
        let scope = self.parse_scope_opt();
        if self.next().is_identifier() {
            let name = self.make_ident();
            self.commit(HighlightKind::Variable);
            return Parsed::Ok(ExprValue::VarAccess(self.alloc(VarAccess {
                scope,
                name,
                range: self.range_from(start),
            })));
        }
        if scope.is_some() {
            self.error("Expected identifier after scope.");
            return Parsed::Pending;
        }
        Parsed::Mismatch
    }

    fn try_parse_literal(&mut self) -> Option<&'a Literal<'a>> {
        let token = self.next();
        let kind = if let crate::lexer::TokenKind::Number(number) = token.kind {
            LiteralKind::Number(number)
        } else if token.is_string() {
            LiteralKind::String
        } else if token.is_reserved("true") {
            LiteralKind::Bool(true)
        } else if token.is_reserved("false") {
            LiteralKind::Bool(false)
        } else if token.is_reserved("null") {
            LiteralKind::Null
        } else {
            return None;
        };

        let literal = self.alloc(Literal {
            kind,
            text: token.text,
            token: self.next_id(),
            span: token.span,
        });
        let highlight = match kind {
            LiteralKind::Number(_) => HighlightKind::Number,
            LiteralKind::String => HighlightKind::String,
            _ => HighlightKind::Keyword,
        };
        self.commit(highlight);
        Some(literal)
    }

    fn parse_post_ops(&mut self) -> &'a [PostOp<'a>] {
        let mut ops = BumpVec::new_in(self.arena);
        loop {
            let token = self.next();
            if token.is_reserved(".") {
                self.commit(HighlightKind::Operator);
                if !self.next().is_identifier() {
                    self.error("Expected identifier.");
                    break;
                }
                let name = self.make_ident();
                if self.next_at(1).is_reserved("(") {
                    self.commit(HighlightKind::Function);
                    match self.parse_arg_list() {
                        Parsed::Ok(args) => ops.push(PostOp::MethodCall { name, args }),
                        _ => break,
                    }
                } else {
                    self.commit(HighlightKind::Variable);
                    ops.push(PostOp::Field { name });
                }
            } else if token.is_reserved("[") {
                match self.parse_index_args() {
                    Parsed::Ok(args) => ops.push(PostOp::Index { args }),
                    _ => break,
                }
            } else if token.is_reserved("(") {
                match self.parse_arg_list() {
                    Parsed::Ok(args) => ops.push(PostOp::Call { args }),
                    _ => break,
                }
            } else if token.is_reserved("++") || token.is_reserved("--") {
                let op = if token.text == "++" {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                };
                ops.push(PostOp::IncDec {
                    op,
                    token: self.next_id(),
                    span: token.span,
                });
                self.commit(HighlightKind::Operator);
            } else {
                break;
            }
        }
        ops.into_bump_slice()
    }

    /// `cast '<' TYPE '>' '(' ASSIGN ')'`
    fn parse_cast(&mut self) -> Parsed<&'a CastExpr<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("<", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let ty = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.error("Expected type.");
                return Parsed::Pending;
            }
        };
        if !self.expect(">", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let expr = match self.parse_assign() {
            Parsed::Ok(expr) => expr,
            Parsed::Mismatch => {
                self.error("Expected expression.");
                return Parsed::Pending;
            }
            Parsed::Pending => return Parsed::Pending,
        };
        self.expect(")", HighlightKind::Operator);
        Parsed::Ok(self.alloc(CastExpr {
            ty,
            expr,
            range: self.range_from(start),
        }))
    }

    /// Whether `function` here begins a lambda.
    ///
    /// Accepts only `function '(' … ')' '{'`; the scan runs to the
    /// first `)` without balancing nested parentheses, which is
    /// adequate because lambda parameter lists cannot contain them.
    fn lambda_follows(&self) -> bool {
        if !self.next_at(1).is_reserved("(") {
            return false;
        }
        let mut offset = 2;
        loop {
            let token = self.next_at(offset);
            if token.is_end() {
                return false;
            }
            if token.is_reserved(")") {
                return self.next_at(offset + 1).is_reserved("{");
            }
            offset += 1;
        }
    }

    /// `function '(' [params] ')' STATBLOCK`
    fn parse_lambda(&mut self) -> Parsed<&'a LambdaExpr<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }

        let mut params = BumpVec::new_in(self.arena);
        if self.next().is_reserved(")") {
            self.commit(HighlightKind::Operator);
        } else {
            loop {
                let param = self.parse_lambda_param();
                match param {
                    Some(param) => params.push(param),
                    None => return Parsed::Pending,
                }
                match self.expect_continuous_or_close(",", ")", true) {
                    ListStep::Closed => break,
                    ListStep::Continued => continue,
                    ListStep::Aborted => break,
                }
            }
        }

        let body = match self.parse_stat_block() {
            Parsed::Ok(body) => body,
            Parsed::Mismatch => {
                self.error("Expected lambda body.");
                return Parsed::Pending;
            }
            Parsed::Pending => return Parsed::Pending,
        };

        Parsed::Ok(self.alloc(LambdaExpr {
            params: params.into_bump_slice(),
            body,
            range: self.range_from(start),
        }))
    }

    fn parse_lambda_param(&mut self) -> Option<LambdaParam<'a>> {
        // A lone identifier is a name without a type.
        if self.next().is_identifier()
            && (self.next_at(1).is_reserved(",") || self.next_at(1).is_reserved(")"))
        {
            let name = self.make_ident();
            self.commit(HighlightKind::Parameter);
            return Some(LambdaParam {
                ty: None,
                name: Some(name),
            });
        }

        let ty = match self.parse_type() {
            Parsed::Ok(ty) => ty,
            _ => {
                self.error("Expected type or identifier.");
                return None;
            }
        };
        if self.next().is_reserved("&") {
            self.commit(HighlightKind::Operator);
            for mode in ["in", "out", "inout"] {
                if self.next().is_reserved(mode) {
                    self.commit(HighlightKind::Keyword);
                    break;
                }
            }
        }
        let name = if self.next().is_identifier() {
            let name = self.make_ident();
            self.commit(HighlightKind::Parameter);
            Some(name)
        } else {
            None
        };
        Some(LambdaParam { ty: Some(ty), name })
    }

    /// `'{' [elem {',' elem}] '}'` with nested lists.
    pub(crate) fn parse_init_list(&mut self) -> Parsed<&'a InitList<'a>> {
        if !self.next().is_reserved("{") {
            return Parsed::Mismatch;
        }
        let start = self.next_id();
        self.commit(HighlightKind::Operator);

        let mut elements = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                self.error("Expected '}'");
                break;
            }
            if self.next().is_reserved("}") {
                self.commit(HighlightKind::Operator);
                break;
            }
            if self.next().is_reserved(",") {
                // Empty element slot.
                self.commit(HighlightKind::Operator);
                continue;
            }
            let element = if self.next().is_reserved("{") {
                match self.parse_init_list() {
                    Parsed::Ok(list) => InitElement::List(list),
                    _ => return Parsed::Pending,
                }
            } else {
                match self.parse_assign() {
                    Parsed::Ok(assign) => InitElement::Assign(assign),
                    Parsed::Mismatch => {
                        self.error("Expected expression or initializer list.");
                        return Parsed::Pending;
                    }
                    Parsed::Pending => return Parsed::Pending,
                }
            };
            elements.push(element);
            match self.expect_continuous_or_close(",", "}", true) {
                ListStep::Closed => break,
                ListStep::Continued => continue,
                ListStep::Aborted => break,
            }
        }

        Parsed::Ok(self.alloc(InitList {
            elements: elements.into_bump_slice(),
            range: self.range_from(start),
        }))
    }

    /// `'(' [args] ')'`
    pub(crate) fn parse_arg_list(&mut self) -> Parsed<&'a ArgList<'a>> {
        self.parse_args_until("(", ")")
    }

    /// `'[' [args] ']'` — the indexer form.
    fn parse_index_args(&mut self) -> Parsed<&'a ArgList<'a>> {
        self.parse_args_until("[", "]")
    }

    fn parse_args_until(&mut self, open: &str, close: &str) -> Parsed<&'a ArgList<'a>> {
        if !self.next().is_reserved(open) {
            return Parsed::Mismatch;
        }
        let start = self.next_id();
        self.commit(HighlightKind::Operator);

        let mut args = BumpVec::new_in(self.arena);
        if self.next().is_reserved(close) {
            self.commit(HighlightKind::Operator);
        } else {
            loop {
                let name = if self.next().is_identifier() && self.next_at(1).is_reserved(":") {
                    let name = self.make_ident();
                    self.commit(HighlightKind::Parameter);
                    self.commit(HighlightKind::Operator);
                    Some(name)
                } else {
                    None
                };
                match self.parse_assign() {
                    Parsed::Ok(value) => args.push(Arg { name, value }),
                    Parsed::Mismatch => {
                        self.error("Expected expression.");
                        return Parsed::Pending;
                    }
                    Parsed::Pending => return Parsed::Pending,
                }
                match self.expect_continuous_or_close(",", close, true) {
                    ListStep::Closed => break,
                    ListStep::Continued => continue,
                    ListStep::Aborted => break,
                }
            }
        }

        Parsed::Ok(self.alloc(ArgList {
            args: args.into_bump_slice(),
            range: self.range_from(start),
        }))
    }

    // =====================================================================
    // Virtual operator synthesis
    // =====================================================================

    /// Fuse a run of right-angle tokens (and a trailing `=`) into the
    /// composite operator text and its token count.
    fn scan_right_angle(&self) -> (&'static str, usize) {
        let mut count = 1;
        while count < 3 && self.fused_with_next(count - 1) && self.next_at(count).is_reserved(">") {
            count += 1;
        }
        let with_eq = self.fused_with_next(count - 1) && self.next_at(count).is_reserved("=");
        match (count, with_eq) {
            (1, false) => (">", 1),
            (1, true) => (">=", 2),
            (2, false) => (">>", 2),
            (2, true) => (">>=", 3),
            (3, false) => (">>>", 3),
            _ => (">>>=", 4),
        }
    }

    fn op_span(&self, count: usize) -> Span {
        let mut span = self.next().span;
        for offset in 1..count {
            span = span.merge(self.next_at(offset).span);
        }
        span
    }

    /// The binary operator starting at the cursor, if any, with the
    /// number of tokens it spans.
    fn peek_expr_op(&self) -> Option<(OpToken<ExprOp>, usize)> {
        let token = self.next();
        let (text, count) = if token.is_reserved(">") {
            self.scan_right_angle()
        } else if token.is_reserved("!") && self.fused_with_next(0) && self.next_at(1).is_reserved("is")
        {
            ("!is", 2)
        } else if token.has(ReservedFlags::EXPR_OP) {
            (token.text, 1)
        } else {
            return None;
        };
        // `>>=` and `>>>=` fall through to the assignment peek.
        let op = ExprOp::from_text(text)?;
        Some((
            OpToken {
                op,
                token: self.next_id(),
                span: self.op_span(count),
            },
            count,
        ))
    }

    fn peek_assign_op(&self) -> Option<(OpToken<AssignOp>, usize)> {
        let token = self.next();
        let (text, count) = if token.is_reserved(">") {
            self.scan_right_angle()
        } else if token.has(ReservedFlags::ASSIGN_OP) {
            (token.text, 1)
        } else {
            return None;
        };
        let op = AssignOp::from_text(text)?;
        Some((
            OpToken {
                op,
                token: self.next_id(),
                span: self.op_span(count),
            },
            count,
        ))
    }

    fn consume_op_tokens(&mut self, count: usize) {
        for _ in 0..count {
            self.commit(HighlightKind::Operator);
        }
    }
}
