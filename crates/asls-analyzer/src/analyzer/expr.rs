//! Expression analysis.
//!
//! The parser hands over flat `term (op term)*` lists; this module is
//! the authority on operator precedence. A shunting-yard pass orders
//! the flat list into postfix form, and the fold then runs the
//! binary-operator analysis over typed operands.

use super::Analyzer;
use crate::symbols::{ResolvedType, Symbol};
use asls_core::Span;
use asls_parser::ast::*;
use asls_parser::lexer::NumberKind;

/// Precedence per operator; higher binds tighter. Terms rank above
/// every operator.
fn precedence(op: ExprOp) -> i32 {
    use ExprOp::*;
    match op {
        Pow => 0,
        Mul | Div | Mod => -1,
        Add | Sub => -2,
        Shl | Shr | ShrU => -3,
        BitAnd => -4,
        BitXor => -5,
        BitOr => -6,
        Lt | Le | Gt | Ge => -7,
        Eq | Ne | Is | NotIs | Xor => -8,
        And => -9,
        Or => -10,
    }
}

const TERM_PRECEDENCE: i32 = 1;

#[derive(Clone, Copy)]
enum ShuntItem<'a> {
    Term(ExprTerm<'a>),
    Op(OpToken<ExprOp>),
}

impl ShuntItem<'_> {
    fn precedence(&self) -> i32 {
        match self {
            ShuntItem::Term(_) => TERM_PRECEDENCE,
            ShuntItem::Op(op) => precedence(op.op),
        }
    }
}

impl<'a, 'out> Analyzer<'a, 'out> {
    /// `ASSIGN ::= CONDITION [op ASSIGN]`, right-associative.
    pub(crate) fn analyze_assign(&mut self, node: &'a Assign<'a>) -> Option<ResolvedType> {
        let lhs = self.analyze_condition(node.condition);
        let Some(tail) = node.tail else {
            return lhs;
        };
        let rhs = self.analyze_assign(tail.rhs);
        self.analyze_assign_op(
            tail.op,
            (lhs, self.span_of(node.condition.range)),
            (rhs, self.span_of(tail.rhs.range)),
        )
    }

    pub(crate) fn analyze_condition(&mut self, node: &'a Condition<'a>) -> Option<ResolvedType> {
        let expr_ty = self.analyze_expr_node(node.expr);

        let Some(ternary) = node.ternary else {
            return expr_ty;
        };

        // The controlling expression must be usable as a bool.
        let bool_ty = self.builtin_type("bool");
        if !crate::conversion::can_convert(&self.symbols, &expr_ty, &bool_ty) {
            self.error(
                self.span_of(node.expr.range),
                "Condition is not convertible to bool.",
            );
        }

        let true_ty = self.analyze_assign(ternary.true_assign);
        let _false_ty = self.analyze_assign(ternary.false_assign);
        // Branch types are not joined; the true branch speaks for the
        // whole conditional.
        true_ty
    }

    /// Analyze a flat expression list under the precedence table.
    pub(crate) fn analyze_expr_node(&mut self, node: &'a Expr<'a>) -> Option<ResolvedType> {
        if node.tail.is_none() {
            return self.analyze_expr_term(&node.head);
        }

        let mut inputs = Vec::new();
        let mut cursor = node;
        loop {
            inputs.push(ShuntItem::Term(cursor.head));
            match cursor.tail {
                Some(tail) => {
                    inputs.push(ShuntItem::Op(tail.op));
                    cursor = tail.rhs;
                }
                None => break,
            }
        }

        // Shunting yard: push while tighter than the stack top,
        // otherwise pop the top to the output.
        let mut stack: Vec<ShuntItem<'a>> = Vec::new();
        let mut output: Vec<ShuntItem<'a>> = Vec::new();
        for item in inputs {
            loop {
                match stack.last() {
                    None => {
                        stack.push(item);
                        break;
                    }
                    Some(top) if item.precedence() > top.precedence() => {
                        stack.push(item);
                        break;
                    }
                    Some(_) => output.push(stack.pop().expect("stack top just observed")),
                }
            }
        }
        while let Some(item) = stack.pop() {
            output.push(item);
        }

        // Fold the postfix list: terms push operands, operators pop
        // two and push their analysis result.
        let mut operands: Vec<(Option<ResolvedType>, Span)> = Vec::new();
        for item in output {
            match item {
                ShuntItem::Term(term) => {
                    let span = self.span_of(term.range());
                    let ty = self.analyze_expr_term(&term);
                    operands.push((ty, span));
                }
                ShuntItem::Op(op) => {
                    let Some(rhs) = operands.pop() else { break };
                    let Some(lhs) = operands.pop() else { break };
                    let span = lhs.1.merge(rhs.1);
                    let result = self.analyze_binary_op(op, lhs, rhs);
                    operands.push((result, span));
                }
            }
        }
        operands.pop().and_then(|(ty, _)| ty)
    }

    fn analyze_expr_term(&mut self, term: &ExprTerm<'a>) -> Option<ResolvedType> {
        match *term {
            ExprTerm::InitList { ty, list, .. } => {
                self.analyze_init_list(list);
                ty.and_then(|t| self.analyze_type(t))
            }
            ExprTerm::Value(value) => self.analyze_value_term(value),
        }
    }

    fn analyze_value_term(&mut self, term: &'a ValueTerm<'a>) -> Option<ResolvedType> {
        let mut ty = self.analyze_expr_value(&term.value);

        for post in term.post_ops {
            ty = match *post {
                PostOp::Field { name } => self.analyze_field_access(ty, name),
                PostOp::MethodCall { name, args } => self.analyze_method_call(ty, name, args),
                PostOp::Index { args } => self.analyze_index_op(ty, term, args),
                PostOp::Call { args } => self.analyze_value_call(ty, term, args),
                // ++/-- keep the operand's numeric type.
                PostOp::IncDec { .. } => ty,
            };
        }

        // Prefix operators apply outside the postfix chain.
        for pre in term.pre_ops.iter().rev() {
            ty = match pre.op {
                PreOp::Handle => ty.map(|t| t.with_handler(true)),
                PreOp::Not => self.builtin_type("bool"),
                PreOp::Neg | PreOp::Pos | PreOp::BitNot | PreOp::Inc | PreOp::Dec => ty,
            };
        }
        ty
    }

    fn analyze_expr_value(&mut self, value: &ExprValue<'a>) -> Option<ResolvedType> {
        match *value {
            ExprValue::Void(_) => self.builtin_type("void"),
            ExprValue::Literal(literal) => self.analyze_literal(literal),
            ExprValue::VarAccess(access) => self.analyze_var_access(access),
            ExprValue::FuncCall(call) => self.analyze_func_call(call),
            ExprValue::ConstructCall(call) => self.analyze_construct_call(call),
            ExprValue::Cast(cast) => {
                let target = self.analyze_type(cast.ty);
                let _ = self.analyze_assign(cast.expr);
                target
            }
            ExprValue::Paren(inner) => self.analyze_assign(inner),
            ExprValue::Lambda(lambda) => self.analyze_lambda(lambda),
        }
    }

    fn analyze_literal(&mut self, literal: &Literal<'a>) -> Option<ResolvedType> {
        match literal.kind {
            LiteralKind::Number(NumberKind::Int) => self.builtin_type("int"),
            LiteralKind::Number(NumberKind::Float) => self.builtin_type("float"),
            LiteralKind::Number(NumberKind::Double) => self.builtin_type("double"),
            LiteralKind::Bool(_) => self.builtin_type("bool"),
            // The string type is host-registered; absent registration
            // leaves string literals untyped.
            LiteralKind::String => self
                .symbols
                .lookup_walk(self.scope, "string")
                .map(|(id, _)| ResolvedType::plain(id)),
            // Null typing is unspecified; the literal stays unknown.
            LiteralKind::Null => None,
        }
    }

    pub(crate) fn analyze_var_access(&mut self, access: &VarAccess<'a>) -> Option<ResolvedType> {
        if access.name.name == "this" && access.scope.is_none() {
            let this = self.this_type();
            if this.is_none() {
                self.error(access.name.span, "'this' is not defined.");
            }
            return this;
        }

        let found = if let Some(scope_node) = access.scope {
            let scope = self.analyze_scope(scope_node)?;
            self.symbols
                .lookup(scope, access.name.name)
                .map(|id| (id, scope))
        } else {
            self.symbols.lookup_walk(self.scope, access.name.name)
        };
        let Some((id, found_scope)) = found else {
            self.error(
                access.name.span,
                format!("'{}' is not defined.", access.name.name),
            );
            return None;
        };

        self.add_reference(access.name.token, id);
        match self.symbols.symbol(id) {
            Symbol::Variable(var) => {
                let ty = var.ty.clone();
                let highlight = if var.is_parameter {
                    asls_core::HighlightKind::Parameter
                } else if matches!(
                    self.symbols.scope(found_scope).linked_node,
                    Some(crate::symbols::LinkedNode::Enum(_))
                ) {
                    asls_core::HighlightKind::EnumMember
                } else {
                    asls_core::HighlightKind::Variable
                };
                self.reclassify(access.name.token, highlight);
                ty
            }
            Symbol::Function(_) => {
                self.reclassify(access.name.token, asls_core::HighlightKind::Function);
                // A bare function reference; the statement analysis
                // flags it if it is neither called nor taken as a
                // handler.
                Some(ResolvedType::plain(id))
            }
            Symbol::Type(_) => Some(ResolvedType::plain(id)),
        }
    }

    fn analyze_lambda(&mut self, lambda: &'a LambdaExpr<'a>) -> Option<ResolvedType> {
        let scope = self.symbols.new_scope(
            self.scope,
            None,
            Some(crate::symbols::LinkedNode::Lambda(lambda)),
        );
        self.with_scope(scope, |a| {
            for param in lambda.params {
                let ty = param.ty.and_then(|t| a.analyze_type(t));
                if let Some(name) = param.name {
                    let _ = a.symbols.insert_symbol(
                        a.scope,
                        Symbol::Variable(crate::symbols::SymbolVariable {
                            name: name.name,
                            decl_token: Some(name.token),
                            ty,
                            is_instance_member: false,
                            is_parameter: true,
                            access: Access::Public,
                        }),
                    );
                }
            }
            for statement in lambda.body.statements {
                a.analyze_statement(statement);
            }
        });
        // Return-type inference from context is not implemented; the
        // lambda value itself stays untyped.
        None
    }
}
