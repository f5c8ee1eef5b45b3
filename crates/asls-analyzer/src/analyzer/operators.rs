//! Binary and assignment operator analysis.
//!
//! Numeric primitives are computed directly; anything else is
//! reinterpreted as an operator-alias method call on the left
//! operand's type, or on the right operand's type under the `_r`
//! reflected alias when the left side is a primitive. Operators guard
//! against unknown operands and stay silent about them.

use super::calls::CallSite;
use super::Analyzer;
use crate::conversion::{can_convert, numeric_common};
use crate::symbols::ResolvedType;
use asls_core::Span;
use asls_parser::ast::{AssignOp, ExprOp, OpToken};

/// The alias method pair (direct, reflected) for a math or bitwise
/// operator.
fn math_alias(op: ExprOp) -> (&'static str, &'static str) {
    use ExprOp::*;
    match op {
        Add => ("opAdd", "opAdd_r"),
        Sub => ("opSub", "opSub_r"),
        Mul => ("opMul", "opMul_r"),
        Div => ("opDiv", "opDiv_r"),
        Mod => ("opMod", "opMod_r"),
        Pow => ("opPow", "opPow_r"),
        BitAnd => ("opAnd", "opAnd_r"),
        BitOr => ("opOr", "opOr_r"),
        BitXor => ("opXor", "opXor_r"),
        Shl => ("opShl", "opShl_r"),
        Shr => ("opShr", "opShr_r"),
        ShrU => ("opShrU", "opShrU_r"),
        _ => unreachable!("only math and bitwise operators alias here"),
    }
}

/// The alias for a compound assignment.
fn assign_alias(op: AssignOp) -> &'static str {
    use AssignOp::*;
    match op {
        Assign => "opAssign",
        AddAssign => "opAddAssign",
        SubAssign => "opSubAssign",
        MulAssign => "opMulAssign",
        DivAssign => "opDivAssign",
        ModAssign => "opModAssign",
        PowAssign => "opPowAssign",
        AndAssign => "opAndAssign",
        OrAssign => "opOrAssign",
        XorAssign => "opXorAssign",
        ShlAssign => "opShlAssign",
        ShrAssign => "opShrAssign",
        ShrUAssign => "opShrUAssign",
    }
}

type Operand = (Option<ResolvedType>, Span);

impl<'a, 'out> Analyzer<'a, 'out> {
    /// Analyze `lhs op rhs` after the shunting-yard pass.
    pub(crate) fn analyze_binary_op(
        &mut self,
        op: OpToken<ExprOp>,
        lhs: Operand,
        rhs: Operand,
    ) -> Option<ResolvedType> {
        // Logical operators force both sides to bool.
        if op.op.is_logic() {
            let bool_ty = self.builtin_type("bool");
            for operand in [&lhs, &rhs] {
                if !can_convert(&self.symbols, &operand.0, &bool_ty) {
                    self.error(operand.1, "Operand is not convertible to bool.");
                }
            }
            return bool_ty;
        }

        // Handle identity needs no types at all.
        if matches!(op.op, ExprOp::Is | ExprOp::NotIs) {
            return self.builtin_type("bool");
        }

        let (Some(left), Some(right)) = (lhs.0.clone(), rhs.0.clone()) else {
            return None;
        };
        let left_num = self.is_number(&left);
        let right_num = self.is_number(&right);

        if op.op.is_math() || op.op.is_bitwise() {
            if left_num && right_num {
                return Some(numeric_common(&self.symbols, &left, &right));
            }
            let (direct, reflected) = math_alias(op.op);
            if self.is_user_object(&left) {
                return self.operator_alias_call(&left, direct, op, rhs);
            }
            if left_num && self.is_user_object(&right) {
                return self.operator_alias_call(&right, reflected, op, lhs);
            }
            self.report_undefined_operator(op, &left);
            return None;
        }

        debug_assert!(op.op.is_comparison());
        if left_num && right_num {
            return self.builtin_type("bool");
        }
        // Same-type or mutually convertible non-object operands
        // compare directly (bool == bool, enum == int).
        if !self.is_user_object(&left) && !self.is_user_object(&right) {
            if left.symbol == right.symbol
                || can_convert(&self.symbols, &lhs.0, &rhs.0)
                || can_convert(&self.symbols, &rhs.0, &lhs.0)
            {
                return self.builtin_type("bool");
            }
            self.report_undefined_operator(op, &left);
            return None;
        }
        let alias = match op.op {
            ExprOp::Eq | ExprOp::Ne => "opEquals",
            _ => "opCmp",
        };
        // At least one side is a user object here; equality is
        // symmetric and ordering uses the object side's opCmp.
        let resolved = if self.is_user_object(&left) {
            self.operator_alias_call(&left, alias, op, rhs)
        } else {
            self.operator_alias_call(&right, alias, op, lhs)
        };
        // Comparisons yield bool regardless of the alias signature.
        resolved.and_then(|_| self.builtin_type("bool"))
    }

    /// Analyze `lhs op= rhs`.
    pub(crate) fn analyze_assign_op(
        &mut self,
        op: OpToken<AssignOp>,
        lhs: Operand,
        rhs: Operand,
    ) -> Option<ResolvedType> {
        let (Some(left), Some(_)) = (lhs.0.clone(), rhs.0.clone()) else {
            return lhs.0;
        };

        if self.is_number(&left) && rhs.0.as_ref().is_some_and(|r| self.is_number(r)) {
            return Some(left);
        }
        if op.op == AssignOp::Assign && can_convert(&self.symbols, &rhs.0, &lhs.0) {
            return Some(left);
        }

        if self.is_user_object(&left) {
            let alias = assign_alias(op.op);
            return self.operator_alias_call(&left, alias, op, rhs);
        }

        self.error(lhs.1.merge(rhs.1), "Type mismatch.");
        Some(left)
    }

    /// Rewrite an operator application to an alias method call on
    /// `target`, passing the other operand as the only argument.
    fn operator_alias_call<T>(
        &mut self,
        target: &ResolvedType,
        alias: &'static str,
        op: OpToken<T>,
        other: Operand,
    ) -> Option<ResolvedType> {
        let Some(found) = self.find_member_function(target, alias) else {
            self.error(
                op.span,
                format!(
                    "Operator {} of '{}' is not defined.",
                    alias,
                    self.type_name(target)
                ),
            );
            return None;
        };
        let site = CallSite {
            name: alias,
            name_token: op.token,
            span: op.span,
            arg_types: vec![other.0],
            arg_spans: vec![other.1],
        };
        let translate = target.translate.clone();
        self.check_function_match(&site, found, translate, None)
    }

    fn report_undefined_operator(&mut self, op: OpToken<ExprOp>, left: &ResolvedType) {
        let message = format!(
            "Operator {} of '{}' is not defined.",
            op.op,
            self.type_name(left)
        );
        self.error(op.span, message);
    }

    /// A function member of the target's type, if it has one.
    fn find_member_function(
        &self,
        target: &ResolvedType,
        name: &str,
    ) -> Option<crate::symbols::SymbolId> {
        let members = self
            .symbols
            .symbol(target.symbol)
            .as_type()?
            .members_scope?;
        let id = self.symbols.lookup(members, name)?;
        self.symbols.symbol(id).as_function().map(|_| id)
    }
}
