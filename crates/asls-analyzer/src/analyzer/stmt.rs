//! Statement and control-flow analysis.

use super::{Analyzer, VarRegister};
use crate::conversion::can_convert;
use crate::symbols::{LinkedNode, ResolvedType, ScopeId, Symbol};
use asls_parser::ast::*;

impl<'a, 'out> Analyzer<'a, 'out> {
    pub(crate) fn analyze_statement(&mut self, statement: &'a Statement<'a>) {
        match *statement {
            Statement::Block(block) => {
                let scope = self.anonymous_scope();
                self.with_scope(scope, |a| a.analyze_block_contents(block));
            }
            Statement::Var(var) => self.analyze_var_decl(var, VarRegister::Declare),
            Statement::Expr(stat) => self.analyze_expr_stat(stat),
            Statement::If(stat) => self.analyze_if(stat),
            Statement::For(stat) => self.analyze_for(stat),
            Statement::While(stat) => self.analyze_while(stat),
            Statement::DoWhile(stat) => self.analyze_do_while(stat),
            Statement::Switch(stat) => self.analyze_switch(stat),
            Statement::Try(stat) => self.analyze_try(stat),
            Statement::Return(stat) => self.analyze_return(stat),
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    fn analyze_block_contents(&mut self, block: &'a StatBlock<'a>) {
        for statement in block.statements {
            self.analyze_statement(statement);
        }
    }

    fn anonymous_scope(&mut self) -> ScopeId {
        self.symbols
            .new_scope(self.scope, None, Some(LinkedNode::Block))
    }

    fn analyze_expr_stat(&mut self, stat: &'a ExprStat<'a>) {
        let Some(assign) = stat.expr else {
            return;
        };
        let ty = self.analyze_assign(assign);

        // A function name that was neither called nor taken with '@'
        // is almost certainly a missing call.
        if let Some(resolved) = ty {
            if !resolved.is_handler
                && matches!(self.symbols.symbol(resolved.symbol), Symbol::Function(_))
            {
                self.error(self.span_of(stat.range), "Function call without handler.");
            }
        }
    }

    /// The controlling expression of if/while/do-while must be
    /// convertible to bool.
    fn check_bool_condition(&mut self, condition: &'a Assign<'a>) {
        let ty = self.analyze_assign(condition);
        let bool_ty = self.builtin_type("bool");
        if !can_convert(&self.symbols, &ty, &bool_ty) {
            self.error(
                self.span_of(condition.range),
                "Condition is not convertible to bool.",
            );
        }
    }

    fn analyze_if(&mut self, stat: &'a IfStat<'a>) {
        self.check_bool_condition(stat.condition);
        if let Some(then_branch) = stat.then_branch {
            self.analyze_statement(then_branch);
        }
        if let Some(else_branch) = stat.else_branch {
            self.analyze_statement(else_branch);
        }
    }

    fn analyze_for(&mut self, stat: &'a ForStat<'a>) {
        let scope = self.anonymous_scope();
        self.with_scope(scope, |a| {
            match stat.init {
                Some(ForInit::Var(var)) => a.analyze_var_decl(var, VarRegister::Declare),
                Some(ForInit::Expr(expr_stat)) => a.analyze_expr_stat(expr_stat),
                None => {}
            }
            if let Some(condition) = stat.condition {
                let _ = a.analyze_assign(condition);
            }
            for increment in stat.increments {
                let _ = a.analyze_assign(increment);
            }
            if let Some(body) = stat.body {
                a.analyze_statement(body);
            }
        });
    }

    fn analyze_while(&mut self, stat: &'a WhileStat<'a>) {
        let scope = self.anonymous_scope();
        self.with_scope(scope, |a| {
            a.check_bool_condition(stat.condition);
            if let Some(body) = stat.body {
                a.analyze_statement(body);
            }
        });
    }

    fn analyze_do_while(&mut self, stat: &'a DoWhileStat<'a>) {
        let scope = self.anonymous_scope();
        self.with_scope(scope, |a| {
            if let Some(body) = stat.body {
                a.analyze_statement(body);
            }
            if let Some(condition) = stat.condition {
                a.check_bool_condition(condition);
            }
        });
    }

    fn analyze_switch(&mut self, stat: &'a SwitchStat<'a>) {
        let _ = self.analyze_assign(stat.condition);
        let scope = self.anonymous_scope();
        self.with_scope(scope, |a| {
            for case in stat.cases {
                if let Some(label) = case.label {
                    let _ = a.analyze_expr_node(label);
                }
                for statement in case.statements {
                    a.analyze_statement(statement);
                }
            }
        });
    }

    fn analyze_try(&mut self, stat: &'a TryStat<'a>) {
        let try_scope = self.anonymous_scope();
        self.with_scope(try_scope, |a| a.analyze_block_contents(stat.try_block));
        if let Some(catch_block) = stat.catch_block {
            let catch_scope = self.anonymous_scope();
            self.with_scope(catch_scope, |a| a.analyze_block_contents(catch_block));
        }
    }

    /// Match a return statement against the enclosing function-like
    /// scope: a function's declared return, a getter's property type,
    /// a setter's nothing, or a lambda's anything.
    fn analyze_return(&mut self, stat: &'a ReturnStat<'a>) {
        let value_ty = stat.value.map(|value| self.analyze_assign(value));

        let Some(function_scope) = self.symbols.enclosing_scope(self.scope, |node| {
            matches!(
                node,
                LinkedNode::Func(_) | LinkedNode::VirtualProp(_) | LinkedNode::Lambda(_)
            )
        }) else {
            self.error(self.span_of(stat.range), "'return' is not allowed here.");
            return;
        };

        match self.symbols.scope(function_scope).linked_node {
            Some(LinkedNode::Func(func)) => match func.head {
                FuncHead::Constructor | FuncHead::Destructor => {
                    if stat.value.is_some() {
                        self.error(
                            self.span_of(stat.range),
                            "A void function cannot return a value.",
                        );
                    }
                }
                FuncHead::Returns { return_type, .. } => {
                    if return_type.is_void() {
                        if stat.value.is_some() {
                            self.error(
                                self.span_of(stat.range),
                                "A void function cannot return a value.",
                            );
                        }
                        return;
                    }
                    match value_ty {
                        None => self.error(
                            self.span_of(stat.range),
                            "The function must return a value.",
                        ),
                        Some(value_ty) => {
                            let expected = self.quietly(|a| {
                                a.with_scope(function_scope, |a| a.analyze_type(return_type))
                            });
                            if !can_convert(&self.symbols, &value_ty, &expected) {
                                let span = stat
                                    .value
                                    .map(|v| self.span_of(v.range))
                                    .unwrap_or_else(|| self.span_of(stat.range));
                                self.error(span, "Type mismatch.");
                            }
                        }
                    }
                }
            },
            Some(LinkedNode::VirtualProp(prop)) => {
                let is_getter = self
                    .symbols
                    .scope(function_scope)
                    .key
                    .as_deref()
                    .is_some_and(|key| key.starts_with("get_"));
                if is_getter {
                    let expected = self.property_type(function_scope, prop);
                    match value_ty {
                        None => self.error(
                            self.span_of(stat.range),
                            "The function must return a value.",
                        ),
                        Some(value_ty) => {
                            if !can_convert(&self.symbols, &value_ty, &expected) {
                                let span = stat
                                    .value
                                    .map(|v| self.span_of(v.range))
                                    .unwrap_or_else(|| self.span_of(stat.range));
                                self.error(span, "Type mismatch.");
                            }
                        }
                    }
                } else if stat.value.is_some() {
                    self.error(
                        self.span_of(stat.range),
                        "A void function cannot return a value.",
                    );
                }
            }
            // No return-type inference for lambdas.
            Some(LinkedNode::Lambda(_)) => {}
            _ => {}
        }
    }

    /// The declared type of the property a getter belongs to.
    fn property_type(
        &self,
        accessor_scope: ScopeId,
        prop: &'a VirtualPropDecl<'a>,
    ) -> Option<ResolvedType> {
        let declaring = self.symbols.scope(accessor_scope).parent?;
        let id = self.symbols.lookup(declaring, prop.name.name)?;
        self.symbols.symbol(id).as_variable().and_then(|v| v.ty.clone())
    }
}
