//! Statement grammar.

use super::parsed::Parsed;
use super::state::ParserState;
use crate::ast::*;
use asls_core::HighlightKind;
use bumpalo::collections::Vec as BumpVec;

impl<'a, 'out> ParserState<'a, 'out> {
    /// `'{' {VAR|STATEMENT} '}'`.
    ///
    /// Recovers inside the braces by diagnosing and stepping one
    /// token, so the loop always makes progress.
    pub(crate) fn parse_stat_block(&mut self) -> Parsed<&'a StatBlock<'a>> {
        if !self.next().is_reserved("{") {
            return Parsed::Mismatch;
        }
        let start = self.next_id();
        self.commit(HighlightKind::Operator);

        let mut statements = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                self.error("Expected '}'");
                break;
            }
            if self.next().is_reserved("}") {
                self.commit(HighlightKind::Operator);
                break;
            }
            match self.parse_var() {
                Parsed::Ok(var) => {
                    statements.push(Statement::Var(var));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_statement() {
                Parsed::Ok(statement) => statements.push(statement),
                Parsed::Pending => {}
                Parsed::Mismatch => {
                    self.error("Expected a statement.");
                    self.step();
                }
            }
        }

        Parsed::Ok(self.alloc(StatBlock {
            statements: statements.into_bump_slice(),
            range: self.range_from(start),
        }))
    }

    pub(crate) fn parse_statement(&mut self) -> Parsed<Statement<'a>> {
        let token = self.next();
        if token.is_reserved("{") {
            return self.parse_stat_block().map(Statement::Block);
        }
        if token.is_reserved("if") {
            return self.parse_if().map(Statement::If);
        }
        if token.is_reserved("for") {
            return self.parse_for().map(Statement::For);
        }
        if token.is_reserved("while") {
            return self.parse_while().map(Statement::While);
        }
        if token.is_reserved("do") {
            return self.parse_do_while().map(Statement::DoWhile);
        }
        if token.is_reserved("switch") {
            return self.parse_switch().map(Statement::Switch);
        }
        if token.is_reserved("try") {
            return self.parse_try().map(Statement::Try);
        }
        if token.is_reserved("return") {
            return self.parse_return().map(Statement::Return);
        }
        if token.is_reserved("break") {
            let start = self.next_id();
            self.commit(HighlightKind::Keyword);
            self.expect(";", HighlightKind::Operator);
            return Parsed::Ok(Statement::Break(self.range_from(start)));
        }
        if token.is_reserved("continue") {
            let start = self.next_id();
            self.commit(HighlightKind::Keyword);
            self.expect(";", HighlightKind::Operator);
            return Parsed::Ok(Statement::Continue(self.range_from(start)));
        }
        self.parse_expr_stat().map(Statement::Expr)
    }

    /// `[ASSIGN] ';'`
    fn parse_expr_stat(&mut self) -> Parsed<&'a ExprStat<'a>> {
        let start = self.next_id();
        if self.next().is_reserved(";") {
            self.commit(HighlightKind::Operator);
            return Parsed::Ok(self.alloc(ExprStat {
                expr: None,
                range: self.range_from(start),
            }));
        }
        let expr = match self.parse_assign() {
            Parsed::Ok(expr) => expr,
            Parsed::Mismatch => return Parsed::Mismatch,
            Parsed::Pending => return Parsed::Pending,
        };
        self.expect(";", HighlightKind::Operator);
        Parsed::Ok(self.alloc(ExprStat {
            expr: Some(expr),
            range: self.range_from(start),
        }))
    }

    fn parse_if(&mut self) -> Parsed<&'a IfStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let condition = match self.parse_assign() {
            Parsed::Ok(condition) => condition,
            Parsed::Mismatch => {
                self.error("Expected expression.");
                return Parsed::Pending;
            }
            Parsed::Pending => return Parsed::Pending,
        };
        self.expect(")", HighlightKind::Operator);

        let then_branch = self.parse_branch_body();
        let else_branch = if self.next().is_reserved("else") {
            self.commit(HighlightKind::Keyword);
            self.parse_branch_body()
        } else {
            None
        };

        Parsed::Ok(self.alloc(IfStat {
            condition,
            then_branch,
            else_branch,
            range: self.range_from(start),
        }))
    }

    /// A loop or branch body; a failed body keeps the construct.
    fn parse_branch_body(&mut self) -> Option<&'a Statement<'a>> {
        match self.parse_statement() {
            Parsed::Ok(statement) => Some(self.alloc(statement)),
            Parsed::Pending => None,
            Parsed::Mismatch => {
                self.error("Expected a statement.");
                None
            }
        }
    }

    /// `'for' '(' (VAR|EXPRSTAT) EXPRSTAT [ASSIGN {',' ASSIGN}] ')' STATEMENT`
    fn parse_for(&mut self) -> Parsed<&'a ForStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }

        let init = match self.parse_var() {
            Parsed::Ok(var) => Some(ForInit::Var(var)),
            Parsed::Pending => None,
            Parsed::Mismatch => match self.parse_expr_stat() {
                Parsed::Ok(stat) => Some(ForInit::Expr(stat)),
                Parsed::Mismatch => {
                    self.error("Expected initializer statement.");
                    None
                }
                Parsed::Pending => None,
            },
        };

        let condition = match self.parse_expr_stat() {
            Parsed::Ok(stat) => stat.expr,
            _ => {
                self.error("Expected condition statement.");
                None
            }
        };

        let mut increments = BumpVec::new_in(self.arena);
        if !self.next().is_reserved(")") {
            loop {
                match self.parse_assign() {
                    Parsed::Ok(assign) => increments.push(assign),
                    Parsed::Mismatch => {
                        self.error("Expected expression.");
                        break;
                    }
                    Parsed::Pending => break,
                }
                if self.next().is_reserved(",") {
                    self.commit(HighlightKind::Operator);
                    continue;
                }
                break;
            }
        }
        self.expect(")", HighlightKind::Operator);

        let body = self.parse_branch_body();
        Parsed::Ok(self.alloc(ForStat {
            init,
            condition,
            increments: increments.into_bump_slice(),
            body,
            range: self.range_from(start),
        }))
    }

    fn parse_while(&mut self) -> Parsed<&'a WhileStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let condition = match self.parse_assign() {
            Parsed::Ok(condition) => condition,
            Parsed::Mismatch => {
                self.error("Expected expression.");
                return Parsed::Pending;
            }
            Parsed::Pending => return Parsed::Pending,
        };
        self.expect(")", HighlightKind::Operator);
        let body = self.parse_branch_body();
        Parsed::Ok(self.alloc(WhileStat {
            condition,
            body,
            range: self.range_from(start),
        }))
    }

    /// `'do' STATEMENT 'while' '(' ASSIGN ')' ';'`
    fn parse_do_while(&mut self) -> Parsed<&'a DoWhileStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        let body = self.parse_branch_body();

        if !self.next().is_reserved("while") {
            self.error("Expected 'while'");
            return Parsed::Ok(self.alloc(DoWhileStat {
                body,
                condition: None,
                range: self.range_from(start),
            }));
        }
        self.commit(HighlightKind::Keyword);

        let mut condition = None;
        if self.expect("(", HighlightKind::Operator) {
            match self.parse_assign() {
                Parsed::Ok(assign) => condition = Some(assign),
                Parsed::Mismatch => self.error("Expected expression."),
                Parsed::Pending => {}
            }
            self.expect(")", HighlightKind::Operator);
        }
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(DoWhileStat {
            body,
            condition,
            range: self.range_from(start),
        }))
    }

    /// `'switch' '(' ASSIGN ')' '{' {CASE} '}'`
    fn parse_switch(&mut self) -> Parsed<&'a SwitchStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        if !self.expect("(", HighlightKind::Operator) {
            return Parsed::Pending;
        }
        let condition = match self.parse_assign() {
            Parsed::Ok(condition) => condition,
            Parsed::Mismatch => {
                self.error("Expected expression.");
                return Parsed::Pending;
            }
            Parsed::Pending => return Parsed::Pending,
        };
        self.expect(")", HighlightKind::Operator);
        if !self.expect("{", HighlightKind::Operator) {
            return Parsed::Pending;
        }

        let mut cases = BumpVec::new_in(self.arena);
        loop {
            if self.is_end() {
                self.error("Expected '}'");
                break;
            }
            if self.next().is_reserved("}") {
                self.commit(HighlightKind::Operator);
                break;
            }
            match self.parse_case() {
                Parsed::Ok(case) => cases.push(case),
                Parsed::Pending => {}
                Parsed::Mismatch => {
                    self.error("Expected 'case' or 'default'");
                    self.step();
                }
            }
        }

        Parsed::Ok(self.alloc(SwitchStat {
            condition,
            cases: cases.into_bump_slice(),
            range: self.range_from(start),
        }))
    }

    /// `('case' EXPR | 'default') ':' {STATEMENT}`
    ///
    /// Statements are absorbed until one mismatches, i.e. until the
    /// next token starts a sibling case or closes the switch.
    fn parse_case(&mut self) -> Parsed<CaseClause<'a>> {
        let start = self.next_id();
        let label = if self.next().is_reserved("case") {
            self.commit(HighlightKind::Keyword);
            match self.parse_expr() {
                Parsed::Ok(expr) => Some(expr),
                Parsed::Mismatch => {
                    self.error("Expected expression.");
                    return Parsed::Pending;
                }
                Parsed::Pending => return Parsed::Pending,
            }
        } else if self.next().is_reserved("default") {
            self.commit(HighlightKind::Keyword);
            None
        } else {
            return Parsed::Mismatch;
        };
        self.expect(":", HighlightKind::Operator);

        let mut statements = BumpVec::new_in(self.arena);
        loop {
            if self.is_end()
                || self.next().is_reserved("case")
                || self.next().is_reserved("default")
                || self.next().is_reserved("}")
            {
                break;
            }
            match self.parse_var() {
                Parsed::Ok(var) => {
                    statements.push(Statement::Var(var));
                    continue;
                }
                Parsed::Pending => continue,
                Parsed::Mismatch => {}
            }
            match self.parse_statement() {
                Parsed::Ok(statement) => statements.push(statement),
                Parsed::Pending => {}
                Parsed::Mismatch => break,
            }
        }

        Parsed::Ok(CaseClause {
            label,
            statements: statements.into_bump_slice(),
            range: self.range_from(start),
        })
    }

    /// `'try' STATBLOCK 'catch' STATBLOCK`
    fn parse_try(&mut self) -> Parsed<&'a TryStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);
        let try_block = match self.parse_stat_block() {
            Parsed::Ok(block) => block,
            _ => {
                self.error("Expected block after 'try'");
                return Parsed::Pending;
            }
        };

        let mut catch_block = None;
        if self.next().is_reserved("catch") {
            self.commit(HighlightKind::Keyword);
            match self.parse_stat_block() {
                Parsed::Ok(block) => catch_block = Some(block),
                _ => self.error("Expected block after 'catch'"),
            }
        } else {
            self.error("Expected 'catch'");
        }

        Parsed::Ok(self.alloc(TryStat {
            try_block,
            catch_block,
            range: self.range_from(start),
        }))
    }

    /// `'return' [ASSIGN] ';'`
    fn parse_return(&mut self) -> Parsed<&'a ReturnStat<'a>> {
        let start = self.next_id();
        self.commit(HighlightKind::Keyword);

        let mut value = None;
        if !self.next().is_reserved(";") {
            match self.parse_assign() {
                Parsed::Ok(assign) => value = Some(assign),
                Parsed::Mismatch => self.error("Expected expression or ';'"),
                Parsed::Pending => {}
            }
        }
        self.expect(";", HighlightKind::Operator);

        Parsed::Ok(self.alloc(ReturnStat {
            value,
            range: self.range_from(start),
        }))
    }
}
