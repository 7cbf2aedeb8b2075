use golite_common::{AnalysisError, Span};

use crate::ast::*;

type Result<T> = std::result::Result<T, AnalysisError>;

/// Static well-formedness pass.
///
/// Enforces the rules the grammar cannot express but that need no scope or
/// type information: return-path reachability, statement shape rules,
/// loop-context rules, and literal-only array bounds. Fail-fast: the first
/// violation aborts the pass with a positioned `WeedError`.
pub struct Weeder {
    /// Loop nesting depth; break/continue are legal only when > 0.
    loop_depth: usize,
}

impl Default for Weeder {
    fn default() -> Self {
        Self::new()
    }
}

impl Weeder {
    pub fn new() -> Self {
        Self { loop_depth: 0 }
    }

    /// Run all weeding rules over the program.
    pub fn weed(mut self, program: &Program) -> Result<()> {
        for decl in &program.decls {
            match decl {
                TopDecl::Var(d) => self.weed_var_decl(d)?,
                TopDecl::Type(d) => self.weed_type_decl(d)?,
                TopDecl::Func(f) => self.weed_func(f)?,
            }
        }
        Ok(())
    }

    fn weed_func(&mut self, func: &FuncDecl) -> Result<()> {
        for group in &func.params {
            self.weed_type_expr(&group.ty)?;
        }
        if let Some(ref ret) = func.return_type {
            self.weed_type_expr(ret)?;
            // Non-void functions must return on every execution path.
            check_terminates(func.span, &func.body)?;
        }
        self.weed_stmts(&func.body)
    }

    fn weed_var_decl(&mut self, decl: &VarDecl) -> Result<()> {
        for spec in &decl.specs {
            if !spec.values.is_empty() && spec.names.len() != spec.values.len() {
                return Err(AnalysisError::weed(
                    format!(
                        "assignment count mismatch: {} = {}",
                        spec.names.len(),
                        spec.values.len()
                    ),
                    spec.span,
                ));
            }
            if let Some(ref declared) = spec.declared {
                self.weed_type_expr(declared)?;
            }
            for value in &spec.values {
                self.weed_expr(value)?;
            }
        }
        Ok(())
    }

    fn weed_type_decl(&mut self, decl: &TypeDecl) -> Result<()> {
        for spec in &decl.specs {
            self.weed_type_expr(&spec.ty)?;
        }
        Ok(())
    }

    fn weed_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.weed_stmt(stmt)?;
        }
        Ok(())
    }

    fn weed_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Empty(_) => Ok(()),

            Stmt::Expr(expr) => {
                if !matches!(expr.kind, ExprKind::Call { .. }) {
                    return Err(AnalysisError::weed("evaluated but not used", expr.span));
                }
                self.weed_expr(expr)
            }

            Stmt::ShortDecl {
                targets,
                values,
                span,
            } => {
                if !values.is_empty() && targets.len() != values.len() {
                    return Err(AnalysisError::weed(
                        format!(
                            "assignment count mismatch: {} := {}",
                            targets.len(),
                            values.len()
                        ),
                        *span,
                    ));
                }
                if targets.len() == 1 && targets[0].is_blank() {
                    return Err(AnalysisError::weed(
                        "no new variables declared on the left side of :=",
                        *span,
                    ));
                }
                for value in values {
                    self.weed_expr(value)?;
                }
                Ok(())
            }

            Stmt::Var(decl) => self.weed_var_decl(decl),
            Stmt::Type(decl) => self.weed_type_decl(decl),

            Stmt::Assign { lhs, rhs, span } => {
                // No zero-expression exception for plain assignment.
                if lhs.len() != rhs.len() {
                    return Err(AnalysisError::weed(
                        "L.H.S. and R.H.S. of assignment don't match",
                        *span,
                    ));
                }
                // The blank identifier is an Ident, so it passes as a place.
                for target in lhs {
                    if !target.is_place() {
                        return Err(AnalysisError::weed(
                            "cannot assign to expression",
                            target.span,
                        ));
                    }
                }
                for expr in lhs.iter().chain(rhs) {
                    self.weed_expr(expr)?;
                }
                Ok(())
            }

            Stmt::IncDec { target, span, .. } => {
                if !target.is_place() {
                    return Err(AnalysisError::weed("cannot assign to expression", *span));
                }
                self.weed_expr(target)
            }

            Stmt::Print { args, .. } => {
                for arg in args {
                    self.weed_expr(arg)?;
                }
                Ok(())
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => self.weed_expr(expr),
                None => Ok(()),
            },

            Stmt::Block { stmts, .. } => self.weed_stmts(stmts),

            Stmt::If {
                init,
                cond,
                then_block,
                else_block,
                ..
            } => {
                if let Some(init) = init {
                    self.weed_stmt(init)?;
                }
                self.weed_expr(cond)?;
                self.weed_stmts(then_block)?;
                match else_block {
                    Some(stmts) => self.weed_stmts(stmts),
                    None => Ok(()),
                }
            }

            Stmt::Switch {
                init,
                subject,
                cases,
                ..
            } => {
                if let Some(init) = init {
                    self.weed_stmt(init)?;
                }
                if let Some(subject) = subject {
                    self.weed_expr(subject)?;
                }
                let mut has_default = false;
                for case in cases {
                    if case.is_default() {
                        if has_default {
                            return Err(AnalysisError::weed(
                                "switch statement contains multiple default cases",
                                case.span,
                            ));
                        }
                        has_default = true;
                    }
                    if let Some(ref guards) = case.guards {
                        for guard in guards {
                            self.weed_expr(guard)?;
                        }
                    }
                    self.weed_stmts(&case.stmts)?;
                }
                Ok(())
            }

            Stmt::For {
                init,
                cond,
                post,
                body,
                span,
            } => {
                if let Some(init) = init {
                    self.weed_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.weed_expr(cond)?;
                }
                if let Some(post) = post {
                    if matches!(**post, Stmt::ShortDecl { .. }) {
                        return Err(AnalysisError::weed(
                            "cannot declare in the for-increment",
                            *span,
                        ));
                    }
                    self.weed_stmt(post)?;
                }
                self.loop_depth += 1;
                let result = self.weed_stmts(body);
                self.loop_depth -= 1;
                result
            }

            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    return Err(AnalysisError::weed("break outside loop", *span));
                }
                Ok(())
            }

            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    return Err(AnalysisError::weed("continue outside loop", *span));
                }
                Ok(())
            }
        }
    }

    fn weed_expr(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::RuneLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::Ident(_) => Ok(()),

            ExprKind::Unary { operand, .. } => self.weed_expr(operand),

            ExprKind::Binary { left, right, .. } => {
                self.weed_expr(left)?;
                self.weed_expr(right)
            }

            ExprKind::Call { callee, args } => {
                self.weed_expr(callee)?;
                for arg in args {
                    self.weed_expr(arg)?;
                }
                Ok(())
            }

            ExprKind::Cast { target, operand } => {
                if matches!(target.kind, TypeExprKind::String) {
                    return Err(AnalysisError::weed("cannot cast to type string", expr.span));
                }
                self.weed_type_expr(target)?;
                self.weed_expr(operand)
            }

            ExprKind::Append { slice, value } => {
                self.weed_expr(slice)?;
                self.weed_expr(value)
            }

            ExprKind::Field { object, .. } => {
                if !object.is_place() && !matches!(object.kind, ExprKind::Call { .. }) {
                    return Err(AnalysisError::weed(
                        "invalid field access operation",
                        expr.span,
                    ));
                }
                self.weed_expr(object)
            }

            ExprKind::Index { object, index } => {
                if !object.is_place() && !matches!(object.kind, ExprKind::Call { .. }) {
                    return Err(AnalysisError::weed(
                        "invalid index access operation",
                        expr.span,
                    ));
                }
                self.weed_expr(object)?;
                self.weed_expr(index)
            }
        }
    }

    fn weed_type_expr(&mut self, ty: &TypeExpr) -> Result<()> {
        match &ty.kind {
            TypeExprKind::Bool
            | TypeExprKind::Int
            | TypeExprKind::Float64
            | TypeExprKind::Rune
            | TypeExprKind::String
            | TypeExprKind::Named(_) => Ok(()),

            TypeExprKind::Array { bound, elem } => {
                // Only a literal bound can be resolved to a concrete value
                // during symbol construction.
                if !matches!(bound.kind, ExprKind::IntLit(_)) {
                    return Err(AnalysisError::weed("non-integer array bound", ty.span));
                }
                self.weed_type_expr(elem)
            }

            TypeExprKind::Slice(elem) => self.weed_type_expr(elem),

            TypeExprKind::Struct(fields) => {
                for field in fields {
                    self.weed_type_expr(&field.ty)?;
                }
                Ok(())
            }
        }
    }
}

/// Check that a statement list guarantees a return on every execution
/// path, recursively. The list must be non-empty and its last statement
/// must be "returnable": a return, or a block/if-else/switch/for that
/// itself satisfies the property.
fn check_terminates(span: Span, stmts: &[Stmt]) -> Result<()> {
    let last = stmts
        .last()
        .ok_or_else(|| AnalysisError::weed("missing return", span))?;

    match last {
        Stmt::Return { .. } => Ok(()),

        Stmt::Block { stmts, span } => check_terminates(*span, stmts),

        Stmt::If {
            then_block,
            else_block: Some(else_block),
            span,
            ..
        } => {
            // Both branches must independently guarantee a return.
            check_terminates(*span, then_block)?;
            check_terminates(*span, else_block)
        }

        Stmt::Switch { cases, span, .. } => {
            let mut has_default = false;
            for case in cases {
                check_terminates(case.span, &case.stmts)?;
                if case.is_default() {
                    has_default = true;
                }
            }
            if !has_default {
                return Err(AnalysisError::weed("missing return", *span));
            }
            Ok(())
        }

        // An unconditional loop with no escape never falls through.
        Stmt::For {
            cond: None, body, span, ..
        } => {
            if contains_break(body) {
                return Err(AnalysisError::weed("missing return", *span));
            }
            Ok(())
        }

        other => Err(AnalysisError::weed(
            "missing return at end of function",
            other.span(),
        )),
    }
}

/// Whether a statement list contains a break statement anywhere, including
/// inside nested loops and switches.
fn contains_break(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Break(_) => true,
        Stmt::Block { stmts, .. } => contains_break(stmts),
        Stmt::If {
            then_block,
            else_block,
            ..
        } => {
            contains_break(then_block)
                || else_block.as_deref().map(contains_break).unwrap_or(false)
        }
        Stmt::Switch { cases, .. } => cases.iter().any(|c| contains_break(&c.stmts)),
        Stmt::For { body, .. } => contains_break(body),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use golite_common::{ErrorKind, Span};

    use super::*;
    use crate::ast::Builder;

    fn weed_program(decls: Vec<TopDecl>) -> Result<()> {
        Weeder::new().weed(&Program {
            decls,
            span: Span::dummy(),
        })
    }

    fn func(b: &mut Builder, ret: Option<TypeExpr>, body: Vec<Stmt>) -> TopDecl {
        TopDecl::Func(FuncDecl {
            name: b.name("f"),
            params: vec![],
            return_type: ret,
            body,
            span: Span::dummy(),
        })
    }

    fn ret(b: &mut Builder, value: i64) -> Stmt {
        Stmt::Return {
            value: Some(b.int(value)),
            span: Span::dummy(),
        }
    }

    fn assert_weed_err(result: Result<()>, fragment: &str) {
        let err = result.expect_err("expected a weed error");
        assert_eq!(err.kind(), ErrorKind::Weed);
        assert!(
            err.message().contains(fragment),
            "expected {:?} in {:?}",
            fragment,
            err.message()
        );
    }

    #[test]
    fn if_without_else_cannot_guarantee_return() {
        let mut b = Builder::new();
        let cond = b.ident("true");
        let then = vec![ret(&mut b, 1)];
        let body = vec![Stmt::If {
            init: None,
            cond,
            then_block: then,
            else_block: None,
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert_weed_err(weed_program(vec![decl]), "missing return");
    }

    #[test]
    fn if_else_with_both_returns_passes() {
        let mut b = Builder::new();
        let cond = b.ident("true");
        let then = vec![ret(&mut b, 1)];
        let els = vec![ret(&mut b, 2)];
        let body = vec![Stmt::If {
            init: None,
            cond,
            then_block: then,
            else_block: Some(els),
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn empty_body_of_nonvoid_function_fails() {
        let mut b = Builder::new();
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), vec![]);
        assert_weed_err(weed_program(vec![decl]), "missing return");
    }

    #[test]
    fn void_function_needs_no_return() {
        let mut b = Builder::new();
        let call = b.call("g", vec![]);
        let decl = func(&mut b, None, vec![Stmt::Expr(call)]);
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn switch_requires_default_and_all_cases_returning() {
        let mut b = Builder::new();
        let subject = b.ident("x");
        let guard = b.int(1);
        let case_ret = ret(&mut b, 1);
        let cases = vec![CaseClause {
            guards: Some(vec![guard]),
            stmts: vec![case_ret],
            span: Span::dummy(),
        }];
        let body = vec![Stmt::Switch {
            init: None,
            subject: Some(subject),
            cases,
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert_weed_err(weed_program(vec![decl]), "missing return");
    }

    #[test]
    fn unconditional_loop_without_break_terminates() {
        let mut b = Builder::new();
        let call = b.call("g", vec![]);
        let body = vec![Stmt::For {
            init: None,
            cond: None,
            post: None,
            body: vec![Stmt::Expr(call)],
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn unconditional_loop_with_nested_break_fails() {
        let mut b = Builder::new();
        let cond = b.ident("true");
        let inner_if = Stmt::If {
            init: None,
            cond,
            then_block: vec![Stmt::Break(Span::dummy())],
            else_block: None,
            span: Span::dummy(),
        };
        let body = vec![Stmt::For {
            init: None,
            cond: None,
            post: None,
            body: vec![inner_if],
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert_weed_err(weed_program(vec![decl]), "missing return");
    }

    #[test]
    fn conditional_loop_is_not_returnable() {
        let mut b = Builder::new();
        let cond = b.ident("true");
        let body = vec![Stmt::For {
            init: None,
            cond: Some(cond),
            post: None,
            body: vec![],
            span: Span::dummy(),
        }];
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), body);
        assert_weed_err(weed_program(vec![decl]), "missing return");
    }

    #[test]
    fn bare_expression_statement_rejected() {
        let mut b = Builder::new();
        let x = b.ident("x");
        let y = b.int(1);
        let sum = b.binary(x, BinaryOp::Add, y);
        let decl = func(&mut b, None, vec![Stmt::Expr(sum)]);
        assert_weed_err(weed_program(vec![decl]), "evaluated but not used");
    }

    #[test]
    fn append_statement_rejected() {
        let mut b = Builder::new();
        let s = b.ident("s");
        let v = b.int(1);
        let app = b.append(s, v);
        let decl = func(&mut b, None, vec![Stmt::Expr(app)]);
        assert_weed_err(weed_program(vec![decl]), "evaluated but not used");
    }

    #[test]
    fn short_decl_count_mismatch() {
        let mut b = Builder::new();
        let targets = vec![b.name("a"), b.name("b")];
        let values = vec![b.int(1)];
        let stmt = Stmt::ShortDecl {
            targets,
            values,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "count mismatch");
    }

    #[test]
    fn sole_blank_short_decl_rejected() {
        let mut b = Builder::new();
        let targets = vec![b.blank()];
        let values = vec![b.int(5)];
        let stmt = Stmt::ShortDecl {
            targets,
            values,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "no new variables");
    }

    #[test]
    fn var_decl_without_values_passes() {
        let mut b = Builder::new();
        let spec = VarSpec {
            names: vec![b.name("a"), b.name("b")],
            declared: Some(TypeExpr::int(Span::dummy())),
            values: vec![],
            span: Span::dummy(),
        };
        let decl = TopDecl::Var(VarDecl {
            specs: vec![spec],
            span: Span::dummy(),
        });
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn assignment_counts_must_match_exactly() {
        let mut b = Builder::new();
        let lhs = vec![b.ident("a"), b.ident("b")];
        let rhs = vec![b.int(1)];
        let stmt = Stmt::Assign {
            lhs,
            rhs,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "don't match");
    }

    #[test]
    fn assignment_to_literal_rejected() {
        let mut b = Builder::new();
        let lhs = vec![b.int(1)];
        let rhs = vec![b.int(2)];
        let stmt = Stmt::Assign {
            lhs,
            rhs,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "cannot assign");
    }

    #[test]
    fn assignment_to_blank_allowed() {
        let mut b = Builder::new();
        let lhs = vec![b.ident("_")];
        let rhs = vec![b.int(2)];
        let stmt = Stmt::Assign {
            lhs,
            rhs,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn increment_of_call_rejected() {
        let mut b = Builder::new();
        let call = b.call("g", vec![]);
        let stmt = Stmt::IncDec {
            target: call,
            is_decrement: false,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "cannot assign");
    }

    #[test]
    fn break_outside_loop_rejected() {
        let mut b = Builder::new();
        let decl = func(&mut b, None, vec![Stmt::Break(Span::dummy())]);
        assert_weed_err(weed_program(vec![decl]), "break outside loop");
    }

    #[test]
    fn continue_inside_loop_allowed() {
        let mut b = Builder::new();
        let cond = b.ident("true");
        let stmt = Stmt::For {
            init: None,
            cond: Some(cond),
            post: None,
            body: vec![Stmt::Continue(Span::dummy())],
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert!(weed_program(vec![decl]).is_ok());
    }

    #[test]
    fn for_post_short_decl_rejected() {
        let mut b = Builder::new();
        let targets = vec![b.name("i")];
        let values = vec![b.int(0)];
        let post = Stmt::ShortDecl {
            targets,
            values,
            span: Span::dummy(),
        };
        let stmt = Stmt::For {
            init: None,
            cond: None,
            post: Some(Box::new(post)),
            body: vec![],
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "for-increment");
    }

    #[test]
    fn multiple_default_cases_rejected() {
        let mut b = Builder::new();
        let subject = b.ident("x");
        let cases = vec![
            CaseClause {
                guards: None,
                stmts: vec![],
                span: Span::dummy(),
            },
            CaseClause {
                guards: None,
                stmts: vec![],
                span: Span::dummy(),
            },
        ];
        let stmt = Stmt::Switch {
            init: None,
            subject: Some(subject),
            cases,
            span: Span::dummy(),
        };
        let decl = func(&mut b, None, vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "multiple default cases");
    }

    #[test]
    fn variable_array_bound_rejected() {
        let mut b = Builder::new();
        let bound = b.ident("n");
        let ty = TypeExpr::array(bound, TypeExpr::int(Span::dummy()), Span::dummy());
        let spec = VarSpec {
            names: vec![b.name("a")],
            declared: Some(ty),
            values: vec![],
            span: Span::dummy(),
        };
        let decl = TopDecl::Var(VarDecl {
            specs: vec![spec],
            span: Span::dummy(),
        });
        assert_weed_err(weed_program(vec![decl]), "non-integer array bound");
    }

    #[test]
    fn cast_to_string_rejected() {
        let mut b = Builder::new();
        let x = b.ident("x");
        let cast = b.cast(TypeExpr::string(Span::dummy()), x);
        let stmt = Stmt::Return {
            value: Some(cast),
            span: Span::dummy(),
        };
        let decl = func(&mut b, Some(TypeExpr::string(Span::dummy())), vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "cannot cast to type string");
    }

    #[test]
    fn field_access_on_literal_rejected() {
        let mut b = Builder::new();
        let lit = b.int(5);
        let access = b.field(lit, "f");
        let stmt = Stmt::Return {
            value: Some(access),
            span: Span::dummy(),
        };
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), vec![stmt]);
        assert_weed_err(weed_program(vec![decl]), "invalid field access");
    }

    #[test]
    fn index_on_call_result_allowed() {
        let mut b = Builder::new();
        let call = b.call("g", vec![]);
        let zero = b.int(0);
        let idx = b.index(call, zero);
        let stmt = Stmt::Return {
            value: Some(idx),
            span: Span::dummy(),
        };
        let decl = func(&mut b, Some(TypeExpr::int(Span::dummy())), vec![stmt]);
        assert!(weed_program(vec![decl]).is_ok());
    }
}
