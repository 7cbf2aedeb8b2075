use std::collections::BTreeMap;
use std::collections::HashMap;

use golite_common::{AnalysisError, Span};

use crate::ast::*;

use super::resolver::{resolve_params, resolve_type_expr};
use super::scope::{ScopeKind, Symbol, SymbolKind, SymbolTable};
use super::types::Type;

type Result<T> = std::result::Result<T, AnalysisError>;

/// Per-expression type annotations, keyed by [`NodeId`].
///
/// Append-only while checking runs; read-only afterwards. Later stages
/// (and the `--dump-types` driver flag) consume it.
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, id: NodeId, ty: Type) -> Type {
        self.entries.insert(id, ty.clone());
        ty
    }

    /// The annotations as rendered type names, ordered by node id.
    pub fn to_display_map(&self) -> BTreeMap<NodeId, String> {
        self.entries
            .iter()
            .map(|(id, ty)| (*id, ty.to_string()))
            .collect()
    }
}

/// The type checking pass.
///
/// Consumes the resolver's global scope and walks declaration bodies,
/// opening and closing scopes as it goes. Globals are checked before any
/// function body so that inferred global types are back-filled by the time
/// they can be referenced.
pub struct TypeChecker<'a> {
    table: &'a mut SymbolTable,
    types: TypeTable,
    /// Return type of the enclosing function, `Void` at top level.
    current_return: Type,
}

impl<'a> TypeChecker<'a> {
    pub fn new(table: &'a mut SymbolTable) -> Self {
        Self {
            table,
            types: TypeTable::default(),
            current_return: Type::Void,
        }
    }

    pub fn check(mut self, program: &Program) -> Result<TypeTable> {
        // Global initializers first: after this sub-pass no symbol in the
        // global scope is left ToBeInferred.
        for decl in &program.decls {
            if let TopDecl::Var(d) = decl {
                self.check_global_var_decl(d)?;
            }
        }
        for decl in &program.decls {
            if let TopDecl::Func(f) = decl {
                self.check_func(f)?;
            }
        }
        Ok(self.types)
    }

    fn check_global_var_decl(&mut self, decl: &VarDecl) -> Result<()> {
        for spec in &decl.specs {
            if spec.values.is_empty() {
                continue;
            }
            for (name, value) in spec.names.iter().zip(&spec.values) {
                let value_ty = self.check_value(value)?;
                if name.is_blank() {
                    continue;
                }
                match spec.declared {
                    Some(_) => {
                        // Symbol already carries the declared type.
                        let declared = self.table.lookup(&name.name).map(|s| s.ty.clone());
                        if let Some(declared) = declared {
                            if declared != value_ty {
                                return Err(mismatch(&value_ty, &declared, value.span));
                            }
                        }
                    }
                    None => self.table.backfill(&name.name, value_ty),
                }
            }
        }
        Ok(())
    }

    fn check_func(&mut self, func: &FuncDecl) -> Result<()> {
        self.table.push(ScopeKind::Function);
        for (name, ty) in resolve_params(self.table, &func.params)? {
            if name.is_blank() {
                continue;
            }
            if self.table.lookup_local(&name.name).is_some() {
                return Err(AnalysisError::symbol(
                    format!("{} redeclared in this block", name.name),
                    name.span,
                ));
            }
            self.table.define(Symbol {
                name: name.name.clone(),
                kind: SymbolKind::Variable,
                ty,
                defined_at: name.span,
            });
        }
        self.current_return = match &func.return_type {
            Some(ty) => resolve_type_expr(self.table, ty)?,
            None => Type::Void,
        };
        self.check_stmts(&func.body)?;
        self.current_return = Type::Void;
        self.table.pop();
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn check_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Empty(_) | Stmt::Break(_) | Stmt::Continue(_) => Ok(()),

            Stmt::Expr(expr) => {
                self.check_expr(expr)?;
                Ok(())
            }

            Stmt::ShortDecl {
                targets, values, ..
            } => self.check_short_decl(targets, values),

            Stmt::Var(decl) => self.check_local_var_decl(decl),

            Stmt::Type(decl) => self.check_local_type_decl(decl),

            Stmt::Assign { lhs, rhs, .. } => {
                for (target, value) in lhs.iter().zip(rhs) {
                    let value_ty = self.check_value(value)?;
                    if matches!(&target.kind, ExprKind::Ident(name) if name == "_") {
                        continue;
                    }
                    let target_ty = self.check_expr(target)?;
                    if target_ty != value_ty {
                        return Err(mismatch(&value_ty, &target_ty, value.span));
                    }
                }
                Ok(())
            }

            Stmt::IncDec { target, span, .. } => {
                let ty = self.check_expr(target)?;
                if !matches!(ty.underlying(), Type::Int | Type::Float64) {
                    return Err(AnalysisError::type_error(
                        format!("invalid operation on {}", ty),
                        *span,
                    ));
                }
                Ok(())
            }

            Stmt::Print { args, .. } => {
                for arg in args {
                    self.check_value(arg)?;
                }
                Ok(())
            }

            Stmt::Return { value, span } => match value {
                Some(expr) => {
                    if self.current_return == Type::Void {
                        return Err(AnalysisError::type_error(
                            "too many return values",
                            *span,
                        ));
                    }
                    let ty = self.check_value(expr)?;
                    if ty != self.current_return {
                        return Err(mismatch(&ty, &self.current_return.clone(), expr.span));
                    }
                    Ok(())
                }
                None => {
                    if self.current_return != Type::Void {
                        return Err(AnalysisError::type_error("not enough return values", *span));
                    }
                    Ok(())
                }
            },

            Stmt::Block { stmts, .. } => {
                self.table.push(ScopeKind::Block);
                self.check_stmts(stmts)?;
                self.table.pop();
                Ok(())
            }

            Stmt::If {
                init,
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.table.push(ScopeKind::Block);
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                self.check_condition(cond)?;
                self.table.push(ScopeKind::Block);
                self.check_stmts(then_block)?;
                self.table.pop();
                if let Some(else_block) = else_block {
                    self.table.push(ScopeKind::Block);
                    self.check_stmts(else_block)?;
                    self.table.pop();
                }
                self.table.pop();
                Ok(())
            }

            Stmt::Switch {
                init,
                subject,
                cases,
                ..
            } => {
                self.table.push(ScopeKind::Block);
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                let subject_ty = match subject {
                    Some(expr) => self.check_value(expr)?,
                    None => Type::Bool,
                };
                for case in cases {
                    if let Some(ref guards) = case.guards {
                        for guard in guards {
                            let guard_ty = self.check_value(guard)?;
                            if !guard_ty.compatible(&subject_ty) {
                                return Err(mismatch(&guard_ty, &subject_ty, guard.span));
                            }
                        }
                    }
                    self.table.push(ScopeKind::Block);
                    self.check_stmts(&case.stmts)?;
                    self.table.pop();
                }
                self.table.pop();
                Ok(())
            }

            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.table.push(ScopeKind::Loop);
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.check_condition(cond)?;
                }
                if let Some(post) = post {
                    self.check_stmt(post)?;
                }
                self.table.push(ScopeKind::Block);
                self.check_stmts(body)?;
                self.table.pop();
                self.table.pop();
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) -> Result<()> {
        let ty = self.check_value(cond)?;
        if ty.underlying() != Type::Bool {
            return Err(AnalysisError::type_error(
                format!("non-bool condition (type {})", ty),
                cond.span,
            ));
        }
        Ok(())
    }

    fn check_short_decl(&mut self, targets: &[Ident], values: &[Expr]) -> Result<()> {
        for (target, value) in targets.iter().zip(values) {
            let value_ty = self.check_value(value)?;
            if target.is_blank() {
                continue;
            }
            match self.table.lookup_local(&target.name) {
                // Redeclaration in the same scope re-checks by identity.
                Some(existing) => {
                    let existing_ty = existing.ty.clone();
                    if existing_ty != value_ty {
                        return Err(mismatch(&value_ty, &existing_ty, value.span));
                    }
                }
                None => self.table.define(Symbol {
                    name: target.name.clone(),
                    kind: SymbolKind::Variable,
                    ty: value_ty,
                    defined_at: target.span,
                }),
            }
        }
        Ok(())
    }

    fn check_local_var_decl(&mut self, decl: &VarDecl) -> Result<()> {
        for spec in &decl.specs {
            let declared = match &spec.declared {
                Some(ty) => Some(resolve_type_expr(self.table, ty)?),
                None => None,
            };
            for (i, name) in spec.names.iter().enumerate() {
                let value_ty = match spec.values.get(i) {
                    Some(value) => Some(self.check_value(value)?),
                    None => None,
                };
                if name.is_blank() {
                    continue;
                }
                let ty = match (&declared, value_ty) {
                    (Some(declared), Some(value_ty)) => {
                        if *declared != value_ty {
                            return Err(mismatch(&value_ty, declared, spec.values[i].span));
                        }
                        declared.clone()
                    }
                    (Some(declared), None) => declared.clone(),
                    (None, Some(value_ty)) => value_ty,
                    (None, None) => {
                        return Err(AnalysisError::symbol(
                            format!("cannot infer type of {}", name.name),
                            name.span,
                        ))
                    }
                };
                if self.table.lookup_local(&name.name).is_some() {
                    return Err(AnalysisError::symbol(
                        format!("{} redeclared in this block", name.name),
                        name.span,
                    ));
                }
                self.table.define(Symbol {
                    name: name.name.clone(),
                    kind: SymbolKind::Variable,
                    ty,
                    defined_at: name.span,
                });
            }
        }
        Ok(())
    }

    fn check_local_type_decl(&mut self, decl: &TypeDecl) -> Result<()> {
        for spec in &decl.specs {
            if spec.name.is_blank() {
                continue;
            }
            if self.table.lookup_local(&spec.name.name).is_some() {
                return Err(AnalysisError::symbol(
                    format!("{} redeclared in this block", spec.name.name),
                    spec.name.span,
                ));
            }
            let target = resolve_type_expr(self.table, &spec.ty)?;
            self.table.define(Symbol {
                name: spec.name.name.clone(),
                kind: SymbolKind::TypeAlias,
                ty: Type::Alias(spec.name.name.clone(), Box::new(target)),
                defined_at: spec.name.span,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Check an expression used for its value: the result must be an actual
    /// value type, never `Void`.
    fn check_value(&mut self, expr: &Expr) -> Result<Type> {
        let ty = self.check_expr(expr)?;
        if ty == Type::Void {
            return Err(AnalysisError::type_error(
                "void cannot be used as a value",
                expr.span,
            ));
        }
        Ok(ty)
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<Type> {
        let ty = self.infer_expr(expr)?;
        Ok(self.types.record(expr.id, ty))
    }

    fn infer_expr(&mut self, expr: &Expr) -> Result<Type> {
        match &expr.kind {
            ExprKind::IntLit(_) => Ok(Type::Int),
            ExprKind::FloatLit(_) => Ok(Type::Float64),
            ExprKind::RuneLit(_) => Ok(Type::Rune),
            ExprKind::StringLit(_) => Ok(Type::String),

            ExprKind::Ident(name) => {
                if name == "_" {
                    return Err(AnalysisError::type_error(
                        "cannot use _ as a value",
                        expr.span,
                    ));
                }
                let sym = self.table.lookup(name).ok_or_else(|| {
                    AnalysisError::symbol(format!("undefined: {}", name), expr.span)
                })?;
                match sym.kind {
                    SymbolKind::Variable => match &sym.ty {
                        Type::ToBeInferred => Err(AnalysisError::type_error(
                            format!("{} used before its type is inferred", name),
                            expr.span,
                        )),
                        ty => Ok(ty.clone()),
                    },
                    SymbolKind::Function => Err(AnalysisError::type_error(
                        format!("{} is a function, not a value", name),
                        expr.span,
                    )),
                    SymbolKind::TypeAlias => Err(AnalysisError::type_error(
                        format!("{} is a type, not a value", name),
                        expr.span,
                    )),
                }
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.check_value(operand)?;
                let ok = match op {
                    UnaryOp::Pos | UnaryOp::Neg => {
                        matches!(ty.underlying(), Type::Int | Type::Float64)
                    }
                    UnaryOp::Not => ty.underlying() == Type::Bool,
                    UnaryOp::BitComp => ty.underlying() == Type::Int,
                };
                if !ok {
                    return Err(AnalysisError::type_error(
                        format!("invalid operation: {}{}", op.symbol(), ty),
                        expr.span,
                    ));
                }
                Ok(ty)
            }

            ExprKind::Binary { left, op, right } => {
                let l = self.check_value(left)?;
                let r = self.check_value(right)?;
                self.check_binary(*op, l, r, expr.span)
            }

            ExprKind::Call { callee, args } => self.check_call(callee, args, expr.span),

            ExprKind::Cast { target, operand } => {
                let target_ty = resolve_type_expr(self.table, target)?;
                let operand_ty = self.check_value(operand)?;
                self.check_conversion(&target_ty, &operand_ty, expr.span)?;
                Ok(target_ty)
            }

            ExprKind::Append { slice, value } => {
                let slice_ty = self.check_value(slice)?;
                let elem = match slice_ty.resolve_alias() {
                    Type::Slice(elem) => elem.as_ref().clone(),
                    _ => {
                        return Err(AnalysisError::type_error(
                            format!("first argument to append must be a slice, not {}", slice_ty),
                            slice.span,
                        ))
                    }
                };
                let value_ty = self.check_value(value)?;
                if !value_ty.compatible(&elem) {
                    return Err(mismatch(&value_ty, &elem, value.span));
                }
                Ok(slice_ty)
            }

            ExprKind::Field { object, field } => {
                let object_ty = self.check_value(object)?;
                let fields = match object_ty.resolve_alias() {
                    Type::Struct(fields) => fields,
                    _ => {
                        return Err(AnalysisError::type_error(
                            format!("type {} has no fields", object_ty),
                            expr.span,
                        ))
                    }
                };
                fields
                    .iter()
                    .find(|f| f.name == *field)
                    .map(|f| f.ty.clone())
                    .ok_or_else(|| {
                        AnalysisError::type_error(
                            format!("type {} has no field {}", object_ty, field),
                            expr.span,
                        )
                    })
            }

            ExprKind::Index { object, index } => {
                let object_ty = self.check_value(object)?;
                let elem = match object_ty.resolve_alias() {
                    Type::Array(elem, _) | Type::Slice(elem) => elem.as_ref().clone(),
                    _ => {
                        return Err(AnalysisError::type_error(
                            format!("type {} does not support indexing", object_ty),
                            expr.span,
                        ))
                    }
                };
                let index_ty = self.check_value(index)?;
                if index_ty.underlying() != Type::Int {
                    return Err(AnalysisError::type_error(
                        format!("non-integer index (type {})", index_ty),
                        index.span,
                    ));
                }
                Ok(elem)
            }
        }
    }

    fn check_binary(&mut self, op: BinaryOp, l: Type, r: Type, span: Span) -> Result<Type> {
        use BinaryOp::*;

        let msg = format!("invalid operation: {} {} {}", l, op.symbol(), r);
        let invalid = move || AnalysisError::type_error(msg.clone(), span);

        if !l.compatible(&r) {
            return Err(invalid());
        }

        match op {
            // Arithmetic yields the left operand's type; names survive.
            Add => match l.underlying() {
                Type::Int | Type::Float64 | Type::String => Ok(l),
                _ => Err(invalid()),
            },
            Sub | Mul | Div => match l.underlying() {
                Type::Int | Type::Float64 => Ok(l),
                _ => Err(invalid()),
            },
            Mod | BitAnd | BitOr | BitXor | BitClear | Shl | Shr => match l.underlying() {
                Type::Int => Ok(l),
                _ => Err(invalid()),
            },
            Eq | Neq => {
                if l == Type::Void || l.contains_slice() {
                    return Err(invalid());
                }
                Ok(Type::Bool)
            }
            Lt | Lte | Gt | Gte => match l.underlying() {
                Type::Int | Type::Float64 | Type::String | Type::Rune => Ok(Type::Bool),
                _ => Err(invalid()),
            },
            And | Or => {
                if l.underlying() != Type::Bool {
                    return Err(invalid());
                }
                Ok(Type::Bool)
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Result<Type> {
        let name = match &callee.kind {
            ExprKind::Ident(name) => name.clone(),
            _ => {
                return Err(AnalysisError::type_error(
                    "called expression is not a function",
                    callee.span,
                ))
            }
        };
        let sym = self
            .table
            .lookup(&name)
            .ok_or_else(|| AnalysisError::symbol(format!("undefined: {}", name), callee.span))?;

        match sym.kind {
            SymbolKind::Function => {
                let (params, ret) = match &sym.ty {
                    Type::Function { params, ret } => (params.clone(), ret.as_ref().clone()),
                    other => {
                        return Err(AnalysisError::type_error(
                            format!("{} has non-function type {}", name, other),
                            callee.span,
                        ))
                    }
                };
                if args.len() != params.len() {
                    return Err(AnalysisError::type_error(
                        format!(
                            "{} takes {} argument(s), {} given",
                            name,
                            params.len(),
                            args.len()
                        ),
                        span,
                    ));
                }
                for (arg, param) in args.iter().zip(&params) {
                    let arg_ty = self.check_value(arg)?;
                    if !arg_ty.compatible(param) {
                        return Err(mismatch(&arg_ty, param, arg.span));
                    }
                }
                Ok(ret)
            }

            // A call whose callee names a type alias is a conversion.
            SymbolKind::TypeAlias => {
                let target = sym.ty.clone();
                if args.len() != 1 {
                    return Err(AnalysisError::type_error(
                        format!("conversion to {} takes exactly one argument", name),
                        span,
                    ));
                }
                let operand_ty = self.check_value(&args[0])?;
                self.check_conversion(&target, &operand_ty, span)?;
                Ok(target)
            }

            SymbolKind::Variable => Err(AnalysisError::type_error(
                format!("{} is not a function", name),
                callee.span,
            )),
        }
    }

    /// Conversions connect the castable primitives only.
    fn check_conversion(&self, target: &Type, operand: &Type, span: Span) -> Result<()> {
        let castable =
            |ty: &Type| matches!(ty.underlying(), Type::Bool | Type::Int | Type::Float64 | Type::Rune);
        if !castable(target) || !castable(operand) {
            return Err(AnalysisError::type_error(
                format!("cannot convert {} to {}", operand, target),
                span,
            ));
        }
        Ok(())
    }
}

fn mismatch(found: &Type, expected: &Type, span: Span) -> AnalysisError {
    AnalysisError::type_error(
        format!("cannot use type {} as type {}", found, expected),
        span,
    )
}
