use std::collections::HashSet;

use golite_common::AnalysisError;

use crate::ast::*;

use super::scope::{Symbol, SymbolKind, SymbolTable};
use super::types::{Field, Type};

type Result<T> = std::result::Result<T, AnalysisError>;

/// Resolve a syntactic type expression to a semantic [`Type`] against the
/// current state of the symbol table. Named references must already be
/// visible, so aliases resolve eagerly in source order and forward or
/// cyclic references surface as unresolved names.
pub fn resolve_type_expr(table: &SymbolTable, ty: &TypeExpr) -> Result<Type> {
    match &ty.kind {
        TypeExprKind::Bool => Ok(Type::Bool),
        TypeExprKind::Int => Ok(Type::Int),
        TypeExprKind::Float64 => Ok(Type::Float64),
        TypeExprKind::Rune => Ok(Type::Rune),
        TypeExprKind::String => Ok(Type::String),

        TypeExprKind::Named(name) => {
            let sym = table.lookup(name).ok_or_else(|| {
                AnalysisError::symbol(format!("undefined type {}", name), ty.span)
            })?;
            if sym.kind != SymbolKind::TypeAlias {
                return Err(AnalysisError::symbol(
                    format!("{} is not a type", name),
                    ty.span,
                ));
            }
            Ok(sym.ty.clone())
        }

        TypeExprKind::Array { bound, elem } => {
            let len = match bound.kind {
                ExprKind::IntLit(n) if n >= 0 => n as usize,
                ExprKind::IntLit(_) => {
                    return Err(AnalysisError::symbol("negative array bound", bound.span))
                }
                // The weeder rejects non-literal bounds before this pass.
                _ => return Err(AnalysisError::symbol("non-integer array bound", bound.span)),
            };
            let elem = resolve_type_expr(table, elem)?;
            Ok(Type::Array(Box::new(elem), len))
        }

        TypeExprKind::Slice(elem) => {
            let elem = resolve_type_expr(table, elem)?;
            Ok(Type::Slice(Box::new(elem)))
        }

        TypeExprKind::Struct(specs) => {
            let mut fields = Vec::new();
            let mut seen = HashSet::new();
            for spec in specs {
                let field_ty = resolve_type_expr(table, &spec.ty)?;
                for name in &spec.names {
                    if name.is_blank() {
                        continue;
                    }
                    if !seen.insert(name.name.clone()) {
                        return Err(AnalysisError::symbol(
                            format!("duplicate struct field {}", name.name),
                            name.span,
                        ));
                    }
                    fields.push(Field {
                        name: name.name.clone(),
                        ty: field_ty.clone(),
                    });
                }
            }
            Ok(Type::Struct(fields))
        }
    }
}

/// Resolve a grouped parameter list to (name, type) pairs in declared
/// order, blanks included (the checker skips them when defining).
pub fn resolve_params(table: &SymbolTable, groups: &[ParamGroup]) -> Result<Vec<(Ident, Type)>> {
    let mut params = Vec::new();
    for group in groups {
        let ty = resolve_type_expr(table, &group.ty)?;
        for name in &group.names {
            params.push((name.clone(), ty.clone()));
        }
    }
    Ok(params)
}

/// Populates the global scope from the top-level declarations.
///
/// Walks declarations in source order; variables without an explicit type
/// are deferred with [`Type::ToBeInferred`] and back-filled by the type
/// checker once their initializers have been checked. Function bodies are
/// not entered here; the checker opens those scopes itself.
pub struct Resolver<'a> {
    table: &'a mut SymbolTable,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a mut SymbolTable) -> Self {
        Self { table }
    }

    pub fn resolve(mut self, program: &Program) -> Result<()> {
        for decl in &program.decls {
            match decl {
                TopDecl::Var(d) => self.resolve_var_decl(d)?,
                TopDecl::Type(d) => self.resolve_type_decl(d)?,
                TopDecl::Func(f) => self.resolve_func(f)?,
            }
        }
        Ok(())
    }

    fn check_duplicate(&self, name: &Ident) -> Result<()> {
        if self.table.lookup_local(&name.name).is_some() {
            return Err(AnalysisError::symbol(
                format!("{} redeclared in this block", name.name),
                name.span,
            ));
        }
        Ok(())
    }

    fn resolve_type_decl(&mut self, decl: &TypeDecl) -> Result<()> {
        for spec in &decl.specs {
            if spec.name.is_blank() {
                continue;
            }
            self.check_duplicate(&spec.name)?;
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

    fn resolve_func(&mut self, func: &FuncDecl) -> Result<()> {
        self.check_duplicate(&func.name)?;
        let params = resolve_params(self.table, &func.params)?
            .into_iter()
            .map(|(_, ty)| ty)
            .collect();
        let ret = match &func.return_type {
            Some(ty) => resolve_type_expr(self.table, ty)?,
            None => Type::Void,
        };
        self.table.define(Symbol {
            name: func.name.name.clone(),
            kind: SymbolKind::Function,
            ty: Type::Function {
                params,
                ret: Box::new(ret),
            },
            defined_at: func.name.span,
        });
        Ok(())
    }

    fn resolve_var_decl(&mut self, decl: &VarDecl) -> Result<()> {
        for spec in &decl.specs {
            if spec.declared.is_none() && spec.values.is_empty() {
                return Err(AnalysisError::symbol(
                    "variable declaration needs a type or an initializer",
                    spec.span,
                ));
            }
            let declared = match &spec.declared {
                Some(ty) => Some(resolve_type_expr(self.table, ty)?),
                None => None,
            };
            for name in &spec.names {
                if name.is_blank() {
                    continue;
                }
                self.check_duplicate(name)?;
                self.table.define(Symbol {
                    name: name.name.clone(),
                    kind: SymbolKind::Variable,
                    ty: declared.clone().unwrap_or(Type::ToBeInferred),
                    defined_at: name.span,
                });
            }
        }
        Ok(())
    }
}
