//! Semantic analysis pipeline.
//!
//! Three passes run strictly in order, each fail-fast:
//!
//! 1. [`Weeder`] rejects statically malformed trees (unreachable returns,
//!    bad statement shapes, misplaced break/continue).
//! 2. [`Resolver`] populates the global scope, deferring untyped globals.
//! 3. [`TypeChecker`] walks every body, managing its own scopes, and
//!    annotates each expression with its type.
//!
//! The first error unwinds the whole run; there is no recovery and no
//! aggregation.

pub mod resolver;
pub mod scope;
pub mod type_checker;
pub mod types;
pub mod weeder;

use golite_common::AnalysisError;

use crate::ast::Program;

pub use resolver::Resolver;
pub use scope::{Scope, ScopeKind, Symbol, SymbolKind, SymbolTable};
pub use type_checker::{TypeChecker, TypeTable};
pub use types::{Field, Type};
pub use weeder::Weeder;

/// Options threaded through an analysis run. Passed by value; there is no
/// process-wide configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisConfig {
    /// Record scope activity in the symbol table's diagnostic log.
    pub log_symbols: bool,
}

/// The product of a successful run: the symbol table (with its diagnostic
/// log) and the per-expression type annotations.
#[derive(Debug)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub types: TypeTable,
}

/// Run the weeder only. Used by the driver's `--weed-only` mode.
pub fn weed(program: &Program) -> Result<(), AnalysisError> {
    Weeder::new().weed(program)
}

/// Run the full pipeline over a program.
pub fn analyze(program: &Program, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    Weeder::new().weed(program)?;
    let mut symbols = SymbolTable::new(config.log_symbols);
    Resolver::new(&mut symbols).resolve(program)?;
    let types = TypeChecker::new(&mut symbols).check(program)?;
    Ok(Analysis { symbols, types })
}

#[cfg(test)]
mod tests {
    use golite_common::Span;

    use super::*;
    use crate::ast::{Builder, FuncDecl, Stmt, TopDecl};

    #[test]
    fn empty_program_is_valid() {
        let program = Program {
            decls: vec![],
            span: Span::dummy(),
        };
        let analysis = analyze(&program, &AnalysisConfig::default()).unwrap();
        assert!(analysis.types.is_empty());
    }

    #[test]
    fn log_is_produced_when_enabled() {
        let mut b = Builder::new();
        let call = b.call("f", vec![]);
        let program = Program {
            decls: vec![TopDecl::Func(FuncDecl {
                name: b.name("f"),
                params: vec![],
                return_type: None,
                body: vec![Stmt::Expr(call)],
                span: Span::dummy(),
            })],
            span: Span::dummy(),
        };
        let config = AnalysisConfig { log_symbols: true };
        let analysis = analyze(&program, &config).unwrap();
        let log = analysis.symbols.render_log();
        assert!(log.contains("FUNCTION\tf\tfunc()"));
        assert!(log.contains("ENTER SCOPE"));
    }
}
