use golite_common::Span;

use super::types::Type;

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    TypeAlias,
}

impl SymbolKind {
    /// Label used in the diagnostic log and the symbol table dump.
    fn log_label(self) -> &'static str {
        match self {
            SymbolKind::Variable => "VARIABLE",
            SymbolKind::Function => "FUNCTION",
            SymbolKind::TypeAlias => "TYPE",
        }
    }
}

/// A declared symbol: a named program entity with a type and a defining
/// location. Identity is by name within its owning scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub defined_at: Span,
}

/// The kind of scope, recorded for inspection of popped scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Scope 0, holding the `true`/`false` builtins.
    Universe,
    Global,
    Function,
    Block,
    Loop,
}

/// A lexical scope: symbols in insertion order.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub symbols: Vec<Symbol>,
    parent: Option<usize>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|s| s.name == name)
    }
}

/// Stack of nested scopes for lexical scoping.
///
/// Scopes are stored in a flat `Vec` and linked by parent indices; `pop`
/// only moves the cursor, so popped scopes stay around (unreachable for
/// lookup, still inspectable). A side log records every push, pop, and
/// definition as a human-readable line, independent of lookup state.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: usize,
    log: Vec<String>,
    logging: bool,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SymbolTable {
    /// Create a table with the universe scope holding the boolean literal
    /// names, and the global scope on top of it. Redeclaring `true` or
    /// `false` at the top level is therefore ordinary shadowing.
    pub fn new(logging: bool) -> Self {
        let universe = Scope {
            kind: ScopeKind::Universe,
            symbols: Vec::new(),
            parent: None,
        };
        let mut table = Self {
            scopes: vec![universe],
            current: 0,
            log: vec!["(KIND\tNAME\tTYPE)".to_string(), String::new()],
            logging,
        };
        for lit in ["true", "false"] {
            table.define(Symbol {
                name: lit.to_string(),
                kind: SymbolKind::Variable,
                ty: Type::Bool,
                defined_at: Span::dummy(),
            });
        }
        table.push(ScopeKind::Global);
        table
    }

    fn log_line(&mut self, line: String) {
        if self.logging {
            self.log.push(line);
        }
    }

    /// Push a new child scope of the given kind.
    pub fn push(&mut self, kind: ScopeKind) {
        let parent = self.current;
        let idx = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            symbols: Vec::new(),
            parent: Some(parent),
        });
        self.current = idx;
        self.log_line("ENTER SCOPE".to_string());
    }

    /// Pop the current scope, returning its index (for later inspection).
    pub fn pop(&mut self) -> usize {
        let old = self.current;
        self.current = self.scopes[old].parent.expect("cannot pop universe scope");
        self.log_line("EXIT SCOPE".to_string());
        old
    }

    /// Get a scope by index (for reading after pop).
    pub fn get_scope(&self, idx: usize) -> &Scope {
        &self.scopes[idx]
    }

    /// Define a symbol in the current scope. Duplicate checking is the
    /// caller's job (via [`SymbolTable::lookup_local`]); legal shadowing
    /// and redeclaration errors are indistinguishable at this level.
    pub fn define(&mut self, symbol: Symbol) {
        self.log_line(format!(
            "{}\t{}\t{}",
            symbol.kind.log_label(),
            symbol.name,
            symbol.ty
        ));
        self.scopes[self.current].symbols.push(symbol);
    }

    /// Look up a symbol by name, walking innermost to outermost.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut idx = self.current;
        loop {
            if let Some(sym) = self.scopes[idx].get(name) {
                return Some(sym);
            }
            match self.scopes[idx].parent {
                Some(parent) => idx = parent,
                None => return None,
            }
        }
    }

    /// Look up a symbol in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].get(name)
    }

    /// Look up a symbol mutably, walking up the scope chain. Used to
    /// back-fill inferred global types.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let mut idx = self.current;
        let target_idx = loop {
            if self.scopes[idx].get(name).is_some() {
                break idx;
            }
            match self.scopes[idx].parent {
                Some(parent) => idx = parent,
                None => return None,
            }
        };
        self.scopes[target_idx]
            .symbols
            .iter_mut()
            .rev()
            .find(|s| s.name == name)
    }

    /// Replace a deferred (`ToBeInferred`) symbol type with its inferred
    /// type, logging the late definition.
    pub fn backfill(&mut self, name: &str, ty: Type) {
        let line = self
            .lookup(name)
            .map(|sym| format!("{}\t{}\t{}", sym.kind.log_label(), sym.name, ty));
        if let Some(sym) = self.lookup_mut(name) {
            sym.ty = ty;
        }
        if let Some(line) = line {
            self.log_line(line);
        }
    }

    /// Symbols of the current scope, in insertion order.
    pub fn current_symbols(&self) -> &[Symbol] {
        &self.scopes[self.current].symbols
    }

    /// Render the diagnostic log as text (for the `.symtab` dump).
    pub fn render_log(&self) -> String {
        let mut out = self.log.join("\n");
        out.push('\n');
        out
    }
}
