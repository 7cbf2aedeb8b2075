use golite_common::Span;

use super::nodes::*;

/// Constructs AST nodes with fresh expression ids.
///
/// The external parser is expected to hold one `Builder` per program so
/// that every expression gets a unique [`NodeId`]; tests use it the same
/// way. Nodes built without an explicit span get a dummy span.
#[derive(Debug, Default)]
pub struct Builder {
    next_id: NodeId,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Build an expression with an explicit span.
    pub fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr::new(self.next(), kind, span)
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::IntLit(value), Span::dummy())
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::FloatLit(value), Span::dummy())
    }

    pub fn rune(&mut self, value: char) -> Expr {
        self.expr(ExprKind::RuneLit(value), Span::dummy())
    }

    pub fn string(&mut self, value: impl Into<String>) -> Expr {
        self.expr(ExprKind::StringLit(value.into()), Span::dummy())
    }

    pub fn ident(&mut self, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Ident(name.into()), Span::dummy())
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Span::dummy(),
        )
    }

    pub fn binary(&mut self, left: Expr, op: BinaryOp, right: Expr) -> Expr {
        self.expr(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            Span::dummy(),
        )
    }

    /// A call whose callee is a plain identifier.
    pub fn call(&mut self, name: impl Into<String>, args: Vec<Expr>) -> Expr {
        let callee = self.ident(name);
        self.expr(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            Span::dummy(),
        )
    }

    pub fn cast(&mut self, target: TypeExpr, operand: Expr) -> Expr {
        self.expr(
            ExprKind::Cast {
                target,
                operand: Box::new(operand),
            },
            Span::dummy(),
        )
    }

    pub fn append(&mut self, slice: Expr, value: Expr) -> Expr {
        self.expr(
            ExprKind::Append {
                slice: Box::new(slice),
                value: Box::new(value),
            },
            Span::dummy(),
        )
    }

    pub fn field(&mut self, object: Expr, field: impl Into<String>) -> Expr {
        self.expr(
            ExprKind::Field {
                object: Box::new(object),
                field: field.into(),
            },
            Span::dummy(),
        )
    }

    pub fn index(&mut self, object: Expr, index: Expr) -> Expr {
        self.expr(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            Span::dummy(),
        )
    }

    /// An identifier token (declaration position, not an expression).
    pub fn name(&mut self, name: impl Into<String>) -> Ident {
        Ident {
            name: name.into(),
            span: Span::dummy(),
        }
    }

    pub fn blank(&mut self) -> Ident {
        self.name("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sequential() {
        let mut b = Builder::new();
        let x = b.ident("x");
        let y = b.int(1);
        let sum = b.binary(x, BinaryOp::Add, y);
        assert_eq!(sum.id, 2);
        let ids: Vec<NodeId> = match &sum.kind {
            ExprKind::Binary { left, right, .. } => vec![left.id, right.id],
            _ => unreachable!(),
        };
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn blank_ident_detection() {
        let mut b = Builder::new();
        assert!(b.blank().is_blank());
        assert!(!b.name("x").is_blank());
    }
}
