//! Construction API for AST nodes.
//!
//! Parsers and tests build nodes through `AstBuilder` so every node gets a
//! fresh `NodeId` and a location in the builder's file.

use std::sync::Arc;

use crate::ast::{
    BinaryOp, BindingDecl, BindingKind, DeclKind, Declaration, ExprKind, Expression, Statement,
    StmtKind, TypeExpr, Witness,
};
use crate::{NodeId, SourceLocation};

/// Issues node ids and source locations for one file.
pub struct AstBuilder {
    file: Arc<str>,
    line: u32,
    next_id: u32,
}

impl AstBuilder {
    /// Create a builder for `file`, starting at line 1.
    pub fn new(file: &str) -> Self {
        AstBuilder {
            file: Arc::from(file),
            line: 1,
            next_id: 0,
        }
    }

    /// Subsequent nodes are placed at `line`.
    pub fn at_line(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    /// Allocate a fresh node id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Location of the next node.
    pub fn loc(&self) -> SourceLocation {
        SourceLocation::new(Arc::clone(&self.file), self.line)
    }

    fn expr(&mut self, kind: ExprKind) -> Expression {
        Expression {
            id: self.next_id(),
            source_loc: self.loc(),
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Statement {
        Statement {
            id: self.next_id(),
            source_loc: self.loc(),
            kind,
        }
    }

    pub fn int(&mut self, value: i64) -> Expression {
        self.expr(ExprKind::IntLiteral(value))
    }

    pub fn bool(&mut self, value: bool) -> Expression {
        self.expr(ExprKind::BoolLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> Expression {
        self.expr(ExprKind::StringLiteral(value.to_owned()))
    }

    pub fn ident(&mut self, name: &str) -> Expression {
        self.expr(ExprKind::Identifier(name.to_owned()))
    }

    pub fn tuple(&mut self, elements: Vec<Expression>) -> Expression {
        self.expr(ExprKind::Tuple(elements))
    }

    pub fn index(&mut self, aggregate: Expression, index: usize) -> Expression {
        self.expr(ExprKind::Index {
            aggregate: Box::new(aggregate),
            index,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn call(&mut self, callee: Expression, args: Vec<Expression>) -> Expression {
        self.expr(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// A name-introducing occurrence.
    pub fn binding(&mut self, name: &str, kind: BindingKind, ty: Option<TypeExpr>) -> BindingDecl {
        BindingDecl {
            id: self.next_id(),
            name: name.to_owned(),
            source_loc: self.loc(),
            ty,
            kind,
        }
    }

    pub fn witness(&mut self, interface: &str, ty: TypeExpr) -> Witness {
        Witness {
            id: self.next_id(),
            interface: interface.to_owned(),
            ty,
        }
    }

    pub fn expr_stmt(&mut self, expr: Expression) -> Statement {
        self.stmt(StmtKind::Expression(expr))
    }

    pub fn var_def(&mut self, binding: BindingDecl, init: Expression) -> Statement {
        self.stmt(StmtKind::VariableDefinition { binding, init })
    }

    pub fn assign(&mut self, lhs: Expression, rhs: Expression) -> Statement {
        self.stmt(StmtKind::Assign { lhs, rhs })
    }

    pub fn block(&mut self, statements: Vec<Statement>) -> Statement {
        self.stmt(StmtKind::Block(statements))
    }

    pub fn if_stmt(
        &mut self,
        condition: Expression,
        then_block: Statement,
        else_block: Option<Statement>,
    ) -> Statement {
        self.stmt(StmtKind::If {
            condition,
            then_block: Box::new(then_block),
            else_block: else_block.map(Box::new),
        })
    }

    pub fn while_stmt(&mut self, condition: Expression, body: Statement) -> Statement {
        self.stmt(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn return_stmt(&mut self, expr: Expression) -> Statement {
        self.stmt(StmtKind::Return(expr))
    }

    pub fn function(
        &mut self,
        name: &str,
        params: Vec<BindingDecl>,
        return_type: Option<TypeExpr>,
        body: Option<Statement>,
    ) -> Declaration {
        Declaration {
            id: self.next_id(),
            source_loc: self.loc(),
            kind: DeclKind::Function {
                name: name.to_owned(),
                params,
                return_type,
                body,
            },
        }
    }

    pub fn variable_decl(&mut self, binding: BindingDecl, init: Option<Expression>) -> Declaration {
        Declaration {
            id: self.next_id(),
            source_loc: self.loc(),
            kind: DeclKind::Variable { binding, init },
        }
    }
}
