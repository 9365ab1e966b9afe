//! AST nodes referenced by evaluation frames.
//!
//! These are the shapes the parser and type checker hand to the evaluator.
//! The evaluator only uses them for identity and printing; the node set
//! covers what a frame can point at.

use std::fmt::{self, Write as _};

use crate::{NodeId, SourceLocation};

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Eq,
    NotEq,
    Lt,
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// Surface syntax for a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Int,
    Bool,
    Str,
    Tuple(Vec<TypeExpr>),
    Named(String),
    /// A reference to storage of the inner type.
    Reference(Box<TypeExpr>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Int => f.write_str("i32"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Str => f.write_str("String"),
            TypeExpr::Tuple(elements) => {
                f.write_char('(')?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                if elements.len() == 1 {
                    f.write_char(',')?;
                }
                f.write_char(')')
            }
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Reference(inner) => write!(f, "ref {inner}"),
        }
    }
}

/// How a binding was introduced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `let x = ...` - immutable value binding.
    Let,
    /// `var x = ...` - binding to mutable storage.
    Var,
    /// Function parameter.
    Parameter,
    /// `let ref x = ...` - alias of existing storage, checked on every use.
    Reference,
}

/// The declaration behind a runtime binding.
///
/// One `BindingDecl` exists per name-introducing occurrence in the program.
/// Its `NodeId` is the binding's identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingDecl {
    pub id: NodeId,
    pub name: String,
    pub source_loc: SourceLocation,
    pub ty: Option<TypeExpr>,
    pub kind: BindingKind,
}

impl BindingDecl {
    /// Renders `name: type`, or just the name when no type was written.
    pub fn signature(&self) -> String {
        match &self.ty {
            Some(ty) => format!("{}: {ty}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for BindingDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolution of an interface requirement for a concrete type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub id: NodeId,
    pub interface: String,
    pub ty: TypeExpr,
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "impl {} as {}", self.ty, self.interface)
    }
}

/// Expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub id: NodeId,
    pub source_loc: SourceLocation,
    pub kind: ExprKind,
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    IntLiteral(i64),
    BoolLiteral(bool),
    StringLiteral(String),
    Identifier(String),
    Tuple(Vec<Expression>),
    Index {
        aggregate: Box<Expression>,
        index: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
}

impl Expression {
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.kind, ExprKind::Binary { .. }) {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLiteral(n) => write!(f, "{n}"),
            ExprKind::BoolLiteral(b) => write!(f, "{b}"),
            ExprKind::StringLiteral(s) => write!(f, "\"{s}\""),
            ExprKind::Identifier(name) => f.write_str(name),
            ExprKind::Tuple(elements) => {
                f.write_char('(')?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_char(')')
            }
            ExprKind::Index { aggregate, index } => {
                aggregate.fmt_operand(f)?;
                write!(f, "[{index}]")
            }
            ExprKind::Binary { op, lhs, rhs } => {
                lhs.fmt_operand(f)?;
                write!(f, " {} ", op.as_symbol())?;
                rhs.fmt_operand(f)
            }
            ExprKind::Call { callee, args } => {
                callee.fmt_operand(f)?;
                f.write_char('(')?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_char(')')
            }
        }
    }
}

/// Statement node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub id: NodeId,
    pub source_loc: SourceLocation,
    pub kind: StmtKind,
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    Expression(Expression),
    VariableDefinition {
        binding: BindingDecl,
        init: Expression,
    },
    Assign {
        lhs: Expression,
        rhs: Expression,
    },
    Block(Vec<Statement>),
    If {
        condition: Expression,
        then_block: Box<Statement>,
        else_block: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Return(Expression),
}

impl Statement {
    /// Print this statement, eliding anything nested more than `depth`
    /// statements deep as `...`.
    ///
    /// Depth 0 elides the statement itself; depth 1 shows the statement's own
    /// header with nested statements elided.
    pub fn print_depth(&self, depth: usize, out: &mut dyn fmt::Write) -> fmt::Result {
        if depth == 0 {
            return out.write_str("...");
        }
        let nested = depth - 1;
        match &self.kind {
            StmtKind::Expression(expr) => write!(out, "{expr};"),
            StmtKind::VariableDefinition { binding, init } => {
                let keyword = match binding.kind {
                    BindingKind::Var => "var",
                    BindingKind::Reference => "let ref",
                    BindingKind::Let | BindingKind::Parameter => "let",
                };
                write!(out, "{keyword} {} = {init};", binding.signature())
            }
            StmtKind::Assign { lhs, rhs } => write!(out, "{lhs} = {rhs};"),
            StmtKind::Block(statements) => {
                if statements.is_empty() {
                    return out.write_str("{}");
                }
                out.write_char('{')?;
                for statement in statements {
                    out.write_char(' ')?;
                    statement.print_depth(nested, out)?;
                }
                out.write_str(" }")
            }
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                write!(out, "if ({condition}) ")?;
                then_block.print_depth(nested, out)?;
                if let Some(else_block) = else_block {
                    out.write_str(" else ")?;
                    else_block.print_depth(nested, out)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                write!(out, "while ({condition}) ")?;
                body.print_depth(nested, out)
            }
            StmtKind::Return(expr) => write!(out, "return {expr};"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_depth(usize::MAX, f)
    }
}

/// Declaration node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub id: NodeId,
    pub source_loc: SourceLocation,
    pub kind: DeclKind,
}

/// Declaration variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Function {
        name: String,
        params: Vec<BindingDecl>,
        return_type: Option<TypeExpr>,
        body: Option<Statement>,
    },
    Variable {
        binding: BindingDecl,
        init: Option<Expression>,
    },
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DeclKind::Function {
                name,
                params,
                return_type,
                body,
            } => {
                write!(f, "fn {name}(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&param.signature())?;
                }
                f.write_char(')')?;
                if let Some(return_type) = return_type {
                    write!(f, " -> {return_type}")?;
                }
                match body {
                    Some(body) => write!(f, " {body}"),
                    None => f.write_char(';'),
                }
            }
            DeclKind::Variable { binding, init } => {
                write!(f, "var {}", binding.signature())?;
                if let Some(init) = init {
                    write!(f, " = {init}")?;
                }
                f.write_char(';')
            }
        }
    }
}
