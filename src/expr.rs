//! Typed expressions and the expression analyzer.
//!
//! The analyzer maps parse-tree expressions into typed expressions,
//! resolving names through the symbol table and folding integer and
//! logical constant operations. The typed form renders back to canonical
//! lowercase Fortran (`as_fortran`), which is what the mod-file writer
//! emits for initializers and bind names.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::ast;
use crate::symtab::{ScopeId, SymbolId, SymbolTable};
use crate::types::TypeCategory;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int { value: i64, kind: i64 },
    Real { value: f64, kind: i64 },
    Logical { value: bool, kind: i64 },
    Char { value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignatorPart {
    pub name: String,
    pub subscripts: Vec<Expression>,
}

/// A resolved reference to a datum: base symbol plus component path.
#[derive(Debug, Clone, PartialEq)]
pub struct Designator {
    pub symbol: SymbolId,
    pub parts: Vec<DesignatorPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Constant),
    Designator(Designator),
    Unary {
        op: ast::UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: ast::BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    FunctionRef {
        symbol: SymbolId,
        name: String,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn int(value: i64, kind: i64) -> Self {
        Expression::Constant(Constant::Int { value, kind })
    }

    pub fn logical(value: bool, kind: i64) -> Self {
        Expression::Constant(Constant::Logical { value, kind })
    }

    /// The constant `.true.` used for loop latches with no condition.
    pub fn always_true() -> Self {
        Self::logical(true, TypeCategory::Logical.default_kind())
    }

    pub fn as_fortran(&self) -> String {
        self.to_string()
    }
}

fn binary_op_token(op: ast::BinaryOp) -> &'static str {
    match op {
        ast::BinaryOp::Add => "+",
        ast::BinaryOp::Subtract => "-",
        ast::BinaryOp::Multiply => "*",
        ast::BinaryOp::Divide => "/",
        ast::BinaryOp::Power => "**",
        ast::BinaryOp::Concat => "//",
        ast::BinaryOp::Lt => "<",
        ast::BinaryOp::Le => "<=",
        ast::BinaryOp::Eq => "==",
        ast::BinaryOp::Ne => "/=",
        ast::BinaryOp::Gt => ">",
        ast::BinaryOp::Ge => ">=",
        ast::BinaryOp::And => ".and.",
        ast::BinaryOp::Or => ".or.",
        ast::BinaryOp::Eqv => ".eqv.",
        ast::BinaryOp::Neqv => ".neqv.",
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Constant::Int { value, kind } => write!(f, "{}_{}", value, kind),
            Constant::Real { value, kind } => {
                if *kind == TypeCategory::Real.default_kind() {
                    write!(f, "{:?}", value)
                } else {
                    write!(f, "{:?}_{}", value, kind)
                }
            }
            Constant::Logical { value, kind } => {
                let text = if *value { ".true." } else { ".false." };
                write!(f, "{}_{}", text, kind)
            }
            Constant::Char { value } => write!(f, "\"{}\"", value.replace('"', "\"\"")),
        }
    }
}

impl Display for Designator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                write!(f, "%")?;
            }
            write!(f, "{}", part.name.to_lowercase())?;
            if !part.subscripts.is_empty() {
                write!(f, "(")?;
                for (subscript_index, subscript) in part.subscripts.iter().enumerate() {
                    if subscript_index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", subscript)?;
                }
                write!(f, ")")?;
            }
        }
        Ok(())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Expression::Constant(constant) => write!(f, "{}", constant),
            Expression::Designator(designator) => write!(f, "{}", designator),
            Expression::Unary { op, operand } => {
                let token = match op {
                    ast::UnaryOp::Negate => "-",
                    ast::UnaryOp::Not => ".not.",
                };
                write!(f, "({}{})", token, operand)
            }
            Expression::Binary { op, left, right } => {
                write!(f, "({}{}{})", left, binary_op_token(*op), right)
            }
            Expression::FunctionRef { name, args, .. } => {
                write!(f, "{}(", name.to_lowercase())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Analyzes parse-tree expressions against a symbol table.
pub struct ExpressionAnalyzer<'a> {
    table: &'a SymbolTable,
    scope: Option<ScopeId>,
}

impl<'a> ExpressionAnalyzer<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table, scope: None }
    }

    /// Unresolved names are looked up in `scope` and its ancestors.
    pub fn in_scope(table: &'a SymbolTable, scope: ScopeId) -> Self {
        Self {
            table,
            scope: Some(scope),
        }
    }

    pub fn analyze(&self, expr: &ast::Expr) -> Option<Expression> {
        match expr {
            ast::Expr::IntLiteral { value, kind } => Some(Expression::int(
                *value,
                kind.unwrap_or_else(|| TypeCategory::Integer.default_kind()),
            )),
            ast::Expr::RealLiteral { value, kind } => {
                Some(Expression::Constant(Constant::Real {
                    value: *value,
                    kind: kind.unwrap_or_else(|| TypeCategory::Real.default_kind()),
                }))
            }
            ast::Expr::LogicalLiteral { value, kind } => Some(Expression::logical(
                *value,
                kind.unwrap_or_else(|| TypeCategory::Logical.default_kind()),
            )),
            ast::Expr::CharLiteral { value } => Some(Expression::Constant(Constant::Char {
                value: value.clone(),
            })),
            ast::Expr::Designator(data_ref) => self.analyze_data_ref(data_ref),
            ast::Expr::Parentheses(inner) => self.analyze(inner),
            ast::Expr::Unary { op, operand } => {
                let operand = self.analyze(operand)?;
                Some(fold_unary(*op, operand))
            }
            ast::Expr::Binary { op, left, right } => {
                let left = self.analyze(left)?;
                let right = self.analyze(right)?;
                Some(fold_binary(*op, left, right))
            }
            ast::Expr::FunctionRef { name, args } => {
                let symbol = self.resolve(name)?;
                let args = args
                    .iter()
                    .map(|arg| self.analyze(arg))
                    .collect::<Option<Vec<_>>>()?;
                Some(Expression::FunctionRef {
                    symbol,
                    name: name.text.clone(),
                    args,
                })
            }
        }
    }

    pub fn analyze_variable(&self, variable: &ast::Variable) -> Option<Expression> {
        self.analyze_data_ref(&variable.data_ref)
    }

    pub fn analyze_name(&self, name: &ast::Name) -> Option<Expression> {
        let symbol = self.resolve(name)?;
        Some(Expression::Designator(Designator {
            symbol,
            parts: vec![DesignatorPart {
                name: name.text.clone(),
                subscripts: Vec::new(),
            }],
        }))
    }

    pub fn analyze_data_ref(&self, data_ref: &ast::DataRef) -> Option<Expression> {
        let symbol = self.resolve(data_ref.base())?;
        let parts = data_ref
            .parts
            .iter()
            .map(|part| {
                let subscripts = part
                    .subscripts
                    .iter()
                    .map(|subscript| self.analyze(subscript))
                    .collect::<Option<Vec<_>>>()?;
                Some(DesignatorPart {
                    name: part.name.text.clone(),
                    subscripts,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Expression::Designator(Designator { symbol, parts }))
    }

    fn resolve(&self, name: &ast::Name) -> Option<SymbolId> {
        if name.symbol.is_some() {
            return name.symbol;
        }
        let mut scope = self.scope;
        while let Some(current) = scope {
            if let Some(symbol) = self.table.find(current, &name.text) {
                return Some(symbol);
            }
            scope = self.table.scope(current).parent;
        }
        None
    }
}

fn fold_unary(op: ast::UnaryOp, operand: Expression) -> Expression {
    match (op, &operand) {
        (ast::UnaryOp::Negate, Expression::Constant(Constant::Int { value, kind })) => {
            Expression::int(-value, *kind)
        }
        (ast::UnaryOp::Not, Expression::Constant(Constant::Logical { value, kind })) => {
            Expression::logical(!value, *kind)
        }
        _ => Expression::Unary {
            op,
            operand: Box::new(operand),
        },
    }
}

fn fold_binary(op: ast::BinaryOp, left: Expression, right: Expression) -> Expression {
    use ast::BinaryOp::*;

    if let (
        Expression::Constant(Constant::Int {
            value: left_value,
            kind: left_kind,
        }),
        Expression::Constant(Constant::Int {
            value: right_value,
            kind: right_kind,
        }),
    ) = (&left, &right)
    {
        let kind = (*left_kind).max(*right_kind);
        let (left_value, right_value) = (*left_value, *right_value);
        match op {
            Add => return Expression::int(left_value.wrapping_add(right_value), kind),
            Subtract => return Expression::int(left_value.wrapping_sub(right_value), kind),
            Multiply => return Expression::int(left_value.wrapping_mul(right_value), kind),
            Divide if right_value != 0 => {
                return Expression::int(left_value.wrapping_div(right_value), kind);
            }
            Power if (0..=62).contains(&right_value) => {
                return Expression::int(left_value.wrapping_pow(right_value as u32), kind);
            }
            Lt => return Expression::logical(left_value < right_value, 4),
            Le => return Expression::logical(left_value <= right_value, 4),
            Eq => return Expression::logical(left_value == right_value, 4),
            Ne => return Expression::logical(left_value != right_value, 4),
            Gt => return Expression::logical(left_value > right_value, 4),
            Ge => return Expression::logical(left_value >= right_value, 4),
            _ => {}
        }
    }

    if let (
        Expression::Constant(Constant::Logical {
            value: left_value,
            kind: left_kind,
        }),
        Expression::Constant(Constant::Logical {
            value: right_value,
            kind: right_kind,
        }),
    ) = (&left, &right)
    {
        let kind = (*left_kind).max(*right_kind);
        let (left_value, right_value) = (*left_value, *right_value);
        match op {
            And => return Expression::logical(left_value && right_value, kind),
            Or => return Expression::logical(left_value || right_value, kind),
            Eqv => return Expression::logical(left_value == right_value, kind),
            Neqv => return Expression::logical(left_value != right_value, kind),
            _ => {}
        }
    }

    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
#[path = "tests/t_expr.rs"]
mod tests;
