// This module defines the expression tree accepted by the compiler. An expression is an
// immutable, acyclic tree of named symbols, f64 literals and unary/binary operator nodes, built
// by an external front-end. Operators are closed enums: every operation the compiler knows is a
// named variant, and anything else the front-end hands over lands in the `Other` variant, which
// the lowering pass always rejects. Textual operation names follow the front-end's vocabulary
// ("+", "-", "*", "/", "sqrt", "sin", "ln", "pow", ...). Arithmetic operator impls on `Expr`
// allow trees to be written directly in Rust code and tests.

//! Expression tree.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Unary operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    /// Unary plus. Compiles to nothing.
    Identity,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    /// Natural logarithm.
    Ln,
    /// An operation the compiler does not know.
    Other(String),
}

impl UnaryOp {
    /// Map a front-end operation name onto the operator set.
    pub fn from_name(name: &str) -> Self {
        match name {
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Identity,
            "sqrt" => UnaryOp::Sqrt,
            "sin" => UnaryOp::Sin,
            "cos" => UnaryOp::Cos,
            "tan" => UnaryOp::Tan,
            "asin" => UnaryOp::Asin,
            "acos" => UnaryOp::Acos,
            "atan" => UnaryOp::Atan,
            "sinh" => UnaryOp::Sinh,
            "cosh" => UnaryOp::Cosh,
            "tanh" => UnaryOp::Tanh,
            "asinh" => UnaryOp::Asinh,
            "acosh" => UnaryOp::Acosh,
            "atanh" => UnaryOp::Atanh,
            "exp" => UnaryOp::Exp,
            "ln" => UnaryOp::Ln,
            other => UnaryOp::Other(other.to_string()),
        }
    }

    /// Front-end name of the operation.
    pub fn name(&self) -> &str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Identity => "+",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Asinh => "asinh",
            UnaryOp::Acosh => "acosh",
            UnaryOp::Atanh => "atanh",
            UnaryOp::Exp => "exp",
            UnaryOp::Ln => "ln",
            UnaryOp::Other(name) => name,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// An operation the compiler does not know.
    Other(String),
}

impl BinaryOp {
    /// Map a front-end operation name onto the operator set.
    pub fn from_name(name: &str) -> Self {
        match name {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "pow" => BinaryOp::Pow,
            other => BinaryOp::Other(other.to_string()),
        }
    }

    /// Front-end name of the operation.
    pub fn name(&self) -> &str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "pow",
            BinaryOp::Other(name) => name,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Symbol(String),
    Numeric(f64),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn num(value: f64) -> Self {
        Expr::Numeric(value)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn sqrt(self) -> Self {
        Expr::unary(UnaryOp::Sqrt, self)
    }

    pub fn sin(self) -> Self {
        Expr::unary(UnaryOp::Sin, self)
    }

    pub fn cos(self) -> Self {
        Expr::unary(UnaryOp::Cos, self)
    }

    pub fn exp(self) -> Self {
        Expr::unary(UnaryOp::Exp, self)
    }

    pub fn ln(self) -> Self {
        Expr::unary(UnaryOp::Ln, self)
    }

    pub fn pow(self, exponent: Expr) -> Self {
        Expr::binary(BinaryOp::Pow, self, exponent)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(name) => f.write_str(name),
            Expr::Numeric(value) => write!(f, "{value}"),
            Expr::Unary(op @ (UnaryOp::Neg | UnaryOp::Identity), operand) => {
                write!(f, "{op}{operand}")
            }
            Expr::Unary(op, operand) => write!(f, "{op}({operand})"),
            Expr::Binary(op @ (BinaryOp::Pow | BinaryOp::Other(_)), left, right) => {
                write!(f, "{op}({left}, {right})")
            }
            Expr::Binary(op, left, right) => write!(f, "({left} {op} {right})"),
        }
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, Expr::Numeric(rhs))
            }
        }
    };
}

binary_operator!(Add, add, BinaryOp::Add);
binary_operator!(Sub, sub, BinaryOp::Sub);
binary_operator!(Mul, mul, BinaryOp::Mul);
binary_operator!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}
