// This module implements the lowering pass that turns an expression tree into a flat
// stack-machine instruction sequence. Lowering is a post-order walk: operands are emitted left
// to right, then the operator. Symbols resolve to argument slots through the SymbolTable that
// the caller threads through the walk, so slot numbering is scoped to one compilation and
// depends only on the tree. Unary plus emits nothing. Transcendental functions become calls
// into the runtime module by name. Unknown operators abort the walk with UnsupportedOperation.

//! Tree lowering to a stack-machine instruction sequence.

use crate::core::error::{CompileError, CompileResult};
use crate::core::symbols::{Slot, SymbolTable};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use std::fmt;

/// Stack-machine instruction. Every value on the stack is an f64.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    LoadConst(f64),
    LoadArg(Slot),
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Sqrt,
    CallRuntime(&'static str),
}

impl Instruction {
    /// Short opcode name, used for statistics.
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::LoadConst(_) => "load_const",
            Instruction::LoadArg(_) => "load_arg",
            Instruction::Neg => "neg",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mul => "mul",
            Instruction::Div => "div",
            Instruction::Sqrt => "sqrt",
            Instruction::CallRuntime(_) => "call_runtime",
        }
    }

    /// Apply a binary arithmetic instruction to two constants.
    pub fn eval_binary(&self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Instruction::Add => Some(lhs + rhs),
            Instruction::Sub => Some(lhs - rhs),
            Instruction::Mul => Some(lhs * rhs),
            Instruction::Div => Some(lhs / rhs),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConst(value) => write!(f, "f64.const {value:?}"),
            Instruction::LoadArg(slot) => write!(
                f,
                "local.get $ptr\nf64.load offset={} align=8",
                slot.byte_offset()
            ),
            Instruction::Neg => f.write_str("f64.neg"),
            Instruction::Add => f.write_str("f64.add"),
            Instruction::Sub => f.write_str("f64.sub"),
            Instruction::Mul => f.write_str("f64.mul"),
            Instruction::Div => f.write_str("f64.div"),
            Instruction::Sqrt => f.write_str("f64.sqrt"),
            Instruction::CallRuntime(name) => write!(f, "call ${name}"),
        }
    }
}

/// Lower `expr` into an instruction sequence, assigning slots in `symbols`.
pub fn lower(expr: &Expr, symbols: &mut SymbolTable<'_>) -> CompileResult<Vec<Instruction>> {
    let mut program = Vec::new();
    lower_into(expr, symbols, &mut program)?;
    Ok(program)
}

fn lower_into(
    expr: &Expr,
    symbols: &mut SymbolTable<'_>,
    out: &mut Vec<Instruction>,
) -> CompileResult<()> {
    match expr {
        Expr::Symbol(name) => {
            let slot = symbols.register(name);
            out.push(Instruction::LoadArg(slot));
        }
        Expr::Numeric(value) => out.push(Instruction::LoadConst(*value)),
        Expr::Unary(op, operand) => {
            lower_into(operand, symbols, out)?;
            if let Some(inst) = lower_unary(op)? {
                out.push(inst);
            }
        }
        Expr::Binary(op, left, right) => {
            lower_into(left, symbols, out)?;
            lower_into(right, symbols, out)?;
            out.push(lower_binary(op)?);
        }
    }
    Ok(())
}

fn lower_unary(op: &UnaryOp) -> CompileResult<Option<Instruction>> {
    let inst = match op {
        UnaryOp::Identity => return Ok(None),
        UnaryOp::Neg => Instruction::Neg,
        UnaryOp::Sqrt => Instruction::Sqrt,
        UnaryOp::Sin => Instruction::CallRuntime("sin"),
        UnaryOp::Cos => Instruction::CallRuntime("cos"),
        UnaryOp::Tan => Instruction::CallRuntime("tan"),
        UnaryOp::Asin => Instruction::CallRuntime("asin"),
        UnaryOp::Acos => Instruction::CallRuntime("acos"),
        UnaryOp::Atan => Instruction::CallRuntime("atan"),
        UnaryOp::Sinh => Instruction::CallRuntime("sinh"),
        UnaryOp::Cosh => Instruction::CallRuntime("cosh"),
        UnaryOp::Tanh => Instruction::CallRuntime("tanh"),
        UnaryOp::Asinh => Instruction::CallRuntime("asinh"),
        UnaryOp::Acosh => Instruction::CallRuntime("acosh"),
        UnaryOp::Atanh => Instruction::CallRuntime("atanh"),
        UnaryOp::Exp => Instruction::CallRuntime("exp"),
        UnaryOp::Ln => Instruction::CallRuntime("log"),
        UnaryOp::Other(_) => return Err(CompileError::unsupported(op)),
    };
    Ok(Some(inst))
}

fn lower_binary(op: &BinaryOp) -> CompileResult<Instruction> {
    match op {
        BinaryOp::Add => Ok(Instruction::Add),
        BinaryOp::Sub => Ok(Instruction::Sub),
        BinaryOp::Mul => Ok(Instruction::Mul),
        BinaryOp::Div => Ok(Instruction::Div),
        BinaryOp::Pow => Ok(Instruction::CallRuntime("pow")),
        BinaryOp::Other(_) => Err(CompileError::unsupported(op)),
    }
}
