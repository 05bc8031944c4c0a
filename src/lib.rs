//! exprwasm - Expression compilation to WebAssembly.
//!
//! Compiles symbolic arithmetic expressions into a WebAssembly module that
//! exports a single function, `executable(ptr: i32, len: i32) -> f64`. The
//! function reads one little-endian f64 per distinct symbol from linear memory
//! at `ptr` and returns the value of the expression. Transcendental functions
//! are resolved against a pre-built runtime module the new function is
//! appended to.
//!
//! # Primary Usage
//!
//! ```ignore
//! use exprwasm::{bridge_runtime, Expr, ExpressionCompiler, RuntimeModule};
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(RuntimeModule::from_bytes(bridge_runtime())?);
//! let compiler = ExpressionCompiler::new(runtime);
//!
//! let expr = (Expr::symbol("x") + 1.0) * Expr::symbol("y");
//! let module = compiler.compile(&expr)?;
//! assert_eq!(module.symbols(), ["x", "y"]);
//! ```
//!
//! # Architecture
//!
//! - [`expr`] - Expression tree and operator DSL
//! - [`lower`] - Lowering to a stack-machine instruction sequence
//! - [`core`] - Shared infrastructure (session, symbols, config, errors)
//! - [`runtime`] - Runtime module loading and the linkage table
//! - [`wasm`] - Folding, validation, encoding and emission
//! - [`compiler`] - The end-to-end driver

pub mod compiler;
pub mod core;
pub mod expr;
pub mod lower;
pub mod runtime;
pub mod wasm;

pub use compiler::{compile, ExpressionCompiler};
pub use crate::core::{
    CompilationSession, CompileError, CompileResult, CompileStage, CompilerConfig,
    RuntimeLoadError, SessionStats,
};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use lower::Instruction;
pub use runtime::{bridge_runtime, RuntimeModule};
pub use wasm::{CallingConvention, CompiledModule};
