// This module defines the error types for the expression compiler using the thiserror crate.
// CompileError covers the four ways a compilation can fail: an operator outside the supported
// set, more distinct symbols than the argument buffer can address, a runtime function that the
// linked runtime module does not provide, and a structurally invalid module after assembly.
// The last one indicates a compiler defect rather than bad input. RuntimeLoadError covers the
// separate, earlier step of loading the pre-built runtime module. CompileResult<T> is the
// usual alias for Result<T, CompileError>.

//! Error types for the expression compiler.

use thiserror::Error;

/// Main error type for expression compilation.
///
/// Every variant is fatal: a failed compilation never yields a partial module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unsupported operation: {op}")]
    UnsupportedOperation { op: String },

    #[error("Argument count exceeded: {count} distinct symbols, limit is {limit}")]
    ArgumentCountExceeded { count: usize, limit: usize },

    #[error("Runtime function not linked: {name}")]
    LinkageError { name: String },

    #[error("Invalid module: {reason}")]
    InvalidModule { reason: String },
}

impl CompileError {
    pub(crate) fn unsupported(op: impl ToString) -> Self {
        CompileError::UnsupportedOperation { op: op.to_string() }
    }

    pub(crate) fn linkage(name: impl Into<String>) -> Self {
        CompileError::LinkageError { name: name.into() }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CompileError::InvalidModule {
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading the runtime module.
#[derive(Error, Debug)]
pub enum RuntimeLoadError {
    #[error("Failed to read runtime module: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed runtime module: {0}")]
    Malformed(#[from] wasmparser::BinaryReaderError),

    #[error("Runtime is not a core WebAssembly module")]
    NotCoreModule,

    #[error("Runtime module has no linear memory")]
    MissingMemory,

    #[error("Runtime memory cannot hold the argument buffer: {0}")]
    UnusableMemory(&'static str),

    #[error("Runtime module already exports `{0}`")]
    ReservedExport(String),
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
