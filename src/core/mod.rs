// This module gathers the infrastructure every compilation shares: the error taxonomy, the
// compiler configuration, the arena-backed SymbolTable that assigns argument slots, and the
// CompilationSession that owns one compile call's arena, symbols, stage and statistics.

//! Core compilation infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena-based memory allocation using `bumpalo`
//! - Forward-only compile stage tracking
//! - Compilation statistics
//!
//! ## Symbols (`symbols`)
//! - Arena-interned symbol names
//! - Deterministic first-occurrence slot numbering

pub mod config;
pub mod error;
pub mod session;
pub mod symbols;
pub mod test_utils;

pub use config::{CompilerConfig, MAX_SLOTS};
pub use error::{CompileError, CompileResult, RuntimeLoadError};
pub use session::{CompilationSession, CompileStage, SessionStats};
pub use symbols::{Slot, SymbolTable, SLOT_SIZE};
