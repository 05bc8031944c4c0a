//! WebAssembly back end.
//!
//! - [`fold`] - peephole constant folding on the instruction sequence
//! - [`validate`] - operand stack and full-module validation
//! - [`encoder`] - section splicing into an existing module
//! - [`assembler`] - appending the compiled entry point
//! - [`emit`] - the immutable compiled artifact

pub mod assembler;
pub mod emit;
pub mod encoder;
pub mod fold;
pub mod validate;

pub use assembler::{AssembledModule, ModuleAssembler, EXPORT_NAME};
pub use emit::{CallingConvention, CompiledModule};
