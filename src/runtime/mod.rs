//! Runtime module support.
//!
//! The runtime is a pre-built WebAssembly module providing the transcendental
//! functions compiled expressions call into. It is loaded once and shared
//! read-only by every compilation.

pub mod bridge;
pub mod linkage;
pub mod module;

pub use bridge::{bridge_runtime, HOST_MODULE, MEMORY_EXPORT};
pub use linkage::{lookup, NumericKind, RuntimeFunctionDescriptor, RUNTIME_FUNCTIONS};
pub use module::{RuntimeModule, SectionSpan};
