// This module builds a "bridge" runtime: a minimal runtime module whose math functions are not
// implemented in WebAssembly but imported from the host and re-exported under their own names.
// It satisfies the same contract as the pre-built libm runtime (every linkage-table function
// exported with an f64 signature, one page of exported linear memory), which makes it usable by
// hosts that already have native math routines and by the test suite.

//! Host-bridged runtime module.

use super::linkage::{RuntimeFunctionDescriptor, RUNTIME_FUNCTIONS};
use wasm_encoder::{
    EntityType, ExportKind, ExportSection, ImportSection, MemorySection, MemoryType, Module,
    TypeSection, ValType,
};

/// Module name the bridge imports its functions from.
pub const HOST_MODULE: &str = "env";

/// Export name of the bridge's linear memory.
pub const MEMORY_EXPORT: &str = "memory";

const UNARY_TYPE: u32 = 0;
const BINARY_TYPE: u32 = 1;

fn type_index(desc: &RuntimeFunctionDescriptor) -> u32 {
    match desc.arity {
        2 => BINARY_TYPE,
        _ => UNARY_TYPE,
    }
}

/// One 64 KiB page of 32-bit memory, no maximum.
pub fn scratch_memory() -> MemoryType {
    MemoryType {
        minimum: 1,
        maximum: None,
        memory64: false,
        shared: false,
        page_size_log2: None,
    }
}

/// Build the bridge runtime module.
pub fn bridge_runtime() -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    types.ty().function([ValType::F64], [ValType::F64]);
    types.ty().function([ValType::F64, ValType::F64], [ValType::F64]);
    module.section(&types);

    let mut imports = ImportSection::new();
    for desc in RUNTIME_FUNCTIONS {
        imports.import(HOST_MODULE, desc.name, EntityType::Function(type_index(desc)));
    }
    module.section(&imports);

    let mut memories = MemorySection::new();
    memories.memory(scratch_memory());
    module.section(&memories);

    let mut exports = ExportSection::new();
    for (index, desc) in RUNTIME_FUNCTIONS.iter().enumerate() {
        exports.export(desc.name, ExportKind::Func, index as u32);
    }
    exports.export(MEMORY_EXPORT, ExportKind::Memory, 0);
    module.section(&exports);

    module.finish()
}
