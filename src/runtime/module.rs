// This module loads the pre-built runtime module that supplies the transcendental math
// functions. The runtime is treated as an opaque, versioned artifact: it is parsed once with
// wasmparser to record where each section lives and the few layout facts the assembler needs
// (how many types and functions already exist, which functions are exported under which names),
// and its bytes are never modified afterwards. Loading rejects components, runtimes already
// exporting the reserved entry point name, and modules whose memory 0 cannot hold the argument
// buffer: it must exist, be addressed with 32-bit pointers and start with at least one 64 KiB
// page. A loaded RuntimeModule is immutable and can be shared between threads.

//! Pre-built runtime module.

use crate::core::error::RuntimeLoadError;
use crate::wasm::assembler::EXPORT_NAME;
use hashbrown::HashMap;
use std::ops::Range;
use std::path::Path;
use wasmparser::{Encoding, ExternalKind, MemoryType, Parser, Payload, TypeRef};

/// Smallest initial size of memory 0, in bytes.
pub const MIN_MEMORY_BYTES: u64 = 64 * 1024;

/// Location of one section inside the runtime bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub id: u8,
    /// Payload range, excluding the id byte and size prefix.
    pub range: Range<usize>,
}

/// The runtime module compiled expressions are linked into.
#[derive(Debug)]
pub struct RuntimeModule {
    bytes: Box<[u8]>,
    sections: Vec<SectionSpan>,
    type_count: u32,
    imported_functions: u32,
    defined_functions: u32,
    exported_functions: HashMap<String, u32>,
}

impl RuntimeModule {
    /// Parse a runtime module from its binary encoding.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, RuntimeLoadError> {
        let bytes: Vec<u8> = bytes.into();
        let mut sections = Vec::new();
        let mut type_count = 0u32;
        let mut imported_functions = 0u32;
        let mut defined_functions = 0u32;
        let mut exported_functions = HashMap::new();
        let mut memory: Option<MemoryType> = None;

        for payload in Parser::new(0).parse_all(&bytes) {
            let payload = payload?;
            if let Some((id, range)) = payload.as_section() {
                sections.push(SectionSpan { id, range });
            }

            match payload {
                Payload::Version { encoding, .. } => {
                    if encoding != Encoding::Module {
                        return Err(RuntimeLoadError::NotCoreModule);
                    }
                }
                Payload::TypeSection(reader) => {
                    for group in reader {
                        type_count += group?.types().len() as u32;
                    }
                }
                Payload::ImportSection(reader) => {
                    for import in reader {
                        match import?.ty {
                            TypeRef::Func(_) => imported_functions += 1,
                            TypeRef::Memory(ty) => memory = memory.or(Some(ty)),
                            _ => {}
                        }
                    }
                }
                Payload::FunctionSection(reader) => defined_functions = reader.count(),
                Payload::MemorySection(reader) => {
                    for ty in reader {
                        memory = memory.or(Some(ty?));
                    }
                }
                Payload::ExportSection(reader) => {
                    for export in reader {
                        let export = export?;
                        if export.name == EXPORT_NAME {
                            let name = EXPORT_NAME.to_string();
                            return Err(RuntimeLoadError::ReservedExport(name));
                        }
                        if export.kind == ExternalKind::Func {
                            let name = export.name.to_string();
                            exported_functions.insert(name, export.index);
                        }
                    }
                }
                _ => {}
            }
        }

        check_memory(memory.ok_or(RuntimeLoadError::MissingMemory)?)?;

        log::debug!(
            "runtime module loaded: {} bytes, {} sections, {} types, \
             {} functions ({} imported), {} exported",
            bytes.len(),
            sections.len(),
            type_count,
            imported_functions + defined_functions,
            imported_functions,
            exported_functions.len()
        );

        Ok(Self {
            bytes: bytes.into_boxed_slice(),
            sections,
            type_count,
            imported_functions,
            defined_functions,
            exported_functions,
        })
    }

    /// Read and parse a runtime module from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeLoadError> {
        let path = path.as_ref();
        log::debug!("loading runtime module from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Raw module bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sections(&self) -> &[SectionSpan] {
        &self.sections
    }

    /// Number of entries in the type index space.
    pub fn type_count(&self) -> u32 {
        self.type_count
    }

    /// Number of entries in the function index space, imports included.
    pub fn function_count(&self) -> u32 {
        self.imported_functions + self.defined_functions
    }

    pub fn imported_function_count(&self) -> u32 {
        self.imported_functions
    }

    /// Function index exported under `name`.
    pub fn function_index(&self, name: &str) -> Option<u32> {
        self.exported_functions.get(name).copied()
    }

    /// Whether the runtime exports a function called `name`.
    pub fn exports_function(&self, name: &str) -> bool {
        self.exported_functions.contains_key(name)
    }
}

/// Memory 0 must hold the argument buffer behind an i32 pointer.
fn check_memory(ty: MemoryType) -> Result<(), RuntimeLoadError> {
    if ty.memory64 {
        return Err(RuntimeLoadError::UnusableMemory(
            "64-bit memory cannot be addressed by the i32 argument pointer",
        ));
    }
    let page_size = 1u64 << ty.page_size_log2.unwrap_or(16);
    if ty.initial.saturating_mul(page_size) < MIN_MEMORY_BYTES {
        return Err(RuntimeLoadError::UnusableMemory(
            "memory 0 starts smaller than one 64 KiB page",
        ));
    }
    Ok(())
}
