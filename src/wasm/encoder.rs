// This module implements the binary encoder that splices new entries into an existing module.
// A WebAssembly module is a sequence of sections, each an id byte followed by a LEB128 size and
// a payload; the vector sections (type, import, function, export, code, ...) start their payload
// with a LEB128 entry count. Appending an entry therefore only requires rewriting that count and
// concatenating the new entry after the existing ones, leaving every existing byte untouched.
// ModuleEncoder keeps the runtime's sections as borrowed slices, replaces the ones that receive
// new entries and creates missing sections at their canonical position before handing the
// result to wasm-encoder for final framing. Entry payloads are written with wasm-encoder's
// Encode implementations.

//! Section-level module encoding.

use crate::core::error::{CompileError, CompileResult};
use crate::runtime::module::RuntimeModule;
use std::borrow::Cow;
use wasm_encoder::{Encode, RawSection, ValType};
use wasmparser::BinaryReader;

/// Section ids of the core module format.
pub mod section_id {
    pub const CUSTOM: u8 = 0;
    pub const TYPE: u8 = 1;
    pub const IMPORT: u8 = 2;
    pub const FUNCTION: u8 = 3;
    pub const TABLE: u8 = 4;
    pub const MEMORY: u8 = 5;
    pub const GLOBAL: u8 = 6;
    pub const EXPORT: u8 = 7;
    pub const START: u8 = 8;
    pub const ELEMENT: u8 = 9;
    pub const CODE: u8 = 10;
    pub const DATA: u8 = 11;
    pub const DATA_COUNT: u8 = 12;
    pub const TAG: u8 = 13;
}

/// Position of a non-custom section in the required section order.
pub fn section_rank(id: u8) -> Option<u8> {
    use section_id::*;
    let rank = match id {
        TYPE => 1,
        IMPORT => 2,
        FUNCTION => 3,
        TABLE => 4,
        MEMORY => 5,
        TAG => 6,
        GLOBAL => 7,
        EXPORT => 8,
        START => 9,
        ELEMENT => 10,
        DATA_COUNT => 11,
        CODE => 12,
        DATA => 13,
        _ => return None,
    };
    Some(rank)
}

/// Encode a function type entry: `0x60 vec(params) vec(results)`.
pub fn encode_func_type(params: &[ValType], results: &[ValType], sink: &mut Vec<u8>) {
    sink.push(0x60);
    params.encode(sink);
    results.encode(sink);
}

/// Payload of a vector section: a count followed by the entries.
#[derive(Debug, Clone, Default)]
pub struct VectorSection {
    count: u32,
    entries: Vec<u8>,
}

impl VectorSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing section payload.
    pub fn extend(existing: &[u8]) -> CompileResult<Self> {
        let mut reader = BinaryReader::new(existing, 0);
        let count = reader
            .read_var_u32()
            .map_err(|e| CompileError::invalid(format!("section entry count: {e}")))?;
        Ok(Self {
            count,
            entries: existing[reader.current_position()..].to_vec(),
        })
    }

    /// Append one entry written by `write`.
    pub fn push_with(&mut self, write: impl FnOnce(&mut Vec<u8>)) -> &mut Self {
        self.count += 1;
        write(&mut self.entries);
        self
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Encoded payload.
    pub fn finish(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.entries.len() + 5);
        self.count.encode(&mut payload);
        payload.extend_from_slice(&self.entries);
        payload
    }
}

/// Ordered list of sections making up the output module.
pub struct ModuleEncoder<'a> {
    sections: Vec<(u8, Cow<'a, [u8]>)>,
}

impl<'a> ModuleEncoder<'a> {
    /// Start from an empty module.
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Start from the sections of `runtime`, borrowed byte-for-byte.
    pub fn from_runtime(runtime: &'a RuntimeModule) -> Self {
        let sections = runtime
            .sections()
            .iter()
            .map(|span| (span.id, Cow::Borrowed(&runtime.bytes()[span.range.clone()])))
            .collect();
        Self { sections }
    }

    /// Append one entry to the vector section `id`, creating the section if needed.
    pub fn append_entry(&mut self, id: u8, write: impl FnOnce(&mut Vec<u8>)) -> CompileResult<()> {
        if id == section_id::START || section_rank(id).is_none() {
            return Err(CompileError::invalid(format!(
                "section {id} is not a vector section"
            )));
        }

        match self.sections.iter().position(|(sid, _)| *sid == id) {
            Some(pos) => {
                let mut section = VectorSection::extend(&self.sections[pos].1)?;
                section.push_with(write);
                self.sections[pos].1 = Cow::Owned(section.finish());
            }
            None => {
                let mut section = VectorSection::new();
                section.push_with(write);
                let pos = self.insert_position(id);
                self.sections.insert(pos, (id, Cow::Owned(section.finish())));
            }
        }
        Ok(())
    }

    /// Index at which a new section `id` keeps the canonical order.
    fn insert_position(&self, id: u8) -> usize {
        let rank = section_rank(id);
        let mut after_last_known = 0;
        for (pos, (sid, _)) in self.sections.iter().enumerate() {
            match section_rank(*sid) {
                Some(existing) if Some(existing) > rank => return pos,
                Some(_) => after_last_known = pos + 1,
                None => {}
            }
        }
        after_last_known
    }

    /// Ids of the sections in output order.
    pub fn section_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.sections.iter().map(|(id, _)| *id)
    }

    /// Frame every section and produce the module bytes.
    pub fn finish(&self) -> Vec<u8> {
        let mut module = wasm_encoder::Module::new();
        for (id, data) in &self.sections {
            module.section(&RawSection {
                id: *id,
                data: &data[..],
            });
        }
        module.finish()
    }
}

impl Default for ModuleEncoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
