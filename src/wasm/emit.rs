// This module provides the final output of a compilation. CompiledModule wraps the validated
// module bytes together with the metadata a host needs to call the entry point: the export name,
// the calling convention and the argument layout, i.e. the symbol names in slot order. It also
// carries an optional text disassembly of the generated function for diagnostics. A
// CompiledModule is immutable once emitted; the caller owns it and decides whether to persist or
// instantiate it.

//! Emission of the compiled artifact.

use super::assembler::{AssembledModule, EXPORT_NAME};
use crate::core::symbols::{SymbolTable, SLOT_SIZE};
use crate::lower::Instruction;
use std::fmt::{self, Write as _};

/// How the compiled entry point receives its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// `(ptr: i32, len: i32) -> f64`: `ptr` is the linear-memory offset of `len`
    /// contiguous little-endian f64 values, one per slot. `len` is not checked.
    PointerLength,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::PointerLength => f.write_str("(i32, i32) -> f64"),
        }
    }
}

/// The immutable result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    bytes: Box<[u8]>,
    symbols: Vec<String>,
    function_index: u32,
    instruction_count: usize,
    disassembly: Option<String>,
}

impl CompiledModule {
    /// Freeze an assembled, validated module.
    pub(crate) fn emit(
        assembled: AssembledModule,
        symbols: &SymbolTable<'_>,
        program: &[Instruction],
        with_disassembly: bool,
    ) -> Self {
        let names: Vec<String> = symbols.names().map(str::to_string).collect();
        let disassembly = with_disassembly.then(|| disassemble(&names, program));

        Self {
            bytes: assembled.bytes.into_boxed_slice(),
            symbols: names,
            function_index: assembled.function_index,
            instruction_count: program.len(),
            disassembly,
        }
    }

    /// Module bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn export_name(&self) -> &'static str {
        EXPORT_NAME
    }

    pub fn calling_convention(&self) -> CallingConvention {
        CallingConvention::PointerLength
    }

    /// Index of the entry point in the module's function index space.
    pub fn function_index(&self) -> u32 {
        self.function_index
    }

    /// Symbol names in slot order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Slot of `name`, if the expression references it.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == name)
    }

    /// Number of slots the argument buffer must hold.
    pub fn slot_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of stack-machine instructions in the entry point.
    pub fn instruction_count(&self) -> usize {
        self.instruction_count
    }

    pub fn disassembly(&self) -> Option<&str> {
        self.disassembly.as_deref()
    }

    /// Pack argument values into the buffer layout the entry point reads.
    ///
    /// Returns `None` if `lookup` has no value for some symbol; use
    /// [`CompiledModule::missing_arguments`] to find out which.
    pub fn argument_buffer(&self, lookup: impl Fn(&str) -> Option<f64>) -> Option<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.symbols.len() * SLOT_SIZE as usize);
        for name in &self.symbols {
            buffer.extend_from_slice(&lookup(name)?.to_le_bytes());
        }
        Some(buffer)
    }

    /// Symbols for which `lookup` has no value.
    pub fn missing_arguments<'a>(&'a self, lookup: impl Fn(&str) -> Option<f64>) -> Vec<&'a str> {
        self.symbols
            .iter()
            .filter(|name| lookup(name).is_none())
            .map(String::as_str)
            .collect()
    }
}

/// Render the entry point as WebAssembly text.
fn disassemble(symbols: &[String], program: &[Instruction]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "(func ${EXPORT_NAME} (param $ptr i32) (param $len i32) (result f64)"
    );
    for (slot, name) in symbols.iter().enumerate() {
        let _ = writeln!(out, "  ;; slot {slot} @ {}: {name}", slot as u64 * SLOT_SIZE);
    }
    for inst in program {
        for line in inst.to_string().lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out.push(')');
    out
}
