// This module implements the ModuleAssembler, which turns a validated instruction sequence into
// a new function appended to the runtime module. The function has the fixed signature
// (ptr: i32, len: i32) -> f64 and replays the sequence as straight-line WebAssembly: argument
// loads read the f64 at ptr + slot * 8 from memory 0, arithmetic maps onto the native f64
// instructions and runtime calls target the function index the runtime exports under that name.
// The assembler adds exactly one type, one function, one export and one code entry; all new
// indices come after the existing ones, so nothing already in the runtime is renumbered.

//! Appending the compiled function to the runtime module.

use super::encoder::{encode_func_type, section_id, ModuleEncoder};
use crate::core::error::{CompileError, CompileResult};
use crate::lower::Instruction;
use crate::runtime::module::RuntimeModule;
use wasm_encoder::{Encode, ExportKind, Function, MemArg, ValType};

/// Export name of the compiled entry point.
pub const EXPORT_NAME: &str = "executable";

/// Parameter types of the entry point: base pointer and slot count.
pub const PARAMS: [ValType; 2] = [ValType::I32, ValType::I32];

/// Result type of the entry point.
pub const RESULTS: [ValType; 1] = [ValType::F64];

/// log2 of the natural alignment of an f64 load.
const F64_ALIGN: u32 = 3;

/// Local holding the argument buffer base pointer.
const PTR_LOCAL: u32 = 0;

/// Module produced by the assembler, before validation.
#[derive(Debug, Clone)]
pub struct AssembledModule {
    pub bytes: Vec<u8>,
    /// Index of the new entry in the type index space.
    pub type_index: u32,
    /// Index of the new function in the function index space.
    pub function_index: u32,
}

/// Appends compiled functions to a runtime module.
pub struct ModuleAssembler<'rt> {
    runtime: &'rt RuntimeModule,
    max_slots: usize,
}

impl<'rt> ModuleAssembler<'rt> {
    pub fn new(runtime: &'rt RuntimeModule, max_slots: usize) -> Self {
        Self { runtime, max_slots }
    }

    /// Build the module containing `program` as the exported entry point.
    pub fn assemble(
        &self,
        program: &[Instruction],
        slot_count: usize,
    ) -> CompileResult<AssembledModule> {
        if slot_count > self.max_slots {
            return Err(CompileError::ArgumentCountExceeded {
                count: slot_count,
                limit: self.max_slots,
            });
        }

        let body = self.build_function(program)?;
        let type_index = self.runtime.type_count();
        let function_index = self.runtime.function_count();

        let mut encoder = ModuleEncoder::from_runtime(self.runtime);
        encoder.append_entry(section_id::TYPE, |s| encode_func_type(&PARAMS, &RESULTS, s))?;
        encoder.append_entry(section_id::FUNCTION, |s| type_index.encode(s))?;
        encoder.append_entry(section_id::EXPORT, |s| {
            EXPORT_NAME.encode(s);
            ExportKind::Func.encode(s);
            function_index.encode(s);
        })?;
        encoder.append_entry(section_id::CODE, |s| body.encode(s))?;

        let bytes = encoder.finish();
        log::debug!(
            "assembled `{}` as function {} (type {}), module {} bytes",
            EXPORT_NAME,
            function_index,
            type_index,
            bytes.len()
        );

        Ok(AssembledModule {
            bytes,
            type_index,
            function_index,
        })
    }

    /// Encode the function body for `program`.
    fn build_function(&self, program: &[Instruction]) -> CompileResult<Function> {
        use wasm_encoder::Instruction as Op;

        let mut function = Function::new(Vec::<(u32, ValType)>::new());
        for inst in program {
            match *inst {
                Instruction::LoadConst(value) => {
                    function.instruction(&Op::F64Const(value.into()));
                }
                Instruction::LoadArg(slot) => {
                    function.instruction(&Op::LocalGet(PTR_LOCAL));
                    function.instruction(&Op::F64Load(MemArg {
                        offset: slot.byte_offset(),
                        align: F64_ALIGN,
                        memory_index: 0,
                    }));
                }
                Instruction::Neg => {
                    function.instruction(&Op::F64Neg);
                }
                Instruction::Add => {
                    function.instruction(&Op::F64Add);
                }
                Instruction::Sub => {
                    function.instruction(&Op::F64Sub);
                }
                Instruction::Mul => {
                    function.instruction(&Op::F64Mul);
                }
                Instruction::Div => {
                    function.instruction(&Op::F64Div);
                }
                Instruction::Sqrt => {
                    function.instruction(&Op::F64Sqrt);
                }
                Instruction::CallRuntime(name) => {
                    let index = self
                        .runtime
                        .function_index(name)
                        .ok_or_else(|| CompileError::linkage(name))?;
                    log::trace!("call ${} -> function {}", name, index);
                    function.instruction(&Op::Call(index));
                }
            }
        }
        function.instruction(&Op::End);
        Ok(function)
    }
}
