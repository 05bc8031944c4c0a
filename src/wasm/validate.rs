// This module implements structural validation. The generated function is straight-line code,
// so checking it reduces to simulating the operand stack depth: each instruction must find its
// operands already on the stack and the program must leave exactly one value behind, which
// becomes the function result. Runtime calls must name a function of the linkage table, and the
// table's arity gives their operand count. After encoding, the whole module is run through the
// wasmparser validator. Any failure here is an InvalidModule (or a LinkageError for an unknown
// call) and points at a defect in the compiler or a mismatched runtime.

//! Structural validation of instruction sequences and encoded modules.

use crate::core::error::{CompileError, CompileResult};
use crate::lower::Instruction;
use crate::runtime::linkage;

/// Number of operands `inst` pops from the stack.
pub fn operand_count(inst: &Instruction) -> CompileResult<usize> {
    Ok(match inst {
        Instruction::LoadConst(_) | Instruction::LoadArg(_) => 0,
        Instruction::Neg | Instruction::Sqrt => 1,
        Instruction::Add | Instruction::Sub | Instruction::Mul | Instruction::Div => 2,
        Instruction::CallRuntime(name) => linkage::lookup(name)
            .ok_or_else(|| CompileError::linkage(*name))?
            .arity as usize,
    })
}

/// Check every runtime call against the linkage table.
pub fn check_linkage(program: &[Instruction]) -> CompileResult<()> {
    for inst in program {
        if let Instruction::CallRuntime(name) = inst {
            if linkage::lookup(name).is_none() {
                return Err(CompileError::linkage(*name));
            }
        }
    }
    Ok(())
}

/// Check the operand-count contract of every instruction.
///
/// Returns the maximum stack depth reached.
pub fn validate_program(program: &[Instruction]) -> CompileResult<usize> {
    let mut depth = 0usize;
    let mut max_depth = 0usize;

    for (pos, inst) in program.iter().enumerate() {
        let needed = operand_count(inst)?;
        if depth < needed {
            return Err(CompileError::invalid(format!(
                "instruction {pos} ({inst:?}) needs {needed} operands, stack holds {depth}"
            )));
        }
        depth = depth - needed + 1;
        max_depth = max_depth.max(depth);
    }

    if depth != 1 {
        return Err(CompileError::invalid(format!(
            "program leaves {depth} values on the stack, expected 1"
        )));
    }
    Ok(max_depth)
}

/// Validate an encoded module.
pub fn validate_module(bytes: &[u8]) -> CompileResult<()> {
    wasmparser::validate(bytes)
        .map(|_| ())
        .map_err(|e| CompileError::invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::symbols::Slot;
    use Instruction::*;

    #[test]
    fn test_accepts_well_formed_programs() {
        let program = [
            LoadArg(Slot::new(0)),
            LoadConst(1.0),
            Add,
            LoadArg(Slot::new(1)),
            CallRuntime("sin"),
            Mul,
        ];
        assert_eq!(validate_program(&program), Ok(2));
    }

    #[test]
    fn test_runtime_arity_is_respected() {
        let program = [LoadConst(2.0), LoadConst(3.0), CallRuntime("pow")];
        assert_eq!(validate_program(&program), Ok(2));

        let short = [LoadConst(2.0), CallRuntime("pow")];
        assert!(matches!(
            validate_program(&short),
            Err(CompileError::InvalidModule { .. })
        ));
    }

    #[test]
    fn test_rejects_stack_underflow() {
        let program = [LoadConst(1.0), Add];
        assert!(matches!(
            validate_program(&program),
            Err(CompileError::InvalidModule { .. })
        ));
    }

    #[test]
    fn test_rejects_leftover_or_missing_result() {
        assert!(validate_program(&[]).is_err());
        assert!(validate_program(&[LoadConst(1.0), LoadConst(2.0)]).is_err());
    }

    #[test]
    fn test_unknown_runtime_call_is_a_linkage_error() {
        let program = [LoadConst(1.0), CallRuntime("lgamma")];
        assert_eq!(
            validate_program(&program),
            Err(CompileError::LinkageError {
                name: "lgamma".into()
            })
        );
    }

    #[test]
    fn test_linkage_check_ignores_stack_shape() {
        assert_eq!(check_linkage(&[CallRuntime("sin"), CallRuntime("pow")]), Ok(()));
        assert_eq!(
            check_linkage(&[LoadConst(1.0), CallRuntime("erfc")]),
            Err(CompileError::LinkageError {
                name: "erfc".into()
            })
        );
    }

    #[test]
    fn test_module_validation_rejects_garbage() {
        assert!(validate_module(b"\0asm\x01\0\0\0").is_ok());
        assert!(matches!(
            validate_module(b"not wasm"),
            Err(CompileError::InvalidModule { .. })
        ));
    }
}
