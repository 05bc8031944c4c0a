// This module implements the conservative peephole constant folder run over the lowered
// instruction sequence. A binary arithmetic instruction whose two operands are the immediately
// preceding constants is replaced by a single constant, and so is a negation of a constant. The
// fold evaluates with Rust f64 arithmetic, which is the same IEEE-754 binary64 arithmetic with
// round-to-nearest that the WebAssembly f64 instructions use, so folded and unfolded programs
// produce bit-identical results. Folds whose result is NaN are left alone because WebAssembly
// leaves the NaN payload of arithmetic results nondeterministic.

//! Peephole constant folding.

use crate::lower::Instruction;

/// Fold constant subexpressions. Returns the number of folds performed.
pub fn fold_constants(program: &mut Vec<Instruction>) -> usize {
    let mut out: Vec<Instruction> = Vec::with_capacity(program.len());
    let mut folds = 0;

    for &inst in program.iter() {
        match (inst, out.as_slice()) {
            (Instruction::Neg, [.., Instruction::LoadConst(value)]) => {
                let folded = -*value;
                out.pop();
                out.push(Instruction::LoadConst(folded));
                folds += 1;
            }
            (
                Instruction::Add | Instruction::Sub | Instruction::Mul | Instruction::Div,
                [.., Instruction::LoadConst(lhs), Instruction::LoadConst(rhs)],
            ) => match inst.eval_binary(*lhs, *rhs) {
                Some(folded) if !folded.is_nan() => {
                    out.truncate(out.len() - 2);
                    out.push(Instruction::LoadConst(folded));
                    folds += 1;
                }
                _ => out.push(inst),
            },
            _ => out.push(inst),
        }
    }

    if folds > 0 {
        log::trace!("folded {} constant operations", folds);
    }
    *program = out;
    folds
}
