// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession owns everything that lives for exactly one compile call: the arena, the
// SymbolTable allocated in it, the current CompileStage and the SessionStats. Stages only move
// forward (Idle, Lowering, Assembling, Validating, Emitting, Done); any error moves the session
// straight to Failed, after which no further transition is accepted. Because the session is
// created per call and never shared, concurrent compilations cannot observe each other's slot
// numbering. SessionStats records instruction counts, folds, runtime calls and module size, and
// renders a human-readable summary for diagnostics.

//! Arena-based compilation session management.
//!
//! All per-compilation state is tied to the session lifetime and dropped
//! together with the arena when the compile call returns.

use super::error::{CompileError, CompileResult};
use super::symbols::SymbolTable;
use crate::lower::Instruction;
use bumpalo::Bump;
use std::collections::HashMap;
use std::fmt;

/// Compilation pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompileStage {
    Idle,
    Lowering,
    Assembling,
    Validating,
    Emitting,
    Done,
    Failed,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileStage::Idle => "idle",
            CompileStage::Lowering => "lowering",
            CompileStage::Assembling => "assembling",
            CompileStage::Validating => "validating",
            CompileStage::Emitting => "emitting",
            CompileStage::Done => "done",
            CompileStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Arena-based compilation session.
pub struct CompilationSession<'arena> {
    /// Arena allocator for compilation objects.
    arena: &'arena Bump,

    /// Symbol slots assigned during lowering.
    symbols: SymbolTable<'arena>,

    /// Current pipeline stage.
    stage: CompileStage,

    /// Session statistics for debugging.
    stats: SessionStats,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            symbols: SymbolTable::new(arena),
            stage: CompileStage::Idle,
            stats: SessionStats::default(),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    pub fn symbols(&self) -> &SymbolTable<'arena> {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable<'arena> {
        &mut self.symbols
    }

    pub fn stage(&self) -> CompileStage {
        self.stage
    }

    /// Move to the next stage. Stages are strictly ordered and never re-entered.
    pub fn advance(&mut self, next: CompileStage) -> CompileResult<()> {
        if next == CompileStage::Failed || self.stage == CompileStage::Failed || next <= self.stage
        {
            return Err(CompileError::invalid(format!(
                "illegal stage transition {} -> {}",
                self.stage, next
            )));
        }
        log::debug!("stage {} -> {}", self.stage, next);
        self.stage = next;
        Ok(())
    }

    /// Abandon the compilation.
    pub fn fail(&mut self, error: &CompileError) {
        log::debug!("stage {} -> failed: {}", self.stage, error);
        self.stage = CompileStage::Failed;
    }

    /// Record the lowered program.
    pub fn record_program(&mut self, program: &[Instruction]) {
        for inst in program {
            self.stats.instructions_lowered += 1;
            *self.stats.instruction_counts.entry(inst.opcode()).or_insert(0) += 1;
            if let Instruction::CallRuntime(name) = inst {
                log::trace!("runtime call recorded: {}", name);
                self.stats.runtime_calls += 1;
            }
        }
        self.stats.slots = self.symbols.len();
    }

    /// Record constant folds.
    pub fn record_folds(&mut self, folds: usize) {
        self.stats.constants_folded += folds;
    }

    /// Record the deepest operand stack of the final program.
    pub fn record_stack_depth(&mut self, depth: usize) {
        self.stats.max_stack_depth = depth;
    }

    /// Record the size of the emitted module.
    pub fn record_module_size(&mut self, size: usize) {
        self.stats.module_size = size;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Number of instructions produced by lowering.
    pub instructions_lowered: usize,

    /// Count of each instruction type lowered.
    pub instruction_counts: HashMap<&'static str, usize>,

    /// Constant folds performed.
    pub constants_folded: usize,

    /// Runtime calls emitted.
    pub runtime_calls: usize,

    /// Distinct symbols, i.e. argument slots.
    pub slots: usize,

    /// Deepest operand stack of the generated function.
    pub max_stack_depth: usize,

    /// Size of the emitted module in bytes.
    pub module_size: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Instructions lowered: {}", self.instructions_lowered)?;
        writeln!(f, "  Constants folded: {}", self.constants_folded)?;
        writeln!(f, "  Runtime calls: {}", self.runtime_calls)?;
        writeln!(f, "  Argument slots: {}", self.slots)?;
        writeln!(f, "  Max stack depth: {}", self.max_stack_depth)?;
        writeln!(f, "  Module size: {} bytes", self.module_size)?;

        if !self.instruction_counts.is_empty() {
            writeln!(f, "  Instruction breakdown:")?;
            let mut sorted: Vec<_> = self.instruction_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

            for (opcode, count) in sorted {
                writeln!(f, "    {}: {}", opcode, count)?;
            }
        }

        Ok(())
    }
}
